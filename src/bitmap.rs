use crate::key::{self, Key};

const NUM_BITS: u32 = u32::BITS;

/// Occupancy bitmap of a node; bit `i` is set iff slot `i` holds a cell.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Bitmap(u32);

impl Bitmap {
    pub fn new() -> Self {
        Bitmap(0)
    }

    pub fn get(&self, i: u8) -> bool {
        self.0 & (1 << i) != 0
    }

    pub fn set(&self, i: u8) -> Self {
        Bitmap(self.0 | (1 << i))
    }

    pub fn unset(&self, i: u8) -> Self {
        Bitmap(self.0 & !(1 << i))
    }

    pub fn size(&self) -> usize {
        self.0.population_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Number of set bits strictly below bit `i`.
    pub fn rank(&self, i: u8) -> usize {
        (self.0 & key::low_mask::<u32>(i as u32)).population_count() as usize
    }

    /// Lowest set bit, or 32 if the bitmap is empty.
    pub fn first(&self) -> u8 {
        self.0.trailing_zero_count() as u8
    }

    /// Lowest set bit strictly above bit `i`, or 32 if there is none.
    pub fn next_after(&self, i: u8) -> u8 {
        (self.0 & key::high_mask::<u32>(i as u32 + 1)).trailing_zero_count() as u8
    }

    /// True if exactly bits `0..n` are set for some `n`.
    pub fn is_first_n(&self) -> bool {
        key::low_mask::<u32>(NUM_BITS - self.0.leading_zero_count()) == self.0
    }

    pub fn iter(&self) -> BitmapIterator {
        BitmapIterator(self.0)
    }
}

/// Set bits of a bitmap in ascending order.
#[derive(Clone, Debug)]
pub struct BitmapIterator(u32);

impl Iterator for BitmapIterator {
    type Item = u8;

    fn next(&mut self) -> Option<Self::Item> {
        if self.0 == 0 {
            return None;
        }

        let i = self.0.trailing_zero_count();
        self.0 &= !(1 << i);

        Some(i as u8)
    }
}
