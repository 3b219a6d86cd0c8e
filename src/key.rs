use std::{
    fmt::Debug,
    hash::Hash,
    ops::{BitAnd, BitOr, BitXor, Not, Shl, Shr},
};

/// Bits consumed by every internal level.
pub const NODE_SHIFT: u32 = 5;
/// Bits consumed by the twig level, the one holding values directly.
pub const TWIG_SHIFT: u32 = 5;

/// Fixed-width unsigned integer usable as a trie key.
///
/// The trie geometry (how many levels there are and which bits each level
/// reads) is derived from [`Key::BITS`]. The root absorbs whatever bits are
/// left over once the twig and the 5-bit internal levels are laid out.
pub trait Key:
    Copy
    + Debug
    + Eq
    + Ord
    + Hash
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + BitXor<Output = Self>
    + Not<Output = Self>
    + Shl<u32, Output = Self>
    + Shr<u32, Output = Self>
{
    const BITS: u32;
    const ZERO: Self;
    const MAX: Self;

    const ROOT_SHIFT: u32 = (Self::BITS - TWIG_SHIFT) % NODE_SHIFT;
    const ROOT_FIRST_BIT: u32 = Self::BITS - Self::ROOT_SHIFT;
    const NODE_LEVELS: u32 = (Self::BITS - Self::ROOT_SHIFT - TWIG_SHIFT) / NODE_SHIFT;
    /// Number of node levels, root and twig included.
    const LEVELS: usize = Self::NODE_LEVELS as usize + 2;
    const ROOT_DEPTH: u8 = 0;
    const TWIG_DEPTH: u8 = Self::NODE_LEVELS as u8 + 1;

    fn population_count(self) -> u32;
    /// Returns `BITS` for zero.
    fn leading_zero_count(self) -> u32;
    /// Returns `BITS` for zero.
    fn trailing_zero_count(self) -> u32;
    /// Low 32 bits of the key.
    fn low_u32(self) -> u32;
    fn from_u32(value: u32) -> Self;
    fn checked_increment(self) -> Option<Self>;
}

macro_rules! impl_key {
    ($($type:ty),*) => {
        $(
            impl Key for $type {
                const BITS: u32 = <$type>::BITS;
                const ZERO: Self = 0;
                const MAX: Self = <$type>::MAX;

                fn population_count(self) -> u32 {
                    self.count_ones()
                }

                fn leading_zero_count(self) -> u32 {
                    self.leading_zeros()
                }

                fn trailing_zero_count(self) -> u32 {
                    self.trailing_zeros()
                }

                fn low_u32(self) -> u32 {
                    self as u32
                }

                fn from_u32(value: u32) -> Self {
                    value as Self
                }

                fn checked_increment(self) -> Option<Self> {
                    self.checked_add(1)
                }
            }
        )*
    };
}

impl_key!(u16, u32, u64, u128, usize);

/// Mask with the low `n` bits set and bit `n` itself clear.
pub fn low_mask<K: Key>(n: u32) -> K {
    if n >= K::BITS {
        K::MAX
    } else {
        !(K::MAX << n)
    }
}

/// Mask with bit `n` and everything above it set. `high_mask(BITS)` is zero.
pub fn high_mask<K: Key>(n: u32) -> K {
    if n >= K::BITS {
        K::ZERO
    } else {
        K::MAX << n
    }
}

/// Index of the most significant bit at which two keys differ.
///
/// # Panics
///
/// Panics if the keys are equal.
pub fn highest_differing_bit<K: Key>(a: K, b: K) -> u32 {
    assert_ne!(a, b, "equal keys have no differing bit");

    K::BITS - (a ^ b).leading_zero_count() - 1
}

/// Low bits that are free to vary beneath a node at the given depth.
pub fn depth_mask<K: Key>(depth: u8) -> K {
    if depth == K::ROOT_DEPTH {
        K::MAX
    } else if depth == K::TWIG_DEPTH {
        low_mask(TWIG_SHIFT)
    } else {
        low_mask(K::ROOT_FIRST_BIT - (depth as u32 - 1) * NODE_SHIFT)
    }
}

/// Lowest key bit read by a node at the given depth.
pub fn start_bit<K: Key>(depth: u8) -> u32 {
    if depth == K::ROOT_DEPTH {
        K::ROOT_FIRST_BIT
    } else if depth == K::TWIG_DEPTH {
        0
    } else {
        K::ROOT_FIRST_BIT - depth as u32 * NODE_SHIFT
    }
}

/// Number of key bits read by a node at the given depth.
pub fn shift<K: Key>(depth: u8) -> u32 {
    if depth == K::ROOT_DEPTH {
        K::ROOT_SHIFT
    } else if depth == K::TWIG_DEPTH {
        TWIG_SHIFT
    } else {
        NODE_SHIFT
    }
}

pub fn max_cells<K: Key>(depth: u8) -> usize {
    1 << shift::<K>(depth)
}

/// Whether `key` lies in the address range of a node at `address` and `depth`.
pub fn is_beneath<K: Key>(address: K, depth: u8, key: K) -> bool {
    key >= address && key <= address | depth_mask(depth)
}
