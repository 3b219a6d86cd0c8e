use crate::{
    bitmap::Bitmap,
    key::{self, Key, TWIG_SHIFT},
};
use std::sync::Arc;

/// Whether a node may be shared between tries or belongs to one edit session.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Ownership {
    Persistent,
    Transient,
}

/// How the cells of a node are laid out.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Layout {
    /// Only occupied slots are stored, ordered by bit and addressed by rank.
    Compact,
    /// Slots `0..n` are occupied and stored contiguously.
    FirstN,
    /// Every slot of the node is allocated and addressed by bit.
    Full,
}

impl Layout {
    /// Layout of a freshly built persistent node with the given occupancy.
    pub fn compact_for<K: Key>(bits: Bitmap, depth: u8) -> Self {
        if bits.size() == key::max_cells::<K>(depth) {
            Self::Full
        } else if bits.is_first_n() {
            Self::FirstN
        } else {
            Self::Compact
        }
    }
}

#[derive(Clone, Debug)]
pub enum Cell<K, V> {
    Empty,
    Value(V),
    Node(Arc<Node<K, V>>),
}

/// Where a key falls relative to one node.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CellIndex {
    pub bit_index: u8,
    pub cell_index: u8,
    pub is_beneath: bool,
    pub is_found: bool,
}

#[derive(Clone, Debug)]
pub struct Node<K, V> {
    pub(crate) address: K,
    pub(crate) numel: usize,
    pub(crate) bits: Bitmap,
    pub(crate) depth: u8,
    pub(crate) start_bit: u8,
    pub(crate) shift: u8,
    pub(crate) ownership: Ownership,
    pub(crate) layout: Layout,
    pub(crate) cells: Vec<Cell<K, V>>,
}

impl<K: Key, V> Node<K, V> {
    /// Creates a persistent twig holding a single key.
    pub fn from_kv(key: K, value: V) -> Self {
        let bit = twig_bit(key);
        let bits = Bitmap::new().set(bit);

        Self {
            address: twig_address(key),
            numel: 1,
            bits,
            depth: K::TWIG_DEPTH,
            start_bit: 0,
            shift: TWIG_SHIFT as u8,
            ownership: Ownership::Persistent,
            layout: Layout::compact_for::<K>(bits, K::TWIG_DEPTH),
            cells: vec![Cell::Value(value)],
        }
    }

    /// Creates a transient twig holding a single key, with every slot allocated.
    pub fn transient_from_kv(key: K, value: V) -> Self {
        let bit = twig_bit(key);
        let mut cells = empty_cells(key::max_cells::<K>(K::TWIG_DEPTH));
        cells[bit as usize] = Cell::Value(value);

        Self {
            address: twig_address(key),
            numel: 1,
            bits: Bitmap::new().set(bit),
            depth: K::TWIG_DEPTH,
            start_bit: 0,
            shift: TWIG_SHIFT as u8,
            ownership: Ownership::Transient,
            layout: Layout::Full,
            cells,
        }
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Number of key/value pairs beneath this node.
    pub fn len(&self) -> usize {
        self.numel
    }

    pub fn is_twig(&self) -> bool {
        self.depth == K::TWIG_DEPTH
    }

    pub fn is_transient(&self) -> bool {
        self.ownership == Ownership::Transient
    }

    /// Number of occupied slots.
    pub fn cell_count(&self) -> usize {
        match self.layout {
            Layout::Full => self.bits.size(),
            Layout::Compact | Layout::FirstN => self.cells.len(),
        }
    }

    /// Whether `key` lies in the address range of this node.
    pub fn contains(&self, key: K) -> bool {
        key::is_beneath(self.address, self.depth, key)
    }

    /// Position in `cells` of the slot for `bit`.
    pub fn position(&self, bit: u8) -> usize {
        match self.layout {
            Layout::Full | Layout::FirstN => bit as usize,
            Layout::Compact => self.bits.rank(bit),
        }
    }

    pub fn cell_index(&self, key: K) -> CellIndex {
        let is_beneath = self.contains(key);
        let bit_index =
            ((key >> self.start_bit as u32) & key::low_mask(self.shift as u32)).low_u32() as u8;

        CellIndex {
            bit_index,
            cell_index: self.position(bit_index) as u8,
            is_beneath,
            is_found: is_beneath && self.bits.get(bit_index),
        }
    }

    /// Index of the lowest occupied slot; `is_found` is false for an empty node.
    pub fn first_cell(&self) -> CellIndex {
        let is_found = self.numel > 0;
        let bit_index = match self.layout {
            Layout::FirstN => 0,
            Layout::Compact | Layout::Full => self.bits.first(),
        };

        CellIndex {
            bit_index,
            cell_index: match self.layout {
                Layout::Full => bit_index,
                Layout::Compact | Layout::FirstN => 0,
            },
            is_beneath: is_found,
            is_found,
        }
    }

    /// Index of the next occupied slot after `index`.
    pub fn next_cell(&self, index: CellIndex) -> CellIndex {
        let bit_index = self.bits.next_after(index.bit_index);
        let is_found = bit_index < u32::BITS as u8;

        CellIndex {
            bit_index,
            cell_index: match self.layout {
                Layout::Full => bit_index,
                Layout::Compact | Layout::FirstN => index.cell_index + 1,
            },
            is_beneath: is_found,
            is_found,
        }
    }

    pub fn cell(&self, index: CellIndex) -> &Cell<K, V> {
        &self.cells[index.cell_index as usize]
    }

    /// Cell stored in the occupied slot `bit`.
    pub fn cell_at(&self, bit: u8) -> &Cell<K, V> {
        &self.cells[self.position(bit)]
    }

    /// Child in the only other occupied slot of a two-cell node.
    pub fn other_child(&self, index: CellIndex) -> &Arc<Node<K, V>> {
        debug_assert_eq!(self.cell_count(), 2);

        match self.cell_at(self.bits.unset(index.bit_index).first()) {
            Cell::Node(node) => node,
            _ => panic!("sibling of depth {} is not a node", self.depth),
        }
    }

    /// Occupied slots with their cells, in ascending bit order.
    pub fn occupied(&self) -> impl Iterator<Item = (u8, &Cell<K, V>)> {
        self.bits.iter().map(move |bit| (bit, self.cell_at(bit)))
    }

    /// Key reconstructed from this node's address and a slot.
    pub fn key_at(&self, bit: u8) -> K {
        self.address | (K::from_u32(bit as u32) << self.start_bit as u32)
    }
}

fn twig_address<K: Key>(key: K) -> K {
    key & !key::low_mask::<K>(TWIG_SHIFT)
}

fn twig_bit<K: Key>(key: K) -> u8 {
    (key & key::low_mask(TWIG_SHIFT)).low_u32() as u8
}

pub fn empty_cells<K, V>(count: usize) -> Vec<Cell<K, V>> {
    std::iter::repeat_with(|| Cell::Empty).take(count).collect()
}

#[cfg(test)]
impl<K: Key, V> Node<K, V> {
    /// Checks structural invariants of the subtree and returns its element count.
    pub fn validate(&self) -> usize {
        assert!(self.depth <= K::TWIG_DEPTH);
        assert_eq!(self.start_bit as u32, key::start_bit::<K>(self.depth));
        assert_eq!(self.shift as u32, key::shift::<K>(self.depth));
        assert_eq!(
            self.address & key::depth_mask(self.depth),
            K::ZERO,
            "address has bits below the node"
        );

        match self.layout {
            Layout::Full => {
                assert_eq!(self.cells.len(), key::max_cells::<K>(self.depth));

                for (bit, cell) in self.cells.iter().enumerate() {
                    assert_eq!(
                        self.bits.get(bit as u8),
                        !matches!(cell, Cell::Empty),
                        "bitmap disagrees with cells"
                    );
                }
            }
            Layout::FirstN => {
                assert!(self.bits.is_first_n());
                assert_eq!(self.cells.len(), self.bits.size());
            }
            Layout::Compact => assert_eq!(self.cells.len(), self.bits.size()),
        }

        let count = self
            .occupied()
            .map(|(bit, cell)| match cell {
                Cell::Empty => panic!("occupied slot {bit} holds no cell"),
                Cell::Value(_) => {
                    assert!(self.is_twig());
                    1
                }
                Cell::Node(child) => {
                    assert!(!self.is_twig());
                    assert!(child.depth > self.depth);
                    assert!(self.contains(child.address));
                    assert_eq!(self.cell_index(child.address).bit_index, bit);
                    assert!(
                        child.is_twig() || child.cell_count() > 1,
                        "internal node with a single child"
                    );
                    if !self.is_transient() {
                        assert!(!child.is_transient(), "persistent node above transient one");
                    }
                    child.validate()
                }
            })
            .sum();

        assert_eq!(self.numel, count, "element count mismatch");

        count
    }
}
