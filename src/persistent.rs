//! Copy-on-write edits of persistent nodes.
//!
//! Every primitive copies exactly one node; its cells are shared with the
//! original by cloning them, which for child nodes only bumps an `Arc` count.

use crate::{
    bitmap::Bitmap,
    key::{self, Key, NODE_SHIFT, TWIG_SHIFT},
    node::{empty_cells, Cell, CellIndex, Layout, Node, Ownership},
    path::{find, Path},
};
use log::trace;
use std::sync::Arc;

impl<K: Key, V: Clone> Node<K, V> {
    /// Copies the node with the cell at `index` replaced.
    pub fn with_changed_cell(&self, index: CellIndex, cell: Cell<K, V>) -> Self {
        self.copy_with(self.bits, index.bit_index, Some(cell))
    }

    /// Copies the node with a new cell at the unoccupied slot of `index`.
    pub fn with_added_cell(&self, index: CellIndex, cell: Cell<K, V>) -> Self {
        self.copy_with(self.bits.set(index.bit_index), index.bit_index, Some(cell))
    }

    /// Copies the node without the cell at `index`, or returns `None` if no
    /// cell would be left.
    pub fn with_deleted_cell(&self, index: CellIndex) -> Option<Self> {
        let bits = self.bits.unset(index.bit_index);

        if bits.is_empty() {
            None
        } else {
            Some(self.copy_with(bits, index.bit_index, None))
        }
    }

    fn copy_with(&self, bits: Bitmap, changed: u8, mut cell: Option<Cell<K, V>>) -> Self {
        let cells = bits
            .iter()
            .map(|bit| {
                if bit == changed {
                    cell.take().expect("changed slot is filled once")
                } else {
                    self.cell_at(bit).clone()
                }
            })
            .collect();

        Self {
            address: self.address,
            numel: self.numel,
            bits,
            depth: self.depth,
            start_bit: self.start_bit,
            shift: self.shift,
            ownership: Ownership::Persistent,
            layout: Layout::compact_for::<K>(bits, self.depth),
            cells,
        }
    }
}

impl<K: Key, V> Node<K, V> {
    /// Creates the node directly above two subtrees with disjoint address
    /// ranges, holding both of them.
    ///
    /// # Panics
    ///
    /// Panics if either subtree lies within the range of the other.
    pub fn join_disjoint(a: Arc<Self>, b: Arc<Self>, ownership: Ownership) -> Self {
        assert!(
            !a.contains(b.address) && !b.contains(a.address),
            "cannot join overlapping subtrees at {:?} and {:?}",
            a.address,
            b.address
        );

        let bit = key::highest_differing_bit(a.address, b.address);
        let depth = if bit < K::ROOT_FIRST_BIT {
            K::LEVELS as u8 - 2 - ((bit - TWIG_SHIFT) / NODE_SHIFT) as u8
        } else {
            K::ROOT_DEPTH
        };
        let start_bit = key::start_bit::<K>(depth);
        let shift = key::shift::<K>(depth);

        assert!(depth < a.depth && depth < b.depth);
        trace!("joining subtrees at {:?} and {:?} at depth {}", a.address, b.address, depth);

        let slot = |address: K| ((address >> start_bit) & key::low_mask(shift)).low_u32() as u8;
        let (low, high) = if a.address < b.address { (a, b) } else { (b, a) };
        let (low_bit, high_bit) = (slot(low.address), slot(high.address));
        let bits = Bitmap::new().set(low_bit).set(high_bit);
        let address = low.address & key::high_mask(start_bit + shift);
        let numel = low.numel + high.numel;

        let (layout, cells) = match ownership {
            Ownership::Persistent => (
                Layout::compact_for::<K>(bits, depth),
                vec![Cell::Node(low), Cell::Node(high)],
            ),
            Ownership::Transient => {
                let mut cells = empty_cells(key::max_cells::<K>(depth));
                cells[low_bit as usize] = Cell::Node(low);
                cells[high_bit as usize] = Cell::Node(high);
                (Layout::Full, cells)
            }
        };

        Self {
            address,
            numel,
            bits,
            depth,
            start_bit: start_bit as u8,
            shift: shift as u8,
            ownership,
            layout,
            cells,
        }
    }
}

/// Returns a trie with `key` mapped to `value`, sharing every untouched node
/// with `root`. An absent root is the empty trie.
pub fn assoc<K: Key, V: Clone + PartialEq>(
    root: Option<&Arc<Node<K, V>>>,
    key: K,
    value: V,
) -> Arc<Node<K, V>> {
    let Some(root) = root else {
        return Arc::new(Node::from_kv(key, value));
    };
    let (found, path) = find(root, key);

    if found == Some(&value) {
        return root.clone();
    }

    assoc_path(&path, key, value)
}

/// Rebuilds the trie searched by `path` with `key` mapped to `value`.
pub fn assoc_path<K: Key, V: Clone>(path: &Path<'_, K, V>, key: K, value: V) -> Arc<Node<K, V>> {
    let point = path.point();
    let step = path.deepest();
    let mut node = if point.value_found {
        step.node.with_changed_cell(step.index, Cell::Value(value))
    } else if point.is_disjoint() {
        Node::join_disjoint(
            step.node.clone(),
            Node::from_kv(key, value).into(),
            Ownership::Persistent,
        )
    } else {
        let cell = if step.node.is_twig() {
            Cell::Value(value)
        } else {
            Cell::Node(Node::from_kv(key, value).into())
        };
        let mut node = step.node.with_added_cell(step.index, cell);
        node.numel += 1;
        node
    };
    let mut parent = step.parent;

    while let Some(depth) = parent {
        let step = path.step(depth);

        node = step.node.with_changed_cell(step.index, Cell::Node(node.into()));
        node.numel += !point.value_found as usize;
        parent = step.parent;
    }

    node.into()
}

/// Returns a trie without `key`, sharing every untouched node with `root`.
/// `None` is the empty trie.
pub fn dissoc<K: Key, V: Clone>(root: &Arc<Node<K, V>>, key: K) -> Option<Arc<Node<K, V>>> {
    dissoc_path(&find(root, key).1)
}

/// Rebuilds the trie searched by `path` without the key searched for.
pub fn dissoc_path<K: Key, V: Clone>(path: &Path<'_, K, V>) -> Option<Arc<Node<K, V>>> {
    if !path.value_found() {
        return Some(path.step(path.min_depth()).node.clone());
    }

    let step = path.deepest();
    let (mut node, mut parent) = if step.node.numel == 1 {
        // A twig left empty disappears together with its slot in the parent.
        let depth = step.parent?;
        let step = path.step(depth);

        if step.node.cell_count() == 2 {
            (step.node.other_child(step.index).clone(), step.parent)
        } else {
            (deleted(step.node, step.index), step.parent)
        }
    } else {
        (deleted(step.node, step.index), step.parent)
    };

    while let Some(depth) = parent {
        let step = path.step(depth);
        let mut up = step.node.with_changed_cell(step.index, Cell::Node(node));

        up.numel -= 1;
        node = up.into();
        parent = step.parent;
    }

    Some(node)
}

fn deleted<K: Key, V: Clone>(node: &Node<K, V>, index: CellIndex) -> Arc<Node<K, V>> {
    let mut node = node
        .with_deleted_cell(index)
        .expect("node keeps at least one cell");

    node.numel -= 1;
    node.into()
}
