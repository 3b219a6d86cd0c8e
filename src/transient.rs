//! In-place edits of nodes owned by a single transient session.
//!
//! A node reached by an edit is first brought into the session: a persistent
//! node is copied into a transient one with every slot allocated, and a
//! transient node is edited where it stands. Bits are then toggled in place
//! without reallocating the cell array.

use crate::{
    key::{self, Key},
    node::{empty_cells, Cell, CellIndex, Layout, Node, Ownership},
    path::{find, EditPoint, Path},
};
use log::{debug, trace};
use std::{mem, sync::Arc};

impl<K: Key, V: Clone> Node<K, V> {
    /// Copies the node into full transient layout.
    pub fn to_transient(&self) -> Self {
        trace!("copying node at {:?} into a transient session", self.address);

        let mut cells = empty_cells(key::max_cells::<K>(self.depth));

        for (bit, cell) in self.occupied() {
            cells[bit as usize] = cell.clone();
        }

        Self {
            ownership: Ownership::Transient,
            layout: Layout::Full,
            cells,
            ..*self
        }
    }
}

impl<K: Key, V> Node<K, V> {
    fn full_cell_mut(&mut self, index: CellIndex) -> &mut Cell<K, V> {
        debug_assert!(self.is_transient() && self.layout == Layout::Full);

        &mut self.cells[index.bit_index as usize]
    }

    /// Replaces the cell at `index`, returning the old one.
    pub fn change_cell(&mut self, index: CellIndex, cell: Cell<K, V>) -> Cell<K, V> {
        mem::replace(self.full_cell_mut(index), cell)
    }

    /// Fills the unoccupied slot of `index`.
    pub fn add_cell(&mut self, index: CellIndex, cell: Cell<K, V>) {
        self.bits = self.bits.set(index.bit_index);
        *self.full_cell_mut(index) = cell;
    }

    /// Empties the slot of `index`, returning its cell.
    pub fn delete_cell(&mut self, index: CellIndex) -> Cell<K, V> {
        self.bits = self.bits.unset(index.bit_index);
        mem::replace(self.full_cell_mut(index), Cell::Empty)
    }
}

/// Brings the node in `slot` into the session, copying it if it is persistent
/// or still shared.
fn make_transient<K: Key, V: Clone>(slot: &mut Arc<Node<K, V>>) -> &mut Node<K, V> {
    if !slot.is_transient() {
        *slot = slot.to_transient().into();
    }

    Arc::make_mut(slot)
}

fn child_mut<K: Key, V>(node: &mut Node<K, V>, index: CellIndex) -> &mut Arc<Node<K, V>> {
    let depth = node.depth;

    match node.full_cell_mut(index) {
        Cell::Node(child) => child,
        _ => panic!("slot {} at depth {depth} holds no node", index.bit_index),
    }
}

/// Extracts the value of `key` from a removed cell.
fn into_value<K: Key, V: Clone>(cell: Cell<K, V>, key: K) -> V {
    match cell {
        Cell::Value(value) => value,
        Cell::Node(twig) => {
            let mut twig = Arc::unwrap_or_clone(twig);
            let position = twig.position(twig.cell_index(key).bit_index);

            into_value(twig.cells.swap_remove(position), key)
        }
        Cell::Empty => panic!("removed slot of {key:?} holds no cell"),
    }
}

/// Maps `key` to `value` in place, returning the previous value.
pub fn assoc<K: Key, V: Clone + PartialEq>(
    root: &mut Option<Arc<Node<K, V>>>,
    key: K,
    value: V,
) -> Option<V> {
    let Some(node) = root.as_ref() else {
        *root = Some(Node::transient_from_kv(key, value).into());
        return None;
    };
    let point = {
        let (found, path) = find(node, key);

        if found == Some(&value) {
            return Some(value);
        }

        path.point()
    };

    assoc_at(root, point, key, value)
}

/// Maps `key` to `value` in place at the point found by a search for `key`.
pub fn assoc_at<K: Key, V: Clone>(
    root: &mut Option<Arc<Node<K, V>>>,
    point: EditPoint,
    key: K,
    value: V,
) -> Option<V> {
    let Some(mut slot) = root.as_mut() else {
        *root = Some(Node::transient_from_kv(key, value).into());
        return None;
    };

    if point.is_disjoint() && point.edit_depth.is_none() {
        let twig = Node::transient_from_kv(key, value).into();
        let old = slot.clone();

        *slot = Node::join_disjoint(old, twig, Ownership::Transient).into();
        return None;
    }

    loop {
        let node = make_transient(slot);
        let depth = node.depth;
        let index = node.cell_index(key);

        if !point.value_found {
            node.numel += 1;
        }

        if point.is_disjoint() && point.edit_depth == Some(depth) {
            let twig = Node::transient_from_kv(key, value).into();
            let child = child_mut(node, index);
            let old = child.clone();

            *child = Node::join_disjoint(old, twig, Ownership::Transient).into();
            return None;
        } else if depth == point.max_depth {
            return if point.value_found {
                Some(into_value(node.change_cell(index, Cell::Value(value)), key))
            } else if node.is_twig() {
                node.add_cell(index, Cell::Value(value));
                None
            } else {
                node.add_cell(index, Cell::Node(Node::transient_from_kv(key, value).into()));
                None
            };
        }

        slot = child_mut(node, index);
    }
}

/// Removes `key` in place, returning its value.
pub fn dissoc<K: Key, V: Clone>(root: &mut Option<Arc<Node<K, V>>>, key: K) -> Option<V> {
    let removal = Removal::plan(&find(root.as_ref()?, key).1)?;

    dissoc_at(root, removal, key)
}

/// How the removal of a key reshapes the trie.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Removal {
    /// The key was the only one in the trie.
    Root,
    /// The cell at this depth goes away.
    Cell(u8),
    /// The node at this depth is left with a single child and is replaced by it.
    Collapse(u8),
}

impl Removal {
    /// Plans the removal of the key searched for by `path`, or returns `None`
    /// if it is absent.
    pub fn plan<K: Key, V>(path: &Path<'_, K, V>) -> Option<Self> {
        if !path.value_found() {
            return None;
        }

        let step = path.deepest();

        Some(match step.parent {
            _ if step.node.len() > 1 => Self::Cell(step.node.depth()),
            None => Self::Root,
            Some(depth) if path.step(depth).node.cell_count() == 2 => Self::Collapse(depth),
            Some(depth) => Self::Cell(depth),
        })
    }
}

/// Removes `key` in place as planned by a search for it.
pub fn dissoc_at<K: Key, V: Clone>(
    root: &mut Option<Arc<Node<K, V>>>,
    removal: Removal,
    key: K,
) -> Option<V> {
    if removal == Removal::Root {
        return mem::take(root).map(|twig| into_value(Cell::Node(twig), key));
    }

    let mut slot = root.as_mut()?;

    loop {
        let depth = slot.depth;
        let index = slot.cell_index(key);

        if removal == Removal::Collapse(depth) {
            let sibling = slot.other_child(index).clone();
            let twig = match slot.cell(index) {
                Cell::Node(twig) => twig.clone(),
                _ => panic!("slot of {key:?} at depth {depth} holds no twig"),
            };

            *slot = sibling;
            return Some(into_value(Cell::Node(twig), key));
        }

        let node = make_transient(slot);
        node.numel -= 1;

        if removal == Removal::Cell(depth) {
            return Some(into_value(node.delete_cell(index), key));
        }

        slot = child_mut(node, index);
    }
}

/// Freezes every transient node reachable from `slot`, returning how many
/// nodes were frozen.
pub fn persist<K: Key, V: Clone>(slot: &mut Arc<Node<K, V>>) -> usize {
    let count = freeze(slot);

    debug!("froze {count} transient nodes");

    count
}

fn freeze<K: Key, V: Clone>(slot: &mut Arc<Node<K, V>>) -> usize {
    if !slot.is_transient() {
        return 0;
    }

    let node = Arc::make_mut(slot);
    node.ownership = Ownership::Persistent;

    1 + node
        .cells
        .iter_mut()
        .map(|cell| match cell {
            Cell::Node(child) => freeze(child),
            Cell::Empty | Cell::Value(_) => 0,
        })
        .sum::<usize>()
}
