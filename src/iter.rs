//! Ascending traversal of a trie.

use crate::{
    error::{Error, Result},
    key::Key,
    node::{Cell, CellIndex, Node},
    path::{find, Path, Step},
    thamt::Thamt,
};
use std::{iter::FusedIterator, sync::Arc};

impl<'a, K: Key, V> Path<'a, K, V> {
    /// Searches for the smallest key beneath `root`.
    pub fn first(root: &'a Arc<Node<K, V>>) -> (Option<&'a V>, Self) {
        let mut path = Self::new(root.depth());
        let value = path.dig_first(root, None);

        (value, path)
    }

    /// Advances the path to the next key in ascending order.
    ///
    /// Returns `None` once the path has moved past the last key of the trie
    /// it was built on, leaving the path without a value.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<&'a V> {
        let mut depth = self.max_depth();

        loop {
            let step = self.step(depth);
            let index = step.node.next_cell(step.index);

            if index.is_found {
                self.step_mut(depth).index = index;

                return match step.node.cell(index) {
                    Cell::Value(value) => Some(value),
                    Cell::Node(child) => self.dig_first(child, Some(depth)),
                    Cell::Empty => panic!("occupied slot {} holds no cell", index.bit_index),
                };
            }

            match step.parent {
                Some(parent) => depth = parent,
                None => {
                    self.point_mut().value_found = false;
                    return None;
                }
            }
        }
    }

    fn dig_first(&mut self, mut node: &'a Arc<Node<K, V>>, mut parent: Option<u8>) -> Option<&'a V> {
        loop {
            let index = node.first_cell();

            if !index.is_found {
                return None;
            }

            self.record(Step {
                node,
                index,
                parent,
            });

            let point = self.point_mut();
            point.max_depth = node.depth();
            point.edit_depth = Some(node.depth());

            match node.cell(index) {
                Cell::Node(child) => {
                    parent = Some(node.depth());
                    node = child;
                }
                Cell::Value(value) => {
                    point.value_found = true;
                    return Some(value);
                }
                Cell::Empty => panic!("occupied slot {} holds no cell", index.bit_index),
            }
        }
    }
}

/// Borrowing iterator over the entries of a trie in ascending key order.
#[derive(Debug)]
pub struct Iter<'a, K, V> {
    root: Option<&'a Arc<Node<K, V>>>,
    path: Option<Path<'a, K, V>>,
    remaining: usize,
}

impl<'a, K: Key, V> Iter<'a, K, V> {
    pub(crate) fn new(root: Option<&'a Arc<Node<K, V>>>) -> Self {
        Self {
            root,
            path: None,
            remaining: root.map_or(0, |root| root.len()),
        }
    }
}

impl<'a, K: Key, V> Iterator for Iter<'a, K, V> {
    type Item = (K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let value = match &mut self.path {
            Some(path) => path.next(),
            None => {
                let (value, path) = Path::first(self.root?);
                self.path = Some(path);
                value
            }
        }?;

        self.remaining -= 1;

        Some((self.path.as_ref()?.key(), value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: Key, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K: Key, V> FusedIterator for Iter<'_, K, V> {}

/// Owning iterator over the entries of a trie in ascending key order,
/// yielding clones of shared values.
#[derive(Debug)]
pub struct IntoIter<K, V> {
    stack: Vec<(Arc<Node<K, V>>, CellIndex)>,
    remaining: usize,
}

impl<K: Key, V> IntoIter<K, V> {
    pub(crate) fn new(root: Option<Arc<Node<K, V>>>) -> Self {
        let remaining = root.as_ref().map_or(0, |root| root.len());

        Self {
            stack: root
                .map(|root| {
                    let index = root.first_cell();
                    (root, index)
                })
                .into_iter()
                .collect(),
            remaining,
        }
    }
}

impl<K: Key, V: Clone> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let (node, index) = self.stack.pop()?;

        if !index.is_found {
            return self.next();
        }

        let next = node.next_cell(index);
        self.stack.push((node.clone(), next));

        match node.cell(index) {
            Cell::Node(child) => {
                self.stack.push((child.clone(), child.first_cell()));
                self.next()
            }
            Cell::Value(value) => {
                self.remaining -= 1;
                Some((node.key_at(index.bit_index), value.clone()))
            }
            Cell::Empty => panic!("occupied slot {} holds no cell", index.bit_index),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: Key, V: Clone> ExactSizeIterator for IntoIter<K, V> {}

impl<K: Key, V: Clone> FusedIterator for IntoIter<K, V> {}

/// Detached position in a [`Thamt`].
///
/// A cursor does not borrow the trie between steps, so the trie may be edited
/// while the cursor is alive. Advancing the cursor after such an edit fails
/// with [`Error::ModifiedDuringIteration`] and keeps failing until the cursor
/// is dropped.
#[derive(Clone, Debug)]
pub struct Cursor<K> {
    version: u64,
    last: Option<K>,
    done: bool,
}

impl<K: Key> Cursor<K> {
    pub(crate) fn new(version: u64) -> Self {
        Self {
            version,
            last: None,
            done: false,
        }
    }

    /// Version of the trie the cursor walks.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the entry after the last one returned, or `None` at the end.
    pub fn next<'t, V>(&mut self, trie: &'t Thamt<K, V>) -> Result<Option<(K, &'t V)>> {
        if trie.version() != self.version {
            return Err(Error::ModifiedDuringIteration {
                cursor: self.version,
                trie: trie.version(),
            });
        }

        let Some(root) = trie.root().filter(|_| !self.done) else {
            return Ok(None);
        };
        let (value, path) = match self.last {
            Some(last) => {
                let (_, mut path) = find(root, last);
                let value = path.next();
                (value, path)
            }
            None => Path::first(root),
        };

        Ok(match value {
            Some(value) => {
                let key = path.key();
                self.last = Some(key);
                Some((key, value))
            }
            None => {
                self.done = true;
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistent;
    use rand::random;
    use std::collections::BTreeSet;

    const ITERATION_COUNT: usize = 1 << 12;

    fn tree(keys: &[u64]) -> Option<Arc<Node<u64, u64>>> {
        let mut root = None;

        for &key in keys {
            root = Some(persistent::assoc(root.as_ref(), key, !key));
        }

        root
    }

    #[test]
    fn first() {
        let root = tree(&[1 << 40, 7, 1 << 20]).expect("not empty");
        let (value, path) = Path::first(&root);

        assert_eq!(value, Some(&!7));
        assert_eq!(path.key(), 7);
        assert!(path.value_found());
        assert_eq!(path.max_depth(), u64::TWIG_DEPTH);
    }

    #[test]
    fn next() {
        let root = tree(&[1 << 40, 7, 8, 1 << 20]).expect("not empty");
        let (_, mut path) = Path::first(&root);
        let mut keys = vec![path.key()];

        while path.next().is_some() {
            keys.push(path.key());
        }

        assert_eq!(keys, vec![7, 8, 1 << 20, 1 << 40]);
        assert!(!path.value_found());
        assert_eq!(path.next(), None);
    }

    #[test]
    fn next_from_found_key() {
        let root = tree(&[3, 1 << 30, 1 << 50]).expect("not empty");
        let (_, mut path) = find(&root, 1 << 30);

        assert_eq!(path.next(), Some(&!(1 << 50)));
        assert_eq!(path.key(), 1 << 50);
    }

    #[test]
    fn iterate_empty() {
        assert_eq!(Iter::<u64, u64>::new(None).next(), None);
        assert_eq!(IntoIter::<u64, u64>::new(None).next(), None);
    }

    #[test]
    fn iterate_in_order() {
        let keys = (0..ITERATION_COUNT).map(|_| random()).collect::<Vec<u64>>();
        let root = tree(&keys);
        let sorted = keys.iter().copied().collect::<BTreeSet<_>>();

        assert_eq!(
            Iter::new(root.as_ref()).map(|(key, _)| key).collect::<Vec<_>>(),
            sorted.iter().copied().collect::<Vec<_>>()
        );
        assert_eq!(
            IntoIter::new(root).collect::<Vec<_>>(),
            sorted.into_iter().map(|key| (key, !key)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn iterate_dense_keys() {
        let keys = (0..1000).collect::<Vec<u64>>();
        let root = tree(&keys);

        assert!(Iter::new(root.as_ref())
            .map(|(key, _)| key)
            .eq(keys.iter().copied()));
    }

    #[test]
    fn size_hint() {
        let root = tree(&[1, 2, 3]);
        let mut iterator = Iter::new(root.as_ref());

        assert_eq!(iterator.len(), 3);
        iterator.next();
        assert_eq!(iterator.len(), 2);

        let mut iterator = IntoIter::new(root);

        iterator.next();
        iterator.next();
        assert_eq!(iterator.size_hint(), (1, Some(1)));
    }

    #[test]
    fn fused() {
        let root = tree(&[1]);
        let mut iterator = Iter::new(root.as_ref());

        assert_eq!(iterator.next(), Some((1, &!1)));
        assert_eq!(iterator.next(), None);
        assert_eq!(iterator.next(), None);
    }
}
