use crate::{
    iter::{Cursor, Iter},
    key::Key,
    node::Node,
    path::{find, lookup, Path},
    phamt::Phamt,
    transient::{self, Removal},
};
use std::{fmt, sync::Arc};

/// Transient hash array mapped trie edited in place.
///
/// A transient trie copies a node of the persistent trie it starts from the
/// first time an edit reaches it, and edits its own copies in place from then
/// on. Every edit bumps a version that [`Cursor`]s check on each step.
pub struct Thamt<K, V> {
    root: Option<Arc<Node<K, V>>>,
    version: u64,
}

impl<K: Key, V> Thamt<K, V> {
    /// Creates an empty trie.
    pub fn new() -> Self {
        Self {
            root: None,
            version: 0,
        }
    }

    pub(crate) fn root(&self) -> Option<&Arc<Node<K, V>>> {
        self.root.as_ref()
    }

    /// Returns the value of a key if any.
    pub fn get(&self, key: K) -> Option<&V> {
        lookup(self.root.as_ref()?, key)
    }

    /// Checks if a key is contained in a trie.
    pub fn contains_key(&self, key: K) -> bool {
        self.get(key).is_some()
    }

    /// Returns a number of entries.
    pub fn len(&self) -> usize {
        self.root.as_ref().map_or(0, |root| root.len())
    }

    /// Returns true if a trie is empty.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the entry with the smallest key.
    pub fn first(&self) -> Option<(K, &V)> {
        let (value, path) = Path::first(self.root.as_ref()?);

        Some((path.key(), value?))
    }

    /// Returns entries in ascending key order.
    ///
    /// The borrow keeps the trie from being edited during iteration; use
    /// [`Thamt::cursor`] to interleave iteration with edits.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.root.as_ref())
    }

    /// Returns the number of edits made so far.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Creates a cursor positioned before the smallest key.
    pub fn cursor(&self) -> Cursor<K> {
        Cursor::new(self.version)
    }
}

impl<K: Key, V: Clone> Thamt<K, V> {
    /// Removes a key, returning its value if any.
    pub fn dissoc(&mut self, key: K) -> Option<V> {
        let value = transient::dissoc(&mut self.root, key)?;

        self.version += 1;

        Some(value)
    }

    /// Maps a key to the value `f` computes from its current value, or removes
    /// the key if `f` returns `None`. Returns the previous value if any.
    pub fn update(&mut self, key: K, f: impl FnOnce(Option<&V>) -> Option<V>) -> Option<V> {
        let Some(root) = &self.root else {
            let value = f(None)?;

            self.version += 1;
            self.root = Some(Node::transient_from_kv(key, value).into());
            return None;
        };
        let (found, path) = find(root, key);

        match f(found) {
            Some(value) => {
                let point = path.point();

                self.version += 1;
                transient::assoc_at(&mut self.root, point, key, value)
            }
            None => {
                let removal = Removal::plan(&path)?;

                self.version += 1;
                transient::dissoc_at(&mut self.root, removal, key)
            }
        }
    }

    /// Freezes a trie into a persistent one without copying any node.
    pub fn persist(mut self) -> Phamt<K, V> {
        if let Some(root) = &mut self.root {
            transient::persist(root);
        }

        Phamt::from_root(self.root)
    }
}

impl<K: Key, V: Clone + PartialEq> Thamt<K, V> {
    /// Maps a key to a value, returning the previous value if any.
    pub fn assoc(&mut self, key: K, value: V) -> Option<V> {
        self.version += 1;

        transient::assoc(&mut self.root, key, value)
    }
}

impl<K: Key, V> Default for Thamt<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key, V: fmt::Debug> fmt::Debug for Thamt<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Key, V> From<Phamt<K, V>> for Thamt<K, V> {
    fn from(trie: Phamt<K, V>) -> Self {
        Self {
            root: trie.into_root(),
            version: 0,
        }
    }
}

impl<K: Key, V: Clone + PartialEq> Extend<(K, V)> for Thamt<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iterator: I) {
        for (key, value) in iterator {
            self.assoc(key, value);
        }
    }
}

impl<K: Key, V: Clone + PartialEq> FromIterator<(K, V)> for Thamt<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iterator: I) -> Self {
        let mut trie = Self::new();

        trie.extend(iterator);

        trie
    }
}

impl<'a, K: Key, V> IntoIterator for &'a Thamt<K, V> {
    type IntoIter = Iter<'a, K, V>;
    type Item = (K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
