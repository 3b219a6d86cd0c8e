use crate::{
    error::{Error, Result},
    iter::{IntoIter, Iter},
    key::Key,
    node::Node,
    path::{find, lookup, Path},
    persistent,
    thamt::Thamt,
};
use std::{fmt, sync::Arc};

/// Persistent hash array mapped trie keyed by fixed-width unsigned integers.
///
/// Note that every method does not modify the original trie but creates a
/// new one sharing every untouched node with it.
#[derive(Clone)]
pub struct Phamt<K, V> {
    root: Option<Arc<Node<K, V>>>,
}

impl<K: Key, V> Phamt<K, V> {
    /// Creates an empty trie.
    pub fn new() -> Self {
        Self { root: None }
    }

    pub(crate) fn from_root(root: Option<Arc<Node<K, V>>>) -> Self {
        debug_assert!(root.as_ref().map_or(true, |root| !root.is_transient()));

        Self { root }
    }

    #[cfg(test)]
    pub(crate) fn root(&self) -> Option<&Arc<Node<K, V>>> {
        self.root.as_ref()
    }

    pub(crate) fn into_root(self) -> Option<Arc<Node<K, V>>> {
        self.root
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
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.root.as_ref())
    }

    /// Checks if two tries share the same root node.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (Some(one), Some(other)) => Arc::ptr_eq(one, other),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<K: Key, V: Clone> Phamt<K, V> {
    /// Removes a key if any.
    #[must_use]
    pub fn dissoc(&self, key: K) -> Self {
        match &self.root {
            Some(root) => Self::from_root(persistent::dissoc(root, key)),
            None => Self::new(),
        }
    }

    /// Maps a key to the value `f` computes from its current value, or removes
    /// the key if `f` returns `None`.
    #[must_use]
    pub fn update(&self, key: K, f: impl FnOnce(Option<&V>) -> Option<V>) -> Self {
        let Some(root) = &self.root else {
            return match f(None) {
                Some(value) => Self::from_root(Some(Node::from_kv(key, value).into())),
                None => Self::new(),
            };
        };
        let (found, path) = find(root, key);

        match f(found) {
            Some(value) => Self::from_root(Some(persistent::assoc_path(&path, key, value))),
            None => Self::from_root(persistent::dissoc_path(&path)),
        }
    }

    /// Starts a transient session over a trie in constant time.
    pub fn transient(&self) -> Thamt<K, V> {
        Thamt::from(self.clone())
    }
}

impl<K: Key, V: Clone + PartialEq> Phamt<K, V> {
    /// Maps a key to a value.
    ///
    /// A trie already mapping the key to an equal value is returned as is.
    #[must_use]
    pub fn assoc(&self, key: K, value: V) -> Self {
        Self::from_root(Some(persistent::assoc(self.root.as_ref(), key, value)))
    }

    /// Extends a trie with an iterator of entries.
    #[must_use]
    pub fn extend(&self, iterator: impl IntoIterator<Item = (K, V)>) -> Self {
        let mut trie = self.transient();

        trie.extend(iterator);
        trie.persist()
    }

    /// Creates a trie mapping consecutive keys from `start` to values in order.
    pub fn from_values(values: impl IntoIterator<Item = V>, start: K) -> Result<Self> {
        let mut trie = Thamt::new();
        let mut next = Some(start);

        for (count, value) in values.into_iter().enumerate() {
            let key = next.ok_or(Error::KeyOverflow { count })?;

            trie.assoc(key, value);
            next = key.checked_increment();
        }

        Ok(trie.persist())
    }
}

impl<K: Key, V> Default for Phamt<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key, V: PartialEq> PartialEq for Phamt<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || (self.len() == other.len() && self.iter().eq(other.iter()))
    }
}

impl<K: Key, V: Eq> Eq for Phamt<K, V> {}

impl<K: Key, V: fmt::Debug> fmt::Debug for Phamt<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Key, V: Clone + PartialEq> FromIterator<(K, V)> for Phamt<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iterator: I) -> Self {
        iterator.into_iter().collect::<Thamt<K, V>>().persist()
    }
}

impl<K: Key, V: Clone> From<Thamt<K, V>> for Phamt<K, V> {
    fn from(trie: Thamt<K, V>) -> Self {
        trie.persist()
    }
}

impl<'a, K: Key, V> IntoIterator for &'a Phamt<K, V> {
    type IntoIter = Iter<'a, K, V>;
    type Item = (K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Key, V: Clone> IntoIterator for Phamt<K, V> {
    type IntoIter = IntoIter<K, V>;
    type Item = (K, V);

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self.root)
    }
}
