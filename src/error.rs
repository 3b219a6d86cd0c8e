use thiserror::Error;

/// Usage errors reported by the trie wrappers.
///
/// A missing key is never an error; lookups and removals report it through
/// `Option` instead.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    /// A cursor was advanced after the trie it walks was edited.
    #[error("trie modified during iteration: cursor expects version {cursor}, trie is at {trie}")]
    ModifiedDuringIteration {
        /// Version the cursor was created at
        cursor: u64,
        /// Current version of the trie
        trie: u64,
    },

    /// Consecutive keys ran past the largest key.
    #[error("key space exhausted after {count} values")]
    KeyOverflow {
        /// Number of values stored before the keys ran out
        count: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(
            Error::ModifiedDuringIteration { cursor: 1, trie: 3 }.to_string(),
            "trie modified during iteration: cursor expects version 1, trie is at 3"
        );
        assert_eq!(
            Error::KeyOverflow { count: 2 }.to_string(),
            "key space exhausted after 2 values"
        );
    }
}
