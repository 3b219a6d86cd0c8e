//! Persistent hash array mapped tries keyed by fixed-width unsigned integers.
//!
//! Hash Array Mapped Trie (HAMT) is a data structure popular as a map (a.k.a.
//! associative array or dictionary). Its persistent variant never modifies a
//! trie in place; an edit creates a new trie sharing every untouched sub-tree
//! with the old one.
//!
//! [`Phamt`] is the persistent trie. [`Thamt`] is its transient companion,
//! which edits nodes it owns in place and freezes back into a [`Phamt`] in a
//! single pass. Keys are integers of any width implementing [`Key`]; callers
//! hash other key types themselves.

mod bitmap;
mod error;
mod iter;
mod key;
mod node;
mod path;
mod persistent;
mod phamt;
#[cfg(test)]
mod proptests;
mod thamt;
mod transient;

pub use error::{Error, Result};
pub use iter::{Cursor, IntoIter, Iter};
pub use key::{depth_mask, high_mask, highest_differing_bit, low_mask, Key};
pub use phamt::Phamt;
pub use thamt::Thamt;
