use thiserror::Error;

/// Errors reported by [`ChainedHashMap`](crate::ChainedHashMap) operations
/// and its cursors.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableError {
    #[error("key must not be null")]
    NullKey,
    #[error("an entry with the same key already exists")]
    DuplicateKey,
    #[error("map was modified; enumeration cannot continue")]
    ConcurrentModification,
    #[error("the given key was not present in the map")]
    KeyNotFound,
}
