//! chained-hashmap: a separately chained hash map with slot reuse,
//! pluggable key comparers, fail-fast cursors and hash-flood mitigation.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: an open-chained dictionary whose entries live in one slot array,
//!   with each bucket pointing at the head of its collision chain.
//! - Layers:
//!   - SlotStore<K, V>: bucket heads, the slot array and the free list.
//!     Knows nothing about comparers; all indexing uses stored hashes.
//!   - Table<K, V, C>: probing, insert/remove, growth, version tracking
//!     and the switch to a randomized comparer on long chains.
//!   - ChainedHashMap<K, V, C>: public API. Adds the debug reentrancy guard,
//!     slot `Handle`s, borrowing iterators and detached `Cursor`s.
//!
//! Constraints
//! - Not synchronized: `Send` when `K`, `V` and `C` are, never `Sync`.
//! - Table sizes are primes; the first allocation uses the smallest one.
//!   Growth picks the next prime at least twice the slot count.
//! - Hashes are masked to 31 bits; bucket = `hash % table_size`.
//! - Removed slots are reused (LIFO) before the slot array grows.
//! - Duplicate policy is per call: `insert` overwrites, `try_insert` fails
//!   with `TableError::DuplicateKey` and leaves the map untouched.
//! - Null keys (as reported by `KeyComparer::is_null`) are rejected on
//!   insert and treated as absent on lookup, without being hashed.
//!
//! Reentrancy policy
//! - The comparer is user code called while a chain is being walked.
//!   Every public method that may call it enters a debug-only guard first;
//!   a comparer that reaches back into the same map panics in debug builds.
//! - Growth and rehash never call `equals`; growth does not call `hash`
//!   either, since each slot stores its hash. Randomized rehash computes
//!   every new hash before touching the table, so a panicking comparer
//!   leaves the map unchanged.
//! - `remove_entry` hands back `(K, V)` after the table is consistent;
//!   their `Drop` may use the map.
//!
//! Enumeration
//! - `iter`, `keys`, `values` and friends borrow the map, so it cannot be
//!   mutated underneath them.
//! - `Cursor`s hold only a version stamp and a position. They take the map
//!   on every step and fail with `TableError::ConcurrentModification` once
//!   the map has changed since the cursor was made.
//!
//! Hash flooding
//! - When an insert walks more than `HASH_COLLISION_THRESHOLD` entries of
//!   one chain and the comparer offers a randomized replacement, the map
//!   rehashes every entry with it. This happens at most once per map for
//!   `DefaultComparer`.
//!
//! Notes and non-goals
//! - Handles are plain slot indices, not generational.
//! - No serialization, no concurrent variant.

mod chained_hash_map;
#[cfg(test)]
mod chained_hash_map_proptest;
pub mod comparer;
mod error;
mod hash_policy;
mod reentrancy;
mod slot_store;
mod table;
pub mod views;

// Public surface
#[cfg(any(test, feature = "stats"))]
pub use chained_hash_map::TableStats;
pub use chained_hash_map::{ChainedHashMap, Handle};
pub use comparer::{DefaultComparer, FnComparer, KeyComparer, NullableComparer};
pub use error::TableError;
pub use views::{Cursor, CursorState, EntryView, KeyView, ValueView, View};
