//! Table: chain walking, insertion, removal, growth and rehashing over a
//! `SlotStore`, driven by a `KeyComparer`.
//!
//! Every mutation is committed only after the comparer has been consulted for
//! the whole chain, so a panicking comparer leaves the table as it was.

use crate::comparer::KeyComparer;
use crate::error::TableError;
use crate::hash_policy::{self, bucket_of, HASH_COLLISION_THRESHOLD};
use crate::slot_store::{Slot, SlotStore};
use core::borrow::Borrow;
use core::mem;
use core::sync::atomic::{AtomicU64, Ordering};
use log::{debug, warn};

/// What an insert does when the key is already present.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum OnDuplicate {
    Overwrite,
    Fail,
}

/// Successful insert: the slot holding the key, and the replaced value when
/// an existing entry was overwritten.
pub(crate) struct Inserted<V> {
    pub index: usize,
    pub previous: Option<V>,
}

static NEXT_TABLE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique table identity. A clone is a different table and gets a
/// fresh id.
#[derive(Debug)]
pub(crate) struct TableId(u64);

impl TableId {
    fn next() -> Self {
        TableId(NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn get(&self) -> u64 {
        self.0
    }
}

impl Clone for TableId {
    fn clone(&self) -> Self {
        Self::next()
    }
}

#[derive(Clone)]
pub(crate) struct Table<K, V, C> {
    store: SlotStore<K, V>,
    comparer: C,
    version: u64,
    id: TableId,
}

impl<K, V, C> Table<K, V, C> {
    pub(crate) fn new(comparer: C) -> Self {
        Self {
            store: SlotStore::new(),
            comparer,
            version: 0,
            id: TableId::next(),
        }
    }

    #[inline]
    pub(crate) fn id(&self) -> u64 {
        self.id.get()
    }

    #[inline]
    pub(crate) fn store(&self) -> &SlotStore<K, V> {
        &self.store
    }

    #[inline]
    pub(crate) fn store_mut(&mut self) -> &mut SlotStore<K, V> {
        &mut self.store
    }

    pub(crate) fn into_store(self) -> SlotStore<K, V> {
        self.store
    }

    #[inline]
    pub(crate) fn comparer(&self) -> &C {
        &self.comparer
    }

    #[inline]
    pub(crate) fn version(&self) -> u64 {
        self.version
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.store.len()
    }

    #[inline]
    fn bump_version(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    /// Drop every entry without shrinking storage. Any table that ever held
    /// an entry counts as modified, even if it is empty now.
    pub(crate) fn clear(&mut self) {
        if self.store.high_water() > 0 {
            self.store.clear();
            self.bump_version();
        }
    }

    fn hash_of<Q>(&self, key: &Q) -> u32
    where
        Q: ?Sized,
        C: KeyComparer<Q>,
    {
        hash_policy::mask(self.comparer.hash(key))
    }

    /// Slot index holding `key`. A null key is reported as absent.
    pub(crate) fn find<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: KeyComparer<Q>,
    {
        if !self.store.is_allocated() || self.comparer.is_null(key) {
            return None;
        }
        let hash = self.hash_of(key);
        let mut cursor = self.store.head(bucket_of(hash, self.store.table_size()));
        while let Some(i) = cursor {
            let (h, next, k) = self.store.link(i);
            if h == hash && self.comparer.equals(k.borrow(), key) {
                return Some(i);
            }
            cursor = next;
        }
        None
    }

    /// Unlink and vacate the slot holding `key`.
    pub(crate) fn remove<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: KeyComparer<Q>,
    {
        if !self.store.is_allocated() || self.comparer.is_null(key) {
            return None;
        }
        let hash = self.hash_of(key);
        let bucket = bucket_of(hash, self.store.table_size());
        let mut prev = None;
        let mut cursor = self.store.head(bucket);
        while let Some(i) = cursor {
            let (h, next, k) = self.store.link(i);
            if h == hash && self.comparer.equals(k.borrow(), key) {
                match prev {
                    None => self.store.set_head(bucket, next),
                    Some(p) => self.store.set_next(p, next),
                }
                let removed = self.store.release(i);
                self.bump_version();
                return Some(removed);
            }
            prev = Some(i);
            cursor = next;
        }
        None
    }
}

impl<K, V, C> Table<K, V, C>
where
    C: KeyComparer<K>,
{
    pub(crate) fn insert(
        &mut self,
        key: K,
        value: V,
        on_duplicate: OnDuplicate,
    ) -> Result<Inserted<V>, TableError> {
        if self.comparer.is_null(&key) {
            return Err(TableError::NullKey);
        }
        if !self.store.is_allocated() {
            self.store.allocate(hash_policy::get_prime(0));
        }

        let hash = self.hash_of(&key);
        let mut bucket = bucket_of(hash, self.store.table_size());
        let mut collisions = 0usize;
        let mut cursor = self.store.head(bucket);
        while let Some(i) = cursor {
            let (h, next, k) = self.store.link(i);
            if h == hash && self.comparer.equals(k, &key) {
                return match on_duplicate {
                    OnDuplicate::Fail => Err(TableError::DuplicateKey),
                    OnDuplicate::Overwrite => {
                        let (_, slot_value) = self
                            .store
                            .slot_mut(i)
                            .and_then(Slot::key_value_mut)
                            .expect("chain reaches only occupied slots");
                        let previous = mem::replace(slot_value, value);
                        self.bump_version();
                        Ok(Inserted {
                            index: i,
                            previous: Some(previous),
                        })
                    }
                };
            }
            collisions += 1;
            cursor = next;
        }

        let index = match self.store.try_occupy(bucket, hash, key, value) {
            Ok(index) => index,
            Err((key, value)) => {
                self.grow();
                bucket = bucket_of(hash, self.store.table_size());
                match self.store.try_occupy(bucket, hash, key, value) {
                    Ok(index) => index,
                    Err(_) => unreachable!("grown table has a free slot"),
                }
            }
        };
        self.bump_version();

        if collisions > HASH_COLLISION_THRESHOLD {
            if let Some(randomized) = self.comparer.randomized() {
                warn!(
                    "chain of {} colliding keys detected; switching to a randomized comparer",
                    collisions
                );
                self.rehash_with(randomized);
            }
        }

        Ok(Inserted {
            index,
            previous: None,
        })
    }

    fn grow(&mut self) {
        let old_size = self.store.table_size();
        let new_size = hash_policy::expand_prime(self.store.high_water());
        debug!("growing table from {} to {} buckets", old_size, new_size);
        self.resize(new_size);
    }

    /// Re-bucket into `new_size` buckets, keeping every slot index.
    pub(crate) fn resize(&mut self, new_size: usize) {
        debug_assert!(new_size >= self.store.high_water());
        self.store.rebuild(new_size, None);
        self.bump_version();
    }

    /// Install `comparer` and recompute every stored hash under it.
    ///
    /// All hashes are computed before anything is changed, so the comparer
    /// swap and the rehash land together or not at all.
    pub(crate) fn rehash_with(&mut self, comparer: C) {
        let hashes: Vec<u32> = self
            .store
            .entries()
            .iter()
            .map(|slot| match slot {
                Slot::Occupied { key, .. } => hash_policy::mask(comparer.hash(key)),
                Slot::Vacant { .. } => 0,
            })
            .collect();
        self.comparer = comparer;
        let size = self.store.table_size();
        self.store.rebuild(size, Some(&hashes));
        self.bump_version();
    }

    /// Grow so that at least `capacity` entries fit without another resize.
    pub(crate) fn ensure_capacity(&mut self, capacity: usize) -> usize {
        if self.store.table_size() >= capacity && self.store.is_allocated() {
            return self.store.table_size();
        }
        let new_size = hash_policy::get_prime(capacity);
        if self.store.is_allocated() {
            debug!(
                "reserving capacity: {} to {} buckets",
                self.store.table_size(),
                new_size
            );
            self.resize(new_size);
        } else {
            self.store.allocate(new_size);
            self.bump_version();
        }
        new_size
    }

    /// Compact to the smallest prime table that holds the live entries.
    pub(crate) fn shrink_to_fit(&mut self) {
        if !self.store.is_allocated() {
            return;
        }
        let new_size = hash_policy::get_prime(self.store.len());
        if new_size >= self.store.table_size() && self.store.free_count() == 0 {
            return;
        }
        let new_size = new_size.min(self.store.table_size());
        debug!(
            "compacting {} live entries from {} to {} buckets",
            self.store.len(),
            self.store.table_size(),
            new_size
        );
        self.store.compact(new_size);
        self.bump_version();
    }
}
