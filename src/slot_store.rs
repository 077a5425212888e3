//! SlotStore: bucket heads, the entry array, and the free list threaded
//! through vacant entries.
//!
//! The store knows nothing about comparers; callers hand it masked hashes
//! and walk chains through `link`. `len()` is `high_water() - free_count()`.

use crate::hash_policy::bucket_of;
use core::mem;

#[derive(Clone, Debug)]
pub(crate) enum Slot<K, V> {
    Occupied {
        hash: u32,
        next: Option<usize>,
        key: K,
        value: V,
    },
    Vacant {
        next_free: Option<usize>,
    },
}

impl<K, V> Slot<K, V> {
    #[inline]
    pub(crate) fn is_occupied(&self) -> bool {
        matches!(self, Slot::Occupied { .. })
    }

    #[inline]
    pub(crate) fn key_value(&self) -> Option<(&K, &V)> {
        match self {
            Slot::Occupied { key, value, .. } => Some((key, value)),
            Slot::Vacant { .. } => None,
        }
    }

    #[inline]
    pub(crate) fn key_value_mut(&mut self) -> Option<(&K, &mut V)> {
        match self {
            Slot::Occupied { key, value, .. } => Some((key, value)),
            Slot::Vacant { .. } => None,
        }
    }

    #[inline]
    pub(crate) fn into_key_value(self) -> Option<(K, V)> {
        match self {
            Slot::Occupied { key, value, .. } => Some((key, value)),
            Slot::Vacant { .. } => None,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct SlotStore<K, V> {
    buckets: Vec<Option<usize>>,
    entries: Vec<Slot<K, V>>, // len() is the high-water mark
    free_list: Option<usize>,
    free_count: usize,
}

impl<K, V> SlotStore<K, V> {
    /// Unallocated store; the first `allocate` sizes it.
    pub(crate) const fn new() -> Self {
        Self {
            buckets: Vec::new(),
            entries: Vec::new(),
            free_list: None,
            free_count: 0,
        }
    }

    pub(crate) fn allocate(&mut self, table_size: usize) {
        debug_assert!(!self.is_allocated());
        debug_assert!(table_size > 0);
        self.buckets = vec![None; table_size];
        self.entries = Vec::with_capacity(table_size);
        self.free_list = None;
        self.free_count = 0;
    }

    #[inline]
    pub(crate) fn is_allocated(&self) -> bool {
        !self.buckets.is_empty()
    }

    #[inline]
    pub(crate) fn table_size(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub(crate) fn high_water(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub(crate) fn free_count(&self) -> usize {
        self.free_count
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len() - self.free_count
    }

    #[inline]
    pub(crate) fn head(&self, bucket: usize) -> Option<usize> {
        self.buckets[bucket]
    }

    #[inline]
    pub(crate) fn set_head(&mut self, bucket: usize, index: Option<usize>) {
        self.buckets[bucket] = index;
    }

    /// Chain view of an occupied slot: `(hash, next, key)`.
    #[inline]
    pub(crate) fn link(&self, index: usize) -> (u32, Option<usize>, &K) {
        match &self.entries[index] {
            Slot::Occupied { hash, next, key, .. } => (*hash, *next, key),
            Slot::Vacant { .. } => unreachable!("chain reaches vacant slot {}", index),
        }
    }

    #[inline]
    pub(crate) fn set_next(&mut self, index: usize, to: Option<usize>) {
        match &mut self.entries[index] {
            Slot::Occupied { next, .. } => *next = to,
            Slot::Vacant { .. } => unreachable!("relinking vacant slot {}", index),
        }
    }

    #[inline]
    pub(crate) fn slot(&self, index: usize) -> Option<&Slot<K, V>> {
        self.entries.get(index)
    }

    #[inline]
    pub(crate) fn slot_mut(&mut self, index: usize) -> Option<&mut Slot<K, V>> {
        self.entries.get_mut(index)
    }

    #[inline]
    pub(crate) fn entries(&self) -> &[Slot<K, V>] {
        &self.entries
    }

    #[inline]
    pub(crate) fn entries_mut(&mut self) -> &mut [Slot<K, V>] {
        &mut self.entries
    }

    pub(crate) fn into_entries(self) -> Vec<Slot<K, V>> {
        self.entries
    }

    /// Take a slot and link it as the head of `bucket`.
    ///
    /// Reuses the free-list head when there is one, otherwise the next
    /// never-used slot. When every slot is in use the key and value are
    /// handed back so the caller can grow and retry.
    pub(crate) fn try_occupy(
        &mut self,
        bucket: usize,
        hash: u32,
        key: K,
        value: V,
    ) -> Result<usize, (K, V)> {
        let next = self.buckets[bucket];
        let occupied = |key, value| Slot::Occupied {
            hash,
            next,
            key,
            value,
        };
        let index = if let Some(index) = self.free_list {
            let next_free = match &self.entries[index] {
                Slot::Vacant { next_free } => *next_free,
                Slot::Occupied { .. } => unreachable!("free list reaches occupied slot {}", index),
            };
            self.free_list = next_free;
            self.free_count -= 1;
            self.entries[index] = occupied(key, value);
            index
        } else if self.entries.len() < self.buckets.len() {
            self.entries.push(occupied(key, value));
            self.entries.len() - 1
        } else {
            return Err((key, value));
        };
        self.buckets[bucket] = Some(index);
        Ok(index)
    }

    /// Vacate an occupied slot that the caller has already unlinked from its
    /// chain, returning its key and value.
    pub(crate) fn release(&mut self, index: usize) -> (K, V) {
        debug_assert!(self.entries[index].is_occupied());
        let vacant = Slot::Vacant {
            next_free: self.free_list,
        };
        let (key, value) = mem::replace(&mut self.entries[index], vacant)
            .into_key_value()
            .expect("released slot must be occupied");
        self.free_list = Some(index);
        self.free_count += 1;
        (key, value)
    }

    /// Re-bucket every occupied slot into a table of `table_size` buckets.
    ///
    /// Slots keep their indices and vacant slots keep their free-list links.
    /// With `hashes`, occupied slot `i` takes `hashes[i]` as its new hash.
    pub(crate) fn rebuild(&mut self, table_size: usize, hashes: Option<&[u32]>) {
        debug_assert!(table_size >= self.entries.len());
        let mut buckets = vec![None; table_size];
        self.entries
            .reserve_exact(table_size.saturating_sub(self.entries.len()));
        for (index, slot) in self.entries.iter_mut().enumerate() {
            if let Slot::Occupied { hash, next, .. } = slot {
                if let Some(hashes) = hashes {
                    *hash = hashes[index];
                }
                let bucket = bucket_of(*hash, table_size);
                *next = buckets[bucket];
                buckets[bucket] = Some(index);
            }
        }
        self.buckets = buckets;
    }

    /// Drop vacant slots, renumbering occupied ones densely, and rebuild into
    /// `table_size` buckets.
    pub(crate) fn compact(&mut self, table_size: usize) {
        debug_assert!(table_size >= self.len());
        let old = mem::replace(&mut self.entries, Vec::with_capacity(table_size));
        self.entries.extend(old.into_iter().filter(Slot::is_occupied));
        self.free_list = None;
        self.free_count = 0;
        self.rebuild(table_size, None);
    }

    /// Drop every entry, keeping the allocated bucket and entry storage.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.buckets.fill(None);
        self.free_list = None;
        self.free_count = 0;
    }

    pub(crate) fn chain_len(&self, bucket: usize) -> usize {
        let mut n = 0;
        let mut cursor = self.buckets[bucket];
        while let Some(i) = cursor {
            n += 1;
            cursor = self.link(i).1;
        }
        n
    }

    pub(crate) fn longest_chain(&self) -> usize {
        (0..self.buckets.len())
            .map(|b| self.chain_len(b))
            .max()
            .unwrap_or(0)
    }
}
