//! ChainedHashMap: public surface over `Table` with slot handles, views and
//! a debug reentrancy guard.

use crate::comparer::{DefaultComparer, KeyComparer};
use crate::error::TableError;
use crate::reentrancy::DebugReentrancy;
use crate::slot_store::Slot;
use crate::table::{OnDuplicate, Table};
use crate::views::{
    Cursor, EntryView, IntoIter, Iter, IterMut, KeyView, Keys, ValueView, Values, ValuesMut,
};
use core::borrow::Borrow;
use core::fmt;
use core::hash::Hash;
use core::ops::Index;

/// Index of the slot holding an entry.
///
/// A handle stays valid while its entry is live, across growth and hash
/// randomization. After the entry is removed its slot may be reused by a
/// later insert, and the handle then resolves to that entry. `shrink_to_fit`
/// renumbers slots and invalidates every handle.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Handle(usize);

impl Handle {
    pub(crate) fn new(index: usize) -> Self {
        Handle(index)
    }

    pub fn index(self) -> usize {
        self.0
    }

    pub fn key<'a, K, V, C>(&self, map: &'a ChainedHashMap<K, V, C>) -> Option<&'a K> {
        map.handle_key(*self)
    }

    pub fn value<'a, K, V, C>(&self, map: &'a ChainedHashMap<K, V, C>) -> Option<&'a V> {
        map.handle_value(*self)
    }

    pub fn value_mut<'a, K, V, C>(
        &self,
        map: &'a mut ChainedHashMap<K, V, C>,
    ) -> Option<&'a mut V> {
        map.handle_value_mut(*self)
    }
}

/// A separately chained hash map.
///
/// Entries live in a slot array; each bucket holds the index of the first
/// slot of its collision chain. Removed slots go on a free list and are
/// reused before the array grows. Table sizes are primes.
///
/// The map is not synchronized. It is `Send` when its parts are, and never
/// `Sync`; share it between threads behind a lock.
#[derive(Clone)]
pub struct ChainedHashMap<K, V, C = DefaultComparer> {
    table: Table<K, V, C>,
    reentrancy: DebugReentrancy,
}

/// Slot and chain statistics, for tests and tuning.
#[cfg(any(test, feature = "stats"))]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TableStats {
    pub len: usize,
    /// Slots ever used, live or vacant.
    pub high_water: usize,
    pub free_count: usize,
    pub table_size: usize,
    pub longest_chain: usize,
}

impl<K, V> ChainedHashMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_comparer(DefaultComparer::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_comparer(capacity, DefaultComparer::new())
    }
}

impl<K, V, C: Default> Default for ChainedHashMap<K, V, C> {
    fn default() -> Self {
        Self::with_comparer(C::default())
    }
}

impl<K, V, C> ChainedHashMap<K, V, C> {
    pub fn with_comparer(comparer: C) -> Self {
        Self {
            table: Table::new(comparer),
            reentrancy: DebugReentrancy::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }

    /// Number of slots available before the next growth.
    pub fn capacity(&self) -> usize {
        self.table.store().table_size()
    }

    /// The active comparer. This changes once if hash-flood mitigation kicks
    /// in.
    pub fn comparer(&self) -> &C {
        self.table.comparer()
    }

    pub(crate) fn version(&self) -> u64 {
        self.table.version()
    }

    pub(crate) fn id(&self) -> u64 {
        self.table.id()
    }

    pub(crate) fn slots(&self) -> &[Slot<K, V>] {
        self.table.store().entries()
    }

    /// Remove every entry. Storage is kept; values are dropped in place.
    pub fn clear(&mut self) {
        let _g = self.reentrancy.enter();
        self.table.clear();
    }

    pub fn find<Q>(&self, key: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: KeyComparer<Q>,
    {
        let _g = self.reentrancy.enter();
        self.table.find(key).map(Handle::new)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: KeyComparer<Q>,
    {
        let _g = self.reentrancy.enter();
        self.table.find(key).is_some()
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: KeyComparer<Q>,
    {
        self.get_key_value(key).map(|(_, v)| v)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: KeyComparer<Q>,
    {
        let _g = self.reentrancy.enter();
        let index = self.table.find(key)?;
        self.table.store().slot(index).and_then(Slot::key_value)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: KeyComparer<Q>,
    {
        let _g = self.reentrancy.enter();
        let index = self.table.find(key)?;
        self.table
            .store_mut()
            .slot_mut(index)
            .and_then(Slot::key_value_mut)
            .map(|(_, v)| v)
    }

    /// Value for a key that must be present.
    ///
    /// Fails with `NullKey` for the null key and `KeyNotFound` when the key
    /// is absent. Use [`get`](Self::get) when absence is expected.
    pub fn lookup<Q>(&self, key: &Q) -> Result<&V, TableError>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: KeyComparer<Q>,
    {
        if self.table.comparer().is_null(key) {
            return Err(TableError::NullKey);
        }
        self.get(key).ok_or(TableError::KeyNotFound)
    }

    /// Remove `key`, returning whether it was present.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: KeyComparer<Q>,
    {
        self.remove_entry(key).is_some()
    }

    /// Remove `key`, returning the stored key and value.
    ///
    /// The pair is handed back after the map is consistent again, so their
    /// `Drop` may safely use the map.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: KeyComparer<Q>,
    {
        let _g = self.reentrancy.enter();
        self.table.remove(key)
    }

    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.values().any(|v| v == value)
    }

    pub(crate) fn handle_key(&self, h: Handle) -> Option<&K> {
        let _g = self.reentrancy.enter();
        self.table
            .store()
            .slot(h.index())
            .and_then(Slot::key_value)
            .map(|(k, _)| k)
    }

    pub(crate) fn handle_value(&self, h: Handle) -> Option<&V> {
        let _g = self.reentrancy.enter();
        self.table
            .store()
            .slot(h.index())
            .and_then(Slot::key_value)
            .map(|(_, v)| v)
    }

    pub(crate) fn handle_value_mut(&mut self, h: Handle) -> Option<&mut V> {
        let _g = self.reentrancy.enter();
        self.table
            .store_mut()
            .slot_mut(h.index())
            .and_then(Slot::key_value_mut)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.slots(), self.len())
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let len = self.len();
        IterMut::new(self.table.store_mut().entries_mut(), len)
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys::new(self.iter())
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values::new(self.iter())
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut::new(self.iter_mut())
    }

    /// Fail-fast cursor over `(&K, &V)`.
    pub fn entry_cursor(&self) -> Cursor<EntryView> {
        Cursor::new(self.id(), self.version())
    }

    /// Fail-fast cursor over keys.
    pub fn key_cursor(&self) -> Cursor<KeyView> {
        Cursor::new(self.id(), self.version())
    }

    /// Fail-fast cursor over values.
    pub fn value_cursor(&self) -> Cursor<ValueView> {
        Cursor::new(self.id(), self.version())
    }

    #[cfg(any(test, feature = "stats"))]
    pub fn stats(&self) -> TableStats {
        let store = self.table.store();
        TableStats {
            len: store.len(),
            high_water: store.high_water(),
            free_count: store.free_count(),
            table_size: store.table_size(),
            longest_chain: store.longest_chain(),
        }
    }
}

impl<K, V, C> ChainedHashMap<K, V, C>
where
    C: KeyComparer<K>,
{
    pub fn with_capacity_and_comparer(capacity: usize, comparer: C) -> Self {
        let mut map = Self::with_comparer(comparer);
        if capacity > 0 {
            map.table.ensure_capacity(capacity);
        }
        map
    }

    /// Insert or overwrite. Returns the replaced value, if any.
    ///
    /// ```
    /// use chained_hashmap::ChainedHashMap;
    ///
    /// let mut m = ChainedHashMap::new();
    /// assert_eq!(m.insert("a", 1), Ok(None));
    /// assert_eq!(m.insert("a", 3), Ok(Some(1)));
    /// assert_eq!(m.len(), 1);
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, TableError> {
        let _g = self.reentrancy.enter();
        self.table
            .insert(key, value, OnDuplicate::Overwrite)
            .map(|inserted| inserted.previous)
    }

    /// Insert a key that must not be present yet. On `DuplicateKey` the map
    /// is unchanged.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<Handle, TableError> {
        self.insert_with_policy(key, value, true)
    }

    /// Insert with an explicit duplicate policy: `fail_on_duplicate` rejects
    /// an existing key, otherwise its value is overwritten.
    pub fn insert_with_policy(
        &mut self,
        key: K,
        value: V,
        fail_on_duplicate: bool,
    ) -> Result<Handle, TableError> {
        let on_duplicate = if fail_on_duplicate {
            OnDuplicate::Fail
        } else {
            OnDuplicate::Overwrite
        };
        let _g = self.reentrancy.enter();
        self.table
            .insert(key, value, on_duplicate)
            .map(|inserted| Handle::new(inserted.index))
    }

    /// Grow so that `capacity` entries fit without further growth. Returns
    /// the resulting capacity.
    pub fn ensure_capacity(&mut self, capacity: usize) -> usize {
        let _g = self.reentrancy.enter();
        self.table.ensure_capacity(capacity)
    }

    /// Compact the slots and shrink to the smallest prime table that holds
    /// the live entries. Outstanding handles are invalidated.
    pub fn shrink_to_fit(&mut self) {
        let _g = self.reentrancy.enter();
        self.table.shrink_to_fit();
    }
}

impl<K, V, C> fmt::Debug for ChainedHashMap<K, V, C>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, C, Q> Index<&Q> for ChainedHashMap<K, V, C>
where
    K: Borrow<Q>,
    Q: ?Sized,
    C: KeyComparer<Q>,
{
    type Output = V;

    /// # Panics
    ///
    /// Panics if the key is null or absent.
    fn index(&self, key: &Q) -> &V {
        match self.lookup(key) {
            Ok(v) => v,
            Err(e) => panic!("{}", e),
        }
    }
}

impl<K, V, C> Extend<(K, V)> for ChainedHashMap<K, V, C>
where
    C: KeyComparer<K>,
{
    /// Upserts every pair.
    ///
    /// # Panics
    ///
    /// Panics on a null key.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            if let Err(e) = self.insert(k, v) {
                panic!("{}", e);
            }
        }
    }
}

impl<K, V, C> FromIterator<(K, V)> for ChainedHashMap<K, V, C>
where
    C: KeyComparer<K> + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<K, V, C> IntoIterator for ChainedHashMap<K, V, C> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        let len = self.len();
        IntoIter::new(self.table.into_store().into_entries(), len)
    }
}

impl<'a, K, V, C> IntoIterator for &'a ChainedHashMap<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, C> IntoIterator for &'a mut ChainedHashMap<K, V, C> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}
