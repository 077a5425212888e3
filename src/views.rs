//! Live views over a map's slots.
//!
//! Two families:
//! - Borrowing iterators (`Iter`, `Keys`, `Values`, `IterMut`, `ValuesMut`,
//!   `IntoIter`). They hold the map borrowed, so the map cannot change while
//!   they run.
//! - Detached cursors (`Cursor<W>`). A cursor holds a position plus the
//!   identity and version of the map it was made from; every step takes the
//!   map by reference and fails with `ConcurrentModification` if it is handed
//!   a different map or the map changed structurally in between.
//!
//! Both scan slots in index order and skip vacant ones. That order is
//! neither key order nor insertion order, and may change after any growth,
//! rehash or compaction.

use crate::chained_hash_map::ChainedHashMap;
use crate::error::TableError;
use crate::slot_store::Slot;
use core::iter::FusedIterator;
use core::marker::PhantomData;

/// Iterator over `(&K, &V)`.
pub struct Iter<'a, K, V> {
    slots: core::slice::Iter<'a, Slot<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(slots: &'a [Slot<K, V>], len: usize) -> Self {
        Self {
            slots: slots.iter(),
            remaining: len,
        }
    }
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let item = self.slots.by_ref().find_map(Slot::key_value)?;
        self.remaining -= 1;
        Some(item)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over `(&K, &mut V)`.
pub struct IterMut<'a, K, V> {
    slots: core::slice::IterMut<'a, Slot<K, V>>,
    remaining: usize,
}

impl<'a, K, V> IterMut<'a, K, V> {
    pub(crate) fn new(slots: &'a mut [Slot<K, V>], len: usize) -> Self {
        Self {
            slots: slots.iter_mut(),
            remaining: len,
        }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let item = self.slots.by_ref().find_map(Slot::key_value_mut)?;
        self.remaining -= 1;
        Some(item)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// Owning iterator over `(K, V)`.
pub struct IntoIter<K, V> {
    slots: std::vec::IntoIter<Slot<K, V>>,
    remaining: usize,
}

impl<K, V> IntoIter<K, V> {
    pub(crate) fn new(slots: Vec<Slot<K, V>>, len: usize) -> Self {
        Self {
            slots: slots.into_iter(),
            remaining: len,
        }
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let item = self.slots.by_ref().find_map(Slot::into_key_value)?;
        self.remaining -= 1;
        Some(item)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

/// Iterator over keys.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Keys<'a, K, V> {
    pub(crate) fn new(inner: Iter<'a, K, V>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// Iterator over values.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Values<'a, K, V> {
    pub(crate) fn new(inner: Iter<'a, K, V>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> FusedIterator for Values<'_, K, V> {}

/// Iterator over mutable values.
pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V> ValuesMut<'a, K, V> {
    pub(crate) fn new(inner: IterMut<'a, K, V>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    #[inline]
    fn next(&mut self) -> Option<&'a mut V> {
        self.inner.next().map(|(_, v)| v)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}
impl<K, V> FusedIterator for ValuesMut<'_, K, V> {}

/// Projection a cursor applies to the entry it is positioned on.
pub trait View {
    type Item<'a, K: 'a, V: 'a>;

    fn project<'a, K: 'a, V: 'a>(key: &'a K, value: &'a V) -> Self::Item<'a, K, V>;
}

/// Cursor view yielding `(&K, &V)`.
#[derive(Debug)]
pub enum EntryView {}

/// Cursor view yielding `&K`.
#[derive(Debug)]
pub enum KeyView {}

/// Cursor view yielding `&V`.
#[derive(Debug)]
pub enum ValueView {}

impl View for EntryView {
    type Item<'a, K: 'a, V: 'a> = (&'a K, &'a V);

    #[inline]
    fn project<'a, K: 'a, V: 'a>(key: &'a K, value: &'a V) -> Self::Item<'a, K, V> {
        (key, value)
    }
}

impl View for KeyView {
    type Item<'a, K: 'a, V: 'a> = &'a K;

    #[inline]
    fn project<'a, K: 'a, V: 'a>(key: &'a K, _value: &'a V) -> Self::Item<'a, K, V> {
        key
    }
}

impl View for ValueView {
    type Item<'a, K: 'a, V: 'a> = &'a V;

    #[inline]
    fn project<'a, K: 'a, V: 'a>(_key: &'a K, value: &'a V) -> Self::Item<'a, K, V> {
        value
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CursorState {
    NotStarted,
    Enumerating,
    Exhausted,
}

/// Fail-fast enumerator detached from the map it walks.
///
/// Obtained from [`ChainedHashMap::entry_cursor`],
/// [`ChainedHashMap::key_cursor`] or [`ChainedHashMap::value_cursor`]. A
/// cursor is single pass; once exhausted it stays exhausted, and a fresh
/// cursor must be requested to walk the map again.
///
/// ```
/// use chained_hashmap::{ChainedHashMap, TableError};
///
/// let mut m = ChainedHashMap::new();
/// m.insert("a", 1).unwrap();
/// m.insert("b", 2).unwrap();
///
/// let mut cursor = m.entry_cursor();
/// assert!(cursor.move_next(&m).unwrap());
/// m.insert("c", 3).unwrap();
/// assert_eq!(cursor.move_next(&m), Err(TableError::ConcurrentModification));
/// ```
pub struct Cursor<W> {
    map_id: u64,
    version: u64,
    position: usize,
    current: Option<usize>,
    state: CursorState,
    _view: PhantomData<fn() -> W>,
}

impl<W> Clone for Cursor<W> {
    fn clone(&self) -> Self {
        Self {
            map_id: self.map_id,
            version: self.version,
            position: self.position,
            current: self.current,
            state: self.state,
            _view: PhantomData,
        }
    }
}

impl<W> core::fmt::Debug for Cursor<W> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Cursor")
            .field("map_id", &self.map_id)
            .field("version", &self.version)
            .field("position", &self.position)
            .field("state", &self.state)
            .finish()
    }
}

impl<W: View> Cursor<W> {
    pub(crate) fn new(map_id: u64, version: u64) -> Self {
        Self {
            map_id,
            version,
            position: 0,
            current: None,
            state: CursorState::NotStarted,
            _view: PhantomData,
        }
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    // A cursor is bound to the map that made it; a clone of that map is a
    // different map.
    fn check<K, V, C>(&self, map: &ChainedHashMap<K, V, C>) -> Result<(), TableError> {
        if map.id() != self.map_id || map.version() != self.version {
            return Err(TableError::ConcurrentModification);
        }
        Ok(())
    }

    /// Advance to the next occupied slot. Returns `Ok(false)` once the map is
    /// exhausted.
    pub fn move_next<K, V, C>(
        &mut self,
        map: &ChainedHashMap<K, V, C>,
    ) -> Result<bool, TableError> {
        self.check(map)?;
        if self.state == CursorState::Exhausted {
            return Ok(false);
        }
        let slots = map.slots();
        while let Some(slot) = slots.get(self.position) {
            let index = self.position;
            self.position += 1;
            if slot.is_occupied() {
                self.current = Some(index);
                self.state = CursorState::Enumerating;
                return Ok(true);
            }
        }
        self.current = None;
        self.state = CursorState::Exhausted;
        Ok(false)
    }

    /// The entry the cursor is positioned on, or `Ok(None)` before the first
    /// `move_next` and after exhaustion.
    pub fn current<'m, K, V, C>(
        &self,
        map: &'m ChainedHashMap<K, V, C>,
    ) -> Result<Option<W::Item<'m, K, V>>, TableError>
    where
        K: 'm,
        V: 'm,
    {
        self.check(map)?;
        Ok(self
            .current
            .and_then(|i| map.slots().get(i))
            .and_then(Slot::key_value)
            .map(|(k, v)| W::project(k, v)))
    }

    /// `move_next` followed by `current`.
    pub fn next_item<'m, K, V, C>(
        &mut self,
        map: &'m ChainedHashMap<K, V, C>,
    ) -> Result<Option<W::Item<'m, K, V>>, TableError>
    where
        K: 'm,
        V: 'm,
    {
        if self.move_next(map)? {
            self.current(map)
        } else {
            Ok(None)
        }
    }
}
