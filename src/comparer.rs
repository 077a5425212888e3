//! Key comparers: the pluggable equality and hash strategy of a map.
//!
//! A comparer decides which keys are equal, how they hash, whether a key
//! is the null key, and whether it can be replaced by a randomized variant
//! when the map detects a hash-flooding pattern. The map masks every hash
//! to 31 bits, so comparers may return any `u32`.

use core::fmt;
use core::hash::{Hash, Hasher};
use siphasher::sip::SipHasher13;

/// Equality and hashing strategy for keys of type `K`.
///
/// Implementations must be consistent: `equals(a, b)` implies
/// `hash(a) == hash(b)`. A comparer used for borrowed lookups (`K: Borrow<Q>`)
/// must hash `Q` the same way it hashes the owning `K`.
pub trait KeyComparer<K: ?Sized> {
    fn equals(&self, a: &K, b: &K) -> bool;

    fn hash(&self, key: &K) -> u32;

    /// Whether `key` is the absent key. Null keys are rejected before any
    /// hashing happens.
    fn is_null(&self, _key: &K) -> bool {
        false
    }

    /// A replacement seeded with fresh randomness, if this comparer is
    /// predictable enough to be attacked with crafted collisions.
    fn randomized(&self) -> Option<Self>
    where
        Self: Sized,
    {
        None
    }
}

/// SipHash-1-3 over `K: Hash`.
///
/// `DefaultComparer::new()` uses fixed zero keys, so hashes are stable across
/// runs and processes. When a map sees pathological chains it swaps in a
/// randomly keyed instance via [`KeyComparer::randomized`].
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultComparer {
    keys: Option<(u64, u64)>,
}

impl DefaultComparer {
    pub const fn new() -> Self {
        Self { keys: None }
    }

    /// A comparer keyed with the given SipHash keys.
    pub const fn with_keys(k0: u64, k1: u64) -> Self {
        Self {
            keys: Some((k0, k1)),
        }
    }

    pub fn is_randomized(&self) -> bool {
        self.keys.is_some()
    }
}

impl fmt::Debug for DefaultComparer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Keys stay out of debug output.
        f.debug_struct("DefaultComparer")
            .field("randomized", &self.is_randomized())
            .finish()
    }
}

impl<K: ?Sized + Hash + Eq> KeyComparer<K> for DefaultComparer {
    #[inline]
    fn equals(&self, a: &K, b: &K) -> bool {
        a == b
    }

    fn hash(&self, key: &K) -> u32 {
        let mut h = match self.keys {
            Some((k0, k1)) => SipHasher13::new_with_keys(k0, k1),
            None => SipHasher13::new(),
        };
        key.hash(&mut h);
        let full = h.finish();
        (full ^ (full >> 32)) as u32
    }

    fn randomized(&self) -> Option<Self> {
        if self.is_randomized() {
            return None;
        }
        Some(Self::with_keys(rand::random(), rand::random()))
    }
}

/// Comparer built from an equality closure and a hash closure.
///
/// ```
/// use chained_hashmap::{ChainedHashMap, FnComparer};
///
/// let folded = FnComparer::new(
///     |a: &String, b: &String| a.eq_ignore_ascii_case(b),
///     |k: &String| {
///         k.bytes()
///             .fold(0u32, |h, b| h.wrapping_mul(31) ^ b.to_ascii_lowercase() as u32)
///     },
/// );
/// let mut m = ChainedHashMap::with_comparer(folded);
/// m.insert("Key".to_string(), 1).unwrap();
/// assert_eq!(m.get(&"KEY".to_string()), Some(&1));
/// ```
#[derive(Clone, Copy)]
pub struct FnComparer<E, H> {
    eq: E,
    hash: H,
}

impl<E, H> FnComparer<E, H> {
    pub const fn new(eq: E, hash: H) -> Self {
        Self { eq, hash }
    }
}

impl<E, H> fmt::Debug for FnComparer<E, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnComparer")
    }
}

impl<K: ?Sized, E, H> KeyComparer<K> for FnComparer<E, H>
where
    E: Fn(&K, &K) -> bool,
    H: Fn(&K) -> u32,
{
    #[inline]
    fn equals(&self, a: &K, b: &K) -> bool {
        (self.eq)(a, b)
    }

    #[inline]
    fn hash(&self, key: &K) -> u32 {
        (self.hash)(key)
    }
}

/// Adapts a comparer for `K` to keys of type `Option<K>`, where `None` is the
/// null key and is rejected by the map.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullableComparer<C> {
    inner: C,
}

impl<C> NullableComparer<C> {
    pub const fn new(inner: C) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<K, C> KeyComparer<Option<K>> for NullableComparer<C>
where
    C: KeyComparer<K>,
{
    fn equals(&self, a: &Option<K>, b: &Option<K>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => self.inner.equals(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    fn hash(&self, key: &Option<K>) -> u32 {
        match key {
            Some(k) => self.inner.hash(k),
            None => 0,
        }
    }

    fn is_null(&self, key: &Option<K>) -> bool {
        key.is_none()
    }

    fn randomized(&self) -> Option<Self> {
        self.inner.randomized().map(Self::new)
    }
}
