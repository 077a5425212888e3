//! Hash policy: 31-bit masking, modulo bucketing and prime table sizing.

/// Mask applied to every comparer hash. Stored hashes are always in
/// `0..=HASH_MASK`.
pub(crate) const HASH_MASK: u32 = 0x7FFF_FFFF;

/// Chain length walked during an insert above which a predictable comparer
/// is replaced by a randomized one.
pub(crate) const HASH_COLLISION_THRESHOLD: usize = 100;

/// Largest prime table size growth will pick.
pub(crate) const MAX_PRIME_SIZE: usize = 0x7FEF_FFFD;

// Candidates p with (p - 1) % HASH_PRIME == 0 are skipped so that
// table sizes never share a factor with the multiplier 101.
const HASH_PRIME: usize = 101;

const PRIMES: &[usize] = &[
    3, 7, 11, 17, 23, 29, 37, 47, 59, 71, 89, 107, 131, 163, 197, 239, 293, 353, 431, 521, 631,
    761, 919, 1103, 1327, 1597, 1931, 2333, 2801, 3371, 4049, 4861, 5839, 7013, 8419, 10103,
    12143, 14591, 17519, 21023, 25229, 30293, 36353, 43627, 52361, 62851, 75431, 90523, 108631,
    130363, 156437, 187751, 225307, 270371, 324449, 389357, 467237, 560689, 672827, 807403,
    968897, 1162687, 1395263, 1674319, 2009191, 2411033, 2893249, 3471899, 4166287, 4999559,
    5999471, 7199369,
];

#[inline]
pub(crate) fn mask(raw: u32) -> u32 {
    raw & HASH_MASK
}

#[inline]
pub(crate) fn bucket_of(hash: u32, table_size: usize) -> usize {
    debug_assert!(table_size > 0);
    hash as usize % table_size
}

pub(crate) fn is_prime(candidate: usize) -> bool {
    if candidate & 1 == 0 {
        return candidate == 2;
    }
    let limit = (candidate as f64).sqrt() as usize;
    let mut divisor = 3;
    while divisor <= limit {
        if candidate % divisor == 0 {
            return false;
        }
        divisor += 2;
    }
    candidate != 1
}

/// Smallest usable prime table size that is at least `min`.
pub(crate) fn get_prime(min: usize) -> usize {
    if let Some(&p) = PRIMES.iter().find(|&&p| p >= min) {
        return p;
    }
    let mut candidate = min | 1;
    while candidate < usize::MAX - 1 {
        if is_prime(candidate) && (candidate - 1) % HASH_PRIME != 0 {
            return candidate;
        }
        candidate += 2;
    }
    min
}

/// Table size to grow to from `old_size`: the next prime after doubling.
pub(crate) fn expand_prime(old_size: usize) -> usize {
    let new_size = old_size.saturating_mul(2);
    if new_size > MAX_PRIME_SIZE && MAX_PRIME_SIZE > old_size {
        return MAX_PRIME_SIZE;
    }
    get_prime(new_size)
}
