// Hash-flood mitigation tests.
//
// A comparer whose hash is trivially predictable lets an adversary pile
// every key into one chain. Once an insert walks more than the collision
// threshold, the map asks the comparer for a randomized replacement and
// rehashes everything with it.
//
// Invariants exercised:
// - Membership and slot handles survive the switch.
// - The switch happens at most once.
// - Comparers that offer no replacement keep working, just slowly.
use chained_hashmap::{ChainedHashMap, Handle, KeyComparer};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// `k % 7` until seeded; then a multiplicative mix of the seed.
#[derive(Clone, Debug, Default)]
struct WeakComparer {
    seed: Option<u64>,
    allow_randomize: bool,
}

impl WeakComparer {
    fn randomizable() -> Self {
        Self {
            seed: None,
            allow_randomize: true,
        }
    }
}

impl KeyComparer<u64> for WeakComparer {
    fn equals(&self, a: &u64, b: &u64) -> bool {
        a == b
    }

    fn hash(&self, key: &u64) -> u32 {
        match self.seed {
            None => (key % 7) as u32,
            Some(seed) => {
                let mixed = (key ^ seed).wrapping_mul(0x9E37_79B9_7F4A_7C15);
                (mixed >> 32) as u32
            }
        }
    }

    fn randomized(&self) -> Option<Self> {
        if !self.allow_randomize || self.seed.is_some() {
            return None;
        }
        Some(Self {
            seed: Some(0xD1B5_4A32_D192_ED03),
            allow_randomize: true,
        })
    }
}

// Test: a flood of same-bucket keys triggers one randomized rehash.
// Verifies: comparer switched; every key and handle still resolves.
#[test]
fn flood_switches_to_randomized_comparer() {
    init_logging();
    let mut m = ChainedHashMap::with_comparer(WeakComparer::randomizable());
    let mut handles: Vec<(u64, Handle)> = Vec::new();
    for i in 0..1000u64 {
        let k = i * 7;
        handles.push((k, m.try_insert(k, i).unwrap()));
        if i <= 100 {
            assert!(m.comparer().seed.is_none(), "switched too early at {}", i);
        }
    }
    assert!(m.comparer().seed.is_some(), "comparer was never randomized");
    for (k, h) in &handles {
        assert_eq!(m.find(k), Some(*h));
        assert_eq!(h.value(&m), Some(&(k / 7)));
    }
    assert_eq!(m.len(), 1000);
    assert!(!m.contains_key(&1));
}

// Test: without a replacement comparer the map stays correct.
#[test]
fn flood_without_replacement_stays_correct() {
    init_logging();
    let mut m = ChainedHashMap::with_comparer(WeakComparer::default());
    for i in 0..500u64 {
        m.insert(i * 7, i).unwrap();
    }
    assert!(m.comparer().seed.is_none());
    for i in 0..500u64 {
        assert_eq!(m.get(&(i * 7)), Some(&i));
    }
    for i in (0..500u64).step_by(2) {
        assert!(m.remove(&(i * 7)));
    }
    assert_eq!(m.len(), 250);
    assert_eq!(m.get(&7), Some(&1));
}

// Test: chains that stay at the threshold never trigger the switch.
// Assumes: k % 7 spreads 0..707 over seven chains of at most 101 keys, so no
// insert walks more than 100 entries.
#[test]
fn chains_at_threshold_do_not_randomize() {
    let mut m = ChainedHashMap::with_comparer(WeakComparer::randomizable());
    for k in 0..707u64 {
        m.insert(k, k).unwrap();
    }
    assert!(m.comparer().seed.is_none());
    assert_eq!(m.len(), 707);

    // One more key in residue 0 walks 101 entries.
    m.insert(707, 707).unwrap();
    assert!(m.comparer().seed.is_some());
}
