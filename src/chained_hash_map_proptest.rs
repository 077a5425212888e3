#![cfg(test)]

// State-machine properties for ChainedHashMap. They live in the crate so
// every step can check slot accounting through `stats()`.

use crate::chained_hash_map::{ChainedHashMap, Handle};
use crate::comparer::{DefaultComparer, KeyComparer};
use crate::error::TableError;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

// Owned keys that are looked up as `&str` through the map's comparer.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Operations name keys by their index into a small pool, so that a failing
// case collapses onto few distinct keys and many repeats of them.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    TryInsert(usize, i32),
    Remove(usize),
    Find(usize),
    Contains(String),
    Mutate(usize, i32),
    Clear,
    Shrink,
    Iterate,
    Cursor,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::TryInsert(i, v)),
            3 => idx.clone().prop_map(OpI::Remove),
            2 => idx.clone().prop_map(OpI::Find),
            2 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => Just(OpI::Clear),
            1 => Just(OpI::Shrink),
            1 => Just(OpI::Iterate),
            1 => Just(OpI::Cursor),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Every key hashes alike, so every entry shares one chain.
#[derive(Clone, Copy, Debug, Default)]
struct ConstComparer;
impl<Q: ?Sized + Eq> KeyComparer<Q> for ConstComparer {
    fn equals(&self, a: &Q, b: &Q) -> bool {
        a == b
    }
    fn hash(&self, _key: &Q) -> u32 {
        0
    }
}

// Drives `sut` and a std HashMap model through the same operations.
// Invariants exercised across random operation sequences:
// - `insert` upserts and reports the previous value; `try_insert` rejects
//   duplicates and leaves the stored value alone.
// - `find`/`contains_key`/`get` parity; handles stay put for live entries
//   until `shrink_to_fit` renumbers them.
// - `remove_entry` returns the owned `(K, V)` matching the model.
// - `iter` and cursors yield each live entry exactly once.
// - Slot accounting: live + free == high water; `len`/`is_empty` parity.
fn run_state_machine<C>(
    mut sut: ChainedHashMap<Key, i32, C>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError>
where
    C: KeyComparer<Key> + KeyComparer<str>,
{
    let mut model: HashMap<Key, i32> = HashMap::new();
    let mut live: HashMap<Key, Handle> = HashMap::new();

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(pool, i);
                let prev = sut.insert(k.clone(), v);
                let model_prev = model.insert(k.clone(), v);
                prop_assert_eq!(prev, Ok(model_prev));
                let h = sut.find(&k).expect("inserted key is findable");
                if let Some(&lh) = live.get(&k) {
                    prop_assert_eq!(h, lh, "overwrite keeps the slot");
                }
                live.insert(k, h);
            }
            OpI::TryInsert(i, v) => {
                let k = key_from(pool, i);
                let already = model.contains_key(&k);
                match sut.try_insert(k.clone(), v) {
                    Ok(h) => {
                        prop_assert!(!already, "try_insert must fail on duplicate");
                        let prev = live.insert(k.clone(), h);
                        prop_assert!(prev.is_none());
                        model.insert(k, v);
                    }
                    Err(TableError::DuplicateKey) => {
                        prop_assert!(already, "duplicate error only when key exists");
                        prop_assert_eq!(sut.get(&k), model.get(&k));
                    }
                    Err(e) => prop_assert!(false, "unexpected error {:?}", e),
                }
            }
            OpI::Remove(i) => {
                let k = key_from(pool, i);
                let removed = sut.remove_entry(&k);
                match model.remove(&k) {
                    Some(mv) => {
                        let (kk, vv) = removed.expect("present in map");
                        prop_assert!(kk == k);
                        prop_assert_eq!(vv, mv);
                        live.remove(&k);
                    }
                    None => prop_assert!(removed.is_none()),
                }
            }
            OpI::Find(i) => {
                let k = key_from(pool, i);
                let s = sut.find(&k);
                prop_assert_eq!(s.is_some(), model.contains_key(&k));
                prop_assert_eq!(s.is_some(), sut.contains_key(&k));
                prop_assert_eq!(sut.get(&k), model.get(&k));
                if let Some(h) = s {
                    prop_assert_eq!(Some(&h), live.get(&k));
                }
            }
            OpI::Contains(s) => {
                let has = sut.contains_key(s.as_str());
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(has, has_model);
            }
            OpI::Mutate(i, d) => {
                let k = key_from(pool, i);
                if let Some(&h) = live.get(&k) {
                    match h.value_mut(&mut sut) {
                        Some(vr) => {
                            *vr = vr.saturating_add(d);
                            if let Some(mv) = model.get_mut(&k) {
                                *mv = mv.saturating_add(d);
                            }
                        }
                        None => prop_assert!(false, "live handle should resolve"),
                    }
                }
            }
            OpI::Clear => {
                sut.clear();
                model.clear();
                live.clear();
            }
            OpI::Shrink => {
                sut.shrink_to_fit();
                prop_assert_eq!(sut.stats().free_count, 0);
                for (k, h) in live.iter_mut() {
                    *h = sut.find(k).expect("live key survives compaction");
                }
            }
            OpI::Iterate => {
                let s_keys: BTreeSet<_> = sut.iter().map(|(k, _)| k.clone()).collect();
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(s_keys, m_keys);
                prop_assert_eq!(sut.iter().len(), model.len());
            }
            OpI::Cursor => {
                let mut cursor = sut.entry_cursor();
                let mut seen = HashMap::new();
                while let Some((k, v)) = cursor.next_item(&sut).map_err(fail)? {
                    prop_assert!(seen.insert(k.clone(), *v).is_none());
                }
                prop_assert_eq!(&seen, &model);
            }
        }

        // Post-conditions after each op
        for (k, h) in &live {
            prop_assert_eq!(h.key(&sut), Some(k));
            prop_assert_eq!(h.value(&sut), model.get(k));
        }
        let stats = sut.stats();
        prop_assert_eq!(stats.len + stats.free_count, stats.high_water);
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }
    Ok(())
}

fn fail(e: TableError) -> TestCaseError {
    TestCaseError::fail(e.to_string())
}

// Property: State-machine equivalence against std::collections::HashMap.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let sut: ChainedHashMap<Key, i32, DefaultComparer> = ChainedHashMap::new();
        run_state_machine(sut, &pool, ops)?;
    }
}

// Property: Same state-machine invariants under worst-case collision
// behavior (constant hash). This stresses chain walking and unlinking from
// the middle of a chain.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let sut = ChainedHashMap::with_comparer(ConstComparer);
        run_state_machine(sut, &pool, ops)?;
    }
}

// Property: growth never moves an entry to another slot.
proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn prop_growth_keeps_handles(keys in proptest::collection::btree_set(any::<u32>(), 1..400)) {
        let mut sut: ChainedHashMap<u32, u32> = ChainedHashMap::new();
        let mut handles = Vec::new();
        for &k in &keys {
            handles.push((k, sut.try_insert(k, k.wrapping_mul(3)).map_err(fail)?));
        }
        for (k, h) in handles {
            prop_assert_eq!(h.key(&sut), Some(&k));
            prop_assert_eq!(sut.find(&k), Some(h));
        }
        prop_assert!(sut.capacity() >= sut.len());
    }
}
