//! Property tests for the storage layers.
//!
//! Random insert/erase interleavings are run against both the
//! open-addressing map and the indexed flat map, with a `std` map as the
//! model, checking that lookups, sizes and iteration stay in agreement.

use proptest::prelude::*;
use std::collections::HashMap;

use strata_ecs::flat_map::IndexedFlatMap;
use strata_ecs::open_map::OpenHashMap;

/// Operations applicable to either map.
#[derive(Debug, Clone)]
enum MapOp {
    Insert(u16, u32),
    Remove(u16),
    Lookup(u16),
    Clear,
}

fn map_op_strategy() -> impl Strategy<Value = MapOp> {
    // A small key space forces collisions, tombstone reuse and replacement.
    prop_oneof![
        4 => (any::<u16>(), any::<u32>()).prop_map(|(k, v)| MapOp::Insert(k % 64, v)),
        2 => any::<u16>().prop_map(|k| MapOp::Remove(k % 64)),
        2 => any::<u16>().prop_map(|k| MapOp::Lookup(k % 64)),
        1 => Just(MapOp::Clear),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1_000))]

    #[test]
    fn open_map_agrees_with_std(ops in prop::collection::vec(map_op_strategy(), 1..200)) {
        let mut map: OpenHashMap<u16, u32> = OpenHashMap::new();
        let mut model: HashMap<u16, u32> = HashMap::new();

        for op in ops {
            match op {
                MapOp::Insert(k, v) => {
                    prop_assert_eq!(map.insert(k, v), model.insert(k, v));
                }
                MapOp::Remove(k) => {
                    prop_assert_eq!(map.remove(&k), model.remove(&k));
                }
                MapOp::Lookup(k) => {
                    prop_assert_eq!(map.get(&k), model.get(&k));
                }
                MapOp::Clear => {
                    map.clear();
                    model.clear();
                }
            }
            prop_assert_eq!(map.len(), model.len());
        }

        // Iteration reaches exactly the live entries.
        prop_assert_eq!(map.iter().count(), model.len());
        for (k, v) in map.iter() {
            prop_assert_eq!(model.get(k), Some(v));
        }
    }

    #[test]
    fn open_map_capacity_stays_on_the_prime_sequence(
        keys in prop::collection::hash_set(any::<u32>(), 0..400)
    ) {
        const PRIMES: &[usize] = &[5, 11, 23, 47, 97, 197, 397, 797, 1597];
        let mut map = OpenHashMap::new();
        for &k in &keys {
            map.insert(k, ());
        }
        if map.capacity() > 0 {
            prop_assert!(PRIMES.contains(&map.capacity()), "capacity {}", map.capacity());
            // Load factor bound: the table grows before reaching 0.6.
            prop_assert!(map.len() * 5 < map.capacity() * 3 + 5);
        }
        for &k in &keys {
            prop_assert!(map.contains_key(&k));
        }
    }

    #[test]
    fn flat_map_agrees_with_std(ops in prop::collection::vec(map_op_strategy(), 1..200)) {
        let mut map: IndexedFlatMap<u16, u32> = IndexedFlatMap::new();
        let mut model: HashMap<u16, u32> = HashMap::new();

        for op in ops {
            match op {
                MapOp::Insert(k, v) => {
                    prop_assert_eq!(map.insert(k, v), model.insert(k, v));
                }
                MapOp::Remove(k) => {
                    prop_assert_eq!(map.remove(&k), model.remove(&k));
                }
                MapOp::Lookup(k) => {
                    prop_assert_eq!(map.get(&k), model.get(&k));
                }
                MapOp::Clear => {
                    map.clear();
                    model.clear();
                }
            }

            // The packed vectors and the index never drift apart.
            prop_assert_eq!(map.len(), model.len());
            prop_assert_eq!(map.keys().len(), map.len());
            for (pos, key) in map.keys().iter().enumerate() {
                prop_assert_eq!(map.position(key), Some(pos));
            }
        }

        let mut seen: Vec<u16> = map.iter().map(|(k, _)| *k).collect();
        seen.sort_unstable();
        let mut expected: Vec<u16> = model.keys().copied().collect();
        expected.sort_unstable();
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn flat_map_erase_preserves_untouched_prefix_order(
        n in 2usize..40,
        victim in 0usize..40,
    ) {
        let victim = victim % n;
        let mut map = IndexedFlatMap::new();
        for k in 0..n as u16 {
            map.insert(k, ());
        }
        let before: Vec<u16> = map.iter().map(|(k, _)| *k).collect();
        map.remove(&(victim as u16));
        let after: Vec<u16> = map.iter().map(|(k, _)| *k).collect();

        // Only the victim's position changed: the trailing key moved there.
        for (pos, k) in after.iter().enumerate() {
            if pos == victim {
                prop_assert_eq!(*k, before[n - 1]);
            } else {
                prop_assert_eq!(*k, before[pos]);
            }
        }
    }
}
