use crate::{Error, Phamt, Thamt};

use proptest::prelude::*;
use std::collections::BTreeMap;

fn validate<V>(trie: &Phamt<u64, V>) {
    assert_eq!(trie.root().map_or(0, |root| root.validate()), trie.len());
}

#[derive(Clone, Debug)]
enum Op {
    Assoc(u64, u32),
    Dissoc(u64),
    Get(u64),
}

fn key_strategy() -> impl Strategy<Value = u64> + Clone {
    // Mixes keys that share twigs, keys that only differ high up, and keys
    // scattered over the whole width.
    prop_oneof![
        0u64..256,
        (0u64..64).prop_map(|key| key << 40),
        (0u64..16).prop_map(|key| (key << 60) | 7),
        any::<u64>(),
    ]
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let key = key_strategy();
    let op = prop_oneof![
        50 => (key.clone(), any::<u32>()).prop_map(|(key, value)| Op::Assoc(key, value)),
        30 => key.clone().prop_map(Op::Dissoc),
        20 => key.prop_map(Op::Get),
    ];
    prop::collection::vec(op, 0..=500)
}

fn entries_strategy() -> impl Strategy<Value = Vec<(u64, u32)>> {
    prop::collection::vec((key_strategy(), any::<u32>()), 0..=200)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn persistent_matches_model(ops in ops_strategy()) {
        let mut trie = Phamt::new();
        let mut model = BTreeMap::new();

        for op in ops {
            match op {
                Op::Assoc(key, value) => {
                    trie = trie.assoc(key, value);
                    model.insert(key, value);
                }
                Op::Dissoc(key) => {
                    trie = trie.dissoc(key);
                    model.remove(&key);
                }
                Op::Get(key) => {
                    prop_assert_eq!(trie.get(key), model.get(&key));
                }
            }

            prop_assert_eq!(trie.len(), model.len());
        }

        validate(&trie);
        let got = trie.iter().map(|(key, &value)| (key, value)).collect::<Vec<_>>();
        let expected = model.into_iter().collect::<Vec<_>>();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn transient_matches_persistent(ops in ops_strategy()) {
        let mut persistent = Phamt::new();
        let mut transient = Thamt::new();
        let mut model = BTreeMap::new();

        for op in ops {
            match op {
                Op::Assoc(key, value) => {
                    persistent = persistent.assoc(key, value);
                    prop_assert_eq!(transient.assoc(key, value), model.insert(key, value));
                }
                Op::Dissoc(key) => {
                    persistent = persistent.dissoc(key);
                    prop_assert_eq!(transient.dissoc(key), model.remove(&key));
                }
                Op::Get(key) => {
                    prop_assert_eq!(transient.get(key), model.get(&key));
                }
            }

            prop_assert_eq!(transient.len(), model.len());
        }

        let transient = transient.persist();

        validate(&transient);
        prop_assert_eq!(transient, persistent);
    }

    #[test]
    fn transient_edits_leave_source_intact(entries in entries_strategy(), ops in ops_strategy()) {
        let source = entries.iter().copied().collect::<Phamt<_, _>>();
        let before = source.clone().into_iter().collect::<Vec<_>>();
        let mut transient = source.transient();

        for op in ops {
            match op {
                Op::Assoc(key, value) => {
                    transient.assoc(key, value);
                }
                Op::Dissoc(key) => {
                    transient.dissoc(key);
                }
                Op::Get(_) => {}
            }
        }

        let edited = transient.persist();

        validate(&source);
        validate(&edited);
        prop_assert_eq!(source.into_iter().collect::<Vec<_>>(), before);
    }

    #[test]
    fn round_trip(entries in entries_strategy(), key in key_strategy(), value in any::<u32>()) {
        let trie = entries.into_iter().collect::<Phamt<_, _>>();

        let other = trie.assoc(key, value);

        prop_assert_eq!(other.get(key), Some(&value));
    }

    #[test]
    fn assoc_keeps_original(entries in entries_strategy(), key in key_strategy(), value in any::<u32>()) {
        let trie = entries.into_iter().collect::<Phamt<_, _>>();
        let before = trie.iter().map(|(key, &value)| (key, value)).collect::<Vec<_>>();
        let other = trie.assoc(key, value);

        validate(&other);
        prop_assert!(trie.iter().map(|(key, &value)| (key, value)).eq(before));
    }

    #[test]
    fn assoc_is_idempotent(entries in entries_strategy(), key in key_strategy(), value in any::<u32>()) {
        let trie = entries.into_iter().collect::<Phamt<_, _>>().assoc(key, value);

        prop_assert!(trie.assoc(key, value).ptr_eq(&trie));
    }

    #[test]
    fn dissoc_undoes_assoc(entries in entries_strategy(), key in key_strategy(), value in any::<u32>()) {
        let trie = entries.into_iter().collect::<Phamt<_, _>>().dissoc(key);
        let other = trie.assoc(key, value).dissoc(key);

        validate(&other);
        prop_assert_eq!(other, trie);
    }

    #[test]
    fn iterate_in_ascending_order(entries in entries_strategy()) {
        let trie = entries.into_iter().collect::<Phamt<_, _>>();
        let keys = trie.iter().map(|(key, _)| key).collect::<Vec<_>>();

        prop_assert!(keys.windows(2).all(|pair| pair[0] < pair[1]));
        prop_assert_eq!(keys.len(), trie.len());
    }

    #[test]
    fn cursor_fails_after_edit(entries in entries_strategy(), key in key_strategy(), steps in 0usize..8) {
        let mut trie = entries.into_iter().collect::<Thamt<_, _>>();
        let mut cursor = trie.cursor();

        for _ in 0..steps {
            prop_assert!(cursor.next(&trie).is_ok());
        }

        let version = trie.version();
        trie.assoc(key, 0);

        prop_assert_eq!(
            cursor.next(&trie),
            Err(Error::ModifiedDuringIteration { cursor: version, trie: version + 1 })
        );
    }

    #[test]
    fn cursor_matches_iterator(entries in entries_strategy()) {
        let trie = entries.into_iter().collect::<Thamt<_, _>>();
        let mut cursor = trie.cursor();
        let mut got = vec![];

        while let Some(entry) = cursor.next(&trie).unwrap() {
            got.push(entry);
        }

        prop_assert_eq!(got, trie.iter().collect::<Vec<_>>());
    }

    #[test]
    fn narrow_keys(ops in prop::collection::vec((any::<u16>(), any::<bool>()), 0..=2000)) {
        let mut trie = Thamt::new();
        let mut model = BTreeMap::new();

        for (key, insert) in ops {
            if insert {
                prop_assert_eq!(trie.assoc(key, key), model.insert(key, key));
            } else {
                prop_assert_eq!(trie.dissoc(key), model.remove(&key));
            }
        }

        let trie = trie.persist();

        prop_assert_eq!(trie.root().map_or(0, |root| root.validate()), model.len());
        prop_assert!(trie.into_iter().eq(model));
    }
}

#[test]
fn from_values_assigns_consecutive_keys() {
    let trie = Phamt::from_values(["a", "b", "c", "d", "e"], 10u64).unwrap();

    validate(&trie);
    assert_eq!(
        trie.iter().collect::<Vec<_>>(),
        vec![(10, &"a"), (11, &"b"), (12, &"c"), (13, &"d"), (14, &"e")]
    );
}

#[test]
fn wide_keys() {
    let keys = (0..128).map(|bit| 1u128 << bit).collect::<Vec<_>>();
    let trie = keys
        .iter()
        .map(|&key| (key, key.count_ones()))
        .collect::<Phamt<_, _>>();

    assert_eq!(trie.root().map_or(0, |root| root.validate()), 128);
    assert!(trie.iter().map(|(key, _)| key).eq(keys.iter().copied()));

    let trie = keys.iter().fold(trie, |trie, &key| trie.dissoc(key));

    assert!(trie.is_empty());
}
