#[cfg(test)]
mod tests {
    use concurrent_bimap::{BiMap, ConcurrentBiMap, Error, LiveCollection};

    #[derive(PartialEq, Eq, Clone, Hash, Debug)]
    struct TestingStruct {
        pub(crate) value: u64,
        pub(crate) data: String,
    }

    impl TestingStruct {
        pub(crate) fn from_value(value: u64) -> Self {
            Self {
                value,
                data: value.to_string(),
            }
        }
    }

    fn construct_default_map() -> ConcurrentBiMap<String, TestingStruct> {
        (0..100)
            .map(|i| (i.to_string(), TestingStruct::from_value(i)))
            .collect()
    }

    #[test]
    fn insert_test() {
        let map: ConcurrentBiMap<u64, String> = ConcurrentBiMap::with_capacity(100);
        for i in 0..100 {
            assert_eq!(map.insert(i, i.to_string()), None);
        }
        assert_eq!(map.len(), 100);
        for (val, s) in map.iter() {
            assert_eq!(val.to_string(), s);
        }
        assert_eq!(map.insert(5, "five".to_string()), Some("5".to_string()));
        assert_eq!(map.len(), 100);
    }

    #[test]
    fn get_test() {
        let map = construct_default_map();
        for i in 0..100 {
            assert_eq!(map.get(&i.to_string()), Some(TestingStruct::from_value(i)));
        }
        assert_eq!(map.get("100"), None);
        assert!(map.contains_key("42"));
        assert!(map.contains_value(&TestingStruct::from_value(42)));
        assert!(!map.contains_value(&TestingStruct::from_value(142)));
    }

    #[test]
    fn remove_test() {
        let map = construct_default_map();
        assert_eq!(map.remove("7"), Some(TestingStruct::from_value(7)));
        assert_eq!(map.remove("7"), None);
        assert_eq!(map.len(), 99);
        assert!(!map.inverse().contains_key(&TestingStruct::from_value(7)));
        map.clear();
        assert!(map.is_empty());
        assert!(map.inverse().is_empty());
    }

    #[test]
    fn duplicate_values_are_kept() {
        let map: ConcurrentBiMap<&str, u64> = ConcurrentBiMap::new();
        map.insert("x", 5);
        map.insert("y", 5);
        assert_eq!(map.len(), 2);
        assert_eq!(map.force_insert("z", 5), None);
        assert_eq!(map.len(), 3);
        assert_eq!(map.values().len(), 3);
        assert!(map.values().contains(&5));
    }

    #[test]
    fn key_set_test() {
        let map = construct_default_map();
        let keys = map.key_set();
        assert_eq!(keys.len(), 100);
        assert!(keys.contains(&"3".to_string()));
        assert_eq!(
            keys.add("100".to_string()),
            Err(Error::Unsupported {
                view: "key set",
                operation: "add"
            })
        );
        assert!(keys.remove(&"3".to_string()));
        assert!(!map.contains_key("3"));
        let retained: Vec<String> = (0..10).map(|i| i.to_string()).collect();
        assert!(keys.retain_all(&retained));
        assert_eq!(map.len(), 9);
        assert!(keys.remove_all(&["0".to_string(), "1".to_string()]));
        assert_eq!(map.len(), 7);
    }

    #[test]
    fn entry_set_test() {
        let map = construct_default_map();
        let entries = map.entry_set();
        assert!(entries.contains(&("1".to_string(), TestingStruct::from_value(1))));
        assert!(!entries.contains(&("1".to_string(), TestingStruct::from_value(2))));
        assert_eq!(
            entries.add(("100".to_string(), TestingStruct::from_value(100))),
            Ok(true)
        );
        assert_eq!(map.len(), 101);
        assert!(entries.remove(&("100".to_string(), TestingStruct::from_value(100))));
        assert!(!entries.remove(&("1".to_string(), TestingStruct::from_value(2))));
        assert_eq!(map.len(), 100);

        for mut entry in entries.iter().filter(|e| e.key() == "9") {
            let old = entry.set_value(TestingStruct::from_value(900));
            assert_eq!(old, TestingStruct::from_value(9));
        }
        assert_eq!(map.get("9"), Some(TestingStruct::from_value(900)));
        assert_eq!(entries.to_vec().len(), 100);
    }

    #[test]
    fn trait_and_inherent_agree() {
        fn through_trait<M: BiMap<String, TestingStruct>>(map: &M) -> Option<TestingStruct> {
            map.insert("new".to_string(), TestingStruct::from_value(1000));
            map.get("new")
        }

        let map = construct_default_map();
        assert_eq!(through_trait(&map), Some(TestingStruct::from_value(1000)));
        assert_eq!(map.len(), 101);
    }

    #[test]
    fn shared_between_clones() {
        let map = construct_default_map();
        let clone = map.clone();
        clone.insert("shared".to_string(), TestingStruct::from_value(0));
        assert!(map.contains_key("shared"));
        assert!(map.ptr_eq(&clone));
        assert_eq!(map, clone);
    }

    #[test]
    fn extend_test() {
        let mut map: ConcurrentBiMap<u64, u64> = ConcurrentBiMap::new();
        map.extend((0..10).map(|i| (i, i * 2)));
        assert_eq!(map.len(), 10);
        assert_eq!(map.inverse().get(&18), Some(9));
        assert_eq!((&map).into_iter().count(), 10);
    }

    #[test]
    fn shard_configuration() {
        let map: ConcurrentBiMap<u64, u64> =
            ConcurrentBiMap::with_shard_amount(8).expect("8 is a power of two");
        assert_eq!(map.shard_amount(), 8);
        assert_eq!(
            ConcurrentBiMap::<u64, u64>::with_shard_amount(12).unwrap_err(),
            Error::InvalidShardAmount(12)
        );
    }
}
