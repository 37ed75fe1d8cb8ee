#[cfg(test)]
mod tests {
    use std::thread;

    use concurrent_bimap::{ConcurrentBiMap, LiveCollection};

    const THREADS: u64 = 8;
    const PER_THREAD: u64 = 500;

    #[test]
    fn racing_inserts_of_one_value_keep_both_pairs() {
        for _ in 0..50 {
            let map: ConcurrentBiMap<&str, u64> = ConcurrentBiMap::new();
            thread::scope(|s| {
                s.spawn(|| map.insert("k1", 7));
                s.spawn(|| map.inverse().insert(7, "k2"));
            });
            assert_eq!(map.len(), 2);
            assert_eq!(map.inverse().len(), 2);
            let key = map.inverse().get(&7).expect("7 is present");
            assert!(key == "k1" || key == "k2");
        }
    }

    #[test]
    fn disjoint_writers_through_both_directions() {
        let map: ConcurrentBiMap<u64, u64> = ConcurrentBiMap::new();
        thread::scope(|s| {
            for t in 0..THREADS {
                let map = map.clone();
                s.spawn(move || {
                    let inverse = map.inverse();
                    for i in 0..PER_THREAD {
                        let key = t * PER_THREAD + i;
                        if i % 2 == 0 {
                            map.insert(key, key + 1_000_000);
                        } else {
                            inverse.insert(key + 1_000_000, key);
                        }
                    }
                });
            }
        });
        assert_eq!(map.len(), (THREADS * PER_THREAD) as usize);
        assert_eq!(map.inverse().len(), map.len());
        for key in 0..THREADS * PER_THREAD {
            assert_eq!(map.get(&key), Some(key + 1_000_000));
            assert_eq!(map.inverse().get(&(key + 1_000_000)), Some(key));
        }
    }

    #[test]
    fn removals_race_with_readers() {
        let map: ConcurrentBiMap<u64, u64> = (0..THREADS * PER_THREAD).map(|i| (i, i)).collect();
        thread::scope(|s| {
            for t in 0..THREADS {
                let map = map.clone();
                s.spawn(move || {
                    for i in 0..PER_THREAD {
                        let value = t * PER_THREAD + i;
                        assert_eq!(map.inverse().remove(&value), Some(value));
                    }
                });
            }
            s.spawn(|| {
                // Weakly consistent: iteration never fails while writers run.
                for _ in 0..10 {
                    let seen = map.entry_set().iter().count();
                    assert!(seen <= (THREADS * PER_THREAD) as usize);
                }
            });
        });
        assert!(map.is_empty());
        assert!(map.inverse().is_empty());
    }

    #[test]
    fn competing_removals_of_one_value_remove_it_once() {
        for _ in 0..50 {
            let map: ConcurrentBiMap<u64, u64> = ConcurrentBiMap::new();
            map.insert(1, 10);
            let removed: usize = thread::scope(|s| {
                let handles: Vec<_> = (0..4)
                    .map(|_| s.spawn(|| map.inverse().remove(&10).is_some()))
                    .collect();
                handles
                    .into_iter()
                    .map(|handle| handle.join().expect("remover panicked"))
                    .filter(|removed| *removed)
                    .count()
            });
            assert_eq!(removed, 1);
            assert!(map.is_empty());
        }
    }
}
