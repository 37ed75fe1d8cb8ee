use std::{
    borrow::Borrow,
    collections::hash_map::DefaultHasher,
    hash::{BuildHasher, Hash, Hasher},
};

pub(crate) fn equivalent_key<Q, K, V>(k: &Q) -> impl Fn(&(K, V)) -> bool + '_
where
    K: Borrow<Q>,
    Q: Eq + ?Sized,
{
    move |x| k.eq(x.0.borrow())
}

pub(crate) fn equivalent_pair<'a, Q, W, K, V>(
    k: &'a Q,
    v: &'a W,
) -> impl Fn(&(K, V)) -> bool + 'a
where
    K: Borrow<Q>,
    V: Borrow<W>,
    Q: Eq + ?Sized,
    W: Eq + ?Sized,
{
    move |x| k.eq(x.0.borrow()) && v.eq(x.1.borrow())
}

pub(crate) fn make_hash<T, S>(hash_builder: &S, val: &T) -> u64
where
    T: Hash + ?Sized,
    S: BuildHasher,
{
    let mut state = hash_builder.build_hasher();
    val.hash(&mut state);
    state.finish()
}

// Hashes the key half of a stored pair, used when a shard table grows
pub(crate) fn make_hasher<K, V, S>(hash_builder: &S) -> impl Fn(&(K, V)) -> u64 + '_
where
    K: Hash,
    S: BuildHasher,
{
    move |val| make_hash::<K, S>(hash_builder, &val.0)
}

// Content hashes must agree between maps with different (randomly seeded) hashers, so they use a
// fixed-key hasher instead of the map's own.
pub(crate) fn fixed_hash<T: Hash + ?Sized>(val: &T) -> u64 {
    let mut state = DefaultHasher::new();
    val.hash(&mut state);
    state.finish()
}

// Symmetric in key and value, so a map and its inverse hash identically.
pub(crate) fn entry_hash<K, V>(key: &K, value: &V) -> u64
where
    K: Hash + ?Sized,
    V: Hash + ?Sized,
{
    fixed_hash(key) ^ fixed_hash(value)
}

/// Checks that two sequences hold the same elements the same number of times, in any order.
pub(crate) fn same_multiset<T, I, J>(left: I, right: J) -> bool
where
    T: Hash + Eq,
    I: IntoIterator<Item = T>,
    J: IntoIterator<Item = T>,
{
    let mut counts: hashbrown::HashMap<T, isize> = hashbrown::HashMap::new();
    for item in left {
        *counts.entry(item).or_insert(0) += 1;
    }
    for item in right {
        *counts.entry(item).or_insert(0) -= 1;
    }
    counts.values().all(|count| *count == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_hash_is_symmetric() {
        assert_eq!(entry_hash("a", &1u64), entry_hash(&1u64, "a"));
        assert_ne!(entry_hash("a", &1u64), entry_hash("a", &2u64));
    }

    #[test]
    fn multiset_comparison() {
        assert!(same_multiset(vec![1, 2, 2], vec![2, 1, 2]));
        assert!(!same_multiset(vec![1, 2, 2], vec![1, 1, 2]));
        assert!(!same_multiset(vec![1, 2], vec![1, 2, 2]));
        assert!(same_multiset(Vec::<u8>::new(), Vec::new()));
    }
}
