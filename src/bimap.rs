use std::{borrow::Borrow, hash::Hash};

use crate::views::LiveCollection;

/// The operations shared by a bimap and its inverse.
///
/// [`ConcurrentBiMap`](crate::ConcurrentBiMap) implements `BiMap<K, V>` and its
/// [`Inverse`](crate::Inverse) implements `BiMap<V, K>` over the same store, so generic code can
/// work in either direction. Both types also expose every method inherently.
///
/// Every method takes `&self`; the backing store does its own locking.
///
/// # Examples
/// ```rust
/// use concurrent_bimap::{BiMap, ConcurrentBiMap};
///
/// fn count<K, V, M: BiMap<K, V>>(map: &M) -> usize {
///     map.len()
/// }
///
/// let map: ConcurrentBiMap<&str, u64> = [("a", 1), ("b", 2)].into_iter().collect();
/// assert_eq!(count(&map), 2);
/// assert_eq!(count(&map.inverse()), 2);
/// ```
pub trait BiMap<K, V> {
    /// The map this one is the inverse of
    type Inverse: BiMap<V, K>;
    /// The view returned by [`key_set`](BiMap::key_set)
    type KeySet: LiveCollection<K>;
    /// The view returned by [`values`](BiMap::values)
    type Values: LiveCollection<V>;
    /// The view returned by [`entry_set`](BiMap::entry_set)
    type EntrySet: LiveCollection<(K, V)>;

    /// Returns the number of pairs
    fn len(&self) -> usize;

    /// Returns true if there are no pairs
    fn is_empty(&self) -> bool;

    /// Returns true if the key is present
    fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized;

    /// Returns true if some key maps to the value
    fn contains_value<Q>(&self, value: &Q) -> bool
    where
        V: Borrow<Q>,
        Q: Hash + Eq + ?Sized;

    /// Returns a copy of the value the key maps to
    fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized;

    /// Maps the key to the value and returns the key's previous value
    fn insert(&self, key: K, value: V) -> Option<V>;

    /// Same as [`insert`](BiMap::insert): other keys mapped to the value are not evicted
    fn force_insert(&self, key: K, value: V) -> Option<V>;

    /// Removes the key and returns the value it mapped to
    fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized;

    /// Inserts each pair in turn
    fn insert_all<I>(&self, iter: I)
    where
        I: IntoIterator<Item = (K, V)>;

    /// Removes every pair
    fn clear(&self);

    /// Returns a live view of the keys
    fn key_set(&self) -> Self::KeySet;

    /// Returns a live view of the values
    fn values(&self) -> Self::Values;

    /// Returns a live view of the pairs
    fn entry_set(&self) -> Self::EntrySet;

    /// Returns the inverse map over the same store
    fn inverse(&self) -> Self::Inverse;
}
