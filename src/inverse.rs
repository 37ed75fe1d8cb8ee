use std::{
    borrow::Borrow,
    fmt,
    hash::{BuildHasher, Hash, Hasher},
    iter::FusedIterator,
};

use hashbrown::hash_map::DefaultHashBuilder;
use tracing::trace;

use crate::{
    bimap::BiMap,
    concurrent_bimap::ConcurrentBiMap,
    forwarding::ForwardingSet,
    inverse_entries::InverseEntrySet,
    store::Iter,
    views::{KeySet, Values},
};

/// The inverse of a [`ConcurrentBiMap`]: values act as keys and keys as values.
///
/// An `Inverse` holds nothing but a handle to the forward map. Every call is translated into
/// calls on the shared store, so the two directions always agree on their contents and their
/// size.
///
/// Since the store is only indexed by the forward key, lookups by the inverse key (`get`,
/// `insert`, `remove`, `contains_key`) scan the store. `insert` and `remove` scan first and act
/// second without holding a lock across the two steps, so under concurrent writers:
/// - the "previous" key returned by `insert` can be stale,
/// - `remove` can find a pair that is gone by the time it acts, and return `None`,
/// - another thread can see the forward and inverse views momentarily disagree.
///
/// When a value is held by several keys, which of them the inverse reports is unspecified.
///
/// # Examples
/// ```rust
/// use concurrent_bimap::ConcurrentBiMap;
///
/// let map: ConcurrentBiMap<&str, u64> = ConcurrentBiMap::new();
/// map.insert("x", 5);
/// map.insert("y", 5);
///
/// let key = map.inverse().get(&5).unwrap();
/// assert!(key == "x" || key == "y");
/// ```
pub struct Inverse<K, V, S = DefaultHashBuilder> {
    forward: ConcurrentBiMap<K, V, S>,
}

impl<K, V, S> Inverse<K, V, S> {
    pub(crate) fn new(forward: ConcurrentBiMap<K, V, S>) -> Self {
        Self { forward }
    }

    /// Returns true if both inverses share one store
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.forward.ptr_eq(&other.forward)
    }

    /// Returns the number of pairs, which is always the forward map's
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Returns true if the map holds no pairs
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Removes every pair, in both directions.
    pub fn clear(&self) {
        self.forward.clear()
    }
}

impl<K, V, S> Inverse<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
    S: BuildHasher,
{
    /// Returns true if some forward key maps to the value. This scans the map.
    pub fn contains_key<Q>(&self, value: &Q) -> bool
    where
        V: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        self.forward.contains_value(value)
    }

    /// Returns true if the forward key is present. O(1).
    pub fn contains_value<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.forward.contains_key(key)
    }

    /// Returns a forward key that maps to the value, by scanning the map.
    pub fn get<Q>(&self, value: &Q) -> Option<K>
    where
        V: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        self.forward.store().find_key(value)
    }

    /// Maps `key` to `value` in the forward map, returning a key that mapped to `value` before.
    ///
    /// Other keys that already map to `value` keep their pairs, so the returned key is still
    /// present afterwards unless it is `key` itself. The lookup and the insertion are separate
    /// steps; a concurrent writer can make the returned key stale.
    pub fn insert(&self, value: V, key: K) -> Option<K> {
        let previous = self.get(&value);
        self.forward.insert(key, value);
        trace!(replaced = previous.is_some(), "inserted through the inverse map");
        previous
    }

    /// Identical to [`insert`](Inverse::insert).
    pub fn force_insert(&self, value: V, key: K) -> Option<K> {
        self.insert(value, key)
    }

    /// Removes a pair holding the value and returns its key.
    ///
    /// The pair is found by a scan and then removed by key. If another thread removes that key
    /// in between, nothing is removed and `None` is returned.
    pub fn remove<Q>(&self, value: &Q) -> Option<K>
    where
        V: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let key = self.get(value)?;
        match self.forward.remove(&key) {
            Some(_) => Some(key),
            None => {
                trace!("key found by the inverse scan was removed before the inverse removal");
                None
            }
        }
    }

    /// Inserts each `(value, key)` pair in turn through [`insert`](Inverse::insert).
    pub fn insert_all<I>(&self, iter: I)
    where
        I: IntoIterator<Item = (V, K)>,
    {
        for (value, key) in iter {
            self.insert(value, key);
        }
    }

    /// Returns the forward map's values as this map's live key set.
    ///
    /// Bare values cannot be added, as there is no key to pair them with.
    pub fn key_set(&self) -> ForwardingSet<Values<K, V, S>> {
        self.forward.values()
    }

    /// Returns the forward map's live key set as this map's values.
    pub fn values(&self) -> KeySet<K, V, S> {
        self.forward.key_set()
    }

    /// Returns the live set of `(value, key)` pairs.
    pub fn entry_set(&self) -> InverseEntrySet<K, V, S> {
        InverseEntrySet::new(self.forward.entry_set())
    }

    /// Returns the forward map this is the inverse of.
    pub fn inverse(&self) -> ConcurrentBiMap<K, V, S> {
        self.forward.clone()
    }

    /// Returns a weakly consistent iterator over copies of the `(value, key)` pairs.
    pub fn iter(&self) -> InverseIter<K, V, S> {
        InverseIter {
            inner: self.forward.iter(),
        }
    }
}

impl<K, V, S> BiMap<V, K> for Inverse<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
    S: BuildHasher,
{
    type Inverse = ConcurrentBiMap<K, V, S>;
    type KeySet = ForwardingSet<Values<K, V, S>>;
    type Values = KeySet<K, V, S>;
    type EntrySet = InverseEntrySet<K, V, S>;

    fn len(&self) -> usize {
        Inverse::len(self)
    }

    fn is_empty(&self) -> bool {
        Inverse::is_empty(self)
    }

    fn contains_key<Q>(&self, value: &Q) -> bool
    where
        V: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        Inverse::contains_key(self, value)
    }

    fn contains_value<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        Inverse::contains_value(self, key)
    }

    fn get<Q>(&self, value: &Q) -> Option<K>
    where
        V: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        Inverse::get(self, value)
    }

    fn insert(&self, value: V, key: K) -> Option<K> {
        Inverse::insert(self, value, key)
    }

    fn force_insert(&self, value: V, key: K) -> Option<K> {
        Inverse::force_insert(self, value, key)
    }

    fn remove<Q>(&self, value: &Q) -> Option<K>
    where
        V: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        Inverse::remove(self, value)
    }

    fn insert_all<I>(&self, iter: I)
    where
        I: IntoIterator<Item = (V, K)>,
    {
        Inverse::insert_all(self, iter)
    }

    fn clear(&self) {
        Inverse::clear(self)
    }

    fn key_set(&self) -> Self::KeySet {
        Inverse::key_set(self)
    }

    fn values(&self) -> Self::Values {
        Inverse::values(self)
    }

    fn entry_set(&self) -> Self::EntrySet {
        Inverse::entry_set(self)
    }

    fn inverse(&self) -> Self::Inverse {
        Inverse::inverse(self)
    }
}

impl<K, V, S> Clone for Inverse<K, V, S> {
    fn clone(&self) -> Self {
        Self::new(self.forward.clone())
    }
}

impl<K, V, S> PartialEq for Inverse<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.forward == other.forward
    }
}

impl<K, V, S> Eq for Inverse<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
    S: BuildHasher,
{
}

// Entry hashes are symmetric, so this equals the forward map's hash.
impl<K: Hash, V: Hash, S> Hash for Inverse<K, V, S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.forward.hash(state)
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for Inverse<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        self.forward.store().for_each(|key, value| {
            map.entry(value, key);
        });
        map.finish()
    }
}

impl<K, V, S> IntoIterator for &Inverse<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
    S: BuildHasher,
{
    type Item = (V, K);
    type IntoIter = InverseIter<K, V, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A weakly consistent iterator over the `(value, key)` pairs of an [`Inverse`]
#[derive(Debug)]
pub struct InverseIter<K, V, S = DefaultHashBuilder> {
    inner: Iter<K, V, S>,
}

impl<K: Clone, V: Clone, S> Iterator for InverseIter<K, V, S> {
    type Item = (V, K);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, value)| (value, key))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: Clone, V: Clone, S> FusedIterator for InverseIter<K, V, S> {}
