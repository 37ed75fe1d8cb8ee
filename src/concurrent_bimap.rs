use std::{
    borrow::Borrow,
    fmt,
    hash::{BuildHasher, Hash, Hasher},
    sync::Arc,
};

use hashbrown::hash_map::DefaultHashBuilder;

use crate::{
    bimap::BiMap,
    error::Result,
    forwarding::ForwardingSet,
    inverse::Inverse,
    store::{ConcurrentStore, Iter},
    views::{EntrySet, KeySet, Values},
};

/// A thread-safe hash map that can also be searched by value.
///
/// `ConcurrentBiMap` is a handle to a single [`ConcurrentStore`]. Its [`inverse`] is a second
/// handle to the same store that treats values as keys and keys as values, and its views
/// ([`key_set`], [`values`], [`entry_set`]) are live windows onto that store. No data is ever
/// duplicated: a change made through any handle or view is seen by all of them.
///
/// Keys are unique; values are **not**. Inserting a pair whose value is already held by
/// another key keeps both pairs, and looking that value up through the inverse returns one of
/// the keys, unspecified which. [`force_insert`] behaves exactly like [`insert`].
///
/// Lookups by key are expected O(1) and only lock the shard that holds the key. Lookups by
/// value scan the store. Operations of the inverse that scan before acting are not atomic; see
/// [`Inverse`] for the races that allows.
///
/// Cloning a `ConcurrentBiMap` clones the handle, not the data.
///
/// # Examples
/// ```rust
/// use concurrent_bimap::ConcurrentBiMap;
///
/// let map: ConcurrentBiMap<&str, u64> = ConcurrentBiMap::new();
/// map.insert("a", 1);
/// map.insert("b", 2);
///
/// let inverse = map.inverse();
/// assert_eq!(inverse.get(&1), Some("a"));
/// assert_eq!(inverse.remove(&2), Some("b"));
/// assert_eq!(map.len(), 1);
/// assert!(!map.contains_key("b"));
/// assert!(inverse.inverse().ptr_eq(&map));
/// ```
///
/// [`inverse`]: ConcurrentBiMap::inverse
/// [`key_set`]: ConcurrentBiMap::key_set
/// [`values`]: ConcurrentBiMap::values
/// [`entry_set`]: ConcurrentBiMap::entry_set
/// [`insert`]: ConcurrentBiMap::insert
/// [`force_insert`]: ConcurrentBiMap::force_insert
pub struct ConcurrentBiMap<K, V, S = DefaultHashBuilder> {
    store: Arc<ConcurrentStore<K, V, S>>,
}

impl<K, V> ConcurrentBiMap<K, V, DefaultHashBuilder> {
    /// Creates an empty `ConcurrentBiMap`.
    ///
    /// # Examples
    /// ```rust
    /// use concurrent_bimap::ConcurrentBiMap;
    /// let map: ConcurrentBiMap<u64, String> = ConcurrentBiMap::new();
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty `ConcurrentBiMap` with room for at least `capacity` pairs.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }

    /// Creates an empty `ConcurrentBiMap` split into `shard_amount` shards.
    ///
    /// More shards means less contention between writers at the cost of memory. Fails with
    /// [`Error::InvalidShardAmount`](crate::Error::InvalidShardAmount) unless `shard_amount` is a
    /// power of two no greater than [`MAX_SHARD_AMOUNT`](crate::MAX_SHARD_AMOUNT).
    ///
    /// # Examples
    /// ```rust
    /// use concurrent_bimap::ConcurrentBiMap;
    /// let map: ConcurrentBiMap<u64, String> = ConcurrentBiMap::with_shard_amount(8).unwrap();
    /// assert_eq!(map.shard_amount(), 8);
    /// assert!(ConcurrentBiMap::<u64, String>::with_shard_amount(6).is_err());
    /// ```
    pub fn with_shard_amount(shard_amount: usize) -> Result<Self> {
        Self::with_capacity_shard_amount_and_hasher(0, shard_amount, DefaultHashBuilder::default())
    }
}

impl<K, V, S> ConcurrentBiMap<K, V, S> {
    /// Creates an empty `ConcurrentBiMap` that uses the given hasher.
    ///
    /// Warning: `hash_builder` is normally randomly generated, and is designed to allow maps to
    /// be resistant to attacks that cause many collisions and very poor performance. Setting it
    /// manually using this function can expose a DoS attack vector.
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::from_store(ConcurrentStore::with_hasher(hash_builder))
    }

    /// Creates an empty `ConcurrentBiMap` with room for at least `capacity` pairs that uses the
    /// given hasher.
    ///
    /// # Examples
    /// ```rust
    /// use concurrent_bimap::ConcurrentBiMap;
    /// use std::collections::hash_map::RandomState;
    ///
    /// let map = ConcurrentBiMap::with_capacity_and_hasher(10, RandomState::new());
    /// map.insert(1, "1");
    /// assert!(map.capacity() >= 10);
    /// ```
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self::from_store(ConcurrentStore::with_capacity_and_hasher(
            capacity,
            hash_builder,
        ))
    }

    /// Creates an empty `ConcurrentBiMap` with the given capacity, shard amount and hasher.
    pub fn with_capacity_shard_amount_and_hasher(
        capacity: usize,
        shard_amount: usize,
        hash_builder: S,
    ) -> Result<Self> {
        ConcurrentStore::with_capacity_shard_amount_and_hasher(capacity, shard_amount, hash_builder)
            .map(Self::from_store)
    }

    fn from_store(store: ConcurrentStore<K, V, S>) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub(crate) fn store(&self) -> &Arc<ConcurrentStore<K, V, S>> {
        &self.store
    }

    /// Returns a reference to the [`BuildHasher`] used by the map
    pub fn hasher(&self) -> &S {
        self.store.hasher()
    }

    /// Returns the number of shards the store is split into
    pub fn shard_amount(&self) -> usize {
        self.store.shard_amount()
    }

    /// Returns the number of pairs the map can hold without reallocating
    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    /// Returns true if both handles share one store, as a map and the inverse of its inverse do.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.store, &other.store)
    }

    /// Returns the number of pairs in the map.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns true if the map holds no pairs
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Removes every pair.
    pub fn clear(&self) {
        self.store.clear()
    }
}

impl<K, V, S> ConcurrentBiMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
    S: BuildHasher,
{
    /// Returns true if the key is in the map. O(1).
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store.contains_key(key)
    }

    /// Returns true if some key maps to the value. This scans the map.
    pub fn contains_value<Q>(&self, value: &Q) -> bool
    where
        V: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        self.store.contains_value(value)
    }

    /// Returns a copy of the value the key maps to.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store.get(key)
    }

    /// Maps the key to the value and returns the key's previous value.
    ///
    /// Other keys already mapped to an equal value keep their pairs.
    ///
    /// # Examples
    /// ```rust
    /// use concurrent_bimap::ConcurrentBiMap;
    ///
    /// let map: ConcurrentBiMap<&str, u64> = ConcurrentBiMap::new();
    /// assert_eq!(map.insert("x", 5), None);
    /// assert_eq!(map.insert("y", 5), None);
    /// assert_eq!(map.insert("x", 6), Some(5));
    /// assert_eq!(map.len(), 2);
    /// ```
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.store.insert(key, value)
    }

    /// Identical to [`insert`](ConcurrentBiMap::insert).
    ///
    /// Unlike bimaps that keep values unique, this does not evict a different key that already
    /// holds the value.
    pub fn force_insert(&self, key: K, value: V) -> Option<V> {
        self.insert(key, value)
    }

    /// Removes the key and returns the value it mapped to.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store.remove(key)
    }

    /// Inserts each pair in turn. Other threads can observe the batch half applied.
    pub fn insert_all<I>(&self, iter: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        self.store.insert_all(iter)
    }

    /// Returns the live set of keys. Removing a key from it removes the pair.
    pub fn key_set(&self) -> KeySet<K, V, S> {
        KeySet::new(Arc::clone(&self.store))
    }

    /// Returns the live values, presented as a set.
    ///
    /// Values may repeat, so the "set" can hold the same value more than once, and removing a
    /// value removes one pair that holds it.
    pub fn values(&self) -> ForwardingSet<Values<K, V, S>> {
        ForwardingSet::new(Values::new(Arc::clone(&self.store)))
    }

    /// Returns the live set of pairs.
    pub fn entry_set(&self) -> EntrySet<K, V, S> {
        EntrySet::new(Arc::clone(&self.store))
    }

    /// Returns the inverse map, which shares this map's store.
    pub fn inverse(&self) -> Inverse<K, V, S> {
        Inverse::new(self.clone())
    }

    /// Returns a weakly consistent iterator over copies of the pairs.
    pub fn iter(&self) -> Iter<K, V, S> {
        self.store.iter()
    }
}

impl<K, V, S> BiMap<K, V> for ConcurrentBiMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
    S: BuildHasher,
{
    type Inverse = Inverse<K, V, S>;
    type KeySet = KeySet<K, V, S>;
    type Values = ForwardingSet<Values<K, V, S>>;
    type EntrySet = EntrySet<K, V, S>;

    fn len(&self) -> usize {
        ConcurrentBiMap::len(self)
    }

    fn is_empty(&self) -> bool {
        ConcurrentBiMap::is_empty(self)
    }

    fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        ConcurrentBiMap::contains_key(self, key)
    }

    fn contains_value<Q>(&self, value: &Q) -> bool
    where
        V: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        ConcurrentBiMap::contains_value(self, value)
    }

    fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        ConcurrentBiMap::get(self, key)
    }

    fn insert(&self, key: K, value: V) -> Option<V> {
        ConcurrentBiMap::insert(self, key, value)
    }

    fn force_insert(&self, key: K, value: V) -> Option<V> {
        ConcurrentBiMap::force_insert(self, key, value)
    }

    fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        ConcurrentBiMap::remove(self, key)
    }

    fn insert_all<I>(&self, iter: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        ConcurrentBiMap::insert_all(self, iter)
    }

    fn clear(&self) {
        ConcurrentBiMap::clear(self)
    }

    fn key_set(&self) -> Self::KeySet {
        ConcurrentBiMap::key_set(self)
    }

    fn values(&self) -> Self::Values {
        ConcurrentBiMap::values(self)
    }

    fn entry_set(&self) -> Self::EntrySet {
        ConcurrentBiMap::entry_set(self)
    }

    fn inverse(&self) -> Self::Inverse {
        ConcurrentBiMap::inverse(self)
    }
}

impl<K, V, S> Clone for ConcurrentBiMap<K, V, S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<K, V, S> Default for ConcurrentBiMap<K, V, S>
where
    S: Default,
{
    fn default() -> Self {
        Self::with_hasher(Default::default())
    }
}

impl<K, V, S> fmt::Debug for ConcurrentBiMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.store, f)
    }
}

impl<K, V, S> PartialEq for ConcurrentBiMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.store.contains_entry(&key, &value))
    }
}

impl<K, V, S> Eq for ConcurrentBiMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
    S: BuildHasher,
{
}

impl<K, V, S> Hash for ConcurrentBiMap<K, V, S>
where
    K: Hash,
    V: Hash,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.store.content_hash());
    }
}

impl<K, V, S> Extend<(K, V)> for ConcurrentBiMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
    S: BuildHasher,
{
    #[inline]
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        self.insert_all(iter);
    }
}

impl<K, V, S> FromIterator<(K, V)> for ConcurrentBiMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
    S: BuildHasher + Default,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let digest = ConcurrentBiMap::default();
        digest.insert_all(iter);
        digest
    }
}

impl<K, V, S> IntoIterator for &ConcurrentBiMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
    S: BuildHasher,
{
    type Item = (K, V);
    type IntoIter = Iter<K, V, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
