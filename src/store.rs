use std::{
    borrow::Borrow,
    fmt,
    hash::{BuildHasher, Hash},
    iter::FusedIterator,
    mem,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
    vec,
};

use hashbrown::{hash_map::DefaultHashBuilder, HashTable};
use tracing::debug;

use crate::{
    error::{Error, Result},
    utils::*,
};

/// The largest number of shards a [`ConcurrentStore`] can be split into.
pub const MAX_SHARD_AMOUNT: usize = 1 << 16;

// Shards are picked from hash bits that hashbrown uses for neither bucket indices nor control
// tags, so every shard's table still sees well-spread hashes.
const SHARD_BITS_OFFSET: u32 = 40;

/// The shard amount used when none is given: four shards per available core, rounded up to a
/// power of two.
pub fn default_shard_amount() -> usize {
    std::thread::available_parallelism()
        .map_or(1, usize::from)
        .saturating_mul(4)
        .next_power_of_two()
        .min(MAX_SHARD_AMOUNT)
}

fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Thread-safe key/value storage, and the only place a bimap's data lives.
///
/// Keys are unique, values are not. The store is split into a fixed number of shards, each a
/// hash table behind its own [`RwLock`]. A key's hash picks its shard, so readers never wait on
/// writers touching other shards and a write only locks the shard that holds the key. Gets,
/// inserts and removals by key are expected O(1); anything keyed by value is an O(n) scan.
///
/// A panic inside a user `Eq` or `Hash` impl while a shard is locked does not poison the store.
///
/// Iteration is weakly consistent: iterators snapshot one shard at a time, never fail under
/// concurrent modification, and may or may not observe changes made while they run.
pub struct ConcurrentStore<K, V, S = DefaultHashBuilder> {
    hash_builder: S,
    shards: Box<[RwLock<HashTable<(K, V)>>]>,
}

impl<K, V, S> ConcurrentStore<K, V, S> {
    /// Creates a store with the default shard amount that uses the given hasher.
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_capacity_and_hasher(0, hash_builder)
    }

    /// Creates a store with the default shard amount, room for at least `capacity` pairs, and
    /// the given hasher.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self::build(capacity, default_shard_amount(), hash_builder)
    }

    /// Creates a store split into `shard_amount` shards.
    ///
    /// Fails with [`Error::InvalidShardAmount`] unless `shard_amount` is a power of two no
    /// greater than [`MAX_SHARD_AMOUNT`].
    pub fn with_capacity_shard_amount_and_hasher(
        capacity: usize,
        shard_amount: usize,
        hash_builder: S,
    ) -> Result<Self> {
        if !shard_amount.is_power_of_two() || shard_amount > MAX_SHARD_AMOUNT {
            return Err(Error::InvalidShardAmount(shard_amount));
        }
        Ok(Self::build(capacity, shard_amount, hash_builder))
    }

    fn build(capacity: usize, shard_amount: usize, hash_builder: S) -> Self {
        debug!(shard_amount, capacity, "creating concurrent store");
        let per_shard = capacity.div_ceil(shard_amount);
        let shards = (0..shard_amount)
            .map(|_| RwLock::new(HashTable::with_capacity(per_shard)))
            .collect();
        Self {
            hash_builder,
            shards,
        }
    }

    /// Returns a reference to the [`BuildHasher`] used by the store
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Returns the number of shards the store is split into
    pub fn shard_amount(&self) -> usize {
        self.shards.len()
    }

    /// Returns the number of pairs the store can hold without reallocating any shard, assuming
    /// pairs spread evenly.
    pub fn capacity(&self) -> usize {
        self.shards.iter().map(|shard| read_lock(shard).capacity()).sum()
    }

    /// Returns the number of pairs in the store.
    ///
    /// Shards are counted one after the other, so a concurrent writer can make the total
    /// momentarily disagree with any single instant.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| read_lock(shard).len()).sum()
    }

    /// Returns true if the store holds no pairs
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| read_lock(shard).is_empty())
    }

    /// Removes every pair, shard by shard, keeping the allocated memory.
    pub fn clear(&self) {
        for shard in self.shards.iter() {
            write_lock(shard).clear();
        }
    }

    /// Runs `f` on every pair, holding one shard's read lock at a time.
    pub(crate) fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V),
    {
        for shard in self.shards.iter() {
            for (key, value) in read_lock(shard).iter() {
                f(key, value);
            }
        }
    }

    /// Returns the first `Some` produced by `f`, holding one shard's read lock at a time.
    ///
    /// `f` must not touch the store.
    pub(crate) fn find_map<R, F>(&self, mut f: F) -> Option<R>
    where
        F: FnMut(&K, &V) -> Option<R>,
    {
        self.shards
            .iter()
            .find_map(|shard| read_lock(shard).iter().find_map(|(key, value)| f(key, value)))
    }

    /// Keeps only the pairs for which `f` returns true. Returns true if anything was removed.
    ///
    /// Each shard is filtered under its write lock; shards are visited one after the other.
    pub(crate) fn retain<F>(&self, mut f: F) -> bool
    where
        F: FnMut(&K, &V) -> bool,
    {
        let mut modified = false;
        for shard in self.shards.iter() {
            write_lock(shard).retain(|pair| {
                let keep = f(&pair.0, &pair.1);
                modified |= !keep;
                keep
            });
        }
        modified
    }

    fn snapshot_shard(&self, index: usize) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        read_lock(&self.shards[index]).iter().cloned().collect()
    }

    fn shard_index(&self, hash: u64) -> usize {
        ((hash >> SHARD_BITS_OFFSET) as usize) & (self.shards.len() - 1)
    }

    fn read_shard(&self, hash: u64) -> RwLockReadGuard<'_, HashTable<(K, V)>> {
        read_lock(&self.shards[self.shard_index(hash)])
    }

    fn write_shard(&self, hash: u64) -> RwLockWriteGuard<'_, HashTable<(K, V)>> {
        write_lock(&self.shards[self.shard_index(hash)])
    }
}

impl<K, V, S> ConcurrentStore<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Returns true if the key is in the store. O(1).
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = make_hash::<Q, S>(&self.hash_builder, key);
        self.read_shard(hash)
            .find(hash, equivalent_key(key))
            .is_some()
    }

    /// Returns true if some key maps to the value. O(n).
    pub fn contains_value<W>(&self, value: &W) -> bool
    where
        V: Borrow<W>,
        W: Eq + ?Sized,
    {
        self.find_map(|_, v| value.eq(v.borrow()).then_some(()))
            .is_some()
    }

    /// Returns true if the key is present and mapped to the value. O(1).
    pub fn contains_entry<Q, W>(&self, key: &Q, value: &W) -> bool
    where
        K: Borrow<Q>,
        V: Borrow<W>,
        Q: Hash + Eq + ?Sized,
        W: Eq + ?Sized,
    {
        let hash = make_hash::<Q, S>(&self.hash_builder, key);
        self.read_shard(hash)
            .find(hash, equivalent_pair(key, value))
            .is_some()
    }

    /// Returns a copy of the value the key maps to.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        let hash = make_hash::<Q, S>(&self.hash_builder, key);
        self.read_shard(hash)
            .find(hash, equivalent_key(key))
            .map(|(_, value)| value.clone())
    }

    /// Returns a copy of the first key found that maps to the value. O(n).
    ///
    /// Which key is "first" is unspecified when several keys share the value.
    pub fn find_key<W>(&self, value: &W) -> Option<K>
    where
        K: Clone,
        V: Borrow<W>,
        W: Eq + ?Sized,
    {
        self.find_map(|k, v| value.eq(v.borrow()).then(|| k.clone()))
    }

    /// Maps the key to the value, returning the value it replaced (if any).
    ///
    /// Other keys that already map to an equal value are left alone.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        let hash = make_hash::<K, S>(&self.hash_builder, &key);
        let mut shard = self.write_shard(hash);
        match shard.find_mut(hash, equivalent_key(&key)) {
            Some((_, slot)) => Some(mem::replace(slot, value)),
            None => {
                shard.insert_unique(hash, (key, value), make_hasher::<K, V, S>(&self.hash_builder));
                None
            }
        }
    }

    /// Inserts every pair in turn. This is not one atomic batch.
    pub fn insert_all<I>(&self, iter: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }

    /// Removes the key, returning the value it mapped to.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes the key, returning the stored pair.
    pub fn remove_entry<Q>(&self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = make_hash::<Q, S>(&self.hash_builder, key);
        let mut shard = self.write_shard(hash);
        let (pair, _) = shard.find_entry(hash, equivalent_key(key)).ok()?.remove();
        Some(pair)
    }

    /// Removes the key only if it maps to the value. Returns true if a pair was removed.
    pub fn remove_if<Q, W>(&self, key: &Q, value: &W) -> bool
    where
        K: Borrow<Q>,
        V: Borrow<W>,
        Q: Hash + Eq + ?Sized,
        W: Eq + ?Sized,
    {
        let hash = make_hash::<Q, S>(&self.hash_builder, key);
        let mut shard = self.write_shard(hash);
        match shard.find_entry(hash, equivalent_pair(key, value)) {
            Ok(entry) => {
                entry.remove();
                true
            }
            Err(_) => false,
        }
    }

    /// Returns a weakly consistent iterator over copies of the stored pairs.
    pub fn iter(self: &Arc<Self>) -> Iter<K, V, S>
    where
        K: Clone,
        V: Clone,
    {
        Iter {
            store: Arc::clone(self),
            next_shard: 0,
            current: Vec::new().into_iter(),
        }
    }
}

impl<K, V, S> ConcurrentStore<K, V, S>
where
    K: Hash,
    V: Hash,
{
    // Order independent, so it only depends on which pairs are present.
    pub(crate) fn content_hash(&self) -> u64 {
        let mut sum = 0u64;
        self.for_each(|key, value| sum = sum.wrapping_add(entry_hash(key, value)));
        sum
    }
}

impl<K, V, S> Default for ConcurrentStore<K, V, S>
where
    S: Default,
{
    fn default() -> Self {
        Self::with_hasher(Default::default())
    }
}

impl<K, V, S> fmt::Debug for ConcurrentStore<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        self.for_each(|key, value| {
            map.entry(key, value);
        });
        map.finish()
    }
}

/// A weakly consistent iterator over copies of the pairs of a [`ConcurrentStore`].
///
/// The iterator copies out one shard at a time and holds no lock between calls to `next`.
pub struct Iter<K, V, S = DefaultHashBuilder> {
    store: Arc<ConcurrentStore<K, V, S>>,
    next_shard: usize,
    current: vec::IntoIter<(K, V)>,
}

impl<K, V, S> Iter<K, V, S> {
    pub(crate) fn store(&self) -> &Arc<ConcurrentStore<K, V, S>> {
        &self.store
    }
}

impl<K, V, S> Iterator for Iter<K, V, S>
where
    K: Clone,
    V: Clone,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(pair) = self.current.next() {
                return Some(pair);
            }
            if self.next_shard >= self.store.shards.len() {
                return None;
            }
            self.current = self.store.snapshot_shard(self.next_shard).into_iter();
            self.next_shard += 1;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        // Later shards can grow before they are reached
        (self.current.len(), None)
    }
}

impl<K: Clone, V: Clone, S> FusedIterator for Iter<K, V, S> {}

impl<K, V, S> fmt::Debug for Iter<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter")
            .field("next_shard", &self.next_shard)
            .field("buffered", &self.current.len())
            .finish()
    }
}
