use std::{
    fmt,
    hash::{BuildHasher, Hash, Hasher},
    iter::FusedIterator,
    mem,
};

use hashbrown::hash_map::DefaultHashBuilder;
use tracing::trace;

use crate::{
    error::Result,
    views::{Entry, EntryIter, EntrySet, LiveCollection},
};

/// The live set of pairs of an [`Inverse`](crate::Inverse) map.
///
/// Wraps the forward map's [`EntrySet`] and swaps every pair on the way in and out: queries
/// take `(value, key)` tuples and iteration yields [`InverseEntry`] handles. Nothing is copied
/// into a second collection.
///
/// Queries (`contains`, `remove`, `contains_all`, `retain_all`, `remove_all`) scan the backing
/// pairs for a swapped match, so each costs the size of the map times the number of queried
/// pairs. None of them are atomic: the pair found by a scan can change before it is acted on.
pub struct InverseEntrySet<K, V, S = DefaultHashBuilder> {
    backing: EntrySet<K, V, S>,
}

impl<K, V, S> InverseEntrySet<K, V, S> {
    pub(crate) fn new(backing: EntrySet<K, V, S>) -> Self {
        Self { backing }
    }
}

impl<K, V, S> InverseEntrySet<K, V, S>
where
    K: Eq,
    V: Eq,
{
    // Looks for a backing pair `(key, value)` matching a queried `(value, key)`
    fn scan_swapped(&self, value: &V, key: &K) -> bool {
        self.backing
            .store()
            .find_map(|k, v| (k == key && v == value).then_some(()))
            .is_some()
    }
}

impl<K, V, S> LiveCollection<(V, K)> for InverseEntrySet<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Eq + Clone,
    S: BuildHasher,
{
    type Iter = InverseEntryIter<K, V, S>;

    fn len(&self) -> usize {
        self.backing.len()
    }

    fn contains(&self, (value, key): &(V, K)) -> bool {
        self.scan_swapped(value, key)
    }

    fn iter(&self) -> Self::Iter {
        InverseEntryIter {
            inner: self.backing.iter(),
        }
    }

    fn add(&self, (value, key): (V, K)) -> Result<bool> {
        self.backing.add((key, value))
    }

    fn remove(&self, (value, key): &(V, K)) -> bool {
        self.scan_swapped(value, key) && self.backing.store().remove_if(key, value)
    }

    fn retain_all(&self, items: &[(V, K)]) -> bool {
        self.backing
            .store()
            .retain(|key, value| items.iter().any(|(v, k)| k == key && v == value))
    }

    fn remove_all(&self, items: &[(V, K)]) -> bool {
        self.backing
            .store()
            .retain(|key, value| !items.iter().any(|(v, k)| k == key && v == value))
    }

    fn clear(&self) {
        self.backing.clear()
    }
}

impl<K, V, S> Clone for InverseEntrySet<K, V, S> {
    fn clone(&self) -> Self {
        Self::new(self.backing.clone())
    }
}

impl<K, V, S> PartialEq for InverseEntrySet<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Eq + Clone,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.backing == other.backing
    }
}

impl<K: Hash, V: Hash, S> Hash for InverseEntrySet<K, V, S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.backing.hash(state)
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for InverseEntrySet<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        self.backing.store().for_each(|key, value| {
            map.entry(value, key);
        });
        map.finish()
    }
}

/// Iterator over the [`InverseEntry`] handles of an [`InverseEntrySet`]
#[derive(Debug)]
pub struct InverseEntryIter<K, V, S = DefaultHashBuilder> {
    inner: EntryIter<K, V, S>,
}

impl<K: Clone, V: Clone, S> Iterator for InverseEntryIter<K, V, S> {
    type Item = InverseEntry<K, V, S>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|backing| InverseEntry { backing })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: Clone, V: Clone, S> FusedIterator for InverseEntryIter<K, V, S> {}

/// A handle to one pair of an inverse map.
///
/// The handle reads through to a forward [`Entry`]: its key is the forward value and its value
/// is the forward key.
pub struct InverseEntry<K, V, S = DefaultHashBuilder> {
    backing: Entry<K, V, S>,
}

impl<K, V, S> InverseEntry<K, V, S> {
    /// The key of the pair, which is the forward map's value
    pub fn key(&self) -> &V {
        self.backing.value()
    }

    /// The value of the pair, which is the forward map's key
    pub fn value(&self) -> &K {
        self.backing.key()
    }

    /// Consumes the handle and returns the `(value, key)` pair
    pub fn into_pair(self) -> (V, K) {
        let (key, value) = self.backing.into_pair();
        (value, key)
    }
}

impl<K, V, S> InverseEntry<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Eq + Clone,
    S: BuildHasher,
{
    /// Re-keys the forward pair: removes `(old_key, value)` from the store, inserts
    /// `(key, value)`, and returns the old key.
    ///
    /// This is a removal followed by an insertion, not an update in place. Any other handle to
    /// the old forward pair is stale afterwards; this handle follows the new pair.
    ///
    /// # Examples
    /// ```rust
    /// use concurrent_bimap::{ConcurrentBiMap, LiveCollection};
    ///
    /// let map: ConcurrentBiMap<String, u64> = ConcurrentBiMap::new();
    /// map.insert("one".to_string(), 1);
    ///
    /// let mut entry = map.inverse().entry_set().iter().next().unwrap();
    /// assert_eq!(entry.set_value("uno".to_string()), "one");
    /// assert_eq!(map.get("uno"), Some(1));
    /// assert!(!map.contains_key("one"));
    /// ```
    pub fn set_value(&mut self, key: K) -> K {
        let store = &self.backing.store;
        store.remove_if(&self.backing.key, &self.backing.value);
        store.insert(key.clone(), self.backing.value.clone());
        trace!("re-keyed a pair through the inverse entry set");
        mem::replace(&mut self.backing.key, key)
    }
}

impl<K: PartialEq, V: PartialEq, S> PartialEq for InverseEntry<K, V, S> {
    fn eq(&self, other: &Self) -> bool {
        self.backing == other.backing
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for InverseEntry<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("InverseEntry")
            .field(self.key())
            .field(self.value())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::ConcurrentStore;

    fn construct_entries() -> (Arc<ConcurrentStore<String, u64>>, InverseEntrySet<String, u64>) {
        let store = Arc::new(ConcurrentStore::default());
        store.insert_all((0..5).map(|i| (i.to_string(), i)));
        let entries = InverseEntrySet::new(EntrySet::new(Arc::clone(&store)));
        (store, entries)
    }

    #[test]
    fn swapped_queries() {
        let (store, entries) = construct_entries();
        assert_eq!(entries.len(), 5);
        assert!(entries.contains(&(1, "1".to_string())));
        assert!(!entries.contains(&(1, "2".to_string())));
        assert!(entries.contains_all(&[(1, "1".to_string()), (2, "2".to_string())]));
        assert!(!entries.contains_all(&[(1, "1".to_string()), (2, "1".to_string())]));
        assert!(!entries.remove(&(1, "2".to_string())));
        assert!(entries.remove(&(1, "1".to_string())));
        assert!(!store.contains_key("1"));
        assert_eq!(entries.add((9, "9".to_string())), Ok(true));
        assert_eq!(store.get("9"), Some(9));
    }

    #[test]
    fn bulk_removal() {
        let (store, entries) = construct_entries();
        assert!(entries.remove_all(&[(0, "0".to_string()), (1, "9".to_string())]));
        assert_eq!(store.len(), 4);
        assert!(entries.retain_all(&[(2, "2".to_string()), (3, "3".to_string())]));
        assert_eq!(store.len(), 2);
        assert!(!entries.retain_all(&[(2, "2".to_string()), (3, "3".to_string())]));
    }

    #[test]
    fn iteration_swaps_pairs() {
        let (_store, entries) = construct_entries();
        let mut pairs: Vec<(u64, String)> = entries.iter().map(InverseEntry::into_pair).collect();
        pairs.sort();
        let expected: Vec<(u64, String)> = (0..5).map(|i| (i, i.to_string())).collect();
        assert_eq!(pairs, expected);
        assert_eq!(entries.to_vec().len(), 5);
    }

    #[test]
    fn set_value_rekeys() {
        let (store, entries) = construct_entries();
        let mut entry = entries
            .iter()
            .find(|e| *e.key() == 2)
            .expect("2 is present");
        assert_eq!(entry.set_value("two".to_string()), "2");
        assert_eq!(entry.value(), "two");
        assert_eq!(store.get("two"), Some(2));
        assert!(!store.contains_key("2"));
        assert_eq!(store.len(), 5);
    }
}
