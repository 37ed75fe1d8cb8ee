use std::{
    fmt,
    hash::{BuildHasher, Hash, Hasher},
    iter::FusedIterator,
    mem,
    sync::Arc,
};

use hashbrown::hash_map::DefaultHashBuilder;
use tracing::trace;

use crate::{
    error::{Error, Result},
    store::{ConcurrentStore, Iter},
    utils::*,
};

/// A live collection backed by a map's store.
///
/// Every method reads or writes the store directly, so changes made through one view are seen
/// by every other view and facade over the same store. Nothing is cached. Methods take `&self`
/// since the store does its own locking.
///
/// Bulk methods (`contains_all`, `add_all`, `retain_all`, `remove_all`) are not atomic; other
/// threads can observe them half done.
pub trait LiveCollection<E> {
    /// The iterator returned by [`iter`](LiveCollection::iter)
    type Iter: Iterator;

    /// Returns the number of elements
    fn len(&self) -> usize;

    /// Returns true if there are no elements
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if the element is present
    fn contains(&self, item: &E) -> bool;

    /// Returns a weakly consistent iterator over the elements
    fn iter(&self) -> Self::Iter;

    /// Collects what [`iter`](LiveCollection::iter) yields.
    fn to_vec(&self) -> Vec<<Self::Iter as Iterator>::Item> {
        self.iter().collect()
    }

    /// Adds the element. Returns whether the collection changed, or an error if the collection
    /// cannot accept bare elements.
    fn add(&self, item: E) -> Result<bool>;

    /// Removes one occurrence of the element. Returns true if something was removed.
    fn remove(&self, item: &E) -> bool;

    /// Returns true if every given element is present
    fn contains_all(&self, items: &[E]) -> bool {
        items.iter().all(|item| self.contains(item))
    }

    /// Adds each element in turn, stopping at the first error.
    fn add_all<I>(&self, items: I) -> Result<bool>
    where
        I: IntoIterator<Item = E>,
    {
        let mut added = false;
        for item in items {
            added |= self.add(item)?;
        }
        Ok(added)
    }

    /// Removes every element not among `items`. Returns true if something was removed.
    fn retain_all(&self, items: &[E]) -> bool;

    /// Removes every element among `items`. Returns true if something was removed.
    fn remove_all(&self, items: &[E]) -> bool;

    /// Removes every element (and so every pair of the backing map)
    fn clear(&self);
}

/// A handle to one pair of a map, as yielded by an [`EntrySet`].
///
/// The handle holds copies of the key and value taken when it was yielded. [`set_value`]
/// writes through to the store.
///
/// [`set_value`]: Entry::set_value
pub struct Entry<K, V, S = DefaultHashBuilder> {
    pub(crate) store: Arc<ConcurrentStore<K, V, S>>,
    pub(crate) key: K,
    pub(crate) value: V,
}

impl<K, V, S> Entry<K, V, S> {
    /// The key of the pair
    pub fn key(&self) -> &K {
        &self.key
    }

    /// The value of the pair, as of when the handle was made or last updated
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Consumes the handle and returns the pair
    pub fn into_pair(self) -> (K, V) {
        (self.key, self.value)
    }
}

impl<K, V, S> Entry<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher,
{
    /// Maps the entry's key to a new value in the store and returns the old value.
    pub fn set_value(&mut self, value: V) -> V {
        self.store.insert(self.key.clone(), value.clone());
        mem::replace(&mut self.value, value)
    }
}

impl<K: PartialEq, V: PartialEq, S> PartialEq for Entry<K, V, S> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.value == other.value
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for Entry<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Entry")
            .field(&self.key)
            .field(&self.value)
            .finish()
    }
}

/// The live set of keys of a map.
///
/// Removing a key removes its pair. Keys cannot be added without a value, so
/// [`add`](LiveCollection::add) always fails with [`Error::Unsupported`].
pub struct KeySet<K, V, S = DefaultHashBuilder> {
    store: Arc<ConcurrentStore<K, V, S>>,
}

impl<K, V, S> KeySet<K, V, S> {
    pub(crate) fn new(store: Arc<ConcurrentStore<K, V, S>>) -> Self {
        Self { store }
    }
}

impl<K, V, S> LiveCollection<K> for KeySet<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher,
{
    type Iter = Keys<K, V, S>;

    fn len(&self) -> usize {
        self.store.len()
    }

    fn contains(&self, item: &K) -> bool {
        self.store.contains_key(item)
    }

    fn iter(&self) -> Self::Iter {
        Keys {
            inner: self.store.iter(),
        }
    }

    fn add(&self, _item: K) -> Result<bool> {
        Err(Error::Unsupported {
            view: "key set",
            operation: "add",
        })
    }

    fn remove(&self, item: &K) -> bool {
        self.store.remove(item).is_some()
    }

    fn retain_all(&self, items: &[K]) -> bool {
        self.store.retain(|key, _| items.contains(key))
    }

    fn remove_all(&self, items: &[K]) -> bool {
        self.store.retain(|key, _| !items.contains(key))
    }

    fn clear(&self) {
        self.store.clear()
    }
}

impl<K, V, S> Clone for KeySet<K, V, S> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.store))
    }
}

impl<K, V, S> PartialEq for KeySet<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.store, &other.store) {
            return true;
        }
        self.len() == other.len() && self.iter().all(|key| other.contains(&key))
    }
}

impl<K, V, S> Hash for KeySet<K, V, S>
where
    K: Hash,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut sum = 0u64;
        self.store
            .for_each(|key, _| sum = sum.wrapping_add(fixed_hash(key)));
        state.write_u64(sum);
    }
}

impl<K: fmt::Debug, V, S> fmt::Debug for KeySet<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        self.store.for_each(|key, _| {
            set.entry(key);
        });
        set.finish()
    }
}

/// The live collection of values of a map.
///
/// Values are not distinct, so this is a multiset: [`remove`](LiveCollection::remove) drops the
/// pair of one key that maps to the value, found by scanning. Values cannot be added without a
/// key, so [`add`](LiveCollection::add) always fails with [`Error::Unsupported`].
pub struct Values<K, V, S = DefaultHashBuilder> {
    store: Arc<ConcurrentStore<K, V, S>>,
}

impl<K, V, S> Values<K, V, S> {
    pub(crate) fn new(store: Arc<ConcurrentStore<K, V, S>>) -> Self {
        Self { store }
    }
}

impl<K, V, S> LiveCollection<V> for Values<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Eq + Clone,
    S: BuildHasher,
{
    type Iter = ValuesIter<K, V, S>;

    fn len(&self) -> usize {
        self.store.len()
    }

    fn contains(&self, item: &V) -> bool {
        self.store.contains_value(item)
    }

    fn iter(&self) -> Self::Iter {
        ValuesIter {
            inner: self.store.iter(),
        }
    }

    fn add(&self, _item: V) -> Result<bool> {
        Err(Error::Unsupported {
            view: "values",
            operation: "add",
        })
    }

    // Scan, then remove by key. A writer can slip in between the two.
    fn remove(&self, item: &V) -> bool {
        let Some(key) = self.store.find_key(item) else {
            return false;
        };
        let removed = self.store.remove(&key).is_some();
        if !removed {
            trace!("key holding the value was removed before the value could be");
        }
        removed
    }

    fn retain_all(&self, items: &[V]) -> bool {
        self.store.retain(|_, value| items.contains(value))
    }

    fn remove_all(&self, items: &[V]) -> bool {
        self.store.retain(|_, value| !items.contains(value))
    }

    fn clear(&self) {
        self.store.clear()
    }
}

impl<K, V, S> Clone for Values<K, V, S> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.store))
    }
}

impl<K, V, S> PartialEq for Values<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.store, &other.store) {
            return true;
        }
        same_multiset(self.iter(), other.iter())
    }
}

impl<K, V, S> Hash for Values<K, V, S>
where
    V: Hash,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut sum = 0u64;
        self.store
            .for_each(|_, value| sum = sum.wrapping_add(fixed_hash(value)));
        state.write_u64(sum);
    }
}

impl<K, V: fmt::Debug, S> fmt::Debug for Values<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        self.store.for_each(|_, value| {
            list.entry(value);
        });
        list.finish()
    }
}

/// The live set of pairs of a map, yielding [`Entry`] handles.
///
/// Queries take plain `(key, value)` tuples. Adding a pair maps its key to its value.
pub struct EntrySet<K, V, S = DefaultHashBuilder> {
    store: Arc<ConcurrentStore<K, V, S>>,
}

impl<K, V, S> EntrySet<K, V, S> {
    pub(crate) fn new(store: Arc<ConcurrentStore<K, V, S>>) -> Self {
        Self { store }
    }

    pub(crate) fn store(&self) -> &Arc<ConcurrentStore<K, V, S>> {
        &self.store
    }
}

impl<K, V, S> LiveCollection<(K, V)> for EntrySet<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Eq + Clone,
    S: BuildHasher,
{
    type Iter = EntryIter<K, V, S>;

    fn len(&self) -> usize {
        self.store.len()
    }

    fn contains(&self, (key, value): &(K, V)) -> bool {
        self.store.contains_entry(key, value)
    }

    fn iter(&self) -> Self::Iter {
        EntryIter {
            inner: self.store.iter(),
        }
    }

    /// Returns true if the key was not in the map before
    fn add(&self, (key, value): (K, V)) -> Result<bool> {
        Ok(self.store.insert(key, value).is_none())
    }

    fn remove(&self, (key, value): &(K, V)) -> bool {
        self.store.remove_if(key, value)
    }

    fn retain_all(&self, items: &[(K, V)]) -> bool {
        self.store
            .retain(|key, value| items.iter().any(|(k, v)| k == key && v == value))
    }

    fn remove_all(&self, items: &[(K, V)]) -> bool {
        items
            .iter()
            .fold(false, |removed, (key, value)| self.store.remove_if(key, value) | removed)
    }

    fn clear(&self) {
        self.store.clear()
    }
}

impl<K, V, S> Clone for EntrySet<K, V, S> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.store))
    }
}

impl<K, V, S> PartialEq for EntrySet<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Eq + Clone,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.store, &other.store) {
            return true;
        }
        self.len() == other.len()
            && self
                .store
                .iter()
                .all(|(key, value)| other.store.contains_entry(&key, &value))
    }
}

impl<K: Hash, V: Hash, S> Hash for EntrySet<K, V, S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.store.content_hash());
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for EntrySet<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.store, f)
    }
}

/// Iterator over the keys of a [`KeySet`]
#[derive(Debug)]
pub struct Keys<K, V, S = DefaultHashBuilder> {
    inner: Iter<K, V, S>,
}

impl<K: Clone, V: Clone, S> Iterator for Keys<K, V, S> {
    type Item = K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: Clone, V: Clone, S> FusedIterator for Keys<K, V, S> {}

/// Iterator over the values of a [`Values`] view
#[derive(Debug)]
pub struct ValuesIter<K, V, S = DefaultHashBuilder> {
    inner: Iter<K, V, S>,
}

impl<K: Clone, V: Clone, S> Iterator for ValuesIter<K, V, S> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: Clone, V: Clone, S> FusedIterator for ValuesIter<K, V, S> {}

/// Iterator over the [`Entry`] handles of an [`EntrySet`]
#[derive(Debug)]
pub struct EntryIter<K, V, S = DefaultHashBuilder> {
    inner: Iter<K, V, S>,
}

impl<K: Clone, V: Clone, S> Iterator for EntryIter<K, V, S> {
    type Item = Entry<K, V, S>;

    fn next(&mut self) -> Option<Self::Item> {
        let (key, value) = self.inner.next()?;
        Some(Entry {
            store: Arc::clone(self.inner.store()),
            key,
            value,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: Clone, V: Clone, S> FusedIterator for EntryIter<K, V, S> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn construct_store() -> Arc<ConcurrentStore<String, u64>> {
        let store = Arc::new(ConcurrentStore::default());
        store.insert_all((0..10).map(|i| (i.to_string(), i)));
        store
    }

    #[test]
    fn key_set_is_live() {
        let store = construct_store();
        let keys = KeySet::new(Arc::clone(&store));
        assert_eq!(keys.len(), 10);
        store.insert("10".to_string(), 10);
        assert!(keys.contains(&"10".to_string()));
        assert!(keys.remove(&"10".to_string()));
        assert!(!store.contains_key("10"));
        assert!(keys.add("11".to_string()).is_err());
        assert!(keys.remove_all(&["0".to_string(), "1".to_string()]));
        assert_eq!(store.len(), 8);
        assert!(keys.retain_all(&["2".to_string()]));
        assert_eq!(keys.to_vec(), vec!["2".to_string()]);
    }

    #[test]
    fn values_remove_one_pair() {
        let store = construct_store();
        store.insert("ten".to_string(), 5);
        let values = Values::new(Arc::clone(&store));
        assert!(values.remove(&5));
        assert_eq!(store.len(), 10);
        assert!(values.contains(&5));
        assert!(values.remove(&5));
        assert!(!values.contains(&5));
        assert!(!values.remove(&5));
    }

    #[test]
    fn values_remove_all_occurrences() {
        let store = construct_store();
        store.insert("ten".to_string(), 5);
        let values = Values::new(Arc::clone(&store));
        assert!(values.remove_all(&[5]));
        assert_eq!(store.len(), 9);
        assert_eq!(values.add(5), Err(Error::Unsupported { view: "values", operation: "add" }));
    }

    #[test]
    fn entry_handles_write_through() {
        let store = construct_store();
        let entries = EntrySet::new(Arc::clone(&store));
        let mut entry = entries
            .iter()
            .find(|e| e.key() == "3")
            .expect("3 is present");
        assert_eq!(entry.set_value(33), 3);
        assert_eq!(entry.value(), &33);
        assert_eq!(store.get("3"), Some(33));
    }

    #[test]
    fn entry_set_queries() {
        let store = construct_store();
        let entries = EntrySet::new(Arc::clone(&store));
        assert!(entries.contains(&("1".to_string(), 1)));
        assert!(!entries.contains(&("1".to_string(), 2)));
        assert!(!entries.remove(&("1".to_string(), 2)));
        assert!(entries.remove(&("1".to_string(), 1)));
        assert_eq!(entries.add(("1".to_string(), 1)), Ok(true));
        assert_eq!(entries.add(("1".to_string(), 2)), Ok(false));
        assert!(entries.retain_all(&[("1".to_string(), 2), ("2".to_string(), 2)]));
        assert_eq!(entries.len(), 2);
    }
}
