use std::{
    fmt,
    hash::{Hash, Hasher},
};

use crate::{error::Result, views::LiveCollection};

/// A live collection presented as a set.
///
/// `ForwardingSet` re-exposes another [`LiveCollection`] under a set's name without copying or
/// converting anything: every call goes straight to the wrapped collection. A map's
/// [`values`](crate::ConcurrentBiMap::values) and its inverse's
/// [`key_set`](crate::Inverse::key_set) are both `ForwardingSet`s over the same value view.
///
/// The wrapper does not deduplicate. Values of a map are not guaranteed distinct, so removing
/// a value through this set removes one pair holding it, not a uniquely identified key.
///
/// # Examples
/// ```rust
/// use concurrent_bimap::{ConcurrentBiMap, LiveCollection};
///
/// let map: ConcurrentBiMap<&str, u64> = ConcurrentBiMap::new();
/// map.insert("a", 1);
/// map.insert("b", 1);
///
/// let values = map.values();
/// assert_eq!(values.len(), 2);
/// assert!(values.remove(&1));
/// assert_eq!(map.len(), 1);
/// assert!(values.add(2).is_err());
/// ```
pub struct ForwardingSet<C> {
    inner: C,
}

impl<C> ForwardingSet<C> {
    /// Wraps a collection
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    /// Returns a reference to the wrapped collection
    pub fn get_ref(&self) -> &C {
        &self.inner
    }

    /// Unwraps the collection
    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<E, C> LiveCollection<E> for ForwardingSet<C>
where
    C: LiveCollection<E>,
{
    type Iter = C::Iter;

    #[inline]
    fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[inline]
    fn contains(&self, item: &E) -> bool {
        self.inner.contains(item)
    }

    #[inline]
    fn iter(&self) -> Self::Iter {
        self.inner.iter()
    }

    #[inline]
    fn to_vec(&self) -> Vec<<Self::Iter as Iterator>::Item> {
        self.inner.to_vec()
    }

    #[inline]
    fn add(&self, item: E) -> Result<bool> {
        self.inner.add(item)
    }

    #[inline]
    fn remove(&self, item: &E) -> bool {
        self.inner.remove(item)
    }

    #[inline]
    fn contains_all(&self, items: &[E]) -> bool {
        self.inner.contains_all(items)
    }

    #[inline]
    fn add_all<I>(&self, items: I) -> Result<bool>
    where
        I: IntoIterator<Item = E>,
    {
        self.inner.add_all(items)
    }

    #[inline]
    fn retain_all(&self, items: &[E]) -> bool {
        self.inner.retain_all(items)
    }

    #[inline]
    fn remove_all(&self, items: &[E]) -> bool {
        self.inner.remove_all(items)
    }

    #[inline]
    fn clear(&self) {
        self.inner.clear()
    }
}

impl<C: Clone> Clone for ForwardingSet<C> {
    fn clone(&self) -> Self {
        Self::new(self.inner.clone())
    }
}

impl<C: PartialEq> PartialEq for ForwardingSet<C> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.eq(&other.inner)
    }
}

impl<C: Eq> Eq for ForwardingSet<C> {}

impl<C: Hash> Hash for ForwardingSet<C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.hash(state)
    }
}

impl<C: fmt::Debug> fmt::Debug for ForwardingSet<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}
