use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;

/// Bounded record of keys that have already been acted on. Only the first
/// sighting of a key reports `true`; the least recently seen key is evicted
/// once `capacity` is reached.
pub struct SeenSet<K> {
    cache: LruCache<K, ()>,
}

impl<K> SeenSet<K>
where
    K: Hash + Eq,
{
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
        }
    }

    pub fn first_sighting(&mut self, key: K) -> bool {
        if self.cache.get(&key).is_some() {
            return false;
        }
        self.cache.put(key, ());
        true
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
