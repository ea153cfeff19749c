use crate::resolver::SearchOrigin;

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Addresses already geocoded by one geocoder instance.
pub struct GeocodeCache {
    entries: Mutex<LruCache<String, SearchOrigin>>,
}

impl GeocodeCache {
    pub fn new(capacity: usize) -> Self {
        let cache_size = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(cache_size)),
        }
    }

    pub fn check_cache(&self, address: &str) -> Option<SearchOrigin> {
        let mut cache = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        cache.get(address).copied()
    }

    pub fn insert_into_cache(&self, address: String, origin: SearchOrigin) {
        let mut cache = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        cache.put(address, origin);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
