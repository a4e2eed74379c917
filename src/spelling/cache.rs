//! TTL cache for suggestion results.

use std::sync::Arc;
use std::time::Duration;

use ahash::AHashMap;
use parking_lot::Mutex;

use crate::util::clock::Clock;

#[derive(Debug)]
struct Entry<V> {
    value: V,
    generation: u64,
    inserted_at: u64,
}

/// Results keyed by request, valid for a fixed time and only while the
/// index generation they were computed at is current.
#[derive(Debug)]
pub struct SuggestCache<V> {
    entries: Mutex<AHashMap<String, Entry<V>>>,
    ttl_millis: u64,
    capacity: usize,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> SuggestCache<V> {
    /// A cache of at most `capacity` entries; 0 disables it.
    pub fn new(ttl: Duration, capacity: usize, clock: Arc<dyn Clock>) -> Self {
        SuggestCache {
            entries: Mutex::new(AHashMap::new()),
            ttl_millis: u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
            capacity,
            clock,
        }
    }

    pub fn get(&self, key: &str, generation: u64) -> Option<V> {
        let now = self.clock.now_millis();
        let mut entries = self.entries.lock();
        let fresh = match entries.get(key) {
            Some(entry) => entry.generation == generation && !self.expired(entry, now),
            None => return None,
        };
        if !fresh {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn insert(&self, key: String, generation: u64, value: V) {
        if self.capacity == 0 {
            return;
        }
        let now = self.clock.now_millis();
        let mut entries = self.entries.lock();
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            entries.retain(|_, entry| entry.generation == generation && !self.expired(entry, now));
            if entries.len() >= self.capacity {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.inserted_at)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    entries.remove(&oldest);
                }
            }
        }
        entries.insert(
            key,
            Entry {
                value,
                generation,
                inserted_at: now,
            },
        );
    }

    pub fn invalidate(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn expired(&self, entry: &Entry<V>, now: u64) -> bool {
        now.saturating_sub(entry.inserted_at) >= self.ttl_millis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::clock::ManualClock;

    fn new_cache(capacity: usize) -> (SuggestCache<u32>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = SuggestCache::new(Duration::from_secs(10), capacity, clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_ttl_expiry() {
        let (cache, clock) = new_cache(4);
        cache.insert("a".to_string(), 1, 7);
        assert_eq!(cache.get("a", 1), Some(7));

        clock.advance(Duration::from_secs(9));
        assert_eq!(cache.get("a", 1), Some(7));
        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get("a", 1), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_generation_mismatch() {
        let (cache, _) = new_cache(4);
        cache.insert("a".to_string(), 1, 7);
        assert_eq!(cache.get("a", 2), None);
        assert_eq!(cache.get("a", 1), None);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let (cache, clock) = new_cache(2);
        cache.insert("a".to_string(), 1, 1);
        clock.advance(Duration::from_millis(1));
        cache.insert("b".to_string(), 1, 2);
        clock.advance(Duration::from_millis(1));
        cache.insert("c".to_string(), 1, 3);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a", 1), None);
        assert_eq!(cache.get("c", 1), Some(3));

        let (disabled, _) = new_cache(0);
        disabled.insert("a".to_string(), 1, 1);
        assert!(disabled.is_empty());
    }
}
