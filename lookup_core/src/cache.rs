use config_manager::CacheConfig;
use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

/// Time source for expiry checks
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut offset) = self.offset.lock() {
            *offset += by;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = self.offset.lock().map(|o| *o).unwrap_or_default();
        self.base + offset
    }
}

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// Bounded map whose entries expire a fixed time after insertion.
/// Least recently used entries are evicted when capacity is reached.
pub struct TtlCache<K, V> {
    entries: Mutex<LruCache<K, Entry<V>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + std::fmt::Debug,
    V: Clone,
{
    pub fn new(capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self::with_clock(capacity, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(capacity: NonZeroUsize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
            clock,
        }
    }

    /// Build from validated configuration; zero capacity is clamped to one
    pub fn from_config(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let capacity = NonZeroUsize::new(config.capacity).unwrap_or(NonZeroUsize::MIN);
        Self::with_clock(capacity, Duration::from_secs(config.ttl_seconds), clock)
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().ok()?;

        let expired = match entries.get(key) {
            Some(entry) if entry.expires_at > now => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            debug!("Cache entry expired: {:?}", key);
            entries.pop(key);
        }
        None
    }

    pub fn insert(&self, key: K, value: V) {
        let expires_at = self.clock.now() + self.ttl;
        if let Ok(mut entries) = self.entries.lock() {
            if let Some((evicted, _)) = entries.push(key, Entry { value, expires_at }) {
                debug!("Cache full, evicted: {:?}", evicted);
            }
        }
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.entries
            .lock()
            .ok()
            .and_then(|mut entries| entries.pop(key))
            .map(|entry| entry.value)
    }

    /// Number of stored entries, including ones that expired but were not yet read
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
