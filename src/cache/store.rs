use lru::LruCache;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

const FALLBACK_CAPACITY: NonZeroUsize = match NonZeroUsize::new(32) {
    Some(cap) => cap,
    None => unreachable!(),
};

/// Bounded in-process result cache with one in-flight computation per key.
///
/// Entries beyond `capacity` are evicted least-recently-used first. Callers
/// racing on the same missing key wait on a per-key gate so only the first one
/// does the work; the rest read its result. Failed computations are not stored.
pub struct ResultCache<K, V> {
    entries: Mutex<LruCache<K, V>>,
    inflight: Mutex<HashMap<K, Arc<tokio::sync::Mutex<()>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    pub capacity: usize,
}

impl<K, V> ResultCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// A zero capacity falls back to 32 entries.
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(FALLBACK_CAPACITY);
        Self {
            entries: Mutex::new(LruCache::new(cap)),
            inflight: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let found = self.entries.lock().get(key).cloned();
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    pub fn insert(&self, key: K, value: V) {
        self.entries.lock().put(key, value);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        debug!("Cache cleared");
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: entries.len(),
            capacity: entries.cap().get(),
        }
    }

    /// Return the cached value for `key`, or run `compute` and cache its
    /// success.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }

        let gate = self
            .inflight
            .lock()
            .entry(key.clone())
            .or_default()
            .clone();
        let flight = Flight {
            inflight: &self.inflight,
            key,
            gate,
        };

        let _turn = flight.gate.lock().await;
        // Someone holding the gate before us may have filled the entry.
        let filled = self.entries.lock().get(&flight.key).cloned();
        if let Some(value) = filled {
            debug!("Cache filled by concurrent caller");
            return Ok(value);
        }

        let result = compute().await;
        if let Ok(value) = &result {
            self.insert(flight.key.clone(), value.clone());
        }
        result
    }
}

/// Releases a key's gate when its caller finishes or is cancelled.
struct Flight<'a, K: Hash + Eq> {
    inflight: &'a Mutex<HashMap<K, Arc<tokio::sync::Mutex<()>>>>,
    key: K,
    gate: Arc<tokio::sync::Mutex<()>>,
}

impl<K: Hash + Eq> Drop for Flight<'_, K> {
    fn drop(&mut self) {
        let mut inflight = self.inflight.lock();
        // One reference in the map plus ours means nobody else is waiting.
        if Arc::strong_count(&self.gate) == 2 {
            inflight.remove(&self.key);
        }
    }
}
