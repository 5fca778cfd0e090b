//! Thread-safe, size-bounded LRU cache of opaque upstream responses.
//!
//! Adapted from the reference crate's `ProxyCache`: same `lru::LruCache` +
//! running-byte-size counter under one mutex, but with the TTL/cache-control
//! machinery removed (this proxy never inspects `Cache-Control`, so entries
//! live until evicted, never until they "expire").

use bytes::Bytes;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use xxhash_rust::xxh64::xxh64;

use crate::memory;

/// Upper bound on the number of distinct keys tracked, independent of the
/// byte-size cap. Generous relative to `cache_size_max` so byte-size eviction
/// is almost always the binding constraint.
const MAX_ENTRIES: usize = 100_000;

/// An opaque, fully-buffered upstream response: status line, headers, and
/// body concatenated exactly as received. No parsing, no expiry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedResponse {
    pub data: Bytes,
}

impl CachedResponse {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Computes the opaque cache key for `host || path`, per §3's data model.
pub fn cache_key(host: &str, path: &str) -> u64 {
    let mut buf = Vec::with_capacity(host.len() + path.len());
    buf.extend_from_slice(host.as_bytes());
    buf.extend_from_slice(path.as_bytes());
    xxh64(&buf, 0)
}

#[derive(Clone)]
pub struct ProxyCache {
    cache: Arc<Mutex<LruCache<u64, CachedResponse>>>,
    current_size: Arc<AtomicUsize>,
    cache_size_max: usize,
    element_size_max: usize,
}

impl ProxyCache {
    pub fn new(cache_size_max: usize, element_size_max: usize) -> Self {
        Self {
            cache: Arc::new(Mutex::new(LruCache::new(
                NonZeroUsize::new(MAX_ENTRIES).expect("MAX_ENTRIES must be non-zero"),
            ))),
            current_size: Arc::new(AtomicUsize::new(0)),
            cache_size_max,
            element_size_max,
        }
    }

    /// Looks up `key`, promoting it to MRU on hit and returning a cheap
    /// `Bytes` clone copied out from under the lock.
    pub async fn get(&self, key: u64) -> Option<Bytes> {
        let mut cache = self.cache.lock().await;
        match cache.get(&key) {
            Some(entry) => {
                tracing::debug!(key, "cache HIT");
                Some(entry.data.clone())
            }
            None => {
                tracing::debug!(key, "cache MISS");
                None
            }
        }
    }

    /// Inserts `data` under `key`, evicting LRU entries until it fits.
    /// Oversize entries and entries rejected by the memory-pressure check
    /// are silently skipped, per §4.2's allocation-failure contract.
    pub async fn put(&self, key: u64, data: Bytes) {
        let len = data.len();
        if len > self.element_size_max {
            tracing::warn!(key, len, "item too large to cache, skipping insert");
            return;
        }
        let current_size = self.current_size.load(Ordering::Relaxed);
        if !memory::has_sufficient_memory(current_size, self.cache_size_max, self.element_size_max) {
            tracing::warn!(key, "insufficient memory, skipping insert");
            return;
        }

        let mut cache = self.cache.lock().await;

        if let Some(old) = cache.pop(&key) {
            self.current_size.fetch_sub(old.len(), Ordering::Relaxed);
        }

        while self.current_size.load(Ordering::Relaxed) + len > self.cache_size_max
            && !cache.is_empty()
        {
            if let Some((evicted_key, evicted)) = cache.pop_lru() {
                self.current_size
                    .fetch_sub(evicted.len(), Ordering::Relaxed);
                tracing::debug!(
                    key = evicted_key,
                    size = self.current_size.load(Ordering::Relaxed),
                    "evicted LRU entry"
                );
            } else {
                break;
            }
        }

        cache.put(key, CachedResponse { data });
        self.current_size.fetch_add(len, Ordering::Relaxed);
        tracing::debug!(
            key,
            size = self.current_size.load(Ordering::Relaxed),
            "stored new item"
        );
    }

    pub async fn len(&self) -> usize {
        self.cache.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.lock().await.is_empty()
    }

    pub async fn clear(&self) {
        let mut cache = self.cache.lock().await;
        cache.clear();
        self.current_size.store(0, Ordering::Relaxed);
    }

    pub fn total_size(&self) -> usize {
        self.current_size.load(Ordering::Relaxed)
    }

    pub fn element_size_max(&self) -> usize {
        self.element_size_max
    }
}
