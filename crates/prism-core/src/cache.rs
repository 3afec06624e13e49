//! Bounded, expiring cache of analysis results keyed by content hash.
//!
//! Identical bytes submitted twice (or retried) reuse the earlier analysis
//! instead of paying for another vision call.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::config::CacheConfig;
use crate::types::AnalysisResult;

struct Entry {
    inserted: Instant,
    result: AnalysisResult,
}

pub struct AnalysisCache {
    entries: Mutex<LruCache<String, Entry>>,
    ttl: Duration,
}

impl std::fmt::Debug for AnalysisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisCache")
            .field("len", &self.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl AnalysisCache {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Build from config; `None` when caching is disabled.
    pub fn from_config(config: &CacheConfig) -> Option<Self> {
        config
            .enabled
            .then(|| Self::new(config.capacity, Duration::from_secs(config.ttl_secs)))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fresh result for `content_hash`, evicting it if expired.
    pub fn get(&self, content_hash: &str) -> Option<AnalysisResult> {
        let mut entries = self.lock();
        let expired = match entries.get(content_hash) {
            Some(entry) if entry.inserted.elapsed() < self.ttl => {
                return Some(entry.result.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(content_hash);
            tracing::debug!("Analysis cache entry for {content_hash} expired");
        }
        None
    }

    pub fn insert(&self, content_hash: &str, result: AnalysisResult) {
        self.lock().put(
            content_hash.to_string(),
            Entry {
                inserted: Instant::now(),
                result,
            },
        );
    }

    pub fn remove(&self, content_hash: &str) {
        self.lock().pop(content_hash);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}
