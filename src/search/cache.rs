//! Short-lived memoization of provider searches.
//!
//! Repeated identical queries within a short window (retries, the same album
//! requested by several tracks of a batch) are answered from a small LRU.
//! Entries expire after a TTL because catalogs change; only successful,
//! non-empty results are stored so failures are always retried.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;

use super::domain::{Candidate, Query, SearchError, Source};
use super::traits::Provider;

/// Default number of remembered queries per provider
pub const DEFAULT_CAPACITY: usize = 64;

/// Default lifetime of a cached answer
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

struct Entry {
    stored_at: Instant,
    candidates: Vec<Candidate>,
}

/// A provider wrapped with a bounded, expiring query cache.
pub struct CachedProvider<P> {
    inner: P,
    ttl: Duration,
    cache: Mutex<LruCache<Query, Entry>>,
}

impl<P: Provider> CachedProvider<P> {
    /// Wrap `inner` with the default capacity and TTL.
    pub fn new(inner: P) -> Self {
        Self::with_limits(inner, DEFAULT_CAPACITY, DEFAULT_TTL)
    }

    /// Wrap `inner`; a capacity of 0 is treated as 1.
    pub fn with_limits(inner: P, capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            ttl,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Number of live entries (expired entries may still be counted until read).
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, query: &Query) -> Option<Vec<Candidate>> {
        let mut cache = self.cache.lock();
        let expired = match cache.get(query) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                return Some(entry.candidates.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            cache.pop(query);
        }
        None
    }
}

#[async_trait]
impl<P: Provider> Provider for CachedProvider<P> {
    fn source(&self) -> Source {
        self.inner.source()
    }

    async fn try_search(&self, query: &Query) -> Result<Vec<Candidate>, SearchError> {
        query.validate()?;

        if let Some(hit) = self.lookup(query) {
            tracing::debug!(source = %self.source(), query = %query.keyword(), "cache hit");
            return Ok(hit);
        }

        let candidates = self.inner.try_search(query).await?;
        if !candidates.is_empty() {
            self.cache.lock().put(
                query.clone(),
                Entry {
                    stored_at: Instant::now(),
                    candidates: candidates.clone(),
                },
            );
        }
        Ok(candidates)
    }
}
