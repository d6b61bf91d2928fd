// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Keyed query cache for read operations
//!
//! Every read endpoint funnels through a process-wide cache keyed by
//! operation name + parameters, holding the raw samba-tool output text.
//! Entries are served as-is while fresh, served stale with a background
//! revalidation once past their stale window, and dropped entirely past the
//! eviction window. Concurrent fetches for the same key are collapsed into a
//! single samba-tool invocation.
//!
//! The cache is an explicit object owned by `AppState`, not a module-level
//! singleton, so tests can construct and inspect their own instance.

use anyhow::Result;
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::metrics;

/// Default eviction window when `CACHE_EVICT_SECS` is not set
pub const DEFAULT_EVICT_SECS: u64 = 900;

struct CacheEntry {
    value: String,
    fetched_at: Instant,
    stale_after: Duration,
}

/// Outcome of a cache lookup
enum Lookup {
    Fresh(String),
    Stale(String),
    Miss,
}

struct CacheInner {
    entries: DashMap<String, CacheEntry>,
    /// Per-key gates collapsing concurrent misses into one fetch
    gates: DashMap<String, Arc<Mutex<()>>>,
    /// Keys with a background revalidation in flight
    revalidating: DashMap<String, ()>,
    evict_after: Duration,
}

/// Process-wide query cache with per-entry staleness and global eviction
///
/// Cloning is cheap; clones share the same underlying store.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<CacheInner>,
}

impl QueryCache {
    /// Create a cache with the given eviction window
    pub fn new(evict_after: Duration) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                entries: DashMap::new(),
                gates: DashMap::new(),
                revalidating: DashMap::new(),
                evict_after,
            }),
        }
    }

    /// Look up `key`, invoking `fetch` on a miss
    ///
    /// A fresh entry is returned directly. A stale entry is returned
    /// immediately while `fetch` runs to completion in the background and
    /// replaces it. On a miss, concurrent callers with the same key share a
    /// single `fetch` invocation.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: &str,
        stale_after: Duration,
        fetch: F,
    ) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        self.evict_expired();

        match self.lookup(key) {
            Lookup::Fresh(value) => {
                metrics::record_cache_access("hit");
                return Ok(value);
            }
            Lookup::Stale(value) => {
                metrics::record_cache_access("stale");
                self.spawn_revalidate(key, stale_after, fetch());
                return Ok(value);
            }
            Lookup::Miss => {}
        }

        metrics::record_cache_access("miss");

        let gate = self
            .inner
            .gates
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = gate.lock().await;

        // Another caller may have completed the fetch while we waited
        if let Lookup::Fresh(value) | Lookup::Stale(value) = self.lookup(key) {
            return Ok(value);
        }

        let result = fetch().await;
        if let Ok(ref value) = result {
            self.insert(key, value.clone(), stale_after);
        }
        result
    }

    /// Drop a single entry, forcing the next access to fetch
    pub fn remove(&self, key: &str) {
        self.inner.entries.remove(key);
    }

    /// Drop every entry whose key starts with `prefix`
    ///
    /// Mutations call this with their domain prefix (e.g., "user:") after a
    /// successful command so the next read re-fetches.
    pub fn invalidate_prefix(&self, prefix: &str) {
        let before = self.inner.entries.len();
        self.inner.entries.retain(|key, _| !key.starts_with(prefix));
        let dropped = before - self.inner.entries.len();
        if dropped > 0 {
            debug!("invalidated {} cache entries with prefix {}", dropped, prefix);
        }
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    fn insert(&self, key: &str, value: String, stale_after: Duration) {
        self.inner.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                fetched_at: Instant::now(),
                stale_after,
            },
        );
    }

    fn lookup(&self, key: &str) -> Lookup {
        let (expired, result) = match self.inner.entries.get(key) {
            Some(entry) => {
                let age = entry.fetched_at.elapsed();
                if age >= self.inner.evict_after {
                    (true, Lookup::Miss)
                } else if age >= entry.stale_after {
                    (false, Lookup::Stale(entry.value.clone()))
                } else {
                    (false, Lookup::Fresh(entry.value.clone()))
                }
            }
            None => (false, Lookup::Miss),
        };

        if expired {
            self.inner.entries.remove(key);
        }
        result
    }

    fn evict_expired(&self) {
        let evict_after = self.inner.evict_after;
        self.inner
            .entries
            .retain(|_, entry| entry.fetched_at.elapsed() < evict_after);
    }

    fn spawn_revalidate<Fut>(&self, key: &str, stale_after: Duration, fut: Fut)
    where
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        // Only one revalidation per key at a time
        if self.inner.revalidating.insert(key.to_string(), ()).is_some() {
            return;
        }

        let cache = self.clone();
        let key = key.to_string();
        tokio::spawn(async move {
            match fut.await {
                Ok(value) => cache.insert(&key, value, stale_after),
                Err(e) => warn!("background refresh failed for {}: {}", key, e),
            }
            cache.inner.revalidating.remove(&key);
        });
    }
}
