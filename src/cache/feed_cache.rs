//! Time-bounded cache of the most recently fetched feed per source.
//!
//! Entries are keyed by source id once a source exists, or by the raw URL
//! while a source is still being created. A stale entry is indistinguishable
//! from a missing one.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::domain::Feed;

pub const DEFAULT_FEED_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Source(i64),
    Url(String),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Source(id) => write!(f, "feed_{}", id),
            CacheKey::Url(url) => write!(f, "{}", url),
        }
    }
}

struct CachedFeed {
    feed: Arc<Feed>,
    fetched_at: Instant,
}

pub struct FeedCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CachedFeed>>,
}

impl FeedCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<CacheKey, CachedFeed>> {
        // A panic while holding the lock cannot leave a half-written entry
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the cached feed unless it is absent or older than the TTL.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<Feed>> {
        let mut entries = self.entries();
        let lookup = entries
            .get(key)
            .map(|entry| (entry.fetched_at.elapsed() < self.ttl, Arc::clone(&entry.feed)));

        match lookup {
            Some((true, feed)) => {
                debug!(key = %key, "Feed cache hit");
                Some(feed)
            }
            Some((false, _)) => {
                debug!(key = %key, "Feed cache entry expired");
                entries.remove(key);
                None
            }
            None => {
                debug!(key = %key, "Feed cache miss");
                None
            }
        }
    }

    /// Stores `feed` under `key`, restarting its validity window.
    pub fn put(&self, key: CacheKey, feed: Arc<Feed>) {
        debug!(key = %key, items = feed.items.len(), "Feed stored in cache");
        self.entries().insert(
            key,
            CachedFeed {
                feed,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Drops the entry for `key`. Returns whether one was present.
    pub fn remove(&self, key: &CacheKey) -> bool {
        let removed = self.entries().remove(key).is_some();
        if removed {
            debug!(key = %key, "Feed cache entry removed");
        }
        removed
    }

    /// Number of live (non-expired) entries.
    pub fn len(&self) -> usize {
        self.entries()
            .values()
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for FeedCache {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CACHE_TTL)
    }
}
