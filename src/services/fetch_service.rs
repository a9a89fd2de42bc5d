use std::sync::Arc;

use tracing::debug;

use crate::cache::{CacheKey, FeedCache};
use crate::domain::Feed;
use crate::errors::NewsResult;
use crate::parser::FeedParser;

/// Feed access through the shared cache.
pub struct FetchService {
    parser: Arc<dyn FeedParser>,
    cache: Arc<FeedCache>,
}

impl FetchService {
    pub fn new(parser: Arc<dyn FeedParser>, cache: Arc<FeedCache>) -> Self {
        Self { parser, cache }
    }

    pub fn cache(&self) -> &FeedCache {
        &self.cache
    }

    /// Returns the cached feed for `key`, or fetches `url` and caches it.
    pub async fn cached_or_fetch(&self, key: CacheKey, url: &str) -> NewsResult<Arc<Feed>> {
        if let Some(feed) = self.cache.get(&key) {
            return Ok(feed);
        }

        self.refresh(key, url).await
    }

    /// Always fetches `url`, then replaces the cache entry for `key`.
    pub async fn refresh(&self, key: CacheKey, url: &str) -> NewsResult<Arc<Feed>> {
        debug!(key = %key, url, "Fetching feed");
        let feed = Arc::new(self.parser.parse(url).await?);
        self.cache.put(key, Arc::clone(&feed));
        Ok(feed)
    }

    pub fn store(&self, key: CacheKey, feed: Arc<Feed>) {
        self.cache.put(key, feed);
    }
}
