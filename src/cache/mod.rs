pub mod feed_cache;

pub use feed_cache::{CacheKey, FeedCache, DEFAULT_FEED_CACHE_TTL};
