use async_trait::async_trait;

use crate::domain::Feed;
use crate::errors::NewsResult;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedParser: Send + Sync {
    /// Fetch `url` and decode it into a `Feed`.
    ///
    /// Transport, timeout and malformed-document failures all surface as
    /// `NewsError::Fetch`; there are no partial results.
    async fn parse(&self, url: &str) -> NewsResult<Feed>;
}
