use crate::domain::{Article, NewSource, Source, SourceUpdate};
use crate::errors::NewsResult;

#[cfg_attr(test, mockall::automock)]
pub trait ArticleStore: Send + Sync {
    fn find_by_id(&self, id: &str) -> NewsResult<Option<Article>>;
    fn create(&self, article: &Article) -> NewsResult<Article>;
    fn list_by_source(&self, source_id: i64) -> NewsResult<Vec<Article>>;
    fn count_by_source(&self, source_id: i64) -> NewsResult<usize>;
}

#[cfg_attr(test, mockall::automock)]
pub trait SourceStore: Send + Sync {
    /// Fails with `NotFound` for an unknown id.
    fn find_one(&self, id: i64) -> NewsResult<Source>;
    fn find_all(&self) -> NewsResult<Vec<Source>>;
    fn find_by_user(&self, user_id: i64) -> NewsResult<Vec<Source>>;
    fn find_all_with_subscription_enabled(&self) -> NewsResult<Vec<Source>>;
    fn create(&self, source: &NewSource) -> NewsResult<Source>;
    fn update(&self, id: i64, update: &SourceUpdate) -> NewsResult<Source>;
    fn delete(&self, id: i64) -> NewsResult<()>;
}

#[cfg_attr(test, mockall::automock)]
pub trait UserDirectory: Send + Sync {
    /// Fails with `NotFound` for an unknown user.
    fn find_owner_email(&self, user_id: i64) -> NewsResult<String>;
    fn create(&self, email: &str) -> NewsResult<i64>;
}
