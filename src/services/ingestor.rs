use std::sync::Arc;

use tracing::{debug, error, info};

use crate::domain::{Article, Feed};
use crate::storage::traits::ArticleStore;

/// Turns feed items into articles, skipping the ones already stored.
pub struct ArticleIngestor {
    articles: Arc<dyn ArticleStore>,
}

impl ArticleIngestor {
    pub fn new(articles: Arc<dyn ArticleStore>) -> Self {
        Self { articles }
    }

    /// Persist every unseen item of `feed` for `source_id`, in document order.
    ///
    /// A store failure only skips the item it happened on. Returns the number
    /// of articles created.
    pub fn ingest(&self, source_id: i64, feed: &Feed) -> usize {
        let mut created = 0;

        for item in &feed.items {
            let article = Article::from_item(source_id, item);

            match self.articles.find_by_id(&article.id) {
                Ok(Some(_)) => {
                    debug!(source_id, article_id = %article.id, "Article already exists: {}", item.title);
                    continue;
                }
                Ok(None) => {}
                Err(e) => {
                    error!(source_id, article_id = %article.id, "Failed to look up article: {}", e);
                    continue;
                }
            }

            match self.articles.create(&article) {
                Ok(_) => {
                    debug!(source_id, article_id = %article.id, "Article created: {}", item.title);
                    created += 1;
                }
                Err(e) => {
                    error!(source_id, article_id = %article.id, "Failed to create article: {}", e);
                }
            }
        }

        if created > 0 {
            info!(source_id, created, "Ingested new articles");
        }

        created
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FeedItem, NewSource};
    use crate::errors::NewsError;
    use crate::storage::sqlite::{
        SqliteArticleRepository, SqliteSourceRepository, SqliteStorage, SqliteUserRepository,
    };
    use crate::storage::traits::{MockArticleStore, SourceStore, UserDirectory};
    use chrono::{TimeZone, Utc};

    fn item(title: &str, link: &str) -> FeedItem {
        FeedItem::new(
            title.to_string(),
            link.to_string(),
            Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap(),
        )
    }

    fn feed(items: &[(&str, &str)]) -> Feed {
        Feed::new(
            "Example".to_string(),
            items.iter().map(|(t, l)| item(t, l)).collect(),
        )
    }

    fn setup() -> (ArticleIngestor, Arc<SqliteArticleRepository>, i64) {
        let storage = SqliteStorage::in_memory().unwrap();
        let user_id = SqliteUserRepository::new(storage.clone())
            .create("owner@example.com")
            .unwrap();
        let source = SqliteSourceRepository::new(storage.clone())
            .create(
                &NewSource::new(
                    "S1".to_string(),
                    "https://example.com/feed.xml".to_string(),
                    user_id,
                )
                .with_poll_interval(10),
            )
            .unwrap();
        let articles = Arc::new(SqliteArticleRepository::new(storage));
        (ArticleIngestor::new(articles.clone()), articles, source.id)
    }

    #[test]
    fn test_polls_only_add_new_items() {
        let (ingestor, articles, source_id) = setup();

        let first = feed(&[("Title A", "https://x/a"), ("Title B", "https://x/b")]);
        assert_eq!(ingestor.ingest(source_id, &first), 2);
        assert_eq!(articles.count_by_source(source_id).unwrap(), 2);

        // Unchanged document
        assert_eq!(ingestor.ingest(source_id, &first), 0);
        assert_eq!(articles.count_by_source(source_id).unwrap(), 2);

        let third = feed(&[
            ("Title A", "https://x/a"),
            ("Title B", "https://x/b"),
            ("Title C", "https://x/c"),
        ]);
        assert_eq!(ingestor.ingest(source_id, &third), 1);
        assert_eq!(articles.count_by_source(source_id).unwrap(), 3);
    }

    #[test]
    fn test_duplicate_items_in_one_document_collapse() {
        let (ingestor, articles, source_id) = setup();

        let doubled = feed(&[("Title A", "https://x/a"), ("Title A", "https://x/a")]);
        assert_eq!(ingestor.ingest(source_id, &doubled), 1);
        assert_eq!(articles.count_by_source(source_id).unwrap(), 1);
    }

    #[test]
    fn test_known_article_is_never_rewritten() {
        let (ingestor, articles, source_id) = setup();
        ingestor.ingest(source_id, &feed(&[("Title A", "https://x/a")]));

        let mut changed = feed(&[("Title A", "https://x/a")]);
        changed.items[0].description = "edited upstream".to_string();
        assert_eq!(ingestor.ingest(source_id, &changed), 0);

        let stored = articles.list_by_source(source_id).unwrap();
        assert_eq!(stored[0].description, "");
    }

    #[test]
    fn test_persist_failure_skips_only_that_item() {
        let mut store = MockArticleStore::new();
        store.expect_find_by_id().returning(|_| Ok(None));

        let failing_id = Article::derive_id("Title B", "https://x/b");
        store
            .expect_create()
            .times(3)
            .returning(move |article| {
                if article.id == failing_id {
                    Err(NewsError::Database(rusqlite::Error::InvalidQuery))
                } else {
                    Ok(article.clone())
                }
            });

        let ingestor = ArticleIngestor::new(Arc::new(store));
        let created = ingestor.ingest(
            1,
            &feed(&[
                ("Title A", "https://x/a"),
                ("Title B", "https://x/b"),
                ("Title C", "https://x/c"),
            ]),
        );

        assert_eq!(created, 2);
    }

    #[test]
    fn test_lookup_failure_skips_item_without_creating() {
        let mut store = MockArticleStore::new();
        store
            .expect_find_by_id()
            .returning(|_| Err(NewsError::Database(rusqlite::Error::InvalidQuery)));
        store.expect_create().never();

        let ingestor = ArticleIngestor::new(Arc::new(store));
        assert_eq!(ingestor.ingest(1, &feed(&[("Title A", "https://x/a")])), 0);
    }
}
