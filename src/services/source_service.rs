use std::sync::Arc;

use tracing::{info, warn};
use url::Url;

use crate::cache::{CacheKey, FeedCache};
use crate::config::Config;
use crate::domain::{Article, EmailMessage, Feed, NewSource, Source, SourceUpdate};
use crate::errors::{NewsError, NewsResult};
use crate::parser::FeedParser;
use crate::services::fetch_service::FetchService;
use crate::services::ingestor::ArticleIngestor;
use crate::services::notification_service::NotificationSender;
use crate::services::poll_scheduler::PollScheduler;
use crate::services::subscription_service::{
    SubscribeOutcome, SubscriptionManager, UnsubscribeOutcome,
};
use crate::storage::sqlite::{
    SqliteArticleRepository, SqliteSourceRepository, SqliteStorage, SqliteUserRepository,
};
use crate::storage::traits::{ArticleStore, SourceStore, UserDirectory};

/// Source lifecycle: validation, first fetch, persistence and the background
/// tasks bound to each source.
pub struct SourceService {
    sources: Arc<dyn SourceStore>,
    users: Arc<dyn UserDirectory>,
    articles: Arc<dyn ArticleStore>,
    fetch: Arc<FetchService>,
    polls: PollScheduler,
    subscriptions: SubscriptionManager,
    notifier: Arc<dyn NotificationSender>,
}

impl SourceService {
    pub fn new(
        sources: Arc<dyn SourceStore>,
        users: Arc<dyn UserDirectory>,
        articles: Arc<dyn ArticleStore>,
        fetch: Arc<FetchService>,
        polls: PollScheduler,
        subscriptions: SubscriptionManager,
        notifier: Arc<dyn NotificationSender>,
    ) -> Self {
        Self {
            sources,
            users,
            articles,
            fetch,
            polls,
            subscriptions,
            notifier,
        }
    }

    /// Wires the SQLite stores, one shared cache and both schedulers.
    pub fn with_storage(
        storage: SqliteStorage,
        parser: Arc<dyn FeedParser>,
        notifier: Arc<dyn NotificationSender>,
        config: &Config,
    ) -> Self {
        let sources: Arc<dyn SourceStore> = Arc::new(SqliteSourceRepository::new(storage.clone()));
        let users: Arc<dyn UserDirectory> = Arc::new(SqliteUserRepository::new(storage.clone()));
        let articles: Arc<dyn ArticleStore> = Arc::new(SqliteArticleRepository::new(storage));

        let fetch = Arc::new(FetchService::new(
            parser,
            Arc::new(FeedCache::new(config.feed_cache_ttl)),
        ));
        let polls = PollScheduler::new(
            Arc::clone(&fetch),
            Arc::new(ArticleIngestor::new(Arc::clone(&articles))),
        );
        let subscriptions = SubscriptionManager::new(
            Arc::clone(&sources),
            Arc::clone(&users),
            Arc::clone(&fetch),
            Arc::clone(&notifier),
            config.digest_period,
        );

        Self::new(sources, users, articles, fetch, polls, subscriptions, notifier)
    }

    pub fn add_user(&self, email: &str) -> NewsResult<i64> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(NewsError::InvalidInput(format!(
                "not an email address: {}",
                email
            )));
        }
        self.users.create(email)
    }

    /// Registers a source after fetching it once.
    ///
    /// Duplicates are rejected before any network access. A blank name is
    /// replaced by the feed title. The confirmation email is best effort.
    pub async fn create_source(&self, mut new: NewSource) -> NewsResult<Source> {
        validate_url(&new.url)?;
        let owner = self.users.find_owner_email(new.user_id)?;
        self.ensure_unique(new.user_id, &new.url, None)?;

        let feed = self
            .fetch
            .cached_or_fetch(CacheKey::Url(new.url.clone()), &new.url)
            .await?;

        if new.name.trim().is_empty() {
            new.name = feed.title.clone();
        }

        let source = self.sources.create(&new)?;
        self.fetch.store(CacheKey::Source(source.id), feed);
        self.fetch.cache().remove(&CacheKey::Url(new.url.clone()));
        info!(source_id = source.id, user_id = source.user_id, url = %source.url, "Source created");

        let confirmation = EmailMessage::source_added(&owner, &source.url);
        if let Err(e) = self.notifier.send(&confirmation).await {
            warn!(source_id = source.id, "Failed to send source confirmation: {}", e);
        }

        Ok(source)
    }

    /// Applies `update`. A new URL is validated and fetched before it is
    /// written. A running poll task is stopped, and waited for, before the
    /// change and restarted afterwards, on the old settings if the change
    /// failed.
    pub async fn update_source(&self, id: i64, update: SourceUpdate) -> NewsResult<Source> {
        if update.subscribed.is_some() {
            return Err(NewsError::InvalidInput(
                "subscription is changed with subscribe/unsubscribe".to_string(),
            ));
        }

        let current = self.sources.find_one(id)?;
        if update.is_empty() {
            return Ok(current);
        }

        let new_url = update.url.as_deref().filter(|url| *url != current.url);
        let interval_changed = update
            .poll_interval_minutes
            .is_some_and(|minutes| minutes != current.poll_interval_minutes);

        if let Some(url) = new_url {
            validate_url(url)?;
            self.ensure_unique(current.user_id, url, Some(id))?;
        }

        let restart = (new_url.is_some() || interval_changed) && self.polls.stop(id).await;

        let result = self.apply_update(id, new_url, &update).await;

        if restart {
            self.polls.start(result.as_ref().unwrap_or(&current));
        }

        let updated = result?;
        info!(source_id = id, url_changed = new_url.is_some(), interval_changed, "Source updated");
        Ok(updated)
    }

    async fn apply_update(
        &self,
        id: i64,
        new_url: Option<&str>,
        update: &SourceUpdate,
    ) -> NewsResult<Source> {
        let Some(url) = new_url else {
            return self.sources.update(id, update);
        };

        self.fetch.refresh(CacheKey::Source(id), url).await?;
        match self.sources.update(id, update) {
            Ok(updated) => Ok(updated),
            Err(e) => {
                // The entry now holds the feed of a URL that was never saved
                self.fetch.cache().remove(&CacheKey::Source(id));
                Err(e)
            }
        }
    }

    /// Stops both tasks of the source and waits for them, then deletes it
    /// with its articles.
    pub async fn delete_source(&self, id: i64) -> NewsResult<()> {
        self.sources.find_one(id)?;

        self.polls.stop(id).await;
        self.subscriptions.stop(id).await;
        self.sources.delete(id)?;
        self.fetch.cache().remove(&CacheKey::Source(id));

        info!(source_id = id, "Source deleted");
        Ok(())
    }

    /// Returns the cached feed of the source, fetching it when the entry is
    /// missing or stale. Polling is started even if that fetch fails.
    pub async fn load_feed(&self, id: i64) -> NewsResult<Arc<Feed>> {
        let source = self.sources.find_one(id)?;

        let feed = self
            .fetch
            .cached_or_fetch(CacheKey::Source(source.id), &source.url)
            .await;
        self.polls.start(&source);

        feed
    }

    pub fn subscribe(&self, id: i64) -> NewsResult<SubscribeOutcome> {
        self.subscriptions.subscribe(id)
    }

    pub async fn unsubscribe(&self, id: i64) -> NewsResult<UnsubscribeOutcome> {
        self.subscriptions.unsubscribe(id).await
    }

    /// Restarts digests for every subscribed source. Call once at startup.
    pub fn initialize_subscriptions(&self) -> NewsResult<usize> {
        self.subscriptions.reactivate_all()
    }

    pub fn list_sources(&self, user_id: Option<i64>) -> NewsResult<Vec<Source>> {
        match user_id {
            Some(user_id) => self.sources.find_by_user(user_id),
            None => self.sources.find_all(),
        }
    }

    pub fn find_source(&self, id: i64) -> NewsResult<Source> {
        self.sources.find_one(id)
    }

    pub fn list_articles(&self, source_id: i64) -> NewsResult<Vec<Article>> {
        self.sources.find_one(source_id)?;
        self.articles.list_by_source(source_id)
    }

    pub fn is_polling(&self, id: i64) -> bool {
        self.polls.is_running(id)
    }

    pub fn is_subscribed(&self, id: i64) -> bool {
        self.subscriptions.is_active(id)
    }

    pub async fn shutdown(&self) {
        self.polls.shutdown().await;
        self.subscriptions.shutdown().await;
        info!("Background tasks stopped");
    }

    fn ensure_unique(&self, user_id: i64, url: &str, except: Option<i64>) -> NewsResult<()> {
        let taken = self
            .sources
            .find_by_user(user_id)?
            .iter()
            .any(|source| source.url == url && Some(source.id) != except);

        if taken {
            return Err(NewsError::DuplicateSource {
                user_id,
                url: url.to_string(),
            });
        }
        Ok(())
    }
}

fn validate_url(raw: &str) -> NewsResult<()> {
    let url = Url::parse(raw).map_err(|e| NewsError::InvalidUrl(format!("{}: {}", raw, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(NewsError::InvalidUrl(format!(
            "{}: unsupported scheme {}",
            raw, scheme
        ))),
    }
}
