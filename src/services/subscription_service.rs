//! Newsletter subscriptions.
//!
//! A subscribed source has one digest task that emails its owner every
//! `period`. The first digest goes out one full period after the task
//! starts, so restarting the process does not re-send digests.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::oneshot;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::cache::CacheKey;
use crate::domain::{EmailMessage, Source, SourceUpdate};
use crate::errors::NewsResult;
use crate::services::fetch_service::FetchService;
use crate::services::notification_service::NotificationSender;
use crate::services::task_registry::TaskRegistry;
use crate::storage::traits::{SourceStore, UserDirectory};

pub const DEFAULT_DIGEST_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    /// Flag set and persisted, task started.
    Subscribed,
    /// Flag was already set but no task was running; task started.
    Resumed,
    AlreadySubscribed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsubscribeOutcome {
    Unsubscribed,
    AlreadyUnsubscribed,
}

#[derive(Clone)]
struct DigestContext {
    sources: Arc<dyn SourceStore>,
    users: Arc<dyn UserDirectory>,
    fetch: Arc<FetchService>,
    notifier: Arc<dyn NotificationSender>,
}

impl DigestContext {
    async fn send_digest(&self, source_id: i64) -> NewsResult<usize> {
        let source = self.sources.find_one(source_id)?;
        let feed = self
            .fetch
            .refresh(CacheKey::Source(source.id), &source.url)
            .await?;
        let owner = self.users.find_owner_email(source.user_id)?;

        let message = EmailMessage::digest(&owner, &source.name, &feed, Utc::now().date_naive());
        self.notifier.send(&message).await?;

        Ok(feed.items.len())
    }
}

pub struct SubscriptionManager {
    context: DigestContext,
    period: Duration,
    registry: TaskRegistry,
}

impl SubscriptionManager {
    pub fn new(
        sources: Arc<dyn SourceStore>,
        users: Arc<dyn UserDirectory>,
        fetch: Arc<FetchService>,
        notifier: Arc<dyn NotificationSender>,
        period: Duration,
    ) -> Self {
        Self {
            context: DigestContext {
                sources,
                users,
                fetch,
                notifier,
            },
            period,
            registry: TaskRegistry::new(),
        }
    }

    pub fn subscribe(&self, source_id: i64) -> NewsResult<SubscribeOutcome> {
        let source = self.context.sources.find_one(source_id)?;

        if source.subscribed {
            if self.registry.contains(source_id) {
                return Ok(SubscribeOutcome::AlreadySubscribed);
            }
            self.run_task(&source);
            return Ok(SubscribeOutcome::Resumed);
        }

        let source = self
            .context
            .sources
            .update(source_id, &SourceUpdate::subscription(true))?;
        self.run_task(&source);
        Ok(SubscribeOutcome::Subscribed)
    }

    pub async fn unsubscribe(&self, source_id: i64) -> NewsResult<UnsubscribeOutcome> {
        let source = self.context.sources.find_one(source_id)?;

        if !source.subscribed {
            return Ok(UnsubscribeOutcome::AlreadyUnsubscribed);
        }

        self.context
            .sources
            .update(source_id, &SourceUpdate::subscription(false))?;
        self.stop(source_id).await;
        Ok(UnsubscribeOutcome::Unsubscribed)
    }

    /// Starts the digest task for `source` unless one is running.
    pub fn run_task(&self, source: &Source) -> bool {
        let context = self.context.clone();
        let source_id = source.id;
        let period = self.period;

        let started = self.registry.try_start(source_id, move |stop| {
            tokio::spawn(run(context, source_id, period, stop))
        });

        if started {
            info!(source_id, period_secs = period.as_secs(), "Subscription task started");
        }
        started
    }

    /// Stops the digest task of `source_id` without touching the stored flag,
    /// waiting for a digest in progress to finish.
    pub async fn stop(&self, source_id: i64) -> bool {
        let Some(join) = self.registry.stop(source_id) else {
            return false;
        };

        if let Err(e) = join.await {
            warn!(source_id, "Subscription task ended abnormally: {}", e);
        }
        info!(source_id, "Subscription task stopped");
        true
    }

    /// Restarts the digest task of every subscribed source. Handles live in
    /// memory only, so this runs once at process start.
    pub fn reactivate_all(&self) -> NewsResult<usize> {
        let sources = self.context.sources.find_all_with_subscription_enabled()?;

        let started = sources
            .iter()
            .filter(|source| self.run_task(source))
            .count();

        info!(subscribed = sources.len(), started, "Subscriptions reactivated");
        Ok(started)
    }

    pub fn is_active(&self, source_id: i64) -> bool {
        self.registry.contains(source_id)
    }

    pub fn active(&self) -> Vec<i64> {
        self.registry.active_ids()
    }

    /// Stops every digest task and waits for them to finish.
    pub async fn shutdown(&self) {
        for join in self.registry.stop_all() {
            let _ = join.await;
        }
    }
}

async fn run(
    context: DigestContext,
    source_id: i64,
    period: Duration,
    mut stop: oneshot::Receiver<()>,
) {
    let mut timer = interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = &mut stop => break,
            _ = timer.tick() => {
                match context.send_digest(source_id).await {
                    Ok(items) => info!(source_id, items, "Digest sent"),
                    Err(e) if e.is_fetch() => warn!(source_id, "Skipping digest, feed unavailable: {}", e),
                    Err(e) => error!(source_id, "Skipping digest: {}", e),
                }
            }
        }
    }
}
