//! Periodic re-ingestion of sources.
//!
//! One task per source. The first tick fires as soon as the task starts,
//! later ticks every `poll_interval`. Ticks of one source never overlap and
//! a stop request takes effect between ticks, never inside one.

use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::cache::CacheKey;
use crate::domain::Source;
use crate::errors::NewsResult;
use crate::services::fetch_service::FetchService;
use crate::services::ingestor::ArticleIngestor;
use crate::services::task_registry::TaskRegistry;

#[derive(Clone)]
struct PollContext {
    fetch: Arc<FetchService>,
    ingestor: Arc<ArticleIngestor>,
}

impl PollContext {
    async fn tick(&self, source_id: i64, url: &str) -> NewsResult<usize> {
        let feed = self
            .fetch
            .cached_or_fetch(CacheKey::Source(source_id), url)
            .await?;
        let ingestor = Arc::clone(&self.ingestor);
        let created = tokio::task::spawn_blocking(move || ingestor.ingest(source_id, &feed)).await?;
        Ok(created)
    }
}

pub struct PollScheduler {
    context: PollContext,
    registry: TaskRegistry,
}

impl PollScheduler {
    pub fn new(fetch: Arc<FetchService>, ingestor: Arc<ArticleIngestor>) -> Self {
        Self {
            context: PollContext { fetch, ingestor },
            registry: TaskRegistry::new(),
        }
    }

    /// Starts polling `source`. A no-op returning `false` when a poll task
    /// for it is already running.
    pub fn start(&self, source: &Source) -> bool {
        let context = self.context.clone();
        let source_id = source.id;
        let url = source.url.clone();
        let period = source.poll_interval();

        let started = self.registry.try_start(source_id, move |stop| {
            tokio::spawn(run(context, source_id, url, period, stop))
        });

        if started {
            info!(source_id, interval_secs = period.as_secs(), "Poll task started");
        }
        started
    }

    /// Stops the poll task of `source_id` and waits for it to exit, so a
    /// tick in progress has finished when this returns. Returns whether a
    /// task was running.
    pub async fn stop(&self, source_id: i64) -> bool {
        let Some(join) = self.registry.stop(source_id) else {
            return false;
        };

        if let Err(e) = join.await {
            warn!(source_id, "Poll task ended abnormally: {}", e);
        }
        info!(source_id, "Poll task stopped");
        true
    }

    pub fn is_running(&self, source_id: i64) -> bool {
        self.registry.contains(source_id)
    }

    pub fn running(&self) -> Vec<i64> {
        self.registry.active_ids()
    }

    /// Runs one tick body for `source` outside of any schedule.
    pub async fn poll_now(&self, source: &Source) -> NewsResult<usize> {
        self.context.tick(source.id, &source.url).await
    }

    /// Stops every poll task and waits for them to finish.
    pub async fn shutdown(&self) {
        for join in self.registry.stop_all() {
            let _ = join.await;
        }
    }
}

async fn run(
    context: PollContext,
    source_id: i64,
    url: String,
    period: std::time::Duration,
    mut stop: oneshot::Receiver<()>,
) {
    let mut timer = interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = &mut stop => break,
            _ = timer.tick() => {
                match context.tick(source_id, &url).await {
                    Ok(created) => info!(source_id, created, "Poll finished"),
                    Err(e) => warn!(source_id, url = %url, "Poll failed, retrying next interval: {}", e),
                }
            }
        }
    }
}
