//! Test doubles shared by the scheduler and service tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::domain::{EmailMessage, Feed, FeedItem};
use crate::errors::{FetchFailure, NewsError, NewsResult};
use crate::parser::FeedParser;
use crate::services::notification_service::NotificationSender;

pub fn feed_of(items: &[(&str, &str)]) -> Feed {
    let published = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
    Feed::new(
        "Example".to_string(),
        items
            .iter()
            .map(|(title, link)| {
                FeedItem::new(title.to_string(), link.to_string(), published)
                    .with_description(format!("About {}", title))
            })
            .collect(),
    )
}

/// Lets spawned tasks run until they block on a timer or a signal.
///
/// The short sleeps only complete once no `spawn_blocking` work is in
/// flight, since the paused clock does not auto-advance meanwhile. Each call
/// moves the clock forward by a few milliseconds.
pub async fn settle() {
    for _ in 0..4 {
        for _ in 0..64 {
            tokio::task::yield_now().await;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

/// Parser serving a swappable in-memory feed.
pub struct FakeParser {
    feed: Mutex<Feed>,
    delay: Duration,
    calls: AtomicUsize,
    failures_left: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    urls: Mutex<Vec<String>>,
}

impl FakeParser {
    pub fn new(feed: Feed) -> Self {
        Self::with_delay(feed, Duration::ZERO)
    }

    /// Every parse takes `delay` on the tokio clock.
    pub fn with_delay(feed: Feed, delay: Duration) -> Self {
        Self {
            feed: Mutex::new(feed),
            delay,
            calls: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_feed(&self, feed: Feed) {
        *self.feed.lock().unwrap() = feed;
    }

    /// Makes the next `n` parses fail with a fetch error.
    pub fn fail_next(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of parses that were running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// URLs requested so far, in call order.
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedParser for FakeParser {
    async fn parse(&self, url: &str) -> NewsResult<Feed> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url.to_string());

        if !self.delay.is_zero() {
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(running, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(NewsError::fetch(url, FetchFailure::Status(503)));
        }

        Ok(self.feed.lock().unwrap().clone())
    }
}

/// Notifier that records every message instead of sending it.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<EmailMessage>>,
    failures_left: AtomicUsize,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationSender for RecordingNotifier {
    async fn send(&self, message: &EmailMessage) -> NewsResult<()> {
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(NewsError::Notification("relay unavailable".to_string()));
        }

        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}
