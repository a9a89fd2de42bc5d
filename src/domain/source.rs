use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_POLL_INTERVAL_MINUTES: u32 = 60;

/// A feed URL registered by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub user_id: i64,
    pub poll_interval_minutes: u32,
    pub subscribed: bool,
    pub created_at: DateTime<Utc>,
}

impl Source {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.poll_interval_minutes.max(1)) * 60)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSource {
    pub name: String,
    pub url: String,
    pub user_id: i64,
    pub poll_interval_minutes: u32,
}

impl NewSource {
    pub fn new(name: String, url: String, user_id: i64) -> Self {
        Self {
            name,
            url,
            user_id,
            poll_interval_minutes: DEFAULT_POLL_INTERVAL_MINUTES,
        }
    }

    pub fn with_poll_interval(mut self, minutes: u32) -> Self {
        self.poll_interval_minutes = minutes;
        self
    }
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceUpdate {
    pub name: Option<String>,
    pub url: Option<String>,
    pub poll_interval_minutes: Option<u32>,
    pub subscribed: Option<bool>,
}

impl SourceUpdate {
    pub fn subscription(subscribed: bool) -> Self {
        Self {
            subscribed: Some(subscribed),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    pub fn with_url(mut self, url: String) -> Self {
        self.url = Some(url);
        self
    }

    pub fn with_poll_interval(mut self, minutes: u32) -> Self {
        self.poll_interval_minutes = Some(minutes);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.url.is_none()
            && self.poll_interval_minutes.is_none()
            && self.subscribed.is_none()
    }
}
