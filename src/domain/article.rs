use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::FeedItem;

/// Length of the hex identifier kept from the content hash.
pub const ARTICLE_ID_LEN: usize = 35;

pub const UNKNOWN_AUTHOR: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub link: String,
    pub published_at: DateTime<Utc>,
    pub author: String,
    pub source_id: i64,
}

impl Article {
    /// Natural key of an item: hash of title followed by link.
    pub fn derive_id(title: &str, link: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(title.as_bytes());
        hasher.update(link.as_bytes());
        let mut id = format!("{:x}", hasher.finalize());
        id.truncate(ARTICLE_ID_LEN);
        id
    }

    pub fn from_item(source_id: i64, item: &FeedItem) -> Self {
        let author = item
            .authors
            .first()
            .cloned()
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

        Self {
            id: Self::derive_id(&item.title, &item.link),
            title: item.title.clone(),
            description: item.description.clone(),
            content: item.content.clone(),
            link: item.link.clone(),
            published_at: item.published,
            author,
            source_id,
        }
    }
}
