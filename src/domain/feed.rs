use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A fetched syndication document, normalized. Never persisted as such.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    pub title: String,
    pub items: Vec<FeedItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: String,
    pub description: String,
    pub content: String,
    pub link: String,
    pub published: DateTime<Utc>,
    pub authors: Vec<String>,
}

impl Feed {
    pub fn new(title: String, items: Vec<FeedItem>) -> Self {
        Self { title, items }
    }
}

impl FeedItem {
    pub fn new(title: String, link: String, published: DateTime<Utc>) -> Self {
        Self {
            title,
            description: String::new(),
            content: String::new(),
            link,
            published,
            authors: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = description;
        self
    }

    pub fn with_content(mut self, content: String) -> Self {
        self.content = content;
        self
    }

    pub fn with_authors(mut self, authors: Vec<String>) -> Self {
        self.authors = authors;
        self
    }
}
