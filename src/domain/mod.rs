pub mod source;
pub mod feed;
pub mod article;
pub mod notification;

pub use source::{NewSource, Source, SourceUpdate, DEFAULT_POLL_INTERVAL_MINUTES};
pub use feed::{Feed, FeedItem};
pub use article::{Article, ARTICLE_ID_LEN, UNKNOWN_AUTHOR};
pub use notification::EmailMessage;
