pub mod traits;
pub mod rss_atom;

pub use traits::FeedParser;
pub use rss_atom::HttpFeedParser;
