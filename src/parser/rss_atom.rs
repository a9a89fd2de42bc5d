use std::time::Duration;

use async_trait::async_trait;
use feed_rs::parser;
use reqwest::Client;
use tracing::{debug, warn};

use crate::domain::{Feed, FeedItem};
use crate::errors::{FetchFailure, NewsError, NewsResult};
use crate::parser::traits::FeedParser;

/// Connect timeout; the total budget comes from configuration.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Upper bound on a feed document.
const MAX_FEED_SIZE: u64 = 5 * 1024 * 1024;

const USER_AGENT: &str = concat!("newsfetch/", env!("CARGO_PKG_VERSION"));

pub struct HttpFeedParser {
    client: Client,
    max_size: u64,
}

impl HttpFeedParser {
    pub fn new(timeout: Duration) -> NewsResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(timeout))
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| NewsError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_size: MAX_FEED_SIZE,
        })
    }

    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.max_size = bytes;
        self
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchFailure> {
        let mut response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(FetchFailure::Status(response.status().as_u16()));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_size {
                return Err(FetchFailure::TooLarge(content_length));
            }
        }

        // Without a Content-Length the body is only read up to the cap
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            let size = (body.len() + chunk.len()) as u64;
            if size > self.max_size {
                return Err(FetchFailure::TooLarge(size));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }

    /// Decode a raw RSS/Atom/JSON feed document.
    ///
    /// Items without any publish time cannot be ordered or deduplicated
    /// reliably, so they are dropped individually.
    pub fn parse_document(bytes: &[u8]) -> Result<Feed, FetchFailure> {
        let parsed = parser::parse(bytes).map_err(|e| FetchFailure::Parse(e.to_string()))?;

        let title = parsed
            .title
            .map(|t| t.content)
            .unwrap_or_else(|| "Untitled Feed".to_string());

        let mut items = Vec::with_capacity(parsed.entries.len());

        for entry in parsed.entries {
            let item_title = entry
                .title
                .map(|t| t.content)
                .unwrap_or_else(|| "Untitled".to_string());

            let Some(published) = entry.published.or(entry.updated) else {
                warn!(entry = %entry.id, title = %item_title, "Skipping feed item without publish time");
                continue;
            };

            let link = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .unwrap_or_default();

            let description = entry.summary.map(|s| s.content).unwrap_or_default();
            let content = entry.content.and_then(|c| c.body).unwrap_or_default();
            let authors = entry.authors.into_iter().map(|a| a.name).collect();

            items.push(
                FeedItem::new(item_title, link, published)
                    .with_description(description)
                    .with_content(content)
                    .with_authors(authors),
            );
        }

        Ok(Feed::new(title, items))
    }
}

#[async_trait]
impl FeedParser for HttpFeedParser {
    async fn parse(&self, url: &str) -> NewsResult<Feed> {
        let bytes = self
            .fetch_bytes(url)
            .await
            .map_err(|e| NewsError::fetch(url, e))?;

        let feed = Self::parse_document(&bytes).map_err(|e| NewsError::fetch(url, e))?;
        debug!(url, items = feed.items.len(), "Parsed feed");

        Ok(feed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves `body` once with no Content-Length, closing the connection
    /// to end it.
    async fn serve_unsized(body: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Type: application/rss+xml\r\nConnection: close\r\n\r\n")
                .await;
            let _ = socket.write_all(body).await;
            let _ = socket.shutdown().await;
        });

        format!("http://{}/feed.xml", addr)
    }

    // Sample RSS feed (based on Rust Blog format)
    const SAMPLE_RSS: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Rust Blog</title>
    <link>https://blog.rust-lang.org/</link>
    <description>Empowering everyone to build reliable and efficient software.</description>
    <item>
      <title>Announcing Rust 1.75.0</title>
      <link>https://blog.rust-lang.org/2023/12/28/Rust-1.75.0.html</link>
      <description><![CDATA[<p>The Rust team is happy to announce a new version of Rust, 1.75.0.</p>]]></description>
      <author>rust-team@rust-lang.org (The Rust Team)</author>
      <pubDate>Thu, 28 Dec 2023 00:00:00 +0000</pubDate>
      <guid>https://blog.rust-lang.org/2023/12/28/Rust-1.75.0.html</guid>
    </item>
    <item>
      <title>Rust 2024 Call for Testing</title>
      <link>https://blog.rust-lang.org/2024/01/10/Rust-2024-CFT.html</link>
      <description><![CDATA[<p>We're testing the next edition of Rust!</p>]]></description>
      <pubDate>Wed, 10 Jan 2024 00:00:00 +0000</pubDate>
      <guid>https://blog.rust-lang.org/2024/01/10/Rust-2024-CFT.html</guid>
    </item>
  </channel>
</rss>"#;

    // Sample Atom feed
    const SAMPLE_ATOM: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Example Tech Blog</title>
  <link href="https://example.com/"/>
  <id>https://example.com/feed.atom</id>
  <updated>2024-01-15T12:00:00Z</updated>
  <entry>
    <title>Understanding WebAssembly</title>
    <link href="https://example.com/posts/wasm-intro"/>
    <id>https://example.com/posts/wasm-intro</id>
    <updated>2024-01-15T12:00:00Z</updated>
    <author><name>Jane Doe</name></author>
    <summary type="html"><![CDATA[<p>WebAssembly (Wasm) is a binary instruction format...</p>]]></summary>
    <content type="html"><![CDATA[<article><h1>Understanding WebAssembly</h1></article>]]></content>
  </entry>
</feed>"#;

    const RSS_WITH_UNDATED_ITEM: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Mixed</title>
    <link>https://x/</link>
    <description>Some items lack dates</description>
    <item>
      <title>Title A</title>
      <link>https://x/a</link>
      <pubDate>Wed, 10 Jan 2024 00:00:00 +0000</pubDate>
    </item>
    <item>
      <title>Undated</title>
      <link>https://x/undated</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_rss_document_is_normalized() {
        let feed = HttpFeedParser::parse_document(SAMPLE_RSS).unwrap();

        assert_eq!(feed.title, "Rust Blog");
        assert_eq!(feed.items.len(), 2);

        let first = &feed.items[0];
        assert_eq!(first.title, "Announcing Rust 1.75.0");
        assert_eq!(
            first.link,
            "https://blog.rust-lang.org/2023/12/28/Rust-1.75.0.html"
        );
        assert!(first.description.contains("happy to announce"));
        assert_eq!(
            first.published,
            Utc.with_ymd_and_hms(2023, 12, 28, 0, 0, 0).unwrap()
        );
        assert!(!first.authors.is_empty());

        // Document order is preserved
        assert_eq!(feed.items[1].title, "Rust 2024 Call for Testing");
        assert!(feed.items[1].authors.is_empty());
    }

    #[test]
    fn test_atom_document_is_normalized() {
        let feed = HttpFeedParser::parse_document(SAMPLE_ATOM).unwrap();

        assert_eq!(feed.title, "Example Tech Blog");
        assert_eq!(feed.items.len(), 1);

        let entry = &feed.items[0];
        assert_eq!(entry.title, "Understanding WebAssembly");
        assert_eq!(entry.link, "https://example.com/posts/wasm-intro");
        assert_eq!(entry.authors, vec!["Jane Doe".to_string()]);
        assert!(entry.description.contains("binary instruction format"));
        assert!(entry.content.contains("<h1>Understanding WebAssembly</h1>"));
        // Atom entries fall back to <updated>
        assert_eq!(
            entry.published,
            Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_undated_items_are_dropped() {
        let feed = HttpFeedParser::parse_document(RSS_WITH_UNDATED_ITEM).unwrap();

        assert_eq!(feed.items.len(), 1);
        assert_eq!(feed.items[0].title, "Title A");
    }

    #[test]
    fn test_malformed_document_is_a_parse_failure() {
        let result = HttpFeedParser::parse_document(b"<html><body>not a feed</body></html>");
        assert!(matches!(result, Err(FetchFailure::Parse(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_a_fetch_error() {
        let parser = HttpFeedParser::new(Duration::from_secs(2)).unwrap();
        let result = parser.parse("http://127.0.0.1:9/feed.xml").await;

        match result {
            Err(NewsError::Fetch { url, source }) => {
                assert_eq!(url, "http://127.0.0.1:9/feed.xml");
                assert!(matches!(source, FetchFailure::Http(_)));
            }
            other => panic!("expected fetch error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unsized_body_within_cap_is_parsed() {
        let url = serve_unsized(SAMPLE_RSS).await;
        let parser = HttpFeedParser::new(Duration::from_secs(5)).unwrap();

        let feed = parser.parse(&url).await.unwrap();

        assert_eq!(feed.title, "Rust Blog");
        assert_eq!(feed.items.len(), 2);
    }

    #[tokio::test]
    async fn test_unsized_body_over_cap_is_rejected() {
        let url = serve_unsized(SAMPLE_RSS).await;
        let parser = HttpFeedParser::new(Duration::from_secs(5))
            .unwrap()
            .with_max_size(64);

        let result = parser.fetch_bytes(&url).await;

        match result {
            Err(FetchFailure::TooLarge(size)) => assert!(size > 64),
            other => panic!("expected size rejection, got {:?}", other.map(|b| b.len())),
        }
    }
}
