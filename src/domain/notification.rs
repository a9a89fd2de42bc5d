use chrono::NaiveDate;
use scraper::Html;

use super::Feed;

const SEPARATOR: &str = "------------------------------------------------------";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

impl EmailMessage {
    /// Digest of every item currently in `feed`.
    ///
    /// Subject: "Newsletter: {source} - Day {date}!"
    pub fn digest(to: &str, source_name: &str, feed: &Feed, day: NaiveDate) -> Self {
        let mut text = format!("Current articles on {}:\n", source_name);
        let mut html = format!("<p>Current articles on {}:</p>", html_escape(source_name));

        for item in &feed.items {
            let description = strip_html(&item.description);

            text.push_str(&format!("- {}\n", item.title));
            if !description.is_empty() {
                text.push_str(&description);
                text.push('\n');
            }
            text.push_str(&item.link);
            text.push_str("\n\n");
            text.push_str(SEPARATOR);
            text.push_str("\n\n");

            html.push_str(&format!(
                "<p><b>{}</b><br>{}<br><a href=\"{}\">{}</a></p><hr>",
                html_escape(&item.title),
                html_escape(&description),
                html_escape(&item.link),
                html_escape(&item.link),
            ));
        }

        Self {
            to: to.to_string(),
            subject: format!("Newsletter: {} - Day {}!", source_name, day.format("%Y-%m-%d")),
            text,
            html,
        }
    }

    /// Confirmation sent to the owner once a source is registered.
    pub fn source_added(to: &str, url: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Smart News Fetcher - New Source".to_string(),
            text: format!("New source has been added: {}", url),
            html: format!(
                "<p>New source has been added: <a href=\"{0}\">{0}</a></p>",
                html_escape(url)
            ),
        }
    }
}

/// Collapse an HTML fragment to its visible text.
fn strip_html(fragment: &str) -> String {
    let document = Html::parse_fragment(fragment);
    let text: Vec<&str> = document.root_element().text().collect();
    text.join("").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
