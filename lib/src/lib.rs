//! Mail relay bindings for Rust
//! Submits transactional emails (plain text with an HTML alternative) to an HTTP relay

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Invalid header value")]
    InvalidHeader,
    #[error("Payload too large")]
    PayloadTooLarge,
    #[error("Relay rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub id: String,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

/// Timeout used by the one-shot [`send`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct MailRelayClient {
    url: String,
    client: Client,
}

impl MailRelayClient {
    /// `timeout` bounds a whole request, connect included.
    pub fn new(url: &str, token: &str, timeout: Duration) -> Result<Self, MailError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| MailError::InvalidHeader)?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Endpoint messages are posted to
    pub fn messages_endpoint(&self) -> String {
        format!("{}/messages", self.url)
    }

    /// Submit one message to the relay
    pub async fn send(&self, mail: &OutgoingMail) -> Result<Receipt, MailError> {
        let response = self
            .client
            .post(self.messages_endpoint())
            .json(mail)
            .send()
            .await?;

        let status = response.status();

        // Check for 413 Payload Too Large specifically
        if status == reqwest::StatusCode::PAYLOAD_TOO_LARGE {
            return Err(MailError::PayloadTooLarge);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

/// Send a single message without keeping a client around
pub async fn send(url: &str, token: &str, mail: &OutgoingMail) -> Result<Receipt, MailError> {
    MailRelayClient::new(url, token, DEFAULT_TIMEOUT)?.send(mail).await
}
