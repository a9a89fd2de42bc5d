use async_trait::async_trait;
use mailrelay::{MailError, MailRelayClient, OutgoingMail};
use tracing::{debug, warn};

use crate::config::Config;
use crate::domain::EmailMessage;
use crate::errors::NewsResult;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> NewsResult<()>;
}

/// Delivers email through the HTTP mail relay.
pub struct MailRelayNotifier {
    client: MailRelayClient,
    from: String,
}

impl MailRelayNotifier {
    pub fn new(config: &Config) -> NewsResult<Self> {
        let client = MailRelayClient::new(
            &config.mail_relay_url,
            &config.mail_relay_token,
            config.mail_timeout,
        )?;

        Ok(Self {
            client,
            from: config.mail_from.clone(),
        })
    }

    fn outgoing(&self, message: &EmailMessage) -> OutgoingMail {
        OutgoingMail {
            from: self.from.clone(),
            to: message.to.clone(),
            subject: message.subject.clone(),
            text: message.text.clone(),
            html: message.html.clone(),
        }
    }
}

#[async_trait]
impl NotificationSender for MailRelayNotifier {
    /// Sends the message, falling back to the plain-text part alone when
    /// the relay rejects the full payload as too large.
    async fn send(&self, message: &EmailMessage) -> NewsResult<()> {
        let mut mail = self.outgoing(message);

        match self.client.send(&mail).await {
            Ok(receipt) => {
                debug!(to = %message.to, receipt = %receipt.id, "Email accepted by relay");
                return Ok(());
            }
            Err(MailError::PayloadTooLarge) => {
                warn!(to = %message.to, "Email too large, retrying without HTML part");
            }
            Err(e) => return Err(e.into()),
        }

        mail.html = String::new();
        self.client.send(&mail).await?;
        Ok(())
    }
}
