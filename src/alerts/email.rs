//! SMTP alert delivery.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use backoff::ExponentialBackoff;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials as SmtpCredentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{Alert, AlertSink};

const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;
const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Mail settings (the password lives in [`crate::trading::Credentials`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Sender and login address
    pub address: String,

    /// Recipient; defaults to the sender
    pub recipient: Option<String>,

    pub smtp_host: String,

    /// STARTTLS port
    pub smtp_port: u16,

    /// How long a failing delivery is retried before giving up (seconds)
    pub retry_window_secs: u64,
}

impl EmailConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            recipient: None,
            smtp_host: DEFAULT_SMTP_HOST.to_string(),
            smtp_port: DEFAULT_SMTP_PORT,
            retry_window_secs: 30,
        }
    }

    /// Settings for `address` (from [`crate::trading::Credentials`]) plus
    /// optional environment overrides:
    /// - ALERT_EMAIL_TO (defaults to the sender)
    /// - SMTP_HOST (defaults to smtp.gmail.com)
    /// - SMTP_PORT (defaults to 587)
    pub fn from_env(address: impl Into<String>) -> Result<Self> {
        let mut config = Self::new(address);
        config.recipient = std::env::var("ALERT_EMAIL_TO").ok();
        if let Ok(host) = std::env::var("SMTP_HOST") {
            config.smtp_host = host;
        }
        if let Ok(port) = std::env::var("SMTP_PORT") {
            config.smtp_port = port.parse().context("Invalid SMTP_PORT")?;
        }

        Ok(config)
    }

    pub fn recipient(&self) -> &str {
        self.recipient.as_deref().unwrap_or(&self.address)
    }
}

/// Sends alerts as plain-text email over STARTTLS.
pub struct EmailAlertSink {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
    retry_window: Duration,
}

impl EmailAlertSink {
    pub fn new(config: &EmailConfig, password: &str) -> Result<Self> {
        let from: Mailbox = config
            .address
            .parse()
            .context("Invalid sender email address")?;
        let to: Mailbox = config
            .recipient()
            .parse()
            .context("Invalid recipient email address")?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .context("Failed to configure SMTP relay")?
            .port(config.smtp_port)
            .credentials(SmtpCredentials::new(config.address.clone(), password.to_string()))
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        Ok(Self {
            transport,
            from,
            to,
            retry_window: Duration::from_secs(config.retry_window_secs),
        })
    }

    fn build_message(&self, alert: &Alert) -> Result<Message> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(alert.subject())
            .header(ContentType::TEXT_PLAIN)
            .body(alert.body())
            .context("Failed to build alert email")
    }
}

#[async_trait]
impl AlertSink for EmailAlertSink {
    async fn deliver(&self, alert: &Alert) -> Result<()> {
        let message = self.build_message(alert)?;

        let policy = ExponentialBackoff {
            max_elapsed_time: Some(self.retry_window),
            ..Default::default()
        };

        let transport = &self.transport;
        let message = &message;

        backoff::future::retry(policy, || async move {
            transport.send(message.clone()).await.map_err(|e| {
                if e.is_permanent() {
                    backoff::Error::permanent(e)
                } else {
                    warn!(error = %e, "SMTP send failed, retrying");
                    backoff::Error::transient(e)
                }
            })
        })
        .await
        .context("Failed to send alert email")?;

        info!(symbol = %alert.signal.symbol, to = %self.to, "Alert email sent");
        Ok(())
    }
}
