//! SMTP delivery of deposit notifications.

use async_trait::async_trait;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::{ExposeSecret, SecretString};
use std::env;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

use crate::domain::{AppError, DepositNotification, NotificationError, Notifier};

/// Default submission port (STARTTLS)
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Default time budget for one delivery attempt
pub const DEFAULT_SMTP_TIMEOUT: Duration = Duration::from_secs(10);

/// SMTP relay configuration
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    /// Sender mailbox; defaults to `username`
    pub from_address: String,
    pub timeout: Duration,
}

impl SmtpConfig {
    /// Read relay settings from the environment.
    ///
    /// Returns `None` when `SMTP_SERVER` is unset or empty.
    pub fn from_env() -> Option<Self> {
        let host = env::var("SMTP_SERVER").ok().filter(|h| !h.is_empty())?;
        let port = env::var("SMTP_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_SMTP_PORT);
        let username = env::var("SMTP_USER").unwrap_or_default();
        let password = SecretString::from(env::var("SMTP_PASS").unwrap_or_default());
        let from_address = env::var("SMTP_FROM")
            .ok()
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| username.clone());
        let timeout = env::var("SMTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SMTP_TIMEOUT);

        Some(Self {
            host,
            port,
            username,
            password,
            from_address,
            timeout,
        })
    }
}

/// Notifier that relays mail through an authenticated SMTP server
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    /// Build the transport. No connection is made until the first send.
    pub fn new(config: SmtpConfig) -> Result<Self, AppError> {
        let from: Mailbox = config
            .from_address
            .parse()
            .map_err(|e| NotificationError::Address(format!("{}: {}", config.from_address, e)))?;

        let tls = TlsParameters::new(config.host.clone())
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            .port(config.port)
            .tls(Tls::Opportunistic(tls))
            .timeout(Some(config.timeout));

        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.expose_secret().to_string(),
            ));
        }

        info!(host = %config.host, port = config.port, "SMTP notifier configured");

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    /// Assemble the plain-text message for a notification.
    pub fn build_message(&self, notification: &DepositNotification) -> Result<Message, AppError> {
        let to: Mailbox = notification.recipient.parse().map_err(|e| {
            NotificationError::Address(format!("{}: {}", notification.recipient, e))
        })?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(notification.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(notification.body.clone())
            .map_err(|e| NotificationError::Message(e.to_string()))?;

        Ok(message)
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    #[instrument(skip(self, notification), fields(to = %notification.recipient))]
    async fn send_deposit_notification(
        &self,
        notification: &DepositNotification,
    ) -> Result<(), AppError> {
        let message = self.build_message(notification)?;

        let response = self.transport.send(message).await.map_err(|e| {
            error!(error = %e, "SMTP delivery failed");
            NotificationError::Transport(e.to_string())
        })?;

        debug!(code = %response.code(), "SMTP relay accepted notification");
        Ok(())
    }
}
