//! Notifier used when no SMTP relay is configured.

use async_trait::async_trait;
use tracing::info;

use crate::domain::{AppError, DepositNotification, Notifier};

/// Writes notifications to the log instead of sending them
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl LogNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_deposit_notification(
        &self,
        notification: &DepositNotification,
    ) -> Result<(), AppError> {
        info!(
            to = %notification.recipient,
            subject = %notification.subject,
            body = %notification.body,
            "Deposit notification (SMTP disabled)"
        );
        Ok(())
    }
}
