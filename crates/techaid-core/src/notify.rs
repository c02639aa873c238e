//! Outbound notification seam.

use thiserror::Error;

/// A rendered HTML email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

#[derive(Debug, Clone, Error)]
#[error("Notification failed: {0}")]
pub struct NotificationError(pub String);

/// Delivers emails. Failures are reported, never retried.
pub trait Notifier: Send + Sync {
    fn send(
        &self,
        message: EmailMessage,
    ) -> impl Future<Output = Result<(), NotificationError>> + Send;
}
