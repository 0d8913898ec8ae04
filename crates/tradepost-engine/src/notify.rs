//! Notification delivery.
//!
//! The engine fires notifications after an operation commits, outside
//! every critical section. Delivery is at-most-once: a failed send is
//! logged and dropped. Trades never roll back over a notification.

use tradepost_types::{NotifyKind, NotifyPort, Result, UserId};

/// Notification channel that writes to the log stream.
///
/// The default channel for deployments without a real delivery pipeline;
/// also handy in development, where the log line is the notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl LogNotifier {
    /// Creates a log-backed notifier.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl NotifyPort for LogNotifier {
    fn notify(&self, user: UserId, kind: NotifyKind, title: &str, body: &str) -> Result<()> {
        tracing::info!(%user, %kind, title, body, "notification");
        Ok(())
    }
}
