use crate::core::error::NotifyError;
use crate::models::notification::NotificationRecord;
use async_trait::async_trait;
use tracing::{info, warn};

/// Delivers notification records produced by the engine
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, record: &NotificationRecord) -> Result<(), NotifyError>;
}

/// Fallback used when no delivery endpoint is configured
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, record: &NotificationRecord) -> Result<(), NotifyError> {
        info!(
            function = %record.function,
            grouping = ?record.grouping,
            torrents = record.torrents.len(),
            title = %record.title,
            "{}",
            record.body
        );
        Ok(())
    }
}

/// Send a record, logging instead of failing when delivery breaks
pub async fn deliver(notifier: &dyn Notifier, record: &NotificationRecord) {
    if let Err(e) = notifier.send(record).await {
        warn!(error = %e, function = %record.function, title = %record.title, "Failed to deliver notification");
    }
}
