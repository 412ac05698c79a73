use crate::core::error::NotifyError;
use crate::models::notification::NotificationRecord;
use crate::notify::notifier::Notifier;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Posts each record as JSON to a webhook endpoint
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, record: &NotificationRecord) -> Result<(), NotifyError> {
        debug!(url = %self.url, function = %record.function, "Sending webhook notification");

        let response = self
            .client
            .post(&self.url)
            .json(record)
            .send()
            .await
            .map_err(|source| NotifyError::Transport {
                url: self.url.clone(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(NotifyError::Status {
                url: self.url.clone(),
                status: response.status().as_u16(),
            });
        }

        Ok(())
    }
}
