use crate::api::torrent_client::TorrentClient;
use crate::core::error::ClientError;
use crate::models::limits::{GlobalShareLimits, ShareLimits, SpeedLimit};
use crate::models::torrent::{TorrentQuery, TorrentSnapshot};
use async_trait::async_trait;
use tracing::info;

/// Simulation mode: reads go to the wrapped client, writes are logged and dropped.
pub struct SimulatedClient<C> {
    inner: C,
}

impl<C: TorrentClient> SimulatedClient<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<C: TorrentClient> TorrentClient for SimulatedClient<C> {
    async fn list_torrents(&self, query: TorrentQuery<'_>) -> Result<Vec<TorrentSnapshot>, ClientError> {
        self.inner.list_torrents(query).await
    }

    async fn add_tags(&self, hash: &str, tags: &[String]) -> Result<(), ClientError> {
        info!(dry_run = true, hash, tags = ?tags, "Would add tags");
        Ok(())
    }

    async fn remove_tags(&self, hash: &str, tags: &[String]) -> Result<(), ClientError> {
        info!(dry_run = true, hash, tags = ?tags, "Would remove tags");
        Ok(())
    }

    async fn set_upload_limit(&self, hash: &str, limit: SpeedLimit) -> Result<(), ClientError> {
        info!(dry_run = true, hash, limit = %limit, "Would set upload limit");
        Ok(())
    }

    async fn set_share_limits(&self, hash: &str, limits: ShareLimits) -> Result<(), ClientError> {
        info!(
            dry_run = true,
            hash,
            ratio_limit = limits.ratio.to_raw(),
            seeding_time_limit = limits.seeding_time.to_raw(),
            inactive_seeding_time_limit = limits.inactive_seeding_time.to_raw(),
            "Would set share limits"
        );
        Ok(())
    }

    async fn resume(&self, hash: &str) -> Result<(), ClientError> {
        info!(dry_run = true, hash, "Would resume torrent");
        Ok(())
    }

    async fn delete(&self, hash: &str, with_content: bool) -> Result<(), ClientError> {
        info!(dry_run = true, hash, with_content, "Would delete torrent");
        Ok(())
    }

    async fn tags(&self) -> Result<Vec<String>, ClientError> {
        self.inner.tags().await
    }

    async fn delete_tags(&self, tags: &[String]) -> Result<(), ClientError> {
        info!(dry_run = true, tags = ?tags, "Would delete tags");
        Ok(())
    }

    async fn global_share_limits(&self) -> Result<GlobalShareLimits, ClientError> {
        self.inner.global_share_limits().await
    }
}
