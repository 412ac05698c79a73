use crate::core::error::ClientError;
use crate::models::limits::{GlobalShareLimits, ShareLimits, SpeedLimit};
use crate::models::torrent::{TorrentQuery, TorrentSnapshot};
use async_trait::async_trait;

/// Operations the share limits engine needs from a torrent client.
///
/// Every call goes straight to the client; implementations do not cache, so a
/// listing issued after a mutation observes its effect.
#[async_trait]
pub trait TorrentClient: Send + Sync {
    /// List torrents by status filter, or fetch a single torrent by hash.
    async fn list_torrents(&self, query: TorrentQuery<'_>) -> Result<Vec<TorrentSnapshot>, ClientError>;

    async fn add_tags(&self, hash: &str, tags: &[String]) -> Result<(), ClientError>;

    async fn remove_tags(&self, hash: &str, tags: &[String]) -> Result<(), ClientError>;

    async fn set_upload_limit(&self, hash: &str, limit: SpeedLimit) -> Result<(), ClientError>;

    async fn set_share_limits(&self, hash: &str, limits: ShareLimits) -> Result<(), ClientError>;

    async fn resume(&self, hash: &str) -> Result<(), ClientError>;

    /// Remove the torrent, optionally deleting its content from disk.
    async fn delete(&self, hash: &str, with_content: bool) -> Result<(), ClientError>;

    /// All tags known to the client, assigned or not.
    async fn tags(&self) -> Result<Vec<String>, ClientError>;

    /// Delete tags client-wide.
    async fn delete_tags(&self, tags: &[String]) -> Result<(), ClientError>;

    async fn global_share_limits(&self) -> Result<GlobalShareLimits, ClientError>;
}
