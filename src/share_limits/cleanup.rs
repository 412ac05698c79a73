use crate::api::torrent_client::TorrentClient;
use crate::core::error::ClientError;
use crate::models::notification::NotificationRecord;
use crate::models::torrent::{StatusFilter, TorrentQuery, TorrentSnapshot};
use crate::notify::notifier::{deliver, Notifier};
use crate::share_limits::group::GroupConfig;
use crate::utils::path::PathMapper;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// A torrent that reached a ceiling and waits for removal
#[derive(Clone, Debug)]
pub struct PendingDeletion {
    pub torrent: TorrentSnapshot,
    /// Content path as seen locally, after remapping
    pub content_path: PathBuf,
    pub reason: String,
}

impl PendingDeletion {
    pub fn new(torrent: TorrentSnapshot, paths: &PathMapper, reason: String) -> Self {
        let content_path = paths.remap(&torrent.content_path);
        Self {
            torrent,
            content_path,
            reason,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeletionKind {
    /// Content already gone from disk
    MissingContent,
    /// Another torrent still seeds the same content
    CrossSeed,
    /// Registration and content files
    WithContent,
}

impl DeletionKind {
    pub fn removes_content(&self) -> bool {
        matches!(self, DeletionKind::WithContent)
    }

    fn action(&self) -> &'static str {
        match self {
            DeletionKind::MissingContent => "Deleted .torrent but NOT content files (content path missing).",
            DeletionKind::CrossSeed => "Deleted .torrent but NOT content files (cross-seed).",
            DeletionKind::WithContent => "Deleted .torrent AND content files.",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CleanupCounts {
    /// Registration only
    pub deleted: usize,
    pub deleted_contents: usize,
}

struct Deleted {
    torrent: TorrentSnapshot,
    kind: DeletionKind,
}

/// Removes torrents that met their group's ceilings and reports on it
pub struct CleanupCoordinator<'a> {
    client: &'a dyn TorrentClient,
    notifier: &'a dyn Notifier,
    paths: &'a PathMapper,
    notification_limit: usize,
}

impl<'a> CleanupCoordinator<'a> {
    pub fn new(
        client: &'a dyn TorrentClient,
        notifier: &'a dyn Notifier,
        paths: &'a PathMapper,
        notification_limit: usize,
    ) -> Self {
        Self {
            client,
            notifier,
            paths,
            notification_limit,
        }
    }

    pub async fn run(
        &self,
        group: &GroupConfig,
        pending: BTreeMap<String, PendingDeletion>,
    ) -> Result<CleanupCounts, ClientError> {
        info!(group = %group.name, pending = pending.len(), "Cleaning up torrents that met share limits");

        let batched = pending.len() > self.notification_limit;
        let mut counts = CleanupCounts::default();
        let mut deleted = Vec::new();
        let mut all_torrents: Option<Vec<TorrentSnapshot>> = None;

        for (hash, entry) in pending {
            let refreshed = self.client.list_torrents(TorrentQuery::Hash(&hash)).await?;
            let live = match refreshed.into_iter().next() {
                Some(t) => t,
                None => {
                    warn!(hash = %hash, name = %entry.torrent.name, "Torrent vanished before cleanup, skipping");
                    continue;
                }
            };

            let live_path = self.paths.remap(&live.content_path);
            if live_path != entry.content_path {
                warn!(
                    hash = %hash,
                    name = %live.name,
                    recorded_path = %entry.content_path.display(),
                    live_path = %live_path.display(),
                    "Content path changed since evaluation, skipping"
                );
                continue;
            }

            let kind = if !PathMapper::exists(&live_path) {
                DeletionKind::MissingContent
            } else {
                if all_torrents.is_none() {
                    all_torrents = Some(self.client.list_torrents(TorrentQuery::Status(StatusFilter::All)).await?);
                }
                let others = all_torrents.as_deref().unwrap_or_default();
                if is_cross_seed(&live, others) {
                    DeletionKind::CrossSeed
                } else {
                    DeletionKind::WithContent
                }
            };

            info!(
                hash = %hash,
                name = %live.name,
                tracker = %live.tracker,
                group = %group.name,
                reason = %entry.reason,
                content_path = %live_path.display(),
                kind = ?kind,
                "Removing torrent that met share limits"
            );
            self.client.delete(&hash, kind.removes_content()).await?;

            if let Some(list) = all_torrents.as_mut() {
                list.retain(|t| t.hash != hash);
            }
            if kind.removes_content() {
                counts.deleted_contents += 1;
            } else {
                counts.deleted += 1;
            }

            if !batched {
                self.notify_single(group, &live, &entry.reason, kind).await;
            }
            deleted.push(Deleted { torrent: live, kind });
        }

        if batched {
            self.notify_batched(group, &deleted).await;
        }

        debug!(
            group = %group.name,
            deleted = counts.deleted,
            deleted_contents = counts.deleted_contents,
            "Cleanup finished"
        );
        Ok(counts)
    }

    async fn notify_single(&self, group: &GroupConfig, torrent: &TorrentSnapshot, reason: &str, kind: DeletionKind) {
        let body = [
            format!("Torrent Name: {}", torrent.name),
            format!("Tracker: {}", torrent.tracker),
            reason.to_string(),
            "Cleanup: True [Meets Share Limits]".to_string(),
            kind.action().to_string(),
        ]
        .join("\n");

        let mut record = NotificationRecord::new("cleanup_share_limits", "Share limit removal", body);
        record.grouping = Some(group.name.clone());
        record.torrents = vec![torrent.name.clone()];
        record.torrent_category = Some(torrent.category.clone());
        record.torrent_tracker = Some(torrent.tracker.clone());
        record.cleanup = Some(true);
        record.torrents_deleted_and_contents = Some(kind.removes_content());
        deliver(self.notifier, &record).await;
    }

    async fn notify_batched(&self, group: &GroupConfig, deleted: &[Deleted]) {
        for with_content in [false, true] {
            let names: Vec<String> = deleted
                .iter()
                .filter(|d| d.kind.removes_content() == with_content)
                .map(|d| d.torrent.name.clone())
                .collect();
            if names.is_empty() {
                continue;
            }

            let (title, body) = if with_content {
                (
                    "Share limit removal - Deleted .torrent AND content files.",
                    format!("Deleted {} .torrents AND content files.", names.len()),
                )
            } else {
                (
                    "Share limit removal - Deleted .torrent but NOT content files.",
                    format!("Deleted {} .torrents but NOT content files.", names.len()),
                )
            };

            let mut record = NotificationRecord::new("cleanup_share_limits", title, body);
            record.grouping = Some(group.name.clone());
            record.torrents = names;
            record.cleanup = Some(true);
            record.torrents_deleted_and_contents = Some(with_content);
            deliver(self.notifier, &record).await;
        }
    }
}

/// Another healthy torrent points at the same content
fn is_cross_seed(torrent: &TorrentSnapshot, all: &[TorrentSnapshot]) -> bool {
    all.iter()
        .any(|t| t.hash != torrent.hash && t.content_path == torrent.content_path && !t.errored)
}
