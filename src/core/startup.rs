use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::api::client::QbitClient;
use crate::api::dry_run::SimulatedClient;
use crate::api::torrent_client::TorrentClient;
use crate::core::config::Config;
use crate::notify::notifier::{LogNotifier, Notifier};
use crate::notify::webhook::WebhookNotifier;
use crate::share_limits::matcher::shadowed_groups;
use crate::share_limits::runner::ShareLimitsEngine;

/// Connect to qBittorrent, logging in when credentials are configured.
/// In dry run mode the client is wrapped so no write reaches it.
pub async fn connect_client(config: &Config) -> Result<Arc<dyn TorrentClient>> {
    let qbt = &config.qbittorrent;
    let client = QbitClient::new(&qbt.url, Duration::from_secs(qbt.timeout_seconds))
        .context("Failed to create qBittorrent client")?;

    if let (Some(username), Some(password)) = (&qbt.username, &qbt.password) {
        client
            .login(username, password)
            .await
            .context(format!("Failed to log in to qBittorrent at {}", qbt.url))?;
    }

    if config.settings.dry_run {
        warn!("Dry run enabled, no changes will be made to qBittorrent");
        return Ok(Arc::new(SimulatedClient::new(client)));
    }
    Ok(Arc::new(client))
}

pub fn build_notifier(config: &Config) -> Result<Arc<dyn Notifier>> {
    match &config.notifications.webhook_url {
        Some(url) => {
            let timeout = Duration::from_secs(config.notifications.timeout_seconds);
            let notifier = WebhookNotifier::new(url.clone(), timeout)
                .context("Failed to create webhook notifier")?;
            info!(url = %url, "Webhook notifications enabled");
            Ok(Arc::new(notifier))
        }
        None => Ok(Arc::new(LogNotifier)),
    }
}

pub fn build_engine(config: &Config, client: Arc<dyn TorrentClient>, notifier: Arc<dyn Notifier>) -> ShareLimitsEngine {
    let groups = config.groups();

    for (earlier, later) in shadowed_groups(&groups) {
        warn!(
            group = %later,
            shadowed_by = %earlier,
            "Share limits group has the same filters as a higher priority group and will never match"
        );
    }

    for group in &groups {
        info!(
            group = %group.name,
            priority = group.priority,
            max_ratio = group.ceilings.max_ratio.to_raw(),
            max_seeding_time = group.ceilings.max_seeding_time.to_raw(),
            max_last_active = group.ceilings.max_last_active.to_raw(),
            cleanup = group.cleanup,
            "Loaded share limits group"
        );
    }

    ShareLimitsEngine::new(client, notifier, config.engine_settings(), groups)
}
