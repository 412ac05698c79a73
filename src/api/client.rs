use crate::api::torrent_client::TorrentClient;
use crate::core::error::ClientError;
use crate::models::limits::{GlobalShareLimits, ShareLimits, SpeedLimit};
use crate::models::torrent::{parse_tags, TorrentQuery, TorrentSnapshot};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

const PAUSED_STATES: [&str; 4] = ["pausedUP", "pausedDL", "stoppedUP", "stoppedDL"];
const ERRORED_STATES: [&str; 2] = ["error", "missingFiles"];

/// qBittorrent WebAPI v2 client
pub struct QbitClient {
    client: reqwest::Client,
    base_url: String,
}

/// Torrent record as returned by `torrents/info`
#[derive(Debug, Deserialize)]
pub struct ApiTorrent {
    pub hash: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub ratio: f64,
    #[serde(default)]
    pub seeding_time: i64,
    #[serde(default)]
    pub up_limit: i64,
    /// Configured ratio limit (`max_ratio` in the payload is the effective one)
    #[serde(default = "default_unlimited_ratio")]
    pub ratio_limit: f64,
    /// Configured seeding time limit in minutes
    #[serde(default = "default_unlimited_minutes")]
    pub seeding_time_limit: i64,
    #[serde(default)]
    pub num_complete: u32,
    #[serde(default)]
    pub last_activity: i64,
    #[serde(default)]
    pub content_path: String,
    #[serde(default)]
    pub tracker: String,
    #[serde(default)]
    pub state: String,
}

/// Subset of `app/preferences` holding the global share limits
#[derive(Debug, Deserialize)]
pub struct ApiPreferences {
    #[serde(default)]
    pub max_ratio_enabled: bool,
    #[serde(default)]
    pub max_ratio: f64,
    #[serde(default)]
    pub max_seeding_time_enabled: bool,
    #[serde(default)]
    pub max_seeding_time: i64,
}

fn default_unlimited_ratio() -> f64 {
    -1.0
}

fn default_unlimited_minutes() -> i64 {
    -1
}

impl From<ApiTorrent> for TorrentSnapshot {
    fn from(t: ApiTorrent) -> Self {
        let paused = PAUSED_STATES.contains(&t.state.as_str());
        let errored = ERRORED_STATES.contains(&t.state.as_str());
        TorrentSnapshot {
            hash: t.hash,
            name: t.name,
            category: t.category,
            tags: parse_tags(&t.tags),
            ratio: t.ratio,
            seeding_time: t.seeding_time,
            up_limit: t.up_limit,
            max_ratio: t.ratio_limit,
            max_seeding_time: t.seeding_time_limit,
            num_complete: t.num_complete,
            last_activity: t.last_activity,
            content_path: t.content_path,
            tracker: t.tracker,
            paused,
            errored,
        }
    }
}

impl From<ApiPreferences> for GlobalShareLimits {
    fn from(p: ApiPreferences) -> Self {
        GlobalShareLimits {
            max_ratio_enabled: p.max_ratio_enabled,
            max_ratio: p.max_ratio,
            max_seeding_time_enabled: p.max_seeding_time_enabled,
            max_seeding_time: p.max_seeding_time,
        }
    }
}

impl QbitClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()
            .map_err(ClientError::Builder)?;

        Ok(Self {
            client,
            base_url: url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v2/{}", self.base_url, path)
    }

    /// Open a cookie session. Clients with auth bypass for the local network
    /// can skip this.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ClientError> {
        let path = "auth/login";
        let response = self
            .client
            .post(self.endpoint(path))
            .header("Referer", &self.base_url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                endpoint: path.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(ClientError::Status {
                endpoint: path.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| ClientError::Decode {
            endpoint: path.to_string(),
            source,
        })?;

        if body.trim() != "Ok." {
            return Err(ClientError::LoginRejected(body.trim().to_string()));
        }

        info!(url = %self.base_url, "Logged in to qBittorrent");
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, ClientError> {
        let response = self
            .client
            .get(self.endpoint(path))
            .query(query)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                endpoint: path.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(ClientError::Status {
                endpoint: path.to_string(),
                status: response.status().as_u16(),
            });
        }

        response.json::<T>().await.map_err(|source| ClientError::Decode {
            endpoint: path.to_string(),
            source,
        })
    }

    async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Result<(), ClientError> {
        debug!(endpoint = path, "Sending torrent client command");

        let response = self
            .client
            .post(self.endpoint(path))
            .form(form)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                endpoint: path.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(ClientError::Status {
                endpoint: path.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl TorrentClient for QbitClient {
    async fn list_torrents(&self, query: TorrentQuery<'_>) -> Result<Vec<TorrentSnapshot>, ClientError> {
        let params = match query {
            TorrentQuery::Status(filter) => [("filter", filter.as_str())],
            TorrentQuery::Hash(hash) => [("hashes", hash)],
        };
        let torrents: Vec<ApiTorrent> = self.get_json("torrents/info", &params).await?;
        Ok(torrents.into_iter().map(TorrentSnapshot::from).collect())
    }

    async fn add_tags(&self, hash: &str, tags: &[String]) -> Result<(), ClientError> {
        let tags = tags.join(",");
        self.post_form("torrents/addTags", &[("hashes", hash), ("tags", &tags)]).await
    }

    async fn remove_tags(&self, hash: &str, tags: &[String]) -> Result<(), ClientError> {
        let tags = tags.join(",");
        self.post_form("torrents/removeTags", &[("hashes", hash), ("tags", &tags)]).await
    }

    async fn set_upload_limit(&self, hash: &str, limit: SpeedLimit) -> Result<(), ClientError> {
        let limit = limit.to_bytes().to_string();
        self.post_form("torrents/setUploadLimit", &[("hashes", hash), ("limit", &limit)]).await
    }

    async fn set_share_limits(&self, hash: &str, limits: ShareLimits) -> Result<(), ClientError> {
        let ratio = limits.ratio.to_raw().to_string();
        let seeding_time = limits.seeding_time.to_raw().to_string();
        let inactive = limits.inactive_seeding_time.to_raw().to_string();
        self.post_form(
            "torrents/setShareLimits",
            &[
                ("hashes", hash),
                ("ratioLimit", &ratio),
                ("seedingTimeLimit", &seeding_time),
                ("inactiveSeedingTimeLimit", &inactive),
            ],
        )
        .await
    }

    async fn resume(&self, hash: &str) -> Result<(), ClientError> {
        // qBittorrent 5 renamed resume to start
        match self.post_form("torrents/resume", &[("hashes", hash)]).await {
            Err(ClientError::Status { status: 404, .. }) => {
                self.post_form("torrents/start", &[("hashes", hash)]).await
            }
            other => other,
        }
    }

    async fn delete(&self, hash: &str, with_content: bool) -> Result<(), ClientError> {
        let delete_files = if with_content { "true" } else { "false" };
        self.post_form("torrents/delete", &[("hashes", hash), ("deleteFiles", delete_files)]).await
    }

    async fn tags(&self) -> Result<Vec<String>, ClientError> {
        self.get_json("torrents/tags", &[]).await
    }

    async fn delete_tags(&self, tags: &[String]) -> Result<(), ClientError> {
        let tags = tags.join(",");
        self.post_form("torrents/deleteTags", &[("tags", &tags)]).await
    }

    async fn global_share_limits(&self) -> Result<GlobalShareLimits, ClientError> {
        let prefs: ApiPreferences = self.get_json("app/preferences", &[]).await?;
        Ok(prefs.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::limits::Limit;

    #[test]
    fn test_qbit_client_creation() {
        let client = QbitClient::new("http://localhost:8080/", Duration::from_secs(30));
        assert!(client.is_ok());
        let client = client.unwrap();
        assert_eq!(
            client.endpoint("torrents/info"),
            "http://localhost:8080/api/v2/torrents/info"
        );
    }

    #[test]
    fn test_api_torrent_conversion() {
        let json = r#"{
            "hash": "8c212779b4abde7c6bc608063a0d008b7e40ce32",
            "name": "debian-12.iso",
            "category": "linux",
            "tags": "noHL, ~share_limit_1.default",
            "ratio": 2.5,
            "seeding_time": 7200,
            "up_limit": 512000,
            "max_ratio": 1.0,
            "ratio_limit": -2,
            "max_seeding_time": 1440,
            "seeding_time_limit": -2,
            "num_complete": 12,
            "last_activity": 1699564800,
            "content_path": "/data/torrents/debian-12.iso",
            "tracker": "https://tracker.example/announce",
            "state": "pausedUP"
        }"#;

        let api: ApiTorrent = serde_json::from_str(json).unwrap();
        let snapshot = TorrentSnapshot::from(api);

        assert_eq!(snapshot.tags, vec!["noHL", "~share_limit_1.default"]);
        assert_eq!(snapshot.max_ratio, -2.0);
        assert_eq!(snapshot.max_seeding_time, -2);
        assert_eq!(snapshot.ratio_limit(), Limit::Global);
        assert_eq!(snapshot.seeding_time_limit(), Limit::Global);
        assert_eq!(snapshot.upload_limit(), SpeedLimit::Kib(500));
        assert!(snapshot.paused);
        assert!(!snapshot.errored);
    }

    #[test]
    fn test_configured_limits_win_over_effective_ones() {
        // A torrent inheriting the global 1.0 ratio reports max_ratio 1.0
        // but ratio_limit -2; the configured value is what the engine compares
        let json = r#"{"hash": "abc", "name": "inherits", "max_ratio": 1.0, "ratio_limit": -2,
            "max_seeding_time": 600, "seeding_time_limit": 600}"#;

        let snapshot = TorrentSnapshot::from(serde_json::from_str::<ApiTorrent>(json).unwrap());

        assert_eq!(snapshot.max_ratio, -2.0);
        assert_eq!(snapshot.max_seeding_time, 600);
    }

    #[test]
    fn test_api_torrent_defaults_and_error_state() {
        let json = r#"{"hash": "abc", "name": "broken", "state": "missingFiles"}"#;

        let api: ApiTorrent = serde_json::from_str(json).unwrap();
        let snapshot = TorrentSnapshot::from(api);

        assert!(snapshot.tags.is_empty());
        assert_eq!(snapshot.max_ratio, -1.0);
        assert_eq!(snapshot.max_seeding_time, -1);
        assert_eq!(snapshot.ratio_limit(), Limit::Unlimited);
        assert!(snapshot.errored);
        assert!(!snapshot.paused);
    }

    #[test]
    fn test_preferences_conversion() {
        let json = r#"{"max_ratio_enabled": true, "max_ratio": 1.5, "max_seeding_time_enabled": false, "max_seeding_time": 600, "locale": "en"}"#;

        let prefs: ApiPreferences = serde_json::from_str(json).unwrap();
        let global = GlobalShareLimits::from(prefs);

        assert!(global.max_ratio_enabled);
        assert_eq!(global.max_ratio, 1.5);
        assert!(!global.max_seeding_time_enabled);
    }
}
