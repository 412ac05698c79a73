use crate::models::limits::{Limit, SpeedLimit};

/// Point-in-time view of a torrent as reported by the torrent client
#[derive(Clone, Debug, PartialEq)]
pub struct TorrentSnapshot {
    /// Info hash, unique per torrent
    pub hash: String,
    pub name: String,
    pub category: String,
    pub tags: Vec<String>,
    pub ratio: f64,
    /// Total seeding time in seconds
    pub seeding_time: i64,
    /// Upload cap in bytes per second (0 or -1 means no explicit cap)
    pub up_limit: i64,
    /// Configured ratio limit (-1 no limit, -2 global default)
    pub max_ratio: f64,
    /// Configured seeding time limit in minutes (-1 no limit, -2 global default)
    pub max_seeding_time: i64,
    /// Number of seeders in the swarm
    pub num_complete: u32,
    /// Unix timestamp of the last upload or download activity
    pub last_activity: i64,
    pub content_path: String,
    /// Current working tracker url, empty when unknown
    pub tracker: String,
    pub paused: bool,
    /// Client reports an error or missing files
    pub errored: bool,
}

impl TorrentSnapshot {
    pub fn ratio_limit(&self) -> Limit<f64> {
        Limit::<f64>::from_raw(self.max_ratio)
    }

    pub fn seeding_time_limit(&self) -> Limit<i64> {
        Limit::<i64>::from_raw(self.max_seeding_time)
    }

    /// Upload cap normalized to KiB/s with a single sentinel for "no cap"
    pub fn upload_limit(&self) -> SpeedLimit {
        SpeedLimit::from_bytes(self.up_limit)
    }
}

/// Which torrents a listing call should return
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    Completed,
}

impl StatusFilter {
    pub fn from_completed_only(completed_only: bool) -> Self {
        if completed_only {
            StatusFilter::Completed
        } else {
            StatusFilter::All
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Completed => "completed",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TorrentQuery<'a> {
    Status(StatusFilter),
    Hash(&'a str),
}

/// Split a client tag string ("a, b,c") into trimmed, non-empty tags
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
