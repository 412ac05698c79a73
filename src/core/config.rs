use crate::models::limits::{Limit, SpeedLimit};
use crate::models::torrent::StatusFilter;
use crate::share_limits::group::{
    Ceilings, GroupConfig, GuardThresholds, MatchPredicate, RatioTrigger, SpeedPolicy, Tagging,
};
use crate::share_limits::guard::HoldTags;
use crate::share_limits::runner::EngineSettings;
use crate::utils::path::PathMapper;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub qbittorrent: QbittorrentConfig,
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub share_limits: BTreeMap<String, GroupSection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QbittorrentConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SettingsConfig {
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default = "default_true")]
    pub share_limits_filter_completed: bool,
    #[serde(default = "default_share_limits_tag")]
    pub share_limits_tag: String,
    #[serde(default = "default_min_seeding_time_tag")]
    pub share_limits_min_seeding_time_tag: String,
    #[serde(default = "default_min_num_seeds_tag")]
    pub share_limits_min_num_seeds_tag: String,
    #[serde(default = "default_last_active_tag")]
    pub share_limits_last_active_tag: String,
    #[serde(default = "default_group_notification_limit")]
    pub group_notification_limit: usize,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            share_limits_filter_completed: true,
            share_limits_tag: default_share_limits_tag(),
            share_limits_min_seeding_time_tag: default_min_seeding_time_tag(),
            share_limits_min_num_seeds_tag: default_min_num_seeds_tag(),
            share_limits_last_active_tag: default_last_active_tag(),
            group_notification_limit: default_group_notification_limit(),
        }
    }
}

/// Where the client's download root appears on this machine
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DirectoryConfig {
    #[serde(default)]
    pub root_dir: String,
    pub remote_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ScheduleConfig {
    /// Absent means a single pass
    pub interval_minutes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            console: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationsConfig {
    pub webhook_url: Option<String>,
    #[serde(default = "default_webhook_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_seconds: default_webhook_timeout_seconds(),
        }
    }
}

/// One `[share_limits.<name>]` table as written in the config file.
/// Limits use the client's raw values: -1 no limit, -2 global default.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupSection {
    pub priority: i64,
    #[serde(default)]
    pub include_all_tags: Vec<String>,
    #[serde(default)]
    pub include_any_tags: Vec<String>,
    #[serde(default)]
    pub exclude_all_tags: Vec<String>,
    #[serde(default)]
    pub exclude_any_tags: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default = "default_no_limit_ratio")]
    pub max_ratio: f64,
    #[serde(default = "default_no_limit")]
    pub max_seeding_time: i64,
    #[serde(default = "default_no_limit")]
    pub max_last_active: i64,
    #[serde(default)]
    pub min_seeding_time: i64,
    #[serde(default)]
    pub min_num_seeds: i64,
    #[serde(default)]
    pub min_last_active: i64,
    /// KiB/s
    #[serde(default = "default_no_limit")]
    pub limit_upload_speed: i64,
    #[serde(default)]
    pub enable_group_upload_speed: bool,
    pub limit_upload_speed_on_ratio_target_ratio: Option<f64>,
    pub limit_upload_speed_on_ratio_speed_limit_kib: Option<i64>,
    #[serde(default)]
    pub cleanup: bool,
    #[serde(default = "default_true")]
    pub resume_torrent_after_change: bool,
    #[serde(default = "default_true")]
    pub add_group_to_tag: bool,
    pub custom_tag: Option<String>,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_webhook_timeout_seconds() -> u64 {
    10
}

fn default_share_limits_tag() -> String {
    "~share_limit".to_string()
}

fn default_min_seeding_time_tag() -> String {
    "MinSeedTimeNotReached".to_string()
}

fn default_min_num_seeds_tag() -> String {
    "MinSeedsNotMet".to_string()
}

fn default_last_active_tag() -> String {
    "LastActiveLimitNotReached".to_string()
}

fn default_group_notification_limit() -> usize {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_no_limit_ratio() -> f64 {
    -1.0
}

fn default_no_limit() -> i64 {
    -1
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.qbittorrent.url.is_empty() {
            bail!("qbittorrent url must not be empty");
        }

        if self.settings.share_limits_tag.is_empty() {
            bail!("share_limits_tag must not be empty");
        }

        if self.settings.group_notification_limit == 0 {
            bail!("group_notification_limit must be greater than 0");
        }

        if self.schedule.interval_minutes == Some(0) {
            bail!("schedule interval_minutes must be greater than 0");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            bail!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            );
        }

        let valid_formats = ["json", "console"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            bail!(
                "Invalid log format '{}'. Must be one of: json, console",
                self.logging.format
            );
        }

        if self.share_limits.is_empty() {
            bail!("At least one [share_limits.<group>] section is required");
        }

        let mut priorities: HashMap<i64, &str> = HashMap::new();
        let mut custom_tags: HashMap<&str, &str> = HashMap::new();

        for (name, group) in &self.share_limits {
            if let Some(other) = priorities.insert(group.priority, name) {
                bail!(
                    "share_limits groups '{}' and '{}' share priority {}",
                    other,
                    name,
                    group.priority
                );
            }

            if let Some(tag) = &group.custom_tag {
                if tag.is_empty() {
                    bail!("share_limits.{}: custom_tag must not be empty", name);
                }
                if tag.starts_with(&self.settings.share_limits_tag) {
                    bail!(
                        "share_limits.{}: custom_tag '{}' must not start with share_limits_tag '{}'",
                        name,
                        tag,
                        self.settings.share_limits_tag
                    );
                }
                if let Some(other) = custom_tags.insert(tag, name) {
                    bail!("share_limits groups '{}' and '{}' share custom_tag '{}'", other, name, tag);
                }
            }

            group.validate(name)?;
        }

        Ok(())
    }

    /// Groups in evaluation order
    pub fn groups(&self) -> Vec<GroupConfig> {
        let mut groups: Vec<GroupConfig> = self
            .share_limits
            .iter()
            .map(|(name, section)| section.to_group(name))
            .collect();
        groups.sort_by_key(|g| g.priority);
        groups
    }

    pub fn engine_settings(&self) -> EngineSettings {
        let root_dir = self.directory.root_dir.clone();
        let remote_dir = self.directory.remote_dir.clone().unwrap_or_else(|| root_dir.clone());

        EngineSettings {
            share_limits_tag: self.settings.share_limits_tag.clone(),
            hold_tags: HoldTags {
                min_num_seeds: self.settings.share_limits_min_num_seeds_tag.clone(),
                min_seeding_time: self.settings.share_limits_min_seeding_time_tag.clone(),
                last_active: self.settings.share_limits_last_active_tag.clone(),
            },
            status_filter: StatusFilter::from_completed_only(self.settings.share_limits_filter_completed),
            paths: PathMapper::new(root_dir, remote_dir),
            group_notification_limit: self.settings.group_notification_limit,
        }
    }
}

/// One year, the largest seeding time limit qBittorrent accepts
const MAX_MINUTES: i64 = 525_600;

impl GroupSection {
    fn validate(&self, name: &str) -> Result<()> {
        let r = self.max_ratio;
        if !(r == -2.0 || r == -1.0 || r >= 0.0) {
            bail!("share_limits.{}: max_ratio must be -2, -1 or >= 0, got {}", name, r);
        }

        if self.max_seeding_time < -2 {
            bail!(
                "share_limits.{}: max_seeding_time must be -2, -1 or >= 0, got {}",
                name,
                self.max_seeding_time
            );
        }

        if self.max_last_active < -1 {
            bail!(
                "share_limits.{}: max_last_active must be -1 or >= 0, got {}",
                name,
                self.max_last_active
            );
        }

        for (field, value) in [
            ("min_seeding_time", self.min_seeding_time),
            ("min_num_seeds", self.min_num_seeds),
            ("min_last_active", self.min_last_active),
        ] {
            if value < 0 {
                bail!("share_limits.{}: {} must be non-negative, got {}", name, field, value);
            }
        }

        for (field, value) in [
            ("max_seeding_time", self.max_seeding_time),
            ("max_last_active", self.max_last_active),
            ("min_seeding_time", self.min_seeding_time),
            ("min_last_active", self.min_last_active),
        ] {
            if value > MAX_MINUTES {
                bail!(
                    "share_limits.{}: {} must be at most {} minutes, got {}",
                    name,
                    field,
                    MAX_MINUTES,
                    value
                );
            }
        }

        if self.min_num_seeds > i64::from(u32::MAX) {
            bail!("share_limits.{}: min_num_seeds is too large", name);
        }

        match (
            self.limit_upload_speed_on_ratio_target_ratio,
            self.limit_upload_speed_on_ratio_speed_limit_kib,
        ) {
            (Some(target), Some(_)) if target < 0.0 => {
                bail!(
                    "share_limits.{}: limit_upload_speed_on_ratio_target_ratio must be >= 0, got {}",
                    name,
                    target
                );
            }
            (Some(_), None) | (None, Some(_)) => {
                bail!(
                    "share_limits.{}: limit_upload_speed_on_ratio_target_ratio and \
                    limit_upload_speed_on_ratio_speed_limit_kib must be set together",
                    name
                );
            }
            _ => {}
        }

        Ok(())
    }

    fn to_group(&self, name: &str) -> GroupConfig {
        let ratio_trigger = match (
            self.limit_upload_speed_on_ratio_target_ratio,
            self.limit_upload_speed_on_ratio_speed_limit_kib,
        ) {
            (Some(target_ratio), Some(kib)) => Some(RatioTrigger {
                target_ratio,
                speed: SpeedLimit::from_kib(kib),
            }),
            _ => None,
        };

        GroupConfig {
            name: name.to_string(),
            priority: self.priority,
            predicate: MatchPredicate {
                include_all_tags: self.include_all_tags.clone(),
                include_any_tags: self.include_any_tags.clone(),
                exclude_all_tags: self.exclude_all_tags.clone(),
                exclude_any_tags: self.exclude_any_tags.clone(),
                categories: self.categories.clone(),
            },
            ceilings: Ceilings {
                max_ratio: Limit::<f64>::from_raw(self.max_ratio),
                max_seeding_time: Limit::<i64>::from_raw(self.max_seeding_time),
                max_last_active: Limit::<i64>::from_raw(self.max_last_active),
            },
            guards: GuardThresholds {
                min_seeding_time: self.min_seeding_time,
                min_num_seeds: u32::try_from(self.min_num_seeds).unwrap_or(u32::MAX),
                min_last_active: self.min_last_active,
            },
            speed: SpeedPolicy {
                flat_limit: self.limit_upload_speed,
                split_across_group: self.enable_group_upload_speed,
                ratio_trigger,
            },
            cleanup: self.cleanup,
            resume_after_change: self.resume_torrent_after_change,
            tagging: Tagging {
                add_group_tag: self.add_group_to_tag,
                custom_tag: self.custom_tag.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
[qbittorrent]
url = "http://localhost:8080"

[share_limits.default]
priority = 999
"#;

    fn with_groups(groups: &str) -> String {
        format!("[qbittorrent]\nurl = \"http://localhost:8080\"\n\n{}", groups)
    }

    #[test]
    fn test_minimal_config_defaults() {
        let config = Config::parse(MINIMAL).unwrap();

        assert!(!config.settings.dry_run);
        assert_eq!(config.settings.share_limits_tag, "~share_limit");
        assert_eq!(config.settings.group_notification_limit, 10);
        assert_eq!(config.qbittorrent.timeout_seconds, 30);
        assert_eq!(config.logging.level, "info");
        assert!(config.schedule.interval_minutes.is_none());

        let groups = config.groups();
        assert_eq!(groups.len(), 1);
        let g = &groups[0];
        assert_eq!(g.name, "default");
        assert_eq!(g.ceilings.max_ratio, Limit::Unlimited);
        assert_eq!(g.speed.flat_limit, -1);
        assert!(g.resume_after_change);
        assert!(g.tagging.add_group_tag);
        assert!(!g.cleanup);
    }

    #[test]
    fn test_example_config_loads() {
        let config = Config::from_file(Path::new("config.example.toml")).expect("Failed to load config");

        let groups = config.groups();
        assert!(groups.windows(2).all(|w| w[0].priority < w[1].priority));
        assert!(groups.iter().any(|g| g.cleanup));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.qbittorrent.url, "http://localhost:8080");
    }

    #[test]
    fn test_from_file_missing() {
        let err = Config::from_file(Path::new("/nonexistent/share-limits.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_groups_sorted_by_priority() {
        let config = Config::parse(&with_groups(
            r#"
[share_limits.default]
priority = 10

[share_limits.noHL]
priority = 1
include_all_tags = ["noHL"]
max_ratio = 2.0
limit_upload_speed_on_ratio_target_ratio = 1.5
limit_upload_speed_on_ratio_speed_limit_kib = 500
"#,
        ))
        .unwrap();

        let groups = config.groups();
        assert_eq!(groups[0].name, "noHL");
        assert_eq!(groups[0].ceilings.max_ratio, Limit::Value(2.0));
        assert_eq!(
            groups[0].speed.ratio_trigger,
            Some(RatioTrigger {
                target_ratio: 1.5,
                speed: SpeedLimit::Kib(500),
            })
        );
        assert_eq!(groups[1].name, "default");
    }

    #[test]
    fn test_global_sentinels() {
        let config = Config::parse(&with_groups(
            "[share_limits.g]\npriority = 1\nmax_ratio = -2\nmax_seeding_time = -2\n",
        ))
        .unwrap();
        let g = &config.groups()[0];
        assert_eq!(g.ceilings.max_ratio, Limit::Global);
        assert_eq!(g.ceilings.max_seeding_time, Limit::Global);
    }

    #[test]
    fn test_engine_settings() {
        let config = Config::parse(&format!(
            "{}\n[directory]\nroot_dir = \"/data\"\n\n[settings]\nshare_limits_filter_completed = false\n",
            MINIMAL
        ))
        .unwrap();

        let settings = config.engine_settings();
        assert_eq!(settings.status_filter, StatusFilter::All);
        assert_eq!(settings.hold_tags.min_num_seeds, "MinSeedsNotMet");
        // remote_dir falls back to root_dir
        assert_eq!(settings.paths, PathMapper::new("/data", "/data"));
    }

    #[test]
    fn test_rejects_empty_share_limits() {
        let err = Config::parse("[qbittorrent]\nurl = \"http://localhost:8080\"\n").unwrap_err();
        assert!(err.to_string().contains("share_limits"));
    }

    #[test]
    fn test_rejects_missing_priority() {
        assert!(Config::parse(&with_groups("[share_limits.a]\nmax_ratio = 1.0\n")).is_err());
    }

    #[test]
    fn test_rejects_duplicate_priority() {
        let err = Config::parse(&with_groups(
            "[share_limits.a]\npriority = 1\n\n[share_limits.b]\npriority = 1\n",
        ))
        .unwrap_err();
        assert!(err.to_string().contains("share priority 1"));
    }

    #[test]
    fn test_rejects_duplicate_custom_tag() {
        let err = Config::parse(&with_groups(
            "[share_limits.a]\npriority = 1\ncustom_tag = \"x\"\n\n[share_limits.b]\npriority = 2\ncustom_tag = \"x\"\n",
        ))
        .unwrap_err();
        assert!(err.to_string().contains("custom_tag 'x'"));
    }

    #[test]
    fn test_rejects_custom_tag_in_base_namespace() {
        let err = Config::parse(&with_groups(
            "[share_limits.a]\npriority = 1\ncustom_tag = \"~share_limit_mine\"\n",
        ))
        .unwrap_err();
        assert!(err.to_string().contains("must not start with"));
    }

    #[test]
    fn test_rejects_bad_limits() {
        for bad in [
            "max_ratio = -0.5",
            "max_ratio = -3",
            "max_seeding_time = -3",
            "max_last_active = -2",
            "min_num_seeds = -1",
            "min_seeding_time = -10",
            "min_last_active = -1",
            "limit_upload_speed_on_ratio_target_ratio = 2.0",
            "max_seeding_time = 9223372036854775807",
            "min_seeding_time = 153722867280912930",
            "max_last_active = 525601",
            "min_last_active = 1000000000",
        ] {
            let config = with_groups(&format!("[share_limits.a]\npriority = 1\n{}\n", bad));
            assert!(Config::parse(&config).is_err(), "accepted {}", bad);
        }
    }

    #[test]
    fn test_accepts_one_year_of_minutes() {
        let config = with_groups(
            "[share_limits.a]\npriority = 1\nmax_seeding_time = 525600\nmin_seeding_time = 525600\n",
        );
        let config = Config::parse(&config).unwrap();
        assert_eq!(config.groups()[0].guards.min_seeding_time, 525_600);
    }

    #[test]
    fn test_rejects_bad_settings() {
        assert!(Config::parse(&format!("{}\n[logging]\nlevel = \"verbose\"\n", MINIMAL)).is_err());
        assert!(Config::parse(&format!("{}\n[logging]\nformat = \"xml\"\n", MINIMAL)).is_err());
        assert!(Config::parse(&format!("{}\n[settings]\ngroup_notification_limit = 0\n", MINIMAL)).is_err());
        assert!(Config::parse(&format!("{}\n[schedule]\ninterval_minutes = 0\n", MINIMAL)).is_err());
        assert!(Config::parse(&MINIMAL.replace("http://localhost:8080", "")).is_err());
    }
}
