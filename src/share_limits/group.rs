use crate::models::limits::{Limit, SpeedLimit};
use crate::models::notification::GroupThresholds;

/// Tag and category predicate deciding group membership
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MatchPredicate {
    pub include_all_tags: Vec<String>,
    pub include_any_tags: Vec<String>,
    pub exclude_all_tags: Vec<String>,
    pub exclude_any_tags: Vec<String>,
    pub categories: Vec<String>,
}

/// Upper bounds past which a torrent becomes eligible for cleanup
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ceilings {
    pub max_ratio: Limit<f64>,
    /// Minutes
    pub max_seeding_time: Limit<i64>,
    /// Minutes of inactivity
    pub max_last_active: Limit<i64>,
}

/// Minimums that hold a torrent back from its ceilings
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GuardThresholds {
    /// Minutes
    pub min_seeding_time: i64,
    pub min_num_seeds: u32,
    /// Minutes of inactivity
    pub min_last_active: i64,
}

/// Once a torrent's ratio reaches `target_ratio`, cap it at `speed`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RatioTrigger {
    pub target_ratio: f64,
    pub speed: SpeedLimit,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeedPolicy {
    /// KiB/s, zero or negative for unlimited
    pub flat_limit: i64,
    /// Divide `flat_limit` evenly among the group's torrents
    pub split_across_group: bool,
    pub ratio_trigger: Option<RatioTrigger>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tagging {
    pub add_group_tag: bool,
    pub custom_tag: Option<String>,
}

/// Tag a group stamps on its torrents
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GroupTag {
    None,
    /// User supplied, matched exactly
    Custom(String),
    /// `<base>_<priority>.<name>`, matched by prefix
    Derived(String),
}

impl GroupTag {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            GroupTag::None => None,
            GroupTag::Custom(tag) | GroupTag::Derived(tag) => Some(tag),
        }
    }
}

/// One share limits group. Immutable for the duration of a pass.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupConfig {
    pub name: String,
    pub priority: i64,
    pub predicate: MatchPredicate,
    pub ceilings: Ceilings,
    pub guards: GuardThresholds,
    pub speed: SpeedPolicy,
    pub cleanup: bool,
    pub resume_after_change: bool,
    pub tagging: Tagging,
}

impl GroupConfig {
    pub fn group_tag(&self, base_tag: &str) -> GroupTag {
        if !self.tagging.add_group_tag {
            return GroupTag::None;
        }
        match &self.tagging.custom_tag {
            Some(tag) => GroupTag::Custom(tag.clone()),
            None => GroupTag::Derived(format!("{}_{}.{}", base_tag, self.priority, self.name)),
        }
    }

    pub fn thresholds(&self) -> GroupThresholds {
        GroupThresholds {
            torrent_max_ratio: self.ceilings.max_ratio.to_raw(),
            torrent_max_seeding_time: self.ceilings.max_seeding_time.to_raw(),
            torrent_max_last_active: self.ceilings.max_last_active.to_raw(),
            torrent_min_seeding_time: self.guards.min_seeding_time,
            torrent_min_num_seeds: self.guards.min_num_seeds,
            torrent_min_last_active: self.guards.min_last_active,
            torrent_limit_upload_speed: self.speed.flat_limit,
        }
    }
}
