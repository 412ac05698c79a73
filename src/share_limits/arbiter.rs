use crate::api::torrent_client::TorrentClient;
use crate::core::error::ClientError;
use crate::models::limits::{Limit, ShareLimits, SpeedLimit};
use crate::models::torrent::TorrentSnapshot;
use crate::share_limits::group::{GroupConfig, GroupTag, SpeedPolicy};
use crate::share_limits::guard::HoldSet;
use tracing::{debug, info};

/// Upload cap a torrent should carry, by precedence:
/// met ratio trigger, then unlimited flat limit, then split, then flat.
pub fn effective_speed(policy: &SpeedPolicy, ratio: f64, group_size: usize) -> SpeedLimit {
    if let Some(trigger) = &policy.ratio_trigger {
        if ratio >= trigger.target_ratio {
            return trigger.speed;
        }
    }
    if policy.flat_limit <= 0 {
        return SpeedLimit::Unlimited;
    }
    if policy.split_across_group && group_size > 0 {
        let share = (policy.flat_limit as f64 / group_size as f64).round() as i64;
        return SpeedLimit::from_kib(share);
    }
    SpeedLimit::Kib(policy.flat_limit)
}

/// Tag changes needed to bring a torrent in line with its group
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TagPlan {
    pub add: Option<String>,
    pub remove: Vec<String>,
}

impl TagPlan {
    pub fn has_work(&self) -> bool {
        self.add.is_some() || !self.remove.is_empty()
    }
}

/// Work out which share limits tags to add and which stale ones to drop.
///
/// Stale tags are other groups' custom tags and anything under the shared
/// `base_tag` namespace that does not belong to this group.
pub fn plan_tags(tags: &[String], group_tag: &GroupTag, base_tag: &str, custom_tags: &[String]) -> TagPlan {
    let (own, by_prefix) = match group_tag {
        GroupTag::None => return TagPlan::default(),
        GroupTag::Custom(tag) => (tag.as_str(), false),
        GroupTag::Derived(tag) => (tag.as_str(), true),
    };
    let is_own = |t: &str| if by_prefix { t.starts_with(own) } else { t == own };

    let add = if tags.iter().any(|t| is_own(t.as_str())) {
        None
    } else {
        Some(own.to_string())
    };

    let remove = tags
        .iter()
        .filter(|t| !is_own(t.as_str()))
        .filter(|t| t.starts_with(base_tag) || custom_tags.contains(*t))
        .cloned()
        .collect();

    TagPlan { add, remove }
}

/// What differs between a torrent and its group's target state
#[derive(Clone, Debug, PartialEq)]
pub struct LimitDecision {
    pub target_speed: SpeedLimit,
    pub ratio_changed: bool,
    pub seeding_time_changed: bool,
    pub speed_changed: bool,
    pub tags: TagPlan,
}

impl LimitDecision {
    pub fn is_due(&self) -> bool {
        self.ratio_changed || self.seeding_time_changed || self.speed_changed || self.tags.has_work()
    }
}

pub struct LimitArbiter<'a> {
    group: &'a GroupConfig,
    group_tag: GroupTag,
    base_tag: &'a str,
    custom_tags: &'a [String],
    group_size: usize,
}

impl<'a> LimitArbiter<'a> {
    pub fn new(group: &'a GroupConfig, base_tag: &'a str, custom_tags: &'a [String], group_size: usize) -> Self {
        Self {
            group,
            group_tag: group.group_tag(base_tag),
            base_tag,
            custom_tags,
            group_size,
        }
    }

    pub fn group_tag(&self) -> &GroupTag {
        &self.group_tag
    }

    pub fn decide(&self, torrent: &TorrentSnapshot) -> LimitDecision {
        let target_speed = effective_speed(&self.group.speed, torrent.ratio, self.group_size);
        let decision = LimitDecision {
            target_speed,
            ratio_changed: self.group.ceilings.max_ratio != torrent.ratio_limit(),
            seeding_time_changed: self.group.ceilings.max_seeding_time != torrent.seeding_time_limit(),
            speed_changed: target_speed != torrent.upload_limit(),
            tags: plan_tags(&torrent.tags, &self.group_tag, self.base_tag, self.custom_tags),
        };

        debug!(
            hash = %torrent.hash,
            name = %torrent.name,
            group = %self.group.name,
            ratio = torrent.ratio,
            live_max_ratio = torrent.max_ratio,
            live_max_seeding_time = torrent.max_seeding_time,
            live_speed = %torrent.upload_limit(),
            target_speed = %decision.target_speed,
            ratio_changed = decision.ratio_changed,
            seeding_time_changed = decision.seeding_time_changed,
            speed_changed = decision.speed_changed,
            tag_missing = decision.tags.add.is_some(),
            stale_tags = ?decision.tags.remove,
            "Share limits decision"
        );

        decision
    }

    /// Apply a due decision in one combined step. While a hold is active only
    /// tags are touched; limits stay stripped until the hold clears.
    ///
    /// Returns whether the torrent was mutated.
    pub async fn apply(
        &self,
        client: &dyn TorrentClient,
        torrent: &TorrentSnapshot,
        decision: &LimitDecision,
        holds: HoldSet,
    ) -> Result<bool, ClientError> {
        if holds.any() && !decision.tags.has_work() {
            debug!(
                hash = %torrent.hash,
                name = %torrent.name,
                holds = ?holds,
                "Hold active, leaving limits stripped"
            );
            return Ok(false);
        }

        info!(
            hash = %torrent.hash,
            name = %torrent.name,
            tracker = %torrent.tracker,
            group = %self.group.name,
            add_tag = ?decision.tags.add,
            remove_tags = ?decision.tags.remove,
            upload_limit = %decision.target_speed,
            max_ratio = self.group.ceilings.max_ratio.to_raw(),
            max_seeding_time = self.group.ceilings.max_seeding_time.to_raw(),
            "Updating share limits"
        );

        if !decision.tags.remove.is_empty() {
            client.remove_tags(&torrent.hash, &decision.tags.remove).await?;
        }
        if let Some(tag) = &decision.tags.add {
            client.add_tags(&torrent.hash, std::slice::from_ref(tag)).await?;
        }

        if holds.any() {
            return Ok(true);
        }

        if decision.speed_changed {
            client.set_upload_limit(&torrent.hash, decision.target_speed).await?;
        }
        if decision.ratio_changed || decision.seeding_time_changed {
            let limits = ShareLimits {
                ratio: self.group.ceilings.max_ratio,
                seeding_time: self.group.ceilings.max_seeding_time,
                inactive_seeding_time: Limit::Global,
            };
            client.set_share_limits(&torrent.hash, limits).await?;
        }
        if torrent.paused && self.group.resume_after_change {
            info!(hash = %torrent.hash, name = %torrent.name, "Resuming torrent after share limit update");
            client.resume(&torrent.hash).await?;
        }

        Ok(true)
    }
}
