use crate::api::torrent_client::TorrentClient;
use crate::core::error::ClientError;
use crate::models::limits::{ShareLimits, SpeedLimit};
use crate::models::torrent::TorrentSnapshot;
use crate::share_limits::group::GuardThresholds;
use crate::utils::time::{format_minutes, format_seconds, idle_minutes};
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardKind {
    /// Fewer seeders than `min_num_seeds`
    SeedCount,
    /// Seeded for less than `min_seeding_time`
    SeedingTime,
    /// Idle for less than `min_last_active`
    Inactivity,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardState {
    Clear,
    Held,
}

/// Marker tags the client carries for each active hold
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HoldTags {
    pub min_num_seeds: String,
    pub min_seeding_time: String,
    pub last_active: String,
}

impl HoldTags {
    pub fn tag(&self, kind: GuardKind) -> &str {
        match kind {
            GuardKind::SeedCount => &self.min_num_seeds,
            GuardKind::SeedingTime => &self.min_seeding_time,
            GuardKind::Inactivity => &self.last_active,
        }
    }
}

/// Which holds are active on a torrent. The three are independent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HoldSet {
    pub seed_count: bool,
    pub seeding_time: bool,
    pub inactivity: bool,
}

impl HoldSet {
    pub fn from_tags(tags: &[String], hold_tags: &HoldTags) -> Self {
        let has = |kind| tags.iter().any(|t| t == hold_tags.tag(kind));
        Self {
            seed_count: has(GuardKind::SeedCount),
            seeding_time: has(GuardKind::SeedingTime),
            inactivity: has(GuardKind::Inactivity),
        }
    }

    pub fn any(&self) -> bool {
        self.seed_count || self.seeding_time || self.inactivity
    }

    pub fn state(&self, kind: GuardKind) -> GuardState {
        let held = match kind {
            GuardKind::SeedCount => self.seed_count,
            GuardKind::SeedingTime => self.seeding_time,
            GuardKind::Inactivity => self.inactivity,
        };
        if held {
            GuardState::Held
        } else {
            GuardState::Clear
        }
    }

    pub fn set(&mut self, kind: GuardKind, state: GuardState) {
        let held = state == GuardState::Held;
        match kind {
            GuardKind::SeedCount => self.seed_count = held,
            GuardKind::SeedingTime => self.seeding_time = held,
            GuardKind::Inactivity => self.inactivity = held,
        }
    }
}

/// One minimum requirement that suspends ceiling enforcement until met
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Guard {
    pub kind: GuardKind,
    threshold: i64,
}

impl Guard {
    pub fn seed_count(min_num_seeds: u32) -> Self {
        Self {
            kind: GuardKind::SeedCount,
            threshold: i64::from(min_num_seeds),
        }
    }

    pub fn seeding_time(min_seeding_minutes: i64) -> Self {
        Self {
            kind: GuardKind::SeedingTime,
            threshold: min_seeding_minutes,
        }
    }

    pub fn inactivity(min_idle_minutes: i64) -> Self {
        Self {
            kind: GuardKind::Inactivity,
            threshold: min_idle_minutes,
        }
    }

    pub fn from_thresholds(thresholds: &GuardThresholds) -> [Guard; 3] {
        [
            Guard::seed_count(thresholds.min_num_seeds),
            Guard::seeding_time(thresholds.min_seeding_time),
            Guard::inactivity(thresholds.min_last_active),
        ]
    }

    pub fn evaluate(&self, torrent: &TorrentSnapshot, now: i64) -> GuardState {
        let held = match self.kind {
            GuardKind::SeedCount => self.threshold > 0 && i64::from(torrent.num_complete) < self.threshold,
            GuardKind::SeedingTime => torrent.seeding_time < self.threshold.saturating_mul(60),
            GuardKind::Inactivity => idle_minutes(torrent.last_activity, now) < self.threshold,
        };
        if held {
            GuardState::Held
        } else {
            GuardState::Clear
        }
    }

    /// Why the guard is held, for logs
    pub fn describe(&self, torrent: &TorrentSnapshot, now: i64) -> String {
        match self.kind {
            GuardKind::SeedCount => format!(
                "Min number of seeds not met: Total Seeds ({}) < min_num_seeds ({})",
                torrent.num_complete, self.threshold
            ),
            GuardKind::SeedingTime => format!(
                "Min seed time not met: {} < {}",
                format_seconds(torrent.seeding_time),
                format_minutes(self.threshold)
            ),
            GuardKind::Inactivity => format!(
                "Min inactive time not met: {} < {}",
                format_minutes(idle_minutes(torrent.last_activity, now)),
                format_minutes(self.threshold)
            ),
        }
    }
}

/// A guard moving between clear and held
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardTransition {
    pub kind: GuardKind,
    pub to: GuardState,
    pub reason: String,
}

/// Push a transition to the client.
///
/// Entering a hold tags the torrent and lifts every limit so it keeps seeding.
/// Leaving one only drops the tag; the next limits pass restores the group's limits.
pub async fn apply_transition(
    client: &dyn TorrentClient,
    torrent: &TorrentSnapshot,
    hold_tags: &HoldTags,
    transition: &GuardTransition,
    resume_after_change: bool,
) -> Result<(), ClientError> {
    let tag = vec![hold_tags.tag(transition.kind).to_string()];

    match transition.to {
        GuardState::Held => {
            info!(
                hash = %torrent.hash,
                name = %torrent.name,
                tracker = %torrent.tracker,
                guard = ?transition.kind,
                tag = %tag[0],
                reason = %transition.reason,
                "Removing share limits so the torrent can continue seeding"
            );
            client.add_tags(&torrent.hash, &tag).await?;
            client.set_share_limits(&torrent.hash, ShareLimits::unrestricted()).await?;
            client.set_upload_limit(&torrent.hash, SpeedLimit::Unlimited).await?;
            if torrent.paused && resume_after_change {
                client.resume(&torrent.hash).await?;
            }
        }
        GuardState::Clear => {
            info!(
                hash = %torrent.hash,
                name = %torrent.name,
                guard = ?transition.kind,
                tag = %tag[0],
                "Minimum requirement met, removing hold tag"
            );
            client.remove_tags(&torrent.hash, &tag).await?;
        }
    }

    Ok(())
}
