use crate::api::torrent_client::TorrentClient;
use crate::core::error::ShareLimitError;
use crate::models::limits::GlobalShareLimits;
use crate::models::notification::NotificationRecord;
use crate::models::torrent::{StatusFilter, TorrentQuery, TorrentSnapshot};
use crate::notify::notifier::{deliver, Notifier};
use crate::share_limits::arbiter::LimitArbiter;
use crate::share_limits::cleanup::{CleanupCoordinator, PendingDeletion};
use crate::share_limits::evaluator::{Outcome, SeedLimitEvaluator};
use crate::share_limits::group::{GroupConfig, GroupTag};
use crate::share_limits::guard::{apply_transition, GuardTransition, HoldSet, HoldTags};
use crate::share_limits::matcher::GroupMatcher;
use crate::utils::path::PathMapper;
use crate::utils::time::current_timestamp;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Engine-wide settings, fixed for the lifetime of the engine
#[derive(Clone, Debug)]
pub struct EngineSettings {
    /// Namespace for derived group tags, e.g. `~share_limit`
    pub share_limits_tag: String,
    pub hold_tags: HoldTags,
    pub status_filter: StatusFilter,
    pub paths: PathMapper,
    /// Above this many deletions per group, notifications are summarized
    pub group_notification_limit: usize,
}

/// Counters for one pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub tagged: usize,
    pub deleted: usize,
    pub deleted_contents: usize,
}

impl RunSummary {
    pub fn is_empty(&self) -> bool {
        self.tagged == 0 && self.deleted == 0 && self.deleted_contents == 0
    }
}

/// Run-scoped state threaded through the phases of a pass
#[derive(Default)]
struct PassContext {
    processed: HashSet<String>,
    holds: HashMap<String, HoldSet>,
    summary: RunSummary,
}

impl PassContext {
    /// Record the hold tags each torrent carried when the pass started
    fn seed_holds(&mut self, torrents: &[TorrentSnapshot], tags: &HoldTags) {
        for torrent in torrents {
            self.holds.insert(torrent.hash.clone(), HoldSet::from_tags(&torrent.tags, tags));
        }
    }

    fn holds_for(&self, hash: &str) -> HoldSet {
        self.holds.get(hash).copied().unwrap_or_default()
    }

    fn record_transition(&mut self, hash: &str, transition: &GuardTransition) {
        self.holds
            .entry(hash.to_string())
            .or_default()
            .set(transition.kind, transition.to);
    }
}

pub struct ShareLimitsEngine {
    client: Arc<dyn TorrentClient>,
    notifier: Arc<dyn Notifier>,
    settings: EngineSettings,
    groups: Vec<GroupConfig>,
    custom_tags: Vec<String>,
}

impl ShareLimitsEngine {
    /// `groups` must already be in evaluation order
    pub fn new(
        client: Arc<dyn TorrentClient>,
        notifier: Arc<dyn Notifier>,
        settings: EngineSettings,
        groups: Vec<GroupConfig>,
    ) -> Self {
        let custom_tags = groups
            .iter()
            .filter_map(|g| match g.group_tag(&settings.share_limits_tag) {
                GroupTag::Custom(tag) => Some(tag),
                _ => None,
            })
            .collect();

        Self {
            client,
            notifier,
            settings,
            groups,
            custom_tags,
        }
    }

    pub async fn run(&self) -> Result<RunSummary, ShareLimitError> {
        self.run_at(current_timestamp()).await
    }

    /// One full pass with `now` as the reference time for idle calculations
    pub async fn run_at(&self, now: i64) -> Result<RunSummary, ShareLimitError> {
        let client = self.client.as_ref();
        let mut ctx = PassContext::default();

        self.remove_legacy_tags().await?;

        let global = client.global_share_limits().await?;
        let torrents = client
            .list_torrents(TorrentQuery::Status(self.settings.status_filter))
            .await?;

        info!(
            torrents = torrents.len(),
            groups = self.groups.len(),
            status_filter = self.settings.status_filter.as_str(),
            "Processing share limits"
        );

        ctx.seed_holds(&torrents, &self.settings.hold_tags);

        let buckets = self.bucket(torrents);

        for (group, members) in self.groups.iter().zip(buckets) {
            if members.is_empty() {
                debug!(group = %group.name, "No torrents in group");
                continue;
            }
            self.process_group(group, members, &global, now, &mut ctx).await?;
        }

        let summary = ctx.summary;
        info!(
            tagged = summary.tagged,
            deleted = summary.deleted,
            deleted_contents = summary.deleted_contents,
            "Share limits pass complete"
        );

        if !summary.is_empty() {
            let body = format!(
                "Updated share limits for {} torrents. Deleted {} .torrents but NOT content files. Deleted {} .torrents AND content files.",
                summary.tagged, summary.deleted, summary.deleted_contents
            );
            let record = NotificationRecord::new("share_limits_summary", "Share limits summary", body);
            deliver(self.notifier.as_ref(), &record).await;
        }

        Ok(summary)
    }

    /// Drop tags left behind by the old `<group>.<base>` naming scheme
    async fn remove_legacy_tags(&self) -> Result<(), ShareLimitError> {
        let suffix = format!(".{}", self.settings.share_limits_tag.trim_start_matches('~'));
        let legacy: Vec<String> = self
            .client
            .tags()
            .await?
            .into_iter()
            .filter(|t| t.ends_with(&suffix))
            .collect();

        if !legacy.is_empty() {
            info!(tags = ?legacy, "Deleting legacy share limits tags");
            self.client.delete_tags(&legacy).await?;
        }
        Ok(())
    }

    fn bucket(&self, torrents: Vec<TorrentSnapshot>) -> Vec<Vec<TorrentSnapshot>> {
        let matcher = GroupMatcher::new(&self.groups);
        let mut buckets: Vec<Vec<TorrentSnapshot>> = vec![Vec::new(); self.groups.len()];
        let mut unmatched = 0usize;

        for torrent in torrents {
            match matcher.get_group(&torrent.tags, &torrent.category) {
                Some(index) => buckets[index].push(torrent),
                None => unmatched += 1,
            }
        }

        if unmatched > 0 {
            debug!(unmatched, "Torrents outside every share limits group");
        }
        buckets
    }

    async fn process_group(
        &self,
        group: &GroupConfig,
        members: Vec<TorrentSnapshot>,
        global: &GlobalShareLimits,
        now: i64,
        ctx: &mut PassContext,
    ) -> Result<(), ShareLimitError> {
        let client = self.client.as_ref();
        let arbiter = LimitArbiter::new(group, &self.settings.share_limits_tag, &self.custom_tags, members.len());
        let evaluator = SeedLimitEvaluator::new(group, global, now);
        let mut updated = Vec::new();
        let mut pending = BTreeMap::new();

        info!(group = %group.name, priority = group.priority, torrents = members.len(), "Processing share limits group");

        for torrent in members {
            if ctx.processed.contains(&torrent.hash) {
                continue;
            }
            let holds = ctx.holds_for(&torrent.hash);

            let decision = arbiter.decide(&torrent);
            if decision.is_due() && arbiter.apply(client, &torrent, &decision, holds).await? {
                updated.push(torrent.name.clone());
            }

            let refreshed = client.list_torrents(TorrentQuery::Hash(&torrent.hash)).await?;
            let live = match refreshed.into_iter().next() {
                Some(t) => t,
                None => {
                    warn!(hash = %torrent.hash, name = %torrent.name, "Torrent vanished during processing, skipping");
                    ctx.processed.insert(torrent.hash);
                    continue;
                }
            };
            let evaluation = evaluator.evaluate(&live, holds);
            for transition in &evaluation.transitions {
                apply_transition(client, &live, &self.settings.hold_tags, transition, group.resume_after_change)
                    .await?;
                ctx.record_transition(&live.hash, transition);
            }

            if let Outcome::Reached(reason) = evaluation.outcome {
                if group.cleanup {
                    debug!(hash = %live.hash, name = %live.name, reason = %reason, "Queued for cleanup");
                    let hash = live.hash.clone();
                    pending.insert(hash, PendingDeletion::new(live, &self.settings.paths, reason));
                } else {
                    debug!(hash = %live.hash, name = %live.name, reason = %reason, "Share limits reached, cleanup disabled");
                }
            }

            ctx.processed.insert(torrent.hash);
        }

        if !updated.is_empty() {
            ctx.summary.tagged += updated.len();
            self.notify_group_updated(group, updated).await;
        }

        if group.cleanup && !pending.is_empty() {
            let coordinator = CleanupCoordinator::new(
                client,
                self.notifier.as_ref(),
                &self.settings.paths,
                self.settings.group_notification_limit,
            );
            let counts = coordinator.run(group, pending).await?;
            ctx.summary.deleted += counts.deleted;
            ctx.summary.deleted_contents += counts.deleted_contents;
        }

        Ok(())
    }

    async fn notify_group_updated(&self, group: &GroupConfig, updated: Vec<String>) {
        let title = format!("Updating Share Limits for {}. Priority {}", group.name, group.priority);
        let body = format!("Updated {} torrents.", updated.len());
        let mut record = NotificationRecord::new("share_limits", title, body);
        record.grouping = Some(group.name.clone());
        record.torrents = updated;
        record.torrent_tag = group
            .group_tag(&self.settings.share_limits_tag)
            .as_str()
            .map(str::to_string);
        record.thresholds = Some(group.thresholds());
        deliver(self.notifier.as_ref(), &record).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::dry_run::SimulatedClient;
    use crate::models::limits::{Limit, ShareLimits, SpeedLimit};
    use crate::share_limits::guard::{GuardKind, GuardState};
    use crate::share_limits::testing::{group, torrent, Call, MockClient, RecordingNotifier, NOW};

    fn settings() -> EngineSettings {
        EngineSettings {
            share_limits_tag: "~share_limit".to_string(),
            hold_tags: HoldTags {
                min_num_seeds: "MinSeedsNotMet".to_string(),
                min_seeding_time: "MinSeedTimeNotReached".to_string(),
                last_active: "LastActiveLimitNotReached".to_string(),
            },
            status_filter: StatusFilter::Completed,
            paths: PathMapper::default(),
            group_notification_limit: 10,
        }
    }

    fn engine(mock: &MockClient, notifier: &RecordingNotifier, groups: Vec<GroupConfig>) -> ShareLimitsEngine {
        ShareLimitsEngine::new(Arc::new(mock.clone()), Arc::new(notifier.clone()), settings(), groups)
    }

    fn s(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let mut g = group("default", 1);
        g.ceilings.max_ratio = Limit::Value(2.0);
        g.speed.flat_limit = 1000;
        let mock = MockClient::new(vec![torrent("a", "A"), torrent("b", "B")]);
        let notifier = RecordingNotifier::default();
        let engine = engine(&mock, &notifier, vec![g]);

        let first = engine.run_at(NOW).await.unwrap();
        assert_eq!(first.tagged, 2);
        assert!(!mock.calls().is_empty());
        assert_eq!(mock.torrent("a").unwrap().tags, s(&["~share_limit_1.default"]));
        assert_eq!(mock.torrent("a").unwrap().up_limit, 1000 * 1024);

        mock.clear_calls();
        let second = engine.run_at(NOW).await.unwrap();
        assert_eq!(second, RunSummary::default());
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_group_update_notification() {
        let mut g = group("noHL", 2);
        g.ceilings.max_ratio = Limit::Value(2.0);
        let mock = MockClient::new(vec![torrent("a", "A")]);
        let notifier = RecordingNotifier::default();

        engine(&mock, &notifier, vec![g]).run_at(NOW).await.unwrap();

        let records = notifier.with_function("share_limits");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Updating Share Limits for noHL. Priority 2");
        assert_eq!(records[0].body, "Updated 1 torrents.");
        assert_eq!(records[0].torrents, s(&["A"]));
        assert_eq!(records[0].torrent_tag.as_deref(), Some("~share_limit_2.noHL"));
        assert_eq!(records[0].thresholds.as_ref().unwrap().torrent_max_ratio, 2.0);
        assert_eq!(notifier.with_function("share_limits_summary").len(), 1);
    }

    #[tokio::test]
    async fn test_unmatched_torrents_are_untouched() {
        let mut tv = group("tv", 1);
        tv.predicate.categories = s(&["tv"]);
        let mut movie = torrent("a", "Movie");
        movie.category = "movies".to_string();
        let mock = MockClient::new(vec![movie]);
        let notifier = RecordingNotifier::default();

        let summary = engine(&mock, &notifier, vec![tv]).run_at(NOW).await.unwrap();

        assert_eq!(summary, RunSummary::default());
        assert!(mock.calls().is_empty());
        assert!(notifier.records().is_empty());
    }

    #[tokio::test]
    async fn test_seed_count_hold_end_to_end() {
        let mut g = group("default", 1);
        g.ceilings.max_ratio = Limit::Value(1.0);
        g.guards.min_num_seeds = 2;
        g.cleanup = true;
        let mut t = torrent("a", "A");
        t.ratio = 5.0;
        t.num_complete = 0;
        let mock = MockClient::new(vec![t]);
        let notifier = RecordingNotifier::default();

        let summary = engine(&mock, &notifier, vec![g]).run_at(NOW).await.unwrap();

        // Tagged and limited first, then the hold strips the limits again
        assert_eq!(summary.deleted + summary.deleted_contents, 0);
        let live = mock.torrent("a").unwrap();
        assert!(live.tags.contains(&"MinSeedsNotMet".to_string()));
        assert_eq!(live.max_ratio, -1.0);
        assert_eq!(live.up_limit, -1);
        assert!(!mock.calls().iter().any(|c| matches!(c, Call::Delete(..))));

        // Next pass: hold active and tags in place, nothing to do
        mock.clear_calls();
        engine(&mock, &notifier, vec![group_with_hold()]).run_at(NOW).await.unwrap();
        assert!(mock.calls().is_empty());
    }

    fn group_with_hold() -> GroupConfig {
        let mut g = group("default", 1);
        g.ceilings.max_ratio = Limit::Value(1.0);
        g.guards.min_num_seeds = 2;
        g.cleanup = true;
        g
    }

    #[tokio::test]
    async fn test_hold_clears_and_torrent_is_deleted() {
        let mut t = torrent("a", "A");
        t.ratio = 5.0;
        t.num_complete = 3;
        t.tags = s(&["~share_limit_1.default", "MinSeedsNotMet"]);
        let mock = MockClient::new(vec![t]);
        let notifier = RecordingNotifier::default();

        let summary = engine(&mock, &notifier, vec![group_with_hold()]).run_at(NOW).await.unwrap();

        assert_eq!(summary.deleted, 1);
        let calls = mock.calls();
        assert!(calls.contains(&Call::RemoveTags("a".to_string(), s(&["MinSeedsNotMet"]))));
        assert_eq!(calls.last(), Some(&Call::Delete("a".to_string(), false)));
        assert_eq!(notifier.with_function("cleanup_share_limits").len(), 1);
    }

    #[tokio::test]
    async fn test_hold_tags_are_independent() {
        let mut g = group("default", 1);
        g.guards.min_num_seeds = 1;
        g.guards.min_last_active = 30;
        let mut t = torrent("a", "A");
        t.num_complete = 4;
        t.last_activity = NOW - 60;
        t.tags = s(&["~share_limit_1.default", "MinSeedsNotMet", "LastActiveLimitNotReached"]);
        let mock = MockClient::new(vec![t]);
        let notifier = RecordingNotifier::default();

        engine(&mock, &notifier, vec![g]).run_at(NOW).await.unwrap();

        assert_eq!(
            mock.calls(),
            vec![Call::RemoveTags("a".to_string(), s(&["MinSeedsNotMet"]))]
        );
        assert_eq!(
            mock.torrent("a").unwrap().tags,
            s(&["~share_limit_1.default", "LastActiveLimitNotReached"])
        );
    }

    #[tokio::test]
    async fn test_met_seeding_time_hold_released_without_ceilings() {
        let mut g = group("default", 1);
        g.speed.flat_limit = 1000;
        g.guards.min_seeding_time = 60;
        let mut t = torrent("a", "A");
        t.seeding_time = 10 * 3600;
        t.tags = s(&["~share_limit_1.default", "MinSeedTimeNotReached"]);
        let mock = MockClient::new(vec![t]);
        let notifier = RecordingNotifier::default();
        let engine = engine(&mock, &notifier, vec![g]);

        engine.run_at(NOW).await.unwrap();
        assert_eq!(
            mock.calls(),
            vec![Call::RemoveTags("a".to_string(), s(&["MinSeedTimeNotReached"]))]
        );
        assert_eq!(mock.torrent("a").unwrap().tags, s(&["~share_limit_1.default"]));

        engine.run_at(NOW).await.unwrap();
        assert_eq!(mock.torrent("a").unwrap().up_limit, 1000 * 1024);
    }

    #[test]
    fn test_pass_context_tracks_holds_across_transitions() {
        let tags = settings().hold_tags;
        let mut held = torrent("a", "A");
        held.tags = s(&["MinSeedsNotMet", "LastActiveLimitNotReached"]);
        let mut ctx = PassContext::default();
        ctx.seed_holds(&[held, torrent("b", "B")], &tags);

        assert_eq!(
            ctx.holds_for("a"),
            HoldSet {
                seed_count: true,
                seeding_time: false,
                inactivity: true,
            }
        );
        assert!(!ctx.holds_for("b").any());
        assert!(!ctx.holds_for("missing").any());

        ctx.record_transition(
            "a",
            &GuardTransition {
                kind: GuardKind::SeedCount,
                to: GuardState::Clear,
                reason: String::new(),
            },
        );
        ctx.record_transition(
            "b",
            &GuardTransition {
                kind: GuardKind::SeedingTime,
                to: GuardState::Held,
                reason: "Seeding Time vs Min Seed Time: 0m < 1h 0m".to_string(),
            },
        );

        assert_eq!(
            ctx.holds_for("a"),
            HoldSet {
                seed_count: false,
                seeding_time: false,
                inactivity: true,
            }
        );
        assert!(ctx.holds_for("b").seeding_time);
    }

    #[tokio::test]
    async fn test_split_speed_across_group() {
        let mut g = group("default", 1);
        g.speed.flat_limit = 2000;
        g.speed.split_across_group = true;
        let mock = MockClient::new(vec![torrent("a", "A"), torrent("b", "B")]);
        let notifier = RecordingNotifier::default();

        engine(&mock, &notifier, vec![g]).run_at(NOW).await.unwrap();

        assert!(mock.calls().contains(&Call::SetUploadLimit("a".to_string(), SpeedLimit::Kib(1000))));
        assert_eq!(mock.torrent("b").unwrap().up_limit, 1000 * 1024);
    }

    #[tokio::test]
    async fn test_first_matching_group_wins() {
        let mut no_hl = group("noHL", 1);
        no_hl.predicate.include_all_tags = s(&["noHL"]);
        no_hl.ceilings.max_ratio = Limit::Value(0.5);
        let mut default = group("default", 2);
        default.ceilings.max_ratio = Limit::Value(3.0);
        let mut t = torrent("a", "A");
        t.tags = s(&["noHL"]);
        let mock = MockClient::new(vec![t, torrent("b", "B")]);
        let notifier = RecordingNotifier::default();

        engine(&mock, &notifier, vec![no_hl, default]).run_at(NOW).await.unwrap();

        let a = mock.torrent("a").unwrap();
        assert_eq!(a.max_ratio, 0.5);
        assert_eq!(a.tags, s(&["noHL", "~share_limit_1.noHL"]));
        assert_eq!(mock.torrent("b").unwrap().max_ratio, 3.0);
        let share_limits_calls = mock
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::SetShareLimits(hash, _) if hash == "a"))
            .count();
        assert_eq!(share_limits_calls, 1);
    }

    #[tokio::test]
    async fn test_stale_group_tag_replaced() {
        let mut g = group("default", 1);
        g.ceilings.max_ratio = Limit::Value(2.0);
        let mut t = torrent("a", "A");
        t.tags = s(&["~share_limit_5.old"]);
        t.max_ratio = 2.0;
        let mock = MockClient::new(vec![t]);
        let notifier = RecordingNotifier::default();

        engine(&mock, &notifier, vec![g]).run_at(NOW).await.unwrap();

        assert_eq!(
            mock.calls(),
            vec![
                Call::RemoveTags("a".to_string(), s(&["~share_limit_5.old"])),
                Call::AddTags("a".to_string(), s(&["~share_limit_1.default"])),
            ]
        );
    }

    #[tokio::test]
    async fn test_legacy_tags_removed() {
        let mock = MockClient::new(Vec::new()).with_tags(&["noHL.share_limit", "keep", "default.share_limit"]);
        let notifier = RecordingNotifier::default();

        engine(&mock, &notifier, vec![group("default", 1)]).run_at(NOW).await.unwrap();

        assert_eq!(
            mock.calls(),
            vec![Call::DeleteTags(s(&["noHL.share_limit", "default.share_limit"]))]
        );
        assert_eq!(mock.client_tags(), s(&["keep"]));
    }

    #[tokio::test]
    async fn test_global_ratio_ceiling_triggers_cleanup() {
        let mut g = group("default", 1);
        g.ceilings.max_ratio = Limit::Global;
        g.cleanup = true;
        let mut t = torrent("a", "A");
        t.ratio = 1.5;
        t.max_ratio = -2.0;
        t.tags = s(&["~share_limit_1.default"]);
        let global = GlobalShareLimits {
            max_ratio_enabled: true,
            max_ratio: 1.0,
            ..GlobalShareLimits::default()
        };
        let mock = MockClient::new(vec![t]).with_global(global);
        let notifier = RecordingNotifier::default();

        let summary = engine(&mock, &notifier, vec![g]).run_at(NOW).await.unwrap();

        assert_eq!(summary.deleted, 1);
        let removal = notifier.with_function("cleanup_share_limits");
        assert!(removal[0].body.contains("Ratio vs Global Max Ratio: 1.50 >= 1.00"));
    }

    #[tokio::test]
    async fn test_reached_without_cleanup_keeps_torrent() {
        let mut g = group("default", 1);
        g.ceilings.max_ratio = Limit::Value(1.0);
        let mut t = torrent("a", "A");
        t.ratio = 2.0;
        let mock = MockClient::new(vec![t]);
        let notifier = RecordingNotifier::default();

        let summary = engine(&mock, &notifier, vec![g]).run_at(NOW).await.unwrap();

        assert_eq!(summary.deleted + summary.deleted_contents, 0);
        assert!(mock.torrent("a").is_some());
    }

    #[tokio::test]
    async fn test_paused_torrent_resumed_after_change() {
        let mut g = group("default", 1);
        g.ceilings.max_ratio = Limit::Value(2.0);
        let mut t = torrent("a", "A");
        t.paused = true;
        let mock = MockClient::new(vec![t]);
        let notifier = RecordingNotifier::default();

        engine(&mock, &notifier, vec![g]).run_at(NOW).await.unwrap();

        assert!(mock.calls().contains(&Call::Resume("a".to_string())));
        assert_eq!(
            mock.calls()
                .into_iter()
                .find(|c| matches!(c, Call::SetShareLimits(..))),
            Some(Call::SetShareLimits(
                "a".to_string(),
                ShareLimits {
                    ratio: Limit::Value(2.0),
                    seeding_time: Limit::Unlimited,
                    inactive_seeding_time: Limit::Global,
                }
            ))
        );
    }

    #[tokio::test]
    async fn test_failing_client_aborts_pass() {
        let mut g = group("default", 1);
        g.ceilings.max_ratio = Limit::Value(2.0);
        let mock = MockClient::new(vec![torrent("a", "A")]).failing();
        let notifier = RecordingNotifier::default();

        let result = engine(&mock, &notifier, vec![g]).run_at(NOW).await;

        assert!(matches!(result, Err(ShareLimitError::Client(_))));
        assert!(notifier.records().is_empty());
    }

    #[tokio::test]
    async fn test_dry_run_issues_no_writes() {
        let mut g = group("default", 1);
        g.ceilings.max_ratio = Limit::Value(1.0);
        g.cleanup = true;
        let mut t = torrent("a", "A");
        t.ratio = 3.0;
        let mock = MockClient::new(vec![t]).with_tags(&["old.share_limit"]);
        let notifier = RecordingNotifier::default();
        let engine = ShareLimitsEngine::new(
            Arc::new(SimulatedClient::new(mock.clone())),
            Arc::new(notifier.clone()),
            settings(),
            vec![g],
        );

        let summary = engine.run_at(NOW).await.unwrap();

        assert!(mock.calls().is_empty());
        assert_eq!(summary.tagged, 1);
        assert_eq!(summary.deleted, 1);
        assert!(mock.torrent("a").is_some());
    }
}
