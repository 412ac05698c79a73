use crate::models::limits::{GlobalShareLimits, Limit};
use crate::models::torrent::TorrentSnapshot;
use crate::share_limits::group::GroupConfig;
use crate::share_limits::guard::{Guard, GuardKind, GuardState, GuardTransition, HoldSet};
use crate::utils::time::{format_minutes, format_seconds, idle_minutes};

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    NotReached,
    /// A ceiling fired; the string names it and the compared values
    Reached(String),
}

/// Result of checking one torrent: the outcome plus guard moves to push to the client
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    pub outcome: Outcome,
    pub transitions: Vec<GuardTransition>,
}

/// Tracks guard states seen during one evaluation and the transitions they imply
struct GuardObserver<'t> {
    torrent: &'t TorrentSnapshot,
    now: i64,
    holds: HoldSet,
    transitions: Vec<GuardTransition>,
}

impl<'t> GuardObserver<'t> {
    fn observe(&mut self, guard: Guard) -> GuardState {
        let state = guard.evaluate(self.torrent, self.now);
        if self.holds.state(guard.kind) != state {
            let reason = match state {
                GuardState::Held => guard.describe(self.torrent, self.now),
                GuardState::Clear => String::new(),
            };
            self.transitions.push(GuardTransition {
                kind: guard.kind,
                to: state,
                reason,
            });
            self.holds.set(guard.kind, state);
        }
        state
    }

    fn release(&mut self, kind: GuardKind) {
        if self.holds.state(kind) == GuardState::Held {
            self.transitions.push(GuardTransition {
                kind,
                to: GuardState::Clear,
                reason: String::new(),
            });
            self.holds.set(kind, GuardState::Clear);
        }
    }

    fn finish(self, outcome: Outcome) -> Evaluation {
        Evaluation {
            outcome,
            transitions: self.transitions,
        }
    }
}

/// Decides whether a torrent has reached its group's cleanup ceilings
pub struct SeedLimitEvaluator<'a> {
    group: &'a GroupConfig,
    global: &'a GlobalShareLimits,
    now: i64,
}

impl<'a> SeedLimitEvaluator<'a> {
    pub fn new(group: &'a GroupConfig, global: &'a GlobalShareLimits, now: i64) -> Self {
        Self { group, global, now }
    }

    /// Checks run in a fixed order and stop at the first verdict. The seeding
    /// time guard only enters a hold once a ratio or seeding time threshold is
    /// otherwise met; leaving one is checked up front.
    pub fn evaluate(&self, torrent: &TorrentSnapshot, holds: HoldSet) -> Evaluation {
        let [seed_count, seeding_time, inactivity] = Guard::from_thresholds(&self.group.guards);
        let mut observer = GuardObserver {
            torrent,
            now: self.now,
            holds,
            transitions: Vec::new(),
        };

        // A met seeding time minimum releases its hold even when no ceiling consults it
        if observer.holds.state(GuardKind::SeedingTime) == GuardState::Held
            && seeding_time.evaluate(torrent, self.now) == GuardState::Clear
        {
            observer.release(GuardKind::SeedingTime);
        }

        if observer.observe(seed_count) == GuardState::Held {
            return observer.finish(Outcome::NotReached);
        }
        if observer.observe(inactivity) == GuardState::Held {
            return observer.finish(Outcome::NotReached);
        }

        let ratio_ceiling = match self.group.ceilings.max_ratio {
            Limit::Unlimited => None,
            Limit::Value(max) => Some((max, "Max Ratio")),
            Limit::Global if self.global.max_ratio_enabled => Some((self.global.max_ratio, "Global Max Ratio")),
            Limit::Global => None,
        };
        if let Some((max, label)) = ratio_ceiling {
            if torrent.ratio >= max && observer.observe(seeding_time) == GuardState::Clear {
                let reason = format!("Ratio vs {}: {:.2} >= {:.2}", label, torrent.ratio, max);
                return observer.finish(Outcome::Reached(reason));
            }
        }

        let seeding_ceiling = match self.group.ceilings.max_seeding_time {
            Limit::Unlimited => None,
            Limit::Value(max) => Some(max),
            Limit::Global if self.global.max_seeding_time_enabled => Some(self.global.max_seeding_time),
            Limit::Global => {
                observer.release(GuardKind::SeedingTime);
                None
            }
        };
        if let Some(max) = seeding_ceiling {
            if torrent.seeding_time >= max.saturating_mul(60) && observer.observe(seeding_time) == GuardState::Clear {
                let reason = format!(
                    "Seeding Time vs Max Seed Time: {} >= {}",
                    format_seconds(torrent.seeding_time),
                    format_minutes(max)
                );
                return observer.finish(Outcome::Reached(reason));
            }
        }

        if let Limit::Value(max) = self.group.ceilings.max_last_active {
            let idle = idle_minutes(torrent.last_activity, self.now);
            // The minimum inactivity guard was checked clear above
            if idle >= max {
                let reason = format!(
                    "Inactive Time vs Max Last Active Time: {} >= {}",
                    format_minutes(idle),
                    format_minutes(max)
                );
                return observer.finish(Outcome::Reached(reason));
            }
        }

        observer.finish(Outcome::NotReached)
    }
}
