//! In-memory torrent client and notifier for unit tests.

use crate::api::torrent_client::TorrentClient;
use crate::core::error::{ClientError, NotifyError};
use crate::models::limits::{GlobalShareLimits, Limit, ShareLimits, SpeedLimit};
use crate::models::notification::NotificationRecord;
use crate::models::torrent::{TorrentQuery, TorrentSnapshot};
use crate::notify::notifier::Notifier;
use crate::share_limits::group::{
    Ceilings, GroupConfig, GuardThresholds, MatchPredicate, SpeedPolicy, Tagging,
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

pub const NOW: i64 = 1_700_000_000;

pub fn torrent(hash: &str, name: &str) -> TorrentSnapshot {
    TorrentSnapshot {
        hash: hash.to_string(),
        name: name.to_string(),
        category: String::new(),
        tags: Vec::new(),
        ratio: 0.0,
        seeding_time: 0,
        up_limit: 0,
        max_ratio: -1.0,
        max_seeding_time: -1,
        num_complete: 0,
        last_activity: NOW,
        content_path: format!("/downloads/{}", name),
        tracker: "https://tracker.example/announce".to_string(),
        paused: false,
        errored: false,
    }
}

pub fn group(name: &str, priority: i64) -> GroupConfig {
    GroupConfig {
        name: name.to_string(),
        priority,
        predicate: MatchPredicate::default(),
        ceilings: Ceilings {
            max_ratio: Limit::Unlimited,
            max_seeding_time: Limit::Unlimited,
            max_last_active: Limit::Unlimited,
        },
        guards: GuardThresholds::default(),
        speed: SpeedPolicy {
            flat_limit: -1,
            split_across_group: false,
            ratio_trigger: None,
        },
        cleanup: false,
        resume_after_change: true,
        tagging: Tagging {
            add_group_tag: true,
            custom_tag: None,
        },
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    AddTags(String, Vec<String>),
    RemoveTags(String, Vec<String>),
    SetUploadLimit(String, SpeedLimit),
    SetShareLimits(String, ShareLimits),
    Resume(String),
    Delete(String, bool),
    DeleteTags(Vec<String>),
}

#[derive(Default)]
struct MockState {
    torrents: Vec<TorrentSnapshot>,
    tags: Vec<String>,
    global: GlobalShareLimits,
    calls: Vec<Call>,
    fail_mutations: bool,
}

/// Torrent client backed by a shared in-memory list. Mutations are applied
/// to the stored snapshots so re-fetches observe them.
#[derive(Clone, Default)]
pub struct MockClient {
    state: Arc<Mutex<MockState>>,
}

impl MockClient {
    pub fn new(torrents: Vec<TorrentSnapshot>) -> Self {
        let mock = Self::default();
        mock.state.lock().unwrap().torrents = torrents;
        mock
    }

    pub fn with_tags(self, tags: &[&str]) -> Self {
        self.state.lock().unwrap().tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_global(self, global: GlobalShareLimits) -> Self {
        self.state.lock().unwrap().global = global;
        self
    }

    pub fn failing(self) -> Self {
        self.state.lock().unwrap().fail_mutations = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn torrent(&self, hash: &str) -> Option<TorrentSnapshot> {
        self.state
            .lock()
            .unwrap()
            .torrents
            .iter()
            .find(|t| t.hash == hash)
            .cloned()
    }

    pub fn client_tags(&self) -> Vec<String> {
        self.state.lock().unwrap().tags.clone()
    }

    pub fn update(&self, hash: &str, f: impl FnOnce(&mut TorrentSnapshot)) {
        let mut state = self.state.lock().unwrap();
        if let Some(t) = state.torrents.iter_mut().find(|t| t.hash == hash) {
            f(t);
        }
    }

    fn record(&self, call: Call, apply: impl FnOnce(&mut MockState)) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_mutations {
            return Err(ClientError::Status {
                endpoint: "mock".to_string(),
                status: 500,
            });
        }
        state.calls.push(call);
        apply(&mut state);
        Ok(())
    }
}

fn with_torrent(state: &mut MockState, hash: &str, f: impl FnOnce(&mut TorrentSnapshot)) {
    if let Some(t) = state.torrents.iter_mut().find(|t| t.hash == hash) {
        f(t);
    }
}

#[async_trait]
impl TorrentClient for MockClient {
    async fn list_torrents(&self, query: TorrentQuery<'_>) -> Result<Vec<TorrentSnapshot>, ClientError> {
        let state = self.state.lock().unwrap();
        Ok(match query {
            TorrentQuery::Status(_) => state.torrents.clone(),
            TorrentQuery::Hash(hash) => state.torrents.iter().filter(|t| t.hash == hash).cloned().collect(),
        })
    }

    async fn add_tags(&self, hash: &str, tags: &[String]) -> Result<(), ClientError> {
        self.record(Call::AddTags(hash.to_string(), tags.to_vec()), |s| {
            with_torrent(s, hash, |t| {
                for tag in tags {
                    if !t.tags.contains(tag) {
                        t.tags.push(tag.clone());
                    }
                }
            })
        })
    }

    async fn remove_tags(&self, hash: &str, tags: &[String]) -> Result<(), ClientError> {
        self.record(Call::RemoveTags(hash.to_string(), tags.to_vec()), |s| {
            with_torrent(s, hash, |t| t.tags.retain(|x| !tags.contains(x)))
        })
    }

    async fn set_upload_limit(&self, hash: &str, limit: SpeedLimit) -> Result<(), ClientError> {
        self.record(Call::SetUploadLimit(hash.to_string(), limit), |s| {
            with_torrent(s, hash, |t| t.up_limit = limit.to_bytes())
        })
    }

    async fn set_share_limits(&self, hash: &str, limits: ShareLimits) -> Result<(), ClientError> {
        self.record(Call::SetShareLimits(hash.to_string(), limits), |s| {
            with_torrent(s, hash, |t| {
                t.max_ratio = limits.ratio.to_raw();
                t.max_seeding_time = limits.seeding_time.to_raw();
            })
        })
    }

    async fn resume(&self, hash: &str) -> Result<(), ClientError> {
        self.record(Call::Resume(hash.to_string()), |s| {
            with_torrent(s, hash, |t| t.paused = false)
        })
    }

    async fn delete(&self, hash: &str, with_content: bool) -> Result<(), ClientError> {
        self.record(Call::Delete(hash.to_string(), with_content), |s| {
            s.torrents.retain(|t| t.hash != hash)
        })
    }

    async fn tags(&self) -> Result<Vec<String>, ClientError> {
        Ok(self.state.lock().unwrap().tags.clone())
    }

    async fn delete_tags(&self, tags: &[String]) -> Result<(), ClientError> {
        self.record(Call::DeleteTags(tags.to_vec()), |s| {
            s.tags.retain(|x| !tags.contains(x));
            for t in s.torrents.iter_mut() {
                t.tags.retain(|x| !tags.contains(x));
            }
        })
    }

    async fn global_share_limits(&self) -> Result<GlobalShareLimits, ClientError> {
        Ok(self.state.lock().unwrap().global)
    }
}

/// Notifier that keeps every record it is handed
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    records: Arc<Mutex<Vec<NotificationRecord>>>,
}

impl RecordingNotifier {
    pub fn records(&self) -> Vec<NotificationRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn with_function(&self, function: &str) -> Vec<NotificationRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.function == function)
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, record: &NotificationRecord) -> Result<(), NotifyError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}
