use serde::Serialize;

/// Thresholds of the group a notification refers to
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct GroupThresholds {
    pub torrent_max_ratio: f64,
    pub torrent_max_seeding_time: i64,
    pub torrent_max_last_active: i64,
    pub torrent_min_seeding_time: i64,
    pub torrent_min_num_seeds: u32,
    pub torrent_min_last_active: i64,
    pub torrent_limit_upload_speed: i64,
}

/// Payload handed to the notification collaborator
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct NotificationRecord {
    pub function: String,
    pub title: String,
    pub body: String,
    pub grouping: Option<String>,
    pub torrents: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub torrent_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub torrent_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub torrent_tracker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub torrents_deleted_and_contents: Option<bool>,
    #[serde(flatten)]
    pub thresholds: Option<GroupThresholds>,
}

impl NotificationRecord {
    pub fn new(function: &str, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            function: function.to_string(),
            title: title.into(),
            body: body.into(),
            grouping: None,
            torrents: Vec::new(),
            torrent_tag: None,
            torrent_category: None,
            torrent_tracker: None,
            cleanup: None,
            torrents_deleted_and_contents: None,
            thresholds: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serialization_flattens_thresholds() {
        let mut record = NotificationRecord::new("share_limits", "Updating Share Limits", "Updated 1 torrents.");
        record.grouping = Some("noHL".to_string());
        record.torrents = vec!["Some.Linux.ISO".to_string()];
        record.thresholds = Some(GroupThresholds {
            torrent_max_ratio: 2.0,
            torrent_max_seeding_time: -1,
            torrent_max_last_active: -1,
            torrent_min_seeding_time: 0,
            torrent_min_num_seeds: 0,
            torrent_min_last_active: 0,
            torrent_limit_upload_speed: -1,
        });

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["function"], "share_limits");
        assert_eq!(json["grouping"], "noHL");
        assert_eq!(json["torrent_max_ratio"], 2.0);
        assert!(json.get("torrent_tracker").is_none());
        assert!(json.get("thresholds").is_none());
    }
}
