use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::media::ContentSnapshot;

/// Content the user has marked as watched, optionally rated and reviewed.
///
/// At most one entry exists per content id; re-adding replaces it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WatchedItem {
    pub content_id: u64,
    pub content: ContentSnapshot,
    pub watched_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
}

impl WatchedItem {
    pub fn new(content: ContentSnapshot, rating: Option<f32>, review: Option<String>) -> Self {
        Self {
            content_id: content.id,
            content,
            watched_at: Utc::now(),
            rating,
            review,
        }
    }
}
