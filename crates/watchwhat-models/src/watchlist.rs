use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::media::ContentSnapshot;

/// Content marked as a favorite (local store, keyed by content id)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteItem {
    pub content_id: u64,
    pub content: ContentSnapshot,
    pub added_at: DateTime<Utc>,
}

impl FavoriteItem {
    pub fn new(content: ContentSnapshot) -> Self {
        Self {
            content_id: content.id,
            content,
            added_at: Utc::now(),
        }
    }
}

/// Content the user intends to watch (remote store, keyed by content id)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistItem {
    pub content_id: u64,
    pub content: ContentSnapshot,
    pub added_at: DateTime<Utc>,
}

impl WatchlistItem {
    pub fn new(content: ContentSnapshot) -> Self {
        Self {
            content_id: content.id,
            content,
            added_at: Utc::now(),
        }
    }
}
