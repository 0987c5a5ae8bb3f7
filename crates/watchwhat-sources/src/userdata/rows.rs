//! Row shapes of the hosted tables and their mapping to domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use watchwhat_models::{ContentSnapshot, Preferences, Rating, WatchedItem, WatchlistItem};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesRow {
    pub user_id: String,
    #[serde(flatten)]
    pub preferences: Preferences,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistRow {
    pub user_id: String,
    pub serie_id: u64,
    pub serie_data: ContentSnapshot,
    #[serde(default = "Utc::now")]
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WatchedRow {
    pub user_id: String,
    pub serie_id: u64,
    pub serie_data: ContentSnapshot,
    #[serde(default = "Utc::now")]
    pub watched_at: DateTime<Utc>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub review: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RatingRow {
    pub user_id: String,
    pub serie_id: u64,
    pub rating: f32,
    #[serde(default)]
    pub review: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl WatchlistRow {
    pub fn from_item(user_id: &str, item: &WatchlistItem) -> Self {
        Self {
            user_id: user_id.to_string(),
            serie_id: item.content_id,
            serie_data: item.content.clone(),
            added_at: item.added_at,
        }
    }
}

impl From<WatchlistRow> for WatchlistItem {
    fn from(row: WatchlistRow) -> Self {
        WatchlistItem {
            content_id: row.serie_id,
            content: row.serie_data,
            added_at: row.added_at,
        }
    }
}

impl WatchedRow {
    pub fn from_item(user_id: &str, item: &WatchedItem) -> Self {
        Self {
            user_id: user_id.to_string(),
            serie_id: item.content_id,
            serie_data: item.content.clone(),
            watched_at: item.watched_at,
            rating: item.rating,
            review: item.review.clone(),
        }
    }
}

impl From<WatchedRow> for WatchedItem {
    fn from(row: WatchedRow) -> Self {
        WatchedItem {
            content_id: row.serie_id,
            content: row.serie_data,
            watched_at: row.watched_at,
            rating: row.rating,
            review: row.review,
        }
    }
}

impl From<RatingRow> for Rating {
    fn from(row: RatingRow) -> Self {
        Rating {
            content_id: row.serie_id,
            score: row.rating,
            review: row.review,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
