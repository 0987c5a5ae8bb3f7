use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::preferences::Preferences;
use crate::watch_history::WatchedItem;
use crate::watchlist::FavoriteItem;

/// The "export data" document; `import` must accept anything `export` writes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub preferences: Preferences,
    pub watched_series: Vec<WatchedItem>,
    pub favorite_series: Vec<FavoriteItem>,
    pub export_date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_bundle_top_level_keys() {
        let bundle = ExportBundle {
            preferences: Preferences::default(),
            watched_series: Vec::new(),
            favorite_series: Vec::new(),
            export_date: Utc::now(),
        };
        let value = serde_json::to_value(&bundle).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 4);
        assert!(value.get("preferences").is_some());
        assert!(value.get("watchedSeries").is_some());
        assert!(value.get("favoriteSeries").is_some());
        assert!(value.get("exportDate").is_some());
    }
}
