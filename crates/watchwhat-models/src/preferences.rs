use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// User preferences persisted as a single JSON object.
///
/// Stored objects written by older or newer versions may be missing fields
/// or carry fields of the wrong type; see [`Preferences::merge_stored`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub favorite_genres: Vec<u32>,
    pub disliked_genres: Vec<u32>,
    pub favorite_actors: Vec<u64>,
    pub min_rating: f32,
    pub max_rating: f32,
    pub preferred_languages: Vec<String>,
    pub show_adult_content: bool,
    pub notifications_enabled: bool,
    pub autoplay_trailers: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            favorite_genres: Vec::new(),
            disliked_genres: Vec::new(),
            favorite_actors: Vec::new(),
            min_rating: 6.0,
            max_rating: 10.0,
            preferred_languages: vec!["en".to_string()],
            show_adult_content: false,
            notifications_enabled: true,
            autoplay_trailers: false,
        }
    }
}

impl Preferences {
    /// Merge a stored (possibly partial) JSON value over the defaults.
    ///
    /// Every default key is present in the result. A stored key overrides the
    /// default only if the merged object still deserializes; otherwise the key
    /// is skipped and reported in the returned list. Unknown keys are ignored.
    /// A stored value that is not an object yields the defaults.
    pub fn merge_stored(stored: &Value) -> (Preferences, Vec<String>) {
        let defaults = Preferences::default();
        let mut merged = match serde_json::to_value(&defaults) {
            Ok(Value::Object(map)) => map,
            _ => return (defaults, Vec::new()),
        };

        let stored = match stored {
            Value::Object(map) => map,
            _ => return (defaults, vec!["<root>".to_string()]),
        };

        let mut rejected = Vec::new();
        for (key, value) in stored {
            if !merged.contains_key(key) {
                continue;
            }
            let mut candidate: Map<String, Value> = merged.clone();
            candidate.insert(key.clone(), value.clone());
            if serde_json::from_value::<Preferences>(Value::Object(candidate.clone())).is_ok() {
                merged = candidate;
            } else {
                rejected.push(key.clone());
            }
        }

        let prefs = serde_json::from_value(Value::Object(merged)).unwrap_or(defaults);
        (prefs, rejected)
    }

    /// Favorite genres with disliked genres removed
    pub fn effective_genres(&self) -> Vec<u32> {
        self.favorite_genres
            .iter()
            .copied()
            .filter(|g| !self.disliked_genres.contains(g))
            .collect()
    }

    pub fn toggle_favorite_genre(&mut self, genre_id: u32) {
        if let Some(pos) = self.favorite_genres.iter().position(|g| *g == genre_id) {
            self.favorite_genres.remove(pos);
        } else {
            self.favorite_genres.push(genre_id);
            self.disliked_genres.retain(|g| *g != genre_id);
        }
    }

    pub fn toggle_disliked_genre(&mut self, genre_id: u32) {
        if let Some(pos) = self.disliked_genres.iter().position(|g| *g == genre_id) {
            self.disliked_genres.remove(pos);
        } else {
            self.disliked_genres.push(genre_id);
            self.favorite_genres.retain(|g| *g != genre_id);
        }
    }

    pub fn add_favorite_actor(&mut self, actor_id: u64) {
        if !self.favorite_actors.contains(&actor_id) {
            self.favorite_actors.push(actor_id);
        }
    }

    pub fn remove_favorite_actor(&mut self, actor_id: u64) {
        self.favorite_actors.retain(|a| *a != actor_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_partial_object_keeps_defaults() {
        let stored = json!({ "favoriteGenres": [18, 35], "minRating": 7.5 });
        let (prefs, rejected) = Preferences::merge_stored(&stored);

        assert!(rejected.is_empty());
        assert_eq!(prefs.favorite_genres, vec![18, 35]);
        assert_eq!(prefs.min_rating, 7.5);
        assert_eq!(prefs.max_rating, 10.0);
        assert_eq!(prefs.preferred_languages, vec!["en".to_string()]);
        assert!(prefs.notifications_enabled);
    }

    #[test]
    fn test_merge_skips_corrupt_fields() {
        let stored = json!({
            "favoriteGenres": "not-a-list",
            "dislikedGenres": [27],
            "notificationsEnabled": 3
        });
        let (prefs, rejected) = Preferences::merge_stored(&stored);

        assert_eq!(prefs.favorite_genres, Vec::<u32>::new());
        assert_eq!(prefs.disliked_genres, vec![27]);
        assert!(prefs.notifications_enabled);
        assert!(rejected.contains(&"favoriteGenres".to_string()));
        assert!(rejected.contains(&"notificationsEnabled".to_string()));
    }

    #[test]
    fn test_merge_ignores_unknown_keys_and_non_objects() {
        let (prefs, rejected) = Preferences::merge_stored(&json!({ "legacyTheme": "dark" }));
        assert_eq!(prefs, Preferences::default());
        assert!(rejected.is_empty());

        let (prefs, rejected) = Preferences::merge_stored(&json!([1, 2, 3]));
        assert_eq!(prefs, Preferences::default());
        assert_eq!(rejected, vec!["<root>".to_string()]);
    }

    #[test]
    fn test_merged_object_serializes_every_default_key() {
        let (prefs, _) = Preferences::merge_stored(&json!({ "showAdultContent": true }));
        let value = serde_json::to_value(&prefs).unwrap();
        let defaults = serde_json::to_value(Preferences::default()).unwrap();
        for key in defaults.as_object().unwrap().keys() {
            assert!(value.get(key).is_some(), "missing key {}", key);
        }
        assert_eq!(value["showAdultContent"], json!(true));
    }

    #[test]
    fn test_genre_toggles_are_exclusive() {
        let mut prefs = Preferences::default();
        prefs.toggle_favorite_genre(28);
        prefs.toggle_disliked_genre(28);
        assert!(prefs.favorite_genres.is_empty());
        assert_eq!(prefs.disliked_genres, vec![28]);

        prefs.toggle_favorite_genre(28);
        assert_eq!(prefs.favorite_genres, vec![28]);
        assert!(prefs.disliked_genres.is_empty());
    }

    #[test]
    fn test_favorite_actors_have_set_semantics() {
        let mut prefs = Preferences::default();
        prefs.add_favorite_actor(287);
        prefs.add_favorite_actor(287);
        prefs.add_favorite_actor(1245);
        assert_eq!(prefs.favorite_actors, vec![287, 1245]);

        prefs.remove_favorite_actor(287);
        assert_eq!(prefs.favorite_actors, vec![1245]);
    }

    #[test]
    fn test_effective_genres_excludes_disliked() {
        let prefs = Preferences {
            favorite_genres: vec![18, 27, 35],
            disliked_genres: vec![27],
            ..Preferences::default()
        };
        assert_eq!(prefs.effective_genres(), vec![18, 35]);
    }
}
