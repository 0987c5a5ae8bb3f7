use serde_json::Value;
use tracing::{debug, warn};
use watchwhat_models::{Content, ContentKind, Page};

/// Which index a text search runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    Multi,
    Movie,
    Series,
}

impl SearchScope {
    pub fn path(&self) -> &'static str {
        match self {
            SearchScope::Multi => "/search/multi",
            SearchScope::Movie => "/search/movie",
            SearchScope::Series => "/search/tv",
        }
    }

    /// Kind to tag results with when the endpoint omits `media_type`
    pub fn implied_kind(&self) -> Option<ContentKind> {
        match self {
            SearchScope::Multi => None,
            SearchScope::Movie => Some(ContentKind::Movie),
            SearchScope::Series => Some(ContentKind::Series),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendingScope {
    All,
    Movie,
    Series,
}

impl TrendingScope {
    pub fn segment(&self) -> &'static str {
        match self {
            TrendingScope::All => "all",
            TrendingScope::Movie => "movie",
            TrendingScope::Series => "tv",
        }
    }

    pub fn implied_kind(&self) -> Option<ContentKind> {
        match self {
            TrendingScope::All => None,
            TrendingScope::Movie => Some(ContentKind::Movie),
            TrendingScope::Series => Some(ContentKind::Series),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    Day,
    Week,
}

impl TimeWindow {
    pub fn segment(&self) -> &'static str {
        match self {
            TimeWindow::Day => "day",
            TimeWindow::Week => "week",
        }
    }
}

/// Filters for the discover endpoint, mapped one-to-one onto query parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoverQuery {
    pub page: Option<u32>,
    /// Genre ids; `|` means any-of, `,` means all-of
    pub with_genres: Option<String>,
    pub without_genres: Option<String>,
    pub with_cast: Option<String>,
    pub vote_average_gte: Option<f32>,
    pub vote_average_lte: Option<f32>,
    pub vote_count_gte: Option<u32>,
    pub sort_by: Option<String>,
    pub with_original_language: Option<String>,
    pub year: Option<u32>,
    pub include_adult: bool,
}

impl DiscoverQuery {
    pub fn to_params(&self, kind: ContentKind) -> Vec<(&'static str, String)> {
        let mut params = vec![("include_adult", self.include_adult.to_string())];

        if let Some(page) = self.page {
            params.push(("page", page.to_string()));
        }
        if let Some(ref genres) = self.with_genres {
            params.push(("with_genres", genres.clone()));
        }
        if let Some(ref genres) = self.without_genres {
            params.push(("without_genres", genres.clone()));
        }
        if let Some(ref cast) = self.with_cast {
            // with_cast only exists on the movie index
            if kind == ContentKind::Movie {
                params.push(("with_cast", cast.clone()));
            }
        }
        if let Some(v) = self.vote_average_gte {
            params.push(("vote_average.gte", v.to_string()));
        }
        if let Some(v) = self.vote_average_lte {
            params.push(("vote_average.lte", v.to_string()));
        }
        if let Some(v) = self.vote_count_gte {
            params.push(("vote_count.gte", v.to_string()));
        }
        if let Some(ref sort) = self.sort_by {
            params.push(("sort_by", sort.clone()));
        }
        if let Some(ref lang) = self.with_original_language {
            params.push(("with_original_language", lang.clone()));
        }
        if let Some(year) = self.year {
            let key = match kind {
                ContentKind::Movie => "primary_release_year",
                ContentKind::Series => "first_air_date_year",
            };
            params.push((key, year.to_string()));
        }
        params
    }
}

/// Join ids with `|` (any-of) for list-valued query parameters
pub fn join_any<T: ToString>(ids: &[T]) -> Option<String> {
    if ids.is_empty() {
        return None;
    }
    Some(ids.iter().map(|i| i.to_string()).collect::<Vec<_>>().join("|"))
}

/// Decode one raw catalog item into a [`Content`].
///
/// Injects `media_type` from `implied` when the endpoint omitted it. Items of
/// other media types (people) and undecodable items yield `None`.
pub fn decode_item(mut raw: Value, implied: Option<ContentKind>) -> Option<Content> {
    let obj = raw.as_object_mut()?;

    if !obj.contains_key("media_type") {
        match implied {
            Some(kind) => {
                obj.insert("media_type".to_string(), Value::String(kind.as_path().to_string()));
            }
            None => {
                debug!("Dropping catalog item without media_type");
                return None;
            }
        }
    }

    match obj.get("media_type").and_then(Value::as_str) {
        Some("movie") | Some("tv") => {}
        Some(other) => {
            debug!("Skipping catalog item of media_type {}", other);
            return None;
        }
        None => return None,
    }

    match serde_json::from_value::<Content>(raw) {
        Ok(content) => Some(content),
        Err(e) => {
            warn!("Failed to decode catalog item: {}", e);
            None
        }
    }
}

pub fn decode_page(page: Page<Value>, implied: Option<ContentKind>) -> Page<Content> {
    let Page { page, results, total_pages, total_results } = page;
    Page {
        page,
        results: results.into_iter().filter_map(|raw| decode_item(raw, implied)).collect(),
        total_pages,
        total_results,
    }
}

/// Order by descending popularity; ties keep their original order
pub fn sort_by_popularity(items: &mut [Content]) {
    items.sort_by(|a, b| b.popularity().total_cmp(&a.popularity()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_item_injects_missing_media_type() {
        let raw = json!({ "id": 1396, "name": "Breaking Bad", "popularity": 12.5 });
        let content = decode_item(raw, Some(ContentKind::Series)).unwrap();
        assert_eq!(content.kind(), ContentKind::Series);
        assert_eq!(content.display_title(), "Breaking Bad");
    }

    #[test]
    fn test_decode_item_keeps_existing_media_type() {
        let raw = json!({ "media_type": "movie", "id": 603, "title": "The Matrix" });
        let content = decode_item(raw, Some(ContentKind::Series)).unwrap();
        assert_eq!(content.kind(), ContentKind::Movie);
    }

    #[test]
    fn test_decode_item_drops_people_and_untagged() {
        let person = json!({ "media_type": "person", "id": 287, "name": "Brad Pitt" });
        assert!(decode_item(person, None).is_none());

        let untagged = json!({ "id": 1, "title": "Mystery" });
        assert!(decode_item(untagged, None).is_none());
    }

    #[test]
    fn test_sort_by_popularity_descending() {
        let page: Page<Value> = serde_json::from_value(json!({
            "page": 1,
            "results": [
                { "media_type": "movie", "id": 1, "title": "A", "popularity": 10.0 },
                { "media_type": "tv", "id": 2, "name": "B", "popularity": 99.5 },
                { "media_type": "movie", "id": 3, "title": "C", "popularity": 42.0 }
            ]
        }))
        .unwrap();
        let mut decoded = decode_page(page, None);
        sort_by_popularity(&mut decoded.results);
        let ids: Vec<u64> = decoded.results.iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_discover_query_params() {
        let query = DiscoverQuery {
            with_genres: join_any(&[18u32, 35]),
            with_cast: join_any(&[287u64]),
            vote_average_gte: Some(7.0),
            sort_by: Some("vote_average.desc".to_string()),
            year: Some(2020),
            ..DiscoverQuery::default()
        };

        let movie = query.to_params(ContentKind::Movie);
        assert!(movie.contains(&("with_genres", "18|35".to_string())));
        assert!(movie.contains(&("with_cast", "287".to_string())));
        assert!(movie.contains(&("vote_average.gte", "7".to_string())));
        assert!(movie.contains(&("primary_release_year", "2020".to_string())));

        let series = query.to_params(ContentKind::Series);
        assert!(!series.iter().any(|(k, _)| *k == "with_cast"));
        assert!(series.contains(&("first_air_date_year", "2020".to_string())));
    }

    #[test]
    fn test_join_any_empty() {
        assert_eq!(join_any::<u32>(&[]), None);
    }
}
