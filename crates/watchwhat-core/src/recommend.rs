//! Preference-driven recommendations on top of the catalog's discover index.

use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use watchwhat_config::RecommendationConfig;
use watchwhat_models::{Content, ContentKind, Preferences};
use watchwhat_sources::catalog::join_any;
use watchwhat_sources::{CatalogApi, DiscoverQuery};

pub const DEFAULT_LIMIT: usize = 20;
pub const DEFAULT_MIN_VOTE_COUNT: u32 = 50;

const SORT_BY_RATING: &str = "vote_average.desc";

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationRequest {
    pub kind: ContentKind,
    pub genre_ids: Vec<u32>,
    /// Only used when `genre_ids` is empty
    pub actor_ids: Vec<u64>,
    pub disliked_genre_ids: Vec<u32>,
    /// Content ids to skip. Ids are not scoped by kind, so a watched series
    /// also hides a movie that happens to share its id.
    pub watched_ids: HashSet<u64>,
    pub min_rating: f32,
    pub min_vote_count: u32,
    pub limit: usize,
    pub include_adult: bool,
}

impl RecommendationRequest {
    pub fn new(kind: ContentKind) -> Self {
        Self {
            kind,
            genre_ids: Vec::new(),
            actor_ids: Vec::new(),
            disliked_genre_ids: Vec::new(),
            watched_ids: HashSet::new(),
            min_rating: 0.0,
            min_vote_count: DEFAULT_MIN_VOTE_COUNT,
            limit: DEFAULT_LIMIT,
            include_adult: false,
        }
    }

    pub fn from_preferences(preferences: &Preferences, watched_ids: HashSet<u64>, kind: ContentKind) -> Self {
        Self {
            genre_ids: preferences.effective_genres(),
            actor_ids: preferences.favorite_actors.clone(),
            disliked_genre_ids: preferences.disliked_genres.clone(),
            watched_ids,
            min_rating: preferences.min_rating,
            include_adult: preferences.show_adult_content,
            ..Self::new(kind)
        }
    }

    pub fn with_config(mut self, config: &RecommendationConfig) -> Self {
        self.limit = config.limit;
        self.min_vote_count = config.min_vote_count;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn discover_query(&self) -> DiscoverQuery {
        let with_genres = join_any(&self.genre_ids);
        let with_cast = if with_genres.is_none() {
            join_any(&self.actor_ids)
        } else {
            None
        };

        DiscoverQuery {
            with_genres,
            with_cast,
            vote_average_gte: Some(self.min_rating),
            vote_count_gte: Some(self.min_vote_count),
            sort_by: Some(SORT_BY_RATING.to_string()),
            include_adult: self.include_adult,
            ..DiscoverQuery::default()
        }
    }

    fn accepts(&self, content: &Content) -> bool {
        !self.watched_ids.contains(&content.id())
            && !content
                .genre_ids()
                .iter()
                .any(|g| self.disliked_genre_ids.contains(g))
    }
}

/// Highest-rated unwatched content matching the request.
///
/// Never fails: a catalog error or cancellation yields an empty list.
pub async fn recommend<C>(catalog: &C, request: &RecommendationRequest, cancel: &CancellationToken) -> Vec<Content>
where
    C: CatalogApi + ?Sized,
{
    let query = request.discover_query();
    debug!(kind = %request.kind, ?query, "Fetching recommendations");

    let page = match catalog.discover(request.kind, &query, cancel).await {
        Ok(page) => page,
        Err(e) => {
            error!("Failed to fetch recommendations: {}", e);
            return Vec::new();
        }
    };

    let fetched = page.results.len();
    let mut results: Vec<Content> = page
        .results
        .into_iter()
        .filter(|content| request.accepts(content))
        .collect();
    results.truncate(request.limit);

    info!("Recommending {} of {} candidates", results.len(), fetched);
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{movie, FakeCatalog};

    #[tokio::test]
    async fn test_watched_content_is_never_recommended() {
        let catalog = FakeCatalog::new((1..=10).map(|id| movie(id, &[18])).collect());
        let mut request = RecommendationRequest::new(ContentKind::Movie);
        request.genre_ids = vec![18];
        request.watched_ids = HashSet::from([2, 4, 6]);

        let results = recommend(&catalog, &request, &CancellationToken::new()).await;
        let ids: Vec<u64> = results.iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec![1, 3, 5, 7, 8, 9, 10]);
    }

    #[tokio::test]
    async fn test_watched_ids_ignore_kind() {
        // Series 603 was watched; movie 603 shares the id
        let catalog = FakeCatalog::new(vec![movie(603, &[28]), movie(604, &[28])]);
        let mut request = RecommendationRequest::new(ContentKind::Movie);
        request.watched_ids = HashSet::from([603]);

        let results = recommend(&catalog, &request, &CancellationToken::new()).await;
        let ids: Vec<u64> = results.iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec![604]);
    }

    #[tokio::test]
    async fn test_results_are_truncated_to_limit() {
        let catalog = FakeCatalog::new((1..=30).map(|id| movie(id, &[])).collect());
        let request = RecommendationRequest::new(ContentKind::Movie).with_limit(5);
        assert_eq!(recommend(&catalog, &request, &CancellationToken::new()).await.len(), 5);
    }

    #[tokio::test]
    async fn test_disliked_genres_are_filtered() {
        let catalog = FakeCatalog::new(vec![movie(1, &[18, 27]), movie(2, &[18])]);
        let mut request = RecommendationRequest::new(ContentKind::Movie);
        request.disliked_genre_ids = vec![27];

        let results = recommend(&catalog, &request, &CancellationToken::new()).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id(), 2);
    }

    #[tokio::test]
    async fn test_failure_and_cancellation_yield_empty() {
        let mut catalog = FakeCatalog::new(vec![movie(1, &[])]);
        catalog.fail = true;
        let request = RecommendationRequest::new(ContentKind::Movie);
        assert!(recommend(&catalog, &request, &CancellationToken::new()).await.is_empty());

        catalog.fail = false;
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(recommend(&catalog, &request, &cancel).await.is_empty());
    }

    #[tokio::test]
    async fn test_query_from_preferences() {
        let catalog = FakeCatalog::new(Vec::new());
        let mut prefs = Preferences::default();
        prefs.favorite_genres = vec![18, 35, 27];
        prefs.disliked_genres = vec![27];
        prefs.favorite_actors = vec![287];
        prefs.min_rating = 7.0;

        let config = RecommendationConfig { limit: 10, min_vote_count: 200 };
        let request = RecommendationRequest::from_preferences(&prefs, HashSet::new(), ContentKind::Movie)
            .with_config(&config);
        recommend(&catalog, &request, &CancellationToken::new()).await;

        let query = catalog.last_discover().unwrap();
        assert_eq!(query.with_genres.as_deref(), Some("18|35"));
        assert_eq!(query.with_cast, None);
        assert_eq!(query.vote_average_gte, Some(7.0));
        assert_eq!(query.vote_count_gte, Some(200));
        assert_eq!(query.sort_by.as_deref(), Some("vote_average.desc"));
        assert_eq!(request.limit, 10);
    }

    #[test]
    fn test_actors_used_only_without_genres() {
        let mut request = RecommendationRequest::new(ContentKind::Movie);
        request.actor_ids = vec![287, 1245];
        assert_eq!(request.discover_query().with_cast.as_deref(), Some("287|1245"));

        request.genre_ids = vec![28];
        assert_eq!(request.discover_query().with_cast, None);
    }
}
