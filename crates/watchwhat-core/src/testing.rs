//! In-process catalog used by unit tests.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use watchwhat_models::{
    CatalogReview, Content, ContentDetails, ContentKind, Credits, Genre, MovieSummary, Page, Video,
};
use watchwhat_sources::{CatalogApi, CatalogError, DiscoverQuery, SearchScope, TimeWindow, TrendingScope};

/// Answers search and discover from a fixed list and records what was asked
#[derive(Default)]
pub struct FakeCatalog {
    pub items: Vec<Content>,
    pub fail: bool,
    /// Simulated network latency for search
    pub search_delay: Duration,
    pub searches: Mutex<Vec<String>>,
    pub discovers: Mutex<Vec<DiscoverQuery>>,
}

impl FakeCatalog {
    pub fn new(items: Vec<Content>) -> Self {
        Self { items, ..Self::default() }
    }

    pub fn last_discover(&self) -> Option<DiscoverQuery> {
        self.discovers.lock().unwrap().last().cloned()
    }

    pub fn search_count(&self) -> usize {
        self.searches.lock().unwrap().len()
    }

    fn page(&self, results: Vec<Content>) -> Result<Page<Content>, CatalogError> {
        if self.fail {
            return Err(CatalogError::Status { status: 500, body: "down".to_string() });
        }
        let total_results = results.len() as u64;
        Ok(Page { page: 1, results, total_pages: 1, total_results })
    }
}

pub fn movie(id: u64, genres: &[u32]) -> Content {
    Content::Movie(MovieSummary {
        id,
        title: format!("Movie {}", id),
        original_title: None,
        overview: None,
        poster_path: None,
        backdrop_path: None,
        release_date: None,
        vote_average: 8.0,
        vote_count: 1000,
        popularity: 10.0,
        genre_ids: genres.to_vec(),
        original_language: Some("en".to_string()),
        adult: false,
    })
}

fn unsupported<T>() -> Result<T, CatalogError> {
    Err(CatalogError::Status { status: 404, body: String::new() })
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn search(
        &self,
        _scope: SearchScope,
        query: &str,
        _page: u32,
        cancel: &CancellationToken,
    ) -> Result<Page<Content>, CatalogError> {
        self.searches.lock().unwrap().push(query.to_string());
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CatalogError::Cancelled),
            _ = tokio::time::sleep(self.search_delay) => {}
        }
        let query = query.to_lowercase();
        let matches = self
            .items
            .iter()
            .filter(|c| c.display_title().to_lowercase().contains(&query))
            .cloned()
            .collect();
        self.page(matches)
    }

    async fn discover(
        &self,
        _kind: ContentKind,
        query: &DiscoverQuery,
        cancel: &CancellationToken,
    ) -> Result<Page<Content>, CatalogError> {
        self.discovers.lock().unwrap().push(query.clone());
        if cancel.is_cancelled() {
            return Err(CatalogError::Cancelled);
        }
        self.page(self.items.clone())
    }

    async fn trending(&self, _: TrendingScope, _: TimeWindow, _: &CancellationToken) -> Result<Page<Content>, CatalogError> {
        self.page(self.items.clone())
    }

    async fn genres(&self, _: ContentKind, _: &CancellationToken) -> Result<Vec<Genre>, CatalogError> {
        unsupported()
    }

    async fn details(&self, _: ContentKind, _: u64, _: &CancellationToken) -> Result<ContentDetails, CatalogError> {
        unsupported()
    }

    async fn credits(&self, _: ContentKind, _: u64, _: &CancellationToken) -> Result<Credits, CatalogError> {
        unsupported()
    }

    async fn videos(&self, _: ContentKind, _: u64, _: &CancellationToken) -> Result<Vec<Video>, CatalogError> {
        unsupported()
    }

    async fn similar(&self, _: ContentKind, _: u64, _: u32, _: &CancellationToken) -> Result<Page<Content>, CatalogError> {
        unsupported()
    }

    async fn recommendations(
        &self,
        _: ContentKind,
        _: u64,
        _: u32,
        _: &CancellationToken,
    ) -> Result<Page<Content>, CatalogError> {
        unsupported()
    }

    async fn reviews(
        &self,
        _: ContentKind,
        _: u64,
        _: u32,
        _: &CancellationToken,
    ) -> Result<Page<CatalogReview>, CatalogError> {
        unsupported()
    }
}
