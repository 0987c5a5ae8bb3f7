use crate::catalog::api::{self, DiscoverQuery, SearchScope, TimeWindow, TrendingScope};
use crate::error::CatalogError;
use crate::traits::CatalogApi;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use watchwhat_models::{
    CatalogReview, Content, ContentDetails, ContentKind, Credits, Genre, MovieDetails, Page, SeriesDetails, Video,
};

#[derive(Deserialize)]
struct GenreList {
    #[serde(default)]
    genres: Vec<Genre>,
}

#[derive(Deserialize)]
struct VideoList {
    #[serde(default)]
    results: Vec<Video>,
}

/// HTTP client for the movie/TV catalog API.
///
/// No retries and no response caching; each method maps its parameters
/// straight onto the endpoint's query string.
#[derive(Clone)]
pub struct CatalogClient {
    client: Arc<Client>,
    base_url: String,
    image_base_url: String,
    language: String,
    token: String,
}

impl CatalogClient {
    pub fn new(base_url: String, image_base_url: String, language: String, token: String) -> Self {
        Self {
            client: Arc::new(Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
            image_base_url: image_base_url.trim_end_matches('/').to_string(),
            language,
            token,
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Full image URL for a poster/backdrop path, e.g. size "w500" or "original"
    pub fn image_url(&self, path: &str, size: &str) -> String {
        format!("{}/{}{}", self.image_base_url, size, path)
    }

    pub async fn movie_details(&self, id: u64, cancel: &CancellationToken) -> Result<MovieDetails, CatalogError> {
        self.get_json(&format!("/movie/{}", id), &[], cancel).await
    }

    pub async fn series_details(&self, id: u64, cancel: &CancellationToken) -> Result<SeriesDetails, CatalogError> {
        self.get_json(&format!("/tv/{}", id), &[], cancel).await
    }

    async fn content_page(
        &self,
        path: &str,
        params: &[(&str, String)],
        implied: Option<ContentKind>,
        cancel: &CancellationToken,
    ) -> Result<Page<Content>, CatalogError> {
        let raw: Page<Value> = self.get_json(path, params, cancel).await?;
        Ok(api::decode_page(raw, implied))
    }

    async fn get_json<T>(
        &self,
        path: &str,
        params: &[(&str, String)],
        cancel: &CancellationToken,
    ) -> Result<T, CatalogError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(path = %path, "Catalog request");

        let request = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .query(&[("language", self.language.as_str())])
            .query(params);

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CatalogError::Cancelled),
            response = request.send() => response?,
        };

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(CatalogError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Status { status: status.as_u16(), body });
        }

        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CatalogError::Cancelled),
            body = response.text() => body?,
        };

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl CatalogApi for CatalogClient {
    async fn search(
        &self,
        scope: SearchScope,
        query: &str,
        page: u32,
        cancel: &CancellationToken,
    ) -> Result<Page<Content>, CatalogError> {
        let params = [
            ("query", query.to_string()),
            ("page", page.max(1).to_string()),
            ("include_adult", "false".to_string()),
        ];
        self.content_page(scope.path(), &params, scope.implied_kind(), cancel).await
    }

    async fn discover(
        &self,
        kind: ContentKind,
        query: &DiscoverQuery,
        cancel: &CancellationToken,
    ) -> Result<Page<Content>, CatalogError> {
        let params = query.to_params(kind);
        self.content_page(&format!("/discover/{}", kind.as_path()), &params, Some(kind), cancel)
            .await
    }

    async fn trending(
        &self,
        scope: TrendingScope,
        window: TimeWindow,
        cancel: &CancellationToken,
    ) -> Result<Page<Content>, CatalogError> {
        let path = format!("/trending/{}/{}", scope.segment(), window.segment());
        let mut page = self.content_page(&path, &[], scope.implied_kind(), cancel).await?;
        api::sort_by_popularity(&mut page.results);
        Ok(page)
    }

    async fn genres(&self, kind: ContentKind, cancel: &CancellationToken) -> Result<Vec<Genre>, CatalogError> {
        let list: GenreList = self
            .get_json(&format!("/genre/{}/list", kind.as_path()), &[], cancel)
            .await?;
        Ok(list.genres)
    }

    async fn details(
        &self,
        kind: ContentKind,
        id: u64,
        cancel: &CancellationToken,
    ) -> Result<ContentDetails, CatalogError> {
        match kind {
            ContentKind::Movie => self.movie_details(id, cancel).await.map(ContentDetails::Movie),
            ContentKind::Series => self.series_details(id, cancel).await.map(ContentDetails::Series),
        }
    }

    async fn credits(&self, kind: ContentKind, id: u64, cancel: &CancellationToken) -> Result<Credits, CatalogError> {
        self.get_json(&format!("/{}/{}/credits", kind.as_path(), id), &[], cancel)
            .await
    }

    async fn videos(&self, kind: ContentKind, id: u64, cancel: &CancellationToken) -> Result<Vec<Video>, CatalogError> {
        let list: VideoList = self
            .get_json(&format!("/{}/{}/videos", kind.as_path(), id), &[], cancel)
            .await?;
        Ok(list.results)
    }

    async fn similar(
        &self,
        kind: ContentKind,
        id: u64,
        page: u32,
        cancel: &CancellationToken,
    ) -> Result<Page<Content>, CatalogError> {
        let params = [("page", page.max(1).to_string())];
        self.content_page(&format!("/{}/{}/similar", kind.as_path(), id), &params, Some(kind), cancel)
            .await
    }

    async fn recommendations(
        &self,
        kind: ContentKind,
        id: u64,
        page: u32,
        cancel: &CancellationToken,
    ) -> Result<Page<Content>, CatalogError> {
        let params = [("page", page.max(1).to_string())];
        self.content_page(
            &format!("/{}/{}/recommendations", kind.as_path(), id),
            &params,
            Some(kind),
            cancel,
        )
        .await
    }

    async fn reviews(
        &self,
        kind: ContentKind,
        id: u64,
        page: u32,
        cancel: &CancellationToken,
    ) -> Result<Page<CatalogReview>, CatalogError> {
        let params = [("page", page.max(1).to_string())];
        self.get_json(&format!("/{}/{}/reviews", kind.as_path(), id), &params, cancel)
            .await
    }
}
