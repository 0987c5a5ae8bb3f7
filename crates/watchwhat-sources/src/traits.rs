use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use watchwhat_models::{CatalogReview, Content, ContentDetails, ContentKind, Credits, Genre, Page, Video};
use crate::catalog::{DiscoverQuery, SearchScope, TimeWindow, TrendingScope};
use crate::error::{CatalogError, UserDataError};
use crate::userdata::{Table, UserSession};

/// Read-only catalog of movies and series.
///
/// Every call takes a cancellation token; a cancelled call resolves to
/// [`CatalogError::Cancelled`] without waiting for the network.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn search(
        &self,
        scope: SearchScope,
        query: &str,
        page: u32,
        cancel: &CancellationToken,
    ) -> Result<Page<Content>, CatalogError>;

    async fn discover(
        &self,
        kind: ContentKind,
        query: &DiscoverQuery,
        cancel: &CancellationToken,
    ) -> Result<Page<Content>, CatalogError>;

    /// Trending content, most popular first
    async fn trending(
        &self,
        scope: TrendingScope,
        window: TimeWindow,
        cancel: &CancellationToken,
    ) -> Result<Page<Content>, CatalogError>;

    async fn genres(&self, kind: ContentKind, cancel: &CancellationToken) -> Result<Vec<Genre>, CatalogError>;

    async fn details(
        &self,
        kind: ContentKind,
        id: u64,
        cancel: &CancellationToken,
    ) -> Result<ContentDetails, CatalogError>;

    async fn credits(&self, kind: ContentKind, id: u64, cancel: &CancellationToken) -> Result<Credits, CatalogError>;

    async fn videos(&self, kind: ContentKind, id: u64, cancel: &CancellationToken) -> Result<Vec<Video>, CatalogError>;

    async fn similar(
        &self,
        kind: ContentKind,
        id: u64,
        page: u32,
        cancel: &CancellationToken,
    ) -> Result<Page<Content>, CatalogError>;

    async fn recommendations(
        &self,
        kind: ContentKind,
        id: u64,
        page: u32,
        cancel: &CancellationToken,
    ) -> Result<Page<Content>, CatalogError>;

    async fn reviews(
        &self,
        kind: ContentKind,
        id: u64,
        page: u32,
        cancel: &CancellationToken,
    ) -> Result<Page<CatalogReview>, CatalogError>;
}

/// Row-level access to the hosted user-data tables.
///
/// Rows are JSON objects with camelCase columns. `upsert` must honour the
/// table's uniqueness constraint (see [`Table::conflict_columns`]) so that
/// re-submitting the same row is idempotent.
#[async_trait]
pub trait UserDataBackend: Send + Sync {
    async fn select(
        &self,
        table: Table,
        session: &UserSession,
        content_id: Option<u64>,
    ) -> Result<Vec<Value>, UserDataError>;

    async fn upsert(&self, table: Table, session: &UserSession, row: Value) -> Result<(), UserDataError>;

    async fn delete(
        &self,
        table: Table,
        session: &UserSession,
        content_id: Option<u64>,
    ) -> Result<(), UserDataError>;
}
