use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, error, warn};
use watchwhat_models::{
    is_valid_score, ContentSnapshot, Preferences, Rating, UserStats, WatchedItem, WatchlistItem,
};
use watchwhat_sources::userdata::{PreferencesRow, RatingRow, WatchedRow, WatchlistRow};
use watchwhat_sources::{Table, UserDataBackend, UserDataError, UserSession};

const TOP_GENRE_COUNT: usize = 5;

/// Per-user data kept in the hosted backend: watchlist, ratings, watched
/// history and a copy of the preferences.
///
/// Every call needs a signed-in session and fails with
/// [`UserDataError::AuthRequired`] otherwise. Reads degrade to empty results
/// when the backend fails; writes return the error.
pub struct UserDataService<B> {
    backend: B,
    session: Option<UserSession>,
}

impl<B: UserDataBackend> UserDataService<B> {
    pub fn new(backend: B, session: Option<UserSession>) -> Self {
        Self { backend, session }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    fn session(&self) -> Result<&UserSession, UserDataError> {
        self.session.as_ref().ok_or(UserDataError::AuthRequired)
    }

    /// Select and decode rows, degrading backend failures to an empty list.
    /// A rejected session is still reported.
    async fn read_rows<T: DeserializeOwned>(
        &self,
        table: Table,
        content_id: Option<u64>,
    ) -> Result<Vec<T>, UserDataError> {
        let session = self.session()?;
        match self.backend.select(table, session, content_id).await {
            Ok(rows) => Ok(decode_rows(table, rows)),
            Err(UserDataError::AuthRequired) => Err(UserDataError::AuthRequired),
            Err(e) => {
                error!("Failed to read {}: {}", table, e);
                Ok(Vec::new())
            }
        }
    }

    // Preferences

    pub async fn get_preferences(&self) -> Result<Option<Preferences>, UserDataError> {
        let session = self.session()?;
        let rows = match self.backend.select(Table::Preferences, session, None).await {
            Ok(rows) => rows,
            Err(UserDataError::AuthRequired) => return Err(UserDataError::AuthRequired),
            Err(e) => {
                error!("Failed to read {}: {}", Table::Preferences, e);
                return Ok(None);
            }
        };

        Ok(rows.first().map(|row| {
            let (preferences, rejected) = Preferences::merge_stored(row);
            // The row also carries userId/updatedAt, which the merge ignores
            if !rejected.is_empty() {
                warn!("Ignoring invalid remote preference fields: {}", rejected.join(", "));
            }
            preferences
        }))
    }

    pub async fn upsert_preferences(&self, preferences: &Preferences) -> Result<(), UserDataError> {
        let session = self.session()?;
        let row = PreferencesRow {
            user_id: session.user_id.clone(),
            preferences: preferences.clone(),
            updated_at: Utc::now(),
        };
        self.backend
            .upsert(Table::Preferences, session, serde_json::to_value(row)?)
            .await
    }

    // Watchlist

    pub async fn get_watchlist(&self) -> Result<Vec<WatchlistItem>, UserDataError> {
        let rows: Vec<WatchlistRow> = self.read_rows(Table::Watchlist, None).await?;
        let mut items: Vec<WatchlistItem> = rows.into_iter().map(WatchlistItem::from).collect();
        items.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        Ok(items)
    }

    pub async fn is_in_watchlist(&self, content_id: u64) -> Result<bool, UserDataError> {
        let rows: Vec<WatchlistRow> = self.read_rows(Table::Watchlist, Some(content_id)).await?;
        Ok(!rows.is_empty())
    }

    pub async fn add_to_watchlist(&self, content: ContentSnapshot) -> Result<WatchlistItem, UserDataError> {
        let session = self.session()?;
        let item = WatchlistItem::new(content);
        let row = WatchlistRow::from_item(&session.user_id, &item);
        self.backend
            .upsert(Table::Watchlist, session, serde_json::to_value(row)?)
            .await?;
        debug!("Added {} to watchlist", item.content_id);
        Ok(item)
    }

    pub async fn remove_from_watchlist(&self, content_id: u64) -> Result<(), UserDataError> {
        let session = self.session()?;
        self.backend.delete(Table::Watchlist, session, Some(content_id)).await
    }

    // Watched history

    pub async fn get_watched(&self) -> Result<Vec<WatchedItem>, UserDataError> {
        let rows: Vec<WatchedRow> = self.read_rows(Table::Watched, None).await?;
        let mut items: Vec<WatchedItem> = rows.into_iter().map(WatchedItem::from).collect();
        items.sort_by(|a, b| b.watched_at.cmp(&a.watched_at));
        Ok(items)
    }

    pub async fn mark_watched(
        &self,
        content: ContentSnapshot,
        rating: Option<f32>,
        review: Option<String>,
    ) -> Result<WatchedItem, UserDataError> {
        if let Some(score) = rating {
            check_score(score)?;
        }
        let session = self.session()?;
        let item = WatchedItem::new(content, rating, review);
        let row = WatchedRow::from_item(&session.user_id, &item);
        self.backend
            .upsert(Table::Watched, session, serde_json::to_value(row)?)
            .await?;
        Ok(item)
    }

    pub async fn remove_watched(&self, content_id: u64) -> Result<(), UserDataError> {
        let session = self.session()?;
        self.backend.delete(Table::Watched, session, Some(content_id)).await
    }

    // Ratings

    pub async fn get_ratings(&self) -> Result<Vec<Rating>, UserDataError> {
        let rows: Vec<RatingRow> = self.read_rows(Table::Ratings, None).await?;
        Ok(rows.into_iter().map(Rating::from).collect())
    }

    pub async fn get_rating(&self, content_id: u64) -> Result<Option<Rating>, UserDataError> {
        let rows: Vec<RatingRow> = self.read_rows(Table::Ratings, Some(content_id)).await?;
        Ok(rows.into_iter().next().map(Rating::from))
    }

    /// Create or update the user's rating for a piece of content.
    ///
    /// Scores must lie in [0, 10]; anything else is rejected before the
    /// backend is contacted. Re-rating keeps the original creation time.
    pub async fn rate(&self, content_id: u64, score: f32, review: Option<String>) -> Result<Rating, UserDataError> {
        check_score(score)?;
        let session = self.session()?;

        let existing = self.backend.select(Table::Ratings, session, Some(content_id)).await?;
        let created_at = decode_rows::<RatingRow>(Table::Ratings, existing)
            .into_iter()
            .next()
            .map(|row| row.created_at);

        let now = Utc::now();
        let row = RatingRow {
            user_id: session.user_id.clone(),
            serie_id: content_id,
            rating: score,
            review,
            created_at: created_at.unwrap_or(now),
            updated_at: now,
        };
        self.backend
            .upsert(Table::Ratings, session, serde_json::to_value(&row)?)
            .await?;
        Ok(Rating::from(row))
    }

    pub async fn delete_rating(&self, content_id: u64) -> Result<(), UserDataError> {
        let session = self.session()?;
        self.backend.delete(Table::Ratings, session, Some(content_id)).await
    }

    // Stats

    /// Counts, average rating and favourite genres, from three concurrent
    /// reads. Not a consistent snapshot.
    pub async fn get_user_stats(&self) -> Result<UserStats, UserDataError> {
        self.session()?;
        let (watched, watchlist, ratings) =
            tokio::join!(self.get_watched(), self.get_watchlist(), self.get_ratings());
        Ok(compute_stats(&watched?, watchlist?.len(), &ratings?))
    }
}

fn check_score(score: f32) -> Result<(), UserDataError> {
    if is_valid_score(score) {
        Ok(())
    } else {
        Err(UserDataError::InvalidInput(format!(
            "rating must be between 0 and 10, got {}",
            score
        )))
    }
}

fn decode_rows<T: DeserializeOwned>(table: Table, rows: Vec<Value>) -> Vec<T> {
    let total = rows.len();
    let decoded: Vec<T> = rows
        .into_iter()
        .filter_map(|row| match serde_json::from_value(row) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Skipping malformed {} row: {}", table, e);
                None
            }
        })
        .collect();
    if decoded.len() != total {
        debug!("Decoded {}/{} {} rows", decoded.len(), total, table);
    }
    decoded
}

pub fn compute_stats(watched: &[WatchedItem], watchlist_len: usize, ratings: &[Rating]) -> UserStats {
    let average_rating = if ratings.is_empty() {
        None
    } else {
        let sum: f32 = ratings.iter().map(|r| r.score).sum();
        let mean = sum / ratings.len() as f32;
        Some((mean * 10.0).round() / 10.0)
    };

    let mut genre_counts: HashMap<u32, usize> = HashMap::new();
    for item in watched {
        for genre in &item.content.genre_ids {
            *genre_counts.entry(*genre).or_default() += 1;
        }
    }
    let mut top_genres: Vec<(u32, usize)> = genre_counts.into_iter().collect();
    top_genres.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    top_genres.truncate(TOP_GENRE_COUNT);

    UserStats {
        total_watched: watched.len(),
        total_watchlist: watchlist_len,
        total_ratings: ratings.len(),
        average_rating,
        top_genres,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchwhat_models::ContentKind;
    use watchwhat_sources::MemoryBackend;

    fn snapshot(id: u64, genres: &[u32]) -> ContentSnapshot {
        ContentSnapshot {
            id,
            kind: ContentKind::Movie,
            title: format!("Movie {}", id),
            poster_path: None,
            release_date: None,
            vote_average: 7.0,
            genre_ids: genres.to_vec(),
        }
    }

    fn signed_in() -> UserDataService<MemoryBackend> {
        UserDataService::new(MemoryBackend::new(), Some(UserSession::new("user-1", "token")))
    }

    #[tokio::test]
    async fn test_everything_requires_session() {
        let service = UserDataService::new(MemoryBackend::new(), None);
        assert!(!service.is_signed_in());
        assert!(service.get_watchlist().await.unwrap_err().is_auth_required());
        assert!(service.get_preferences().await.unwrap_err().is_auth_required());
        assert!(service.rate(1, 5.0, None).await.unwrap_err().is_auth_required());
        assert!(service
            .add_to_watchlist(snapshot(1, &[]))
            .await
            .unwrap_err()
            .is_auth_required());
        assert!(service.get_user_stats().await.unwrap_err().is_auth_required());
    }

    #[tokio::test]
    async fn test_watchlist_upsert_is_idempotent() {
        let service = signed_in();
        service.add_to_watchlist(snapshot(10, &[18])).await.unwrap();
        service.add_to_watchlist(snapshot(10, &[18])).await.unwrap();

        assert_eq!(service.get_watchlist().await.unwrap().len(), 1);
        assert!(service.is_in_watchlist(10).await.unwrap());

        service.remove_from_watchlist(10).await.unwrap();
        assert!(!service.is_in_watchlist(10).await.unwrap());
    }

    #[tokio::test]
    async fn test_reads_degrade_and_writes_propagate() {
        let service = signed_in();
        service.add_to_watchlist(snapshot(10, &[])).await.unwrap();
        service.backend().set_failing(true);

        assert!(service.get_watchlist().await.unwrap().is_empty());
        assert!(!service.is_in_watchlist(10).await.unwrap());
        assert_eq!(service.get_rating(10).await.unwrap(), None);
        assert_eq!(service.get_preferences().await.unwrap(), None);

        let err = service.add_to_watchlist(snapshot(11, &[])).await.unwrap_err();
        assert!(matches!(err, UserDataError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_invalid_scores_are_rejected_before_writing() {
        let service = signed_in();
        for score in [-1.0, 10.5, f32::NAN] {
            let err = service.rate(7, score, None).await.unwrap_err();
            assert!(matches!(err, UserDataError::InvalidInput(_)));
        }
        assert!(service.mark_watched(snapshot(7, &[]), Some(42.0), None).await.is_err());
        assert_eq!(service.backend().row_count(Table::Ratings), 0);
        assert_eq!(service.backend().row_count(Table::Watched), 0);
    }

    #[tokio::test]
    async fn test_rerating_keeps_created_at() {
        let service = signed_in();
        let first = service.rate(7, 6.0, None).await.unwrap();
        let second = service.rate(7, 9.0, Some("Grew on me".to_string())).await.unwrap();

        assert_eq!(second.created_at, first.created_at);
        let stored = service.get_rating(7).await.unwrap().unwrap();
        assert_eq!(stored.score, 9.0);
        assert_eq!(stored.review.as_deref(), Some("Grew on me"));
        assert_eq!(service.get_ratings().await.unwrap().len(), 1);

        service.delete_rating(7).await.unwrap();
        assert_eq!(service.get_rating(7).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_preferences_round_trip() {
        let service = signed_in();
        assert_eq!(service.get_preferences().await.unwrap(), None);

        let mut prefs = Preferences::default();
        prefs.favorite_genres = vec![16, 35];
        prefs.min_rating = 7.0;
        service.upsert_preferences(&prefs).await.unwrap();
        service.upsert_preferences(&prefs).await.unwrap();

        assert_eq!(service.get_preferences().await.unwrap(), Some(prefs));
        assert_eq!(service.backend().row_count(Table::Preferences), 1);
    }

    #[tokio::test]
    async fn test_user_stats() {
        let service = signed_in();
        service.mark_watched(snapshot(1, &[18, 80]), Some(8.0), None).await.unwrap();
        service.mark_watched(snapshot(2, &[18]), None, None).await.unwrap();
        service.add_to_watchlist(snapshot(3, &[35])).await.unwrap();
        service.rate(1, 8.0, None).await.unwrap();
        service.rate(2, 7.25, None).await.unwrap();

        let stats = service.get_user_stats().await.unwrap();
        assert_eq!(stats.total_watched, 2);
        assert_eq!(stats.total_watchlist, 1);
        assert_eq!(stats.total_ratings, 2);
        assert_eq!(stats.average_rating, Some(7.6));
        assert_eq!(stats.top_genres, vec![(18, 2), (80, 1)]);
    }

    #[test]
    fn test_compute_stats_caps_top_genres() {
        let watched: Vec<WatchedItem> = (0..8u32)
            .map(|i| WatchedItem::new(snapshot(i as u64, &[i, 100]), None, None))
            .collect();
        let stats = compute_stats(&watched, 0, &[]);
        assert_eq!(stats.average_rating, None);
        assert_eq!(stats.top_genres.len(), 5);
        assert_eq!(stats.top_genres[0], (100, 8));
        assert_eq!(stats.top_genres[1], (0, 1));
    }
}
