use crate::error::UserDataError;
use crate::traits::UserDataBackend;
use crate::userdata::{Table, UserSession};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

type RowKey = (String, Option<u64>);

/// In-process user-data backend.
///
/// Rows are keyed the same way the hosted tables enforce uniqueness, so
/// upserts merge instead of duplicating. Used for offline runs and tests.
#[derive(Default)]
pub struct MemoryBackend {
    tables: Mutex<BTreeMap<&'static str, BTreeMap<RowKey, Value>>>,
    failing: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a 503 until switched back off
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn row_count(&self, table: Table) -> usize {
        self.lock().get(table.name()).map_or(0, BTreeMap::len)
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<&'static str, BTreeMap<RowKey, Value>>> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_available(&self) -> Result<(), UserDataError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(UserDataError::Status {
                status: 503,
                body: "backend unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn row_key(table: Table, session: &UserSession, row: &Value) -> Result<RowKey, UserDataError> {
        match row.get("userId").and_then(Value::as_str) {
            Some(user) if user == session.user_id => {}
            Some(_) => return Err(UserDataError::AuthRequired),
            None => return Err(UserDataError::InvalidInput("row is missing userId".to_string())),
        }

        let content_id = if table.is_per_content() {
            let id = row
                .get("serieId")
                .and_then(Value::as_u64)
                .ok_or_else(|| UserDataError::InvalidInput("row is missing serieId".to_string()))?;
            Some(id)
        } else {
            None
        };
        Ok((session.user_id.clone(), content_id))
    }
}

fn matches_filter(key: &RowKey, session: &UserSession, content_id: Option<u64>) -> bool {
    key.0 == session.user_id && content_id.map_or(true, |id| key.1 == Some(id))
}

#[async_trait]
impl UserDataBackend for MemoryBackend {
    async fn select(
        &self,
        table: Table,
        session: &UserSession,
        content_id: Option<u64>,
    ) -> Result<Vec<Value>, UserDataError> {
        self.check_available()?;
        let tables = self.lock();

        Ok(tables
            .get(table.name())
            .map(|rows| {
                rows.iter()
                    .filter(|(key, _)| matches_filter(key, session, content_id))
                    .map(|(_, row)| row.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn upsert(&self, table: Table, session: &UserSession, row: Value) -> Result<(), UserDataError> {
        self.check_available()?;
        let key = Self::row_key(table, session, &row)?;
        let mut tables = self.lock();

        let rows = tables.entry(table.name()).or_default();
        match rows.get_mut(&key) {
            // Columns missing from the incoming row keep their stored values
            Some(Value::Object(existing)) if row.is_object() => {
                if let Value::Object(incoming) = row {
                    existing.extend(incoming);
                }
            }
            _ => {
                rows.insert(key, row);
            }
        }
        Ok(())
    }

    async fn delete(
        &self,
        table: Table,
        session: &UserSession,
        content_id: Option<u64>,
    ) -> Result<(), UserDataError> {
        self.check_available()?;
        let mut tables = self.lock();

        if let Some(rows) = tables.get_mut(table.name()) {
            rows.retain(|key, _| !matches_filter(key, session, content_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session() -> UserSession {
        UserSession::new("user-1", "token")
    }

    #[tokio::test]
    async fn test_upsert_merges_on_conflict_key() {
        let backend = MemoryBackend::new();
        let s = session();
        backend
            .upsert(Table::Ratings, &s, json!({ "userId": "user-1", "serieId": 1, "rating": 6.0 }))
            .await
            .unwrap();
        backend
            .upsert(Table::Ratings, &s, json!({ "userId": "user-1", "serieId": 1, "rating": 8.0 }))
            .await
            .unwrap();

        let rows = backend.select(Table::Ratings, &s, None).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["rating"], json!(8.0));
    }

    #[tokio::test]
    async fn test_rows_are_scoped_to_user() {
        let backend = MemoryBackend::new();
        let alice = UserSession::new("alice", "a");
        let bob = UserSession::new("bob", "b");
        backend
            .upsert(Table::Watchlist, &alice, json!({ "userId": "alice", "serieId": 7 }))
            .await
            .unwrap();

        assert!(backend.select(Table::Watchlist, &bob, None).await.unwrap().is_empty());

        let err = backend
            .upsert(Table::Watchlist, &bob, json!({ "userId": "alice", "serieId": 8 }))
            .await
            .unwrap_err();
        assert!(err.is_auth_required());
    }

    #[tokio::test]
    async fn test_delete_by_content_id() {
        let backend = MemoryBackend::new();
        let s = session();
        for id in [1u64, 2, 3] {
            backend
                .upsert(Table::Watched, &s, json!({ "userId": "user-1", "serieId": id }))
                .await
                .unwrap();
        }
        backend.delete(Table::Watched, &s, Some(2)).await.unwrap();
        assert_eq!(backend.row_count(Table::Watched), 2);
        assert!(backend.select(Table::Watched, &s, Some(2)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failing_mode() {
        let backend = MemoryBackend::new();
        backend.set_failing(true);
        let err = backend.select(Table::Preferences, &session(), None).await.unwrap_err();
        assert!(matches!(err, UserDataError::Status { status: 503, .. }));
    }
}
