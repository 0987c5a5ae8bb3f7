use crate::error::UserDataError;
use crate::traits::UserDataBackend;
use crate::userdata::{Table, UserSession};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// User-data backend speaking the hosted REST dialect
/// (`/rest/v1/<table>?column=eq.value`).
#[derive(Clone)]
pub struct RestBackend {
    client: Arc<Client>,
    base_url: String,
    anon_key: String,
}

impl RestBackend {
    pub fn new(base_url: String, anon_key: String) -> Self {
        Self {
            client: Arc::new(Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
        }
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.name())
    }

    fn authorize(&self, request: RequestBuilder, session: &UserSession) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .header("Accept", "application/json")
    }

    fn filters(table: Table, session: &UserSession, content_id: Option<u64>) -> Vec<(&'static str, String)> {
        let mut filters = vec![("userId", format!("eq.{}", session.user_id))];
        if let Some(id) = content_id {
            if table.is_per_content() {
                filters.push(("serieId", format!("eq.{}", id)));
            }
        }
        filters
    }

    async fn check(response: Response) -> Result<Response, UserDataError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(UserDataError::AuthRequired);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UserDataError::Status { status: status.as_u16(), body });
        }
        Ok(response)
    }
}

#[async_trait]
impl UserDataBackend for RestBackend {
    async fn select(
        &self,
        table: Table,
        session: &UserSession,
        content_id: Option<u64>,
    ) -> Result<Vec<Value>, UserDataError> {
        debug!(table = %table, content_id = ?content_id, "Selecting user data");
        let request = self
            .client
            .get(self.table_url(table))
            .query(&[("select", "*")])
            .query(&Self::filters(table, session, content_id));

        let response = Self::check(self.authorize(request, session).send().await?).await?;
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn upsert(&self, table: Table, session: &UserSession, row: Value) -> Result<(), UserDataError> {
        debug!(table = %table, "Upserting user data");
        let request = self
            .client
            .post(self.table_url(table))
            .query(&[("on_conflict", table.conflict_columns())])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&row);

        Self::check(self.authorize(request, session).send().await?).await?;
        Ok(())
    }

    async fn delete(
        &self,
        table: Table,
        session: &UserSession,
        content_id: Option<u64>,
    ) -> Result<(), UserDataError> {
        debug!(table = %table, content_id = ?content_id, "Deleting user data");
        let request = self
            .client
            .delete(self.table_url(table))
            .query(&Self::filters(table, session, content_id));

        Self::check(self.authorize(request, session).send().await?).await?;
        Ok(())
    }
}
