use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Environment variable that overrides the stored catalog API token
pub const CATALOG_TOKEN_ENV: &str = "WATCHWHAT_CATALOG_TOKEN";

#[derive(Debug, Serialize, Deserialize, Default)]
struct CredentialsData {
    #[serde(flatten)]
    data: HashMap<String, String>,
}

pub struct CredentialStore {
    path: PathBuf,
    credentials: HashMap<String, String>,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            credentials: HashMap::new(),
        }
    }

    pub fn load(&mut self) -> Result<()> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            let creds_data: CredentialsData = toml::from_str(&content)?;
            self.credentials = creds_data.data;
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let creds_data = CredentialsData {
            data: self.credentials.clone(),
        };
        let content = toml::to_string_pretty(&creds_data)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.credentials.get(key)
    }

    pub fn set(&mut self, key: String, value: String) {
        self.credentials.insert(key, value);
    }

    pub fn remove(&mut self, key: &str) {
        self.credentials.remove(key);
    }

    /// Catalog API read token; the environment variable wins over the file
    pub fn catalog_api_token(&self) -> Option<String> {
        std::env::var(CATALOG_TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.get("catalog_api_token").cloned())
    }

    pub fn set_catalog_api_token(&mut self, token: String) {
        self.set("catalog_api_token".to_string(), token);
    }

    // Signed-in account for the user-data service
    pub fn get_user_id(&self) -> Option<&String> {
        self.get("user_id")
    }

    pub fn get_user_access_token(&self) -> Option<&String> {
        self.get("user_access_token")
    }

    pub fn set_user_session(&mut self, user_id: String, access_token: String) {
        self.set("user_id".to_string(), user_id);
        self.set("user_access_token".to_string(), access_token);
        self.set("user_signed_in_at".to_string(), Utc::now().to_rfc3339());
    }

    pub fn get_user_signed_in_at(&self) -> Option<DateTime<Utc>> {
        self.get("user_signed_in_at")
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn clear_user_session(&mut self) {
        self.remove("user_id");
        self.remove("user_access_token");
        self.remove("user_signed_in_at");
    }
}
