use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub user_data: UserDataConfig,
    #[serde(default)]
    pub recommendations: RecommendationConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// External movie/TV catalog API
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_base_url")]
    pub base_url: String,
    #[serde(default = "default_image_base_url")]
    pub image_base_url: String,
    /// Response language negotiated with the `language` query parameter
    #[serde(default = "default_language")]
    pub language: String,
}

/// Hosted user-data backend (PostgREST-style REST façade)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserDataConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub base_url: String,
    /// Public project key sent as the `apikey` header
    #[serde(default)]
    pub anon_key: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RecommendationConfig {
    #[serde(default = "default_recommendation_limit")]
    pub limit: usize,
    /// Discover results need at least this many votes to be considered
    #[serde(default = "default_min_vote_count")]
    pub min_vote_count: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_min_query_length")]
    pub min_query_length: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Also write daily-rotated logs to the log directory
    #[serde(default)]
    pub file: bool,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_catalog_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_image_base_url() -> String {
    "https://image.tmdb.org/t/p".to_string()
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_recommendation_limit() -> usize {
    20
}

fn default_min_vote_count() -> u32 {
    50
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_min_query_length() -> usize {
    2
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_catalog_base_url(),
            image_base_url: default_image_base_url(),
            language: default_language(),
        }
    }
}

impl Default for UserDataConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: String::new(),
            anon_key: String::new(),
        }
    }
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            limit: default_recommendation_limit(),
            min_vote_count: default_min_vote_count(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            min_query_length: default_min_query_length(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: false,
            path: None,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the config file if present, defaults otherwise
    pub fn load_or_default(path: &PathBuf) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.catalog.base_url.trim().is_empty() {
            return Err(anyhow::anyhow!("catalog.base_url cannot be empty"));
        }
        if !self.catalog.base_url.starts_with("http://") && !self.catalog.base_url.starts_with("https://") {
            return Err(anyhow::anyhow!("catalog.base_url must be an http(s) URL: {}", self.catalog.base_url));
        }
        if self.catalog.language.trim().is_empty() {
            return Err(anyhow::anyhow!("catalog.language cannot be empty"));
        }

        if self.user_data.enabled {
            if self.user_data.base_url.trim().is_empty() {
                return Err(anyhow::anyhow!("user_data is enabled but base_url is not configured"));
            }
            if self.user_data.anon_key.trim().is_empty() {
                return Err(anyhow::anyhow!("user_data is enabled but anon_key is not configured"));
            }
        }

        if self.recommendations.limit == 0 {
            return Err(anyhow::anyhow!("recommendations.limit must be greater than zero"));
        }

        if self.search.debounce_ms > 10_000 {
            return Err(anyhow::anyhow!("search.debounce_ms must be at most 10000"));
        }

        Ok(())
    }

    pub fn is_user_data_configured(&self) -> bool {
        self.user_data.enabled
            && !self.user_data.base_url.trim().is_empty()
            && !self.user_data.anon_key.trim().is_empty()
    }
}
