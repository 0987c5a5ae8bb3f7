pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{CatalogConfig, Config, LoggingConfig, RecommendationConfig, SearchConfig, UserDataConfig};
pub use credentials::{CredentialStore, CATALOG_TOKEN_ENV};
pub use paths::{PathManager, container_base_path};
