pub mod account;
pub mod catalog;
pub mod config;
pub mod display;
pub mod library;
pub mod prompts;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use watchwhat_config::{Config, CredentialStore, PathManager};
use watchwhat_core::{FileStorage, LocalPreferenceStore, UserDataService};
use watchwhat_models::{ContentKind, ContentSnapshot};
use watchwhat_sources::{
    create_catalog_client, create_user_data_backend, CatalogApi, CatalogClient, RestBackend, UserDataError,
};

/// Configuration, credentials and paths shared by every command
pub struct AppContext {
    pub paths: PathManager,
    pub config: Config,
    pub credentials: CredentialStore,
}

impl AppContext {
    pub fn load() -> Result<Self> {
        let paths = PathManager::default();
        let config = Config::load_or_default(&paths.config_file())
            .map_err(|e| eyre!("Failed to load config from {}: {}", paths.config_file().display(), e))?;
        config
            .validate()
            .map_err(|e| eyre!("Invalid configuration: {}", e))?;

        let mut credentials = CredentialStore::new(paths.credentials_file());
        credentials
            .load()
            .map_err(|e| eyre!("Failed to load credentials: {}", e))?;

        Ok(Self { paths, config, credentials })
    }

    pub fn catalog(&self) -> Result<CatalogClient> {
        create_catalog_client(&self.config, &self.credentials).map_err(|e| eyre!("{}", e))
    }

    pub fn local_store(&self) -> Result<LocalPreferenceStore> {
        let storage = FileStorage::open(&self.paths)
            .map_err(|e| eyre!("Failed to open local storage: {}", e))?;
        Ok(LocalPreferenceStore::open(Arc::new(storage)))
    }

    /// The account service; without a configured backend this reports
    /// that sign-in is required
    pub fn user_data(&self) -> Result<UserDataService<RestBackend>> {
        match create_user_data_backend(&self.config, &self.credentials) {
            Some((backend, session)) => Ok(UserDataService::new(backend, session)),
            None => Err(UserDataError::AuthRequired.into()),
        }
    }
}

/// Look up a title and reduce it to the snapshot stored next to user data
pub async fn fetch_snapshot<C>(catalog: &C, kind: ContentKind, id: u64) -> Result<ContentSnapshot>
where
    C: CatalogApi + ?Sized,
{
    let spinner = display::spinner(&format!("Looking up {} {}...", kind, id));
    let details = catalog.details(kind, id, &CancellationToken::new()).await;
    spinner.finish_and_clear();

    let details = details.map_err(|e| eyre!("Could not find {} {}: {}", kind, id, e))?;
    Ok(details.snapshot())
}
