//! Construction of clients from configuration and stored credentials.

use anyhow::{anyhow, Result};
use tracing::{debug, info};
use watchwhat_config::{Config, CredentialStore, CATALOG_TOKEN_ENV};

use crate::catalog::CatalogClient;
use crate::userdata::{RestBackend, UserSession};

/// Build the catalog client. Fails when no API token is available.
pub fn create_catalog_client(config: &Config, credentials: &CredentialStore) -> Result<CatalogClient> {
    let token = credentials.catalog_api_token().ok_or_else(|| {
        anyhow!(
            "Catalog API token not configured. Run 'watchwhat config catalog' or set {}",
            CATALOG_TOKEN_ENV
        )
    })?;

    debug!("Creating catalog client for {}", config.catalog.base_url);
    Ok(CatalogClient::new(
        config.catalog.base_url.clone(),
        config.catalog.image_base_url.clone(),
        config.catalog.language.clone(),
        token,
    ))
}

/// Build the user-data backend and, if someone is signed in, their session.
///
/// Returns `None` when the hosted backend is disabled or not configured.
pub fn create_user_data_backend(
    config: &Config,
    credentials: &CredentialStore,
) -> Option<(RestBackend, Option<UserSession>)> {
    if !config.is_user_data_configured() {
        debug!("User-data backend not configured");
        return None;
    }

    let session = match (credentials.get_user_id(), credentials.get_user_access_token()) {
        (Some(user_id), Some(token)) => Some(UserSession::new(user_id.clone(), token.clone())),
        _ => {
            info!("No signed-in user; account features need 'watchwhat config account'");
            None
        }
    };

    let backend = RestBackend::new(config.user_data.base_url.clone(), config.user_data.anon_key.clone());
    Some((backend, session))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> (tempfile::TempDir, CredentialStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("credentials.toml"));
        (dir, store)
    }

    #[test]
    fn test_catalog_client_requires_token() {
        std::env::remove_var(CATALOG_TOKEN_ENV);
        let (_dir, mut store) = credentials();
        let config = Config::default();
        assert!(create_catalog_client(&config, &store).is_err());

        store.set_catalog_api_token("abc".to_string());
        let client = create_catalog_client(&config, &store).unwrap();
        assert_eq!(client.language(), "en-US");
    }

    #[test]
    fn test_user_data_backend_disabled_by_default() {
        let (_dir, store) = credentials();
        assert!(create_user_data_backend(&Config::default(), &store).is_none());
    }

    #[test]
    fn test_user_data_backend_with_session() {
        let (_dir, mut store) = credentials();
        let mut config = Config::default();
        config.user_data.enabled = true;
        config.user_data.base_url = "https://db.example.com".to_string();
        config.user_data.anon_key = "anon".to_string();

        let (_, session) = create_user_data_backend(&config, &store).unwrap();
        assert!(session.is_none());

        store.set_user_session("user-1".to_string(), "tok".to_string());
        let (_, session) = create_user_data_backend(&config, &store).unwrap();
        assert_eq!(session.unwrap().user_id, "user-1");
    }
}
