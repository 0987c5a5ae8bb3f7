use super::display::{check_mark, key_value_table, mask_string, print_section_header};
use super::prompts;
use crate::output::Output;
use crate::ConfigCommands;
use color_eyre::eyre::{bail, eyre};
use color_eyre::Result;
use serde_json::json;
use std::io::IsTerminal;
use tracing::info;
use watchwhat_config::{Config, CredentialStore, PathManager, CATALOG_TOKEN_ENV};

pub async fn run_config(cmd: ConfigCommands, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    match cmd {
        ConfigCommands::Show { full } => show_config(&path_manager, full, output),
        ConfigCommands::Catalog { token, language } => configure_catalog(&path_manager, token, language, output),
        ConfigCommands::Account { url, anon_key, user_id, access_token, sign_out } => {
            if sign_out {
                sign_out_account(&path_manager, output)
            } else {
                configure_account(&path_manager, url, anon_key, user_id, access_token, output)
            }
        }
    }
}

fn load_config(path_manager: &PathManager) -> Result<Config> {
    let config_file = path_manager.config_file();
    Config::load_or_default(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))
}

fn load_credentials(path_manager: &PathManager) -> Result<CredentialStore> {
    let mut credentials = CredentialStore::new(path_manager.credentials_file());
    credentials
        .load()
        .map_err(|e| eyre!("Failed to load credentials: {}", e))?;
    Ok(credentials)
}

fn save(path_manager: &PathManager, config: &Config, credentials: &CredentialStore) -> Result<()> {
    path_manager
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create configuration directories: {}", e))?;
    config
        .validate()
        .map_err(|e| eyre!("Refusing to save invalid configuration: {}", e))?;
    config
        .save_to_file(&path_manager.config_file())
        .map_err(|e| eyre!("Failed to save config: {}", e))?;
    credentials
        .save()
        .map_err(|e| eyre!("Failed to save credentials: {}", e))?;
    info!("Saved configuration to {}", path_manager.config_file().display());
    Ok(())
}

fn secret(value: Option<&str>, full: bool) -> String {
    match value {
        Some(v) if full => v.to_string(),
        Some(v) => mask_string(v),
        None => "<not set>".to_string(),
    }
}

fn show_config(path_manager: &PathManager, full: bool, output: &Output) -> Result<()> {
    let config = load_config(path_manager)?;
    let credentials = load_credentials(path_manager)?;
    let token = credentials.catalog_api_token();
    let anon_key = Some(config.user_data.anon_key.as_str()).filter(|k| !k.is_empty());

    let data = json!({
        "config_file": path_manager.config_file(),
        "config_dir": path_manager.config_dir(),
        "data_dir": path_manager.data_dir(),
        "catalog": {
            "base_url": config.catalog.base_url,
            "language": config.catalog.language,
            "token": secret(token.as_deref(), full),
        },
        "user_data": {
            "enabled": config.user_data.enabled,
            "base_url": config.user_data.base_url,
            "anon_key": secret(anon_key, full),
            "user_id": credentials.get_user_id(),
            "signed_in_at": credentials.get_user_signed_in_at(),
        },
        "recommendations": config.recommendations,
        "search": config.search,
        "logging": config.logging,
    });

    output.data(data, |out| {
        print_section_header("Configuration", out);
        out.println(format!("Config file: {}", path_manager.config_file().display()));
        out.println(format!("Data directory: {}", path_manager.data_dir().display()));

        let catalog_rows = [
            ("Base URL", config.catalog.base_url.clone()),
            ("Language", config.catalog.language.clone()),
            ("API token", secret(token.as_deref(), full)),
        ];
        out.println(key_value_table("Catalog", &catalog_rows).to_string());

        let signed_in = credentials
            .get_user_signed_in_at()
            .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| "-".to_string());
        let account_rows = [
            ("Enabled", check_mark(config.is_user_data_configured())),
            ("URL", config.user_data.base_url.clone()),
            ("Anon key", secret(anon_key, full)),
            ("User", credentials.get_user_id().cloned().unwrap_or_else(|| "-".to_string())),
            ("Signed in", signed_in),
        ];
        out.println(key_value_table("Account", &account_rows).to_string());

        let other_rows = [
            ("Recommendation limit", config.recommendations.limit.to_string()),
            ("Minimum votes", config.recommendations.min_vote_count.to_string()),
            ("Search debounce", format!("{} ms", config.search.debounce_ms)),
            ("Minimum query length", config.search.min_query_length.to_string()),
            ("Log level", config.logging.level.clone()),
            ("Log to file", check_mark(config.logging.file)),
        ];
        out.println(key_value_table("Behaviour", &other_rows).to_string());
    });
    Ok(())
}

fn configure_catalog(
    path_manager: &PathManager,
    token_arg: Option<String>,
    language: Option<String>,
    output: &Output,
) -> Result<()> {
    let mut config = load_config(path_manager)?;
    let mut credentials = load_credentials(path_manager)?;

    let token = match token_arg {
        Some(t) => Some(t),
        None if std::io::stdin().is_terminal() => {
            print_section_header("Catalog API Setup", output);
            output.println("Create an API read access token in your catalog account settings.");
            output.println(format!("The {} environment variable overrides the stored token.", CATALOG_TOKEN_ENV));
            let input = prompts::prompt_password("API read access token (empty keeps the current one)")?;
            Some(input).filter(|t| !t.trim().is_empty())
        }
        None => None,
    };

    if let Some(token) = token {
        credentials.set_catalog_api_token(token.trim().to_string());
        output.success("Catalog API token saved");
    }
    if let Some(language) = language {
        config.catalog.language = language;
        output.success(format!("Catalog language set to {}", config.catalog.language));
    }

    save(path_manager, &config, &credentials)
}

fn configure_account(
    path_manager: &PathManager,
    url: Option<String>,
    anon_key: Option<String>,
    user_id: Option<String>,
    access_token: Option<String>,
    output: &Output,
) -> Result<()> {
    let mut config = load_config(path_manager)?;
    let mut credentials = load_credentials(path_manager)?;
    let interactive = std::io::stdin().is_terminal();

    if interactive {
        print_section_header("Account Setup", output);
    }

    let url = match url {
        Some(url) => url,
        None if interactive => prompts::prompt_string("Backend URL", Some(config.user_data.base_url.as_str()))?,
        None => config.user_data.base_url.clone(),
    };
    let anon_key = match anon_key {
        Some(key) => key,
        None if interactive && config.user_data.anon_key.is_empty() => prompts::prompt_password("Anon key")?,
        None => config.user_data.anon_key.clone(),
    };
    if url.trim().is_empty() || anon_key.trim().is_empty() {
        bail!("Both the backend URL and the anon key are required");
    }
    config.user_data.base_url = url.trim().trim_end_matches('/').to_string();
    config.user_data.anon_key = anon_key.trim().to_string();
    config.user_data.enabled = true;

    let user_id = match user_id {
        Some(id) => Some(id),
        None if interactive => Some(prompts::prompt_string(
            "User id",
            credentials.get_user_id().map(String::as_str),
        )?),
        None => None,
    };
    let access_token = match access_token {
        Some(token) => Some(token),
        None if interactive => Some(prompts::prompt_password("Session access token")?),
        None => None,
    };

    match (user_id, access_token) {
        (Some(id), Some(token)) if !id.trim().is_empty() && !token.trim().is_empty() => {
            credentials.set_user_session(id.trim().to_string(), token.trim().to_string());
            output.success(format!("Signed in as {}", id.trim()));
        }
        (None, None) => output.info("Backend saved; pass --user-id and --access-token to sign in"),
        _ => bail!("Signing in needs both a user id and an access token"),
    }

    save(path_manager, &config, &credentials)
}

fn sign_out_account(path_manager: &PathManager, output: &Output) -> Result<()> {
    let config = load_config(path_manager)?;
    let mut credentials = load_credentials(path_manager)?;

    if credentials.get_user_id().is_none() {
        output.info("Not signed in");
        return Ok(());
    }
    credentials.clear_user_session();
    save(path_manager, &config, &credentials)?;
    output.success("Signed out");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_masks_unless_full() {
        assert_eq!(secret(None, false), "<not set>");
        assert_eq!(secret(Some("abcdefgh"), false), "ab***gh");
        assert_eq!(secret(Some("abcdefgh"), true), "abcdefgh");
    }

    #[test]
    fn test_save_writes_config_and_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathManager::from_base(dir.path().to_path_buf());

        let mut config = Config::default();
        config.catalog.language = "de-DE".to_string();
        let mut credentials = CredentialStore::new(paths.credentials_file());
        credentials.set_catalog_api_token("token-123".to_string());

        save(&paths, &config, &credentials).unwrap();

        assert_eq!(load_config(&paths).unwrap().catalog.language, "de-DE");
        assert_eq!(
            load_credentials(&paths).unwrap().catalog_api_token().as_deref(),
            Some("token-123")
        );
    }

    #[test]
    fn test_save_rejects_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathManager::from_base(dir.path().to_path_buf());

        let mut config = Config::default();
        config.user_data.enabled = true;
        let credentials = CredentialStore::new(paths.credentials_file());

        assert!(save(&paths, &config, &credentials).is_err());
        assert!(!paths.config_file().exists());
    }
}
