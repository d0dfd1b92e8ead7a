//! Configuration file management for Resolv.
//!
//! Reads secrets from `~/.config/resolv/secret.json` and dialogue settings
//! from `~/.config/resolv/config.toml`. Both files are optional; a missing API
//! key only becomes an error when a session is created.

use resolv_core::config::{ConfigRoot, DEFAULT_GEMINI_MODEL, DialogueConfig, SecretConfig};
use resolv_core::{ResolvError, Result};
use std::fs;
use std::path::{Path, PathBuf};

const SECRET_FILE: &str = "secret.json";
const CONFIG_FILE: &str = "config.toml";

/// Environment variables consulted for the API key, in priority order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Fully resolved settings for one run of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub dialogue: DialogueConfig,
}

/// Returns the configuration directory: ~/.config/resolv
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| ResolvError::config("Could not determine home directory"))?;
    Ok(home.join(".config").join("resolv"))
}

/// Loads secret.json from `path`, returning defaults when the file is absent.
pub fn load_secret_config_from(path: &Path) -> Result<SecretConfig> {
    if !path.exists() {
        tracing::debug!("[Config] No secret file at {}", path.display());
        return Ok(SecretConfig::default());
    }

    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        ResolvError::config(format!(
            "Failed to parse configuration file at {}: {}",
            path.display(),
            e
        ))
    })
}

/// Loads config.toml from `path`, returning defaults when the file is absent.
pub fn load_app_config_from(path: &Path) -> Result<ConfigRoot> {
    if !path.exists() {
        return Ok(ConfigRoot::default());
    }

    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Picks the API key: a non-blank environment value wins over secret.json.
pub fn resolve_api_key(env_value: Option<String>, secrets: &SecretConfig) -> Option<String> {
    env_value
        .filter(|key| !key.trim().is_empty())
        .or_else(|| {
            secrets
                .gemini
                .as_ref()
                .map(|gemini| gemini.api_key.clone())
                .filter(|key| !key.trim().is_empty())
        })
}

/// Merges both files and the environment value into one settings struct.
///
/// Model precedence: config.toml, then secret.json, then the default.
pub fn merge_settings(
    secrets: SecretConfig,
    app: ConfigRoot,
    env_api_key: Option<String>,
) -> ResolvSettings {
    let api_key = resolve_api_key(env_api_key, &secrets);
    let model = app
        .dialogue
        .model
        .clone()
        .or_else(|| secrets.gemini.and_then(|gemini| gemini.model_name))
        .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());

    ResolvSettings {
        api_key,
        model,
        dialogue: app.dialogue,
    }
}

/// Loads settings from `dir` plus the process environment.
pub fn load_settings_from(dir: &Path) -> Result<ResolvSettings> {
    let secrets = load_secret_config_from(&dir.join(SECRET_FILE))?;
    let app = load_app_config_from(&dir.join(CONFIG_FILE))?;
    let env_api_key = API_KEY_ENV_VARS
        .iter()
        .find_map(|name| std::env::var(name).ok());

    Ok(merge_settings(secrets, app, env_api_key))
}

/// Loads settings from the default configuration directory.
pub fn load_settings() -> Result<ResolvSettings> {
    load_settings_from(&config_dir()?)
}
