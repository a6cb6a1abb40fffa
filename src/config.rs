//! Cassia Configuration
//!
//! Loads and saves the assistant configuration from `~/.cassia/config.json`,
//! merging missing fields with defaults and falling back to the
//! `GEMINI_API_KEY` environment variable for the credential.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable carrying the API credential.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

const CONFIG_FILENAME: &str = "config.json";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CassiaConfig {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    /// Cap on tool-call/response cycles within one turn.
    pub max_tool_rounds: usize,
    /// Sliding window of prior history entries sent with each request.
    pub history_window: usize,
}

impl Default for CassiaConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.5-flash".to_string(),
            max_tool_rounds: 4,
            history_window: 40,
        }
    }
}

/// Directory holding the config file: `~/.cassia`.
pub fn get_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/root"))
        .join(".cassia")
}

pub fn get_config_path() -> PathBuf {
    get_config_dir().join(CONFIG_FILENAME)
}

/// Load the configuration. A missing or unparsable file yields the defaults;
/// an unset `apiKey` field falls back to the environment.
pub fn load_config() -> CassiaConfig {
    let config_path = get_config_path();

    let mut config = fs::read_to_string(&config_path)
        .ok()
        .and_then(|contents| serde_json::from_str::<CassiaConfig>(&contents).ok())
        .unwrap_or_default();

    merge_defaults(&mut config);

    if config.api_key.is_empty() {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            config.api_key = key;
        }
    }

    config
}

/// Fill empty or zeroed fields from the defaults. Keeps a hand-edited config
/// file valid even when it only sets a subset of keys.
fn merge_defaults(config: &mut CassiaConfig) {
    let defaults = CassiaConfig::default();

    if config.api_url.is_empty() {
        config.api_url = defaults.api_url;
    }
    if config.model.is_empty() {
        config.model = defaults.model;
    }
    if config.max_tool_rounds == 0 {
        config.max_tool_rounds = defaults.max_tool_rounds;
    }
    if config.history_window == 0 {
        config.history_window = defaults.history_window;
    }
}

/// Save the configuration to `~/.cassia/config.json`. The file is written
/// with mode 0o600 since it may contain the API key.
pub fn save_config(config: &CassiaConfig) -> Result<()> {
    let dir = get_config_dir();
    if !dir.exists() {
        fs::create_dir_all(&dir).context("Failed to create config directory")?;
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o700))?;
    }

    let config_path = get_config_path();
    let json = serde_json::to_string_pretty(config).context("Failed to serialize config")?;

    fs::write(&config_path, &json).context("Failed to write config file")?;
    fs::set_permissions(&config_path, fs::Permissions::from_mode(0o600))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = CassiaConfig::default();
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.max_tool_rounds, 4);
        assert_eq!(config.history_window, 40);
        assert!(config.api_key.is_empty());
    }

    #[test]
    fn merge_fills_only_empty_fields() {
        let mut config = CassiaConfig {
            api_key: "k".to_string(),
            api_url: String::new(),
            model: "gemini-2.5-pro".to_string(),
            max_tool_rounds: 0,
            history_window: 10,
        };
        merge_defaults(&mut config);

        assert_eq!(config.api_url, "https://generativelanguage.googleapis.com");
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.max_tool_rounds, 4);
        assert_eq!(config.history_window, 10);
        assert_eq!(config.api_key, "k");
    }

    #[test]
    fn partial_file_deserializes_with_defaults() {
        let config: CassiaConfig = serde_json::from_str(r#"{ "model": "gemini-2.0-flash" }"#).unwrap();
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.max_tool_rounds, 4);
    }
}
