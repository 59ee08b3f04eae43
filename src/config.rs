use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

use crate::database::DEFAULT_STORAGE_LIMIT_BYTES;
use crate::suggest::SuggestConfig;
use crate::utils;

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Checked in order when no key is configured
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_config_version")]
    pub config_version: Option<u32>,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Largest serialized collection the store accepts
    #[serde(default = "default_storage_limit")]
    pub storage_limit_bytes: usize,
    #[serde(default)]
    pub suggestions: SuggestConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: Some(CURRENT_CONFIG_VERSION),
            database_path: default_database_path(),
            log_dir: default_log_dir(),
            log_level: default_log_level(),
            storage_limit_bytes: default_storage_limit(),
            suggestions: SuggestConfig::default(),
        }
    }
}

fn default_config_version() -> Option<u32> {
    Some(CURRENT_CONFIG_VERSION)
}

fn default_database_path() -> String {
    Config::default_database_path_for_profile(utils::Profile::Prod)
}

fn default_log_dir() -> String {
    Config::default_log_dir_for_profile(utils::Profile::Prod)
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_storage_limit() -> usize {
    DEFAULT_STORAGE_LIMIT_BYTES
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config directory: {0}")]
    ConfigDirError(String),
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
}

impl Config {
    /// Load configuration from file, or create default if missing
    /// Uses the provided profile to determine config and database paths
    pub fn load_with_profile(profile: utils::Profile) -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path(profile)?;
        Self::load_from(&config_path, profile)
    }

    /// Load from an explicit file, creating it with defaults if missing
    pub fn load_from(config_path: &PathBuf, profile: utils::Profile) -> Result<Self, ConfigError> {
        if config_path.exists() {
            let contents = fs::read_to_string(config_path)
                .map_err(|e| ConfigError::ReadError(e.to_string()))?;
            let mut config: Config = toml::from_str(&contents)?;

            // Ensure database path matches profile (in case config was manually edited)
            config.database_path = Self::default_database_path_for_profile(profile);

            Ok(config)
        } else {
            let mut config = Config::default();
            config.database_path = Self::default_database_path_for_profile(profile);
            config.log_dir = Self::default_log_dir_for_profile(profile);
            let save_result = config.save_to(config_path);
            if let Err(ref e) = save_result {
                eprintln!("ERROR: Failed to save config file: {}", e);
                eprintln!("Config path: {:?}", config_path);
            }
            save_result?;
            Ok(config)
        }
    }

    pub fn save_to(&mut self, config_path: &PathBuf) -> Result<(), ConfigError> {
        // Ensure config version is set before saving
        self.config_version = Some(CURRENT_CONFIG_VERSION);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(config_path, toml_string)
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile)
            .ok_or_else(|| ConfigError::ConfigDirError("Could not determine config directory".to_string()))?;
        Ok(config_dir.join("config.toml"))
    }

    fn default_database_path_for_profile(profile: utils::Profile) -> String {
        match utils::get_data_dir(profile) {
            Some(data_dir) => data_dir.join("studio.db").to_string_lossy().to_string(),
            None => format!("~/.local/share/{}/studio.db", profile.app_name()),
        }
    }

    fn default_log_dir_for_profile(profile: utils::Profile) -> String {
        match utils::get_data_dir(profile) {
            Some(data_dir) => data_dir.join("logs").to_string_lossy().to_string(),
            None => format!("~/.local/share/{}/logs", profile.app_name()),
        }
    }

    /// Get the expanded database path (with ~ expansion)
    pub fn get_database_path(&self) -> PathBuf {
        utils::expand_path(&self.database_path)
    }

    pub fn get_log_dir(&self) -> PathBuf {
        utils::expand_path(&self.log_dir)
    }

    /// Suggestion settings with the API key filled from the environment
    /// when the file leaves it empty
    pub fn resolved_suggestions(&self) -> SuggestConfig {
        self.resolve_suggestions_with(|name| std::env::var(name).ok())
    }

    fn resolve_suggestions_with(&self, lookup: impl Fn(&str) -> Option<String>) -> SuggestConfig {
        let mut suggestions = self.suggestions.clone();
        let configured = suggestions
            .api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty());
        if !configured {
            suggestions.api_key = API_KEY_ENV_VARS
                .iter()
                .filter_map(|name| lookup(name))
                .find(|key| !key.trim().is_empty());
        }
        suggestions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggest::DEFAULT_MODEL;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg").join("config.toml");
        let config = Config::load_from(&path, utils::Profile::Dev).unwrap();
        assert!(path.exists());
        assert_eq!(config.log_level, "info");
        assert_eq!(config.storage_limit_bytes, DEFAULT_STORAGE_LIMIT_BYTES);
        assert_eq!(config.suggestions.model, DEFAULT_MODEL);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "log_level = \"debug\"\n\n[suggestions]\ntimeout_secs = 5\n").unwrap();
        let config = Config::load_from(&path, utils::Profile::Dev).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.suggestions.timeout_secs, 5);
        assert_eq!(config.suggestions.model, DEFAULT_MODEL);
        assert!(config.suggestions.api_key.is_none());
    }

    #[test]
    fn invalid_toml_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "log_level = [").unwrap();
        assert!(matches!(
            Config::load_from(&path, utils::Profile::Dev),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn env_key_fills_missing_key_in_order() {
        let config = Config::default();
        let env = |name: &str| match name {
            "GEMINI_API_KEY" => Some("  ".to_string()),
            "API_KEY" => Some("from-env".to_string()),
            _ => None,
        };
        assert_eq!(
            config.resolve_suggestions_with(env).api_key.as_deref(),
            Some("from-env")
        );
    }

    #[test]
    fn configured_key_wins_over_env() {
        let mut config = Config::default();
        config.suggestions.api_key = Some("from-file".to_string());
        let resolved = config.resolve_suggestions_with(|_| Some("from-env".to_string()));
        assert_eq!(resolved.api_key.as_deref(), Some("from-file"));
    }
}
