//! Configuration management for Chatty
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{ChattyError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

/// Main configuration structure for Chatty
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Conversation storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Conversation storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database file location; unset means `~/.local/share/chatty/chatty.db`
    #[serde(default)]
    pub path: Option<String>,

    /// Default number of sessions shown by `history list` (0 = all)
    #[serde(default = "default_list_limit")]
    pub list_limit: i64,
}

fn default_list_limit() -> i64 {
    20
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            list_limit: default_list_limit(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ChattyError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ChattyError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(db_path) = std::env::var("CHATTY_HISTORY_DB") {
            self.storage.path = Some(db_path);
        }

        if let Ok(limit) = std::env::var("CHATTY_LIST_LIMIT") {
            if let Ok(value) = limit.parse() {
                self.storage.list_limit = value;
            } else {
                tracing::warn!("Invalid CHATTY_LIST_LIMIT: {}", limit);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(db_path) = &cli.storage_path {
            tracing::info!("Using storage DB override from CLI: {}", db_path);
            self.storage.path = Some(db_path.clone());
        }
    }

    /// Location hint handed to `ConversationStore::open`
    ///
    /// An empty string selects the default location.
    pub fn storage_location(&self) -> &str {
        self.storage.path.as_deref().unwrap_or("")
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if let Some(path) = &self.storage.path {
            if path.trim().is_empty() {
                return Err(ChattyError::Config(
                    "storage.path cannot be blank when set".to_string(),
                )
                .into());
            }
        }

        if self.storage.list_limit < 0 {
            return Err(ChattyError::Config(
                "storage.list_limit must be 0 (unlimited) or greater".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
