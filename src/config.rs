//! Configuration loading with layered overrides.
//!
//! Config is loaded in order (each layer overrides the previous):
//! 1. Default values
//! 2. Config file (TOML)
//! 3. Environment variables
//! 4. CLI arguments

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Default bound on how many ancestors a resolution will walk.
pub const DEFAULT_MAX_DEPTH: u32 = 64;

/// Engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: Database,
    #[serde(default)]
    pub resolver: Resolver,
}

/// Database connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data.db".to_string()
}

/// Folder inheritance settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolver {
    /// Ancestor chains longer than this are treated as corrupt (or cyclic)
    /// and resolution fails instead of walking further.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
}

impl Default for Resolver {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

fn default_max_depth() -> u32 {
    DEFAULT_MAX_DEPTH
}

/// Builder for loading configuration with customizable options.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Environment variable prefix (e.g., "MYAPP" -> MYAPP_MAX_FOLDER_DEPTH)
    pub env_prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self {
            env_prefix: "FOLIO".to_string(),
        }
    }
}

impl ConfigLoader {
    /// Create a new config loader with the given environment prefix.
    pub fn new(env_prefix: impl Into<String>) -> Self {
        Self {
            env_prefix: env_prefix.into(),
        }
    }

    /// Load configuration from file, environment, and CLI arguments.
    ///
    /// # Arguments
    /// * `config_path` - Optional path to TOML config file
    /// * `cli_database_url` - CLI override for database URL
    /// * `cli_max_depth` - CLI override for the resolver depth bound
    pub fn load(
        &self,
        config_path: Option<&Path>,
        cli_database_url: Option<&str>,
        cli_max_depth: Option<u32>,
    ) -> crate::Result<Config> {
        // Start with file config or defaults
        let mut config: Config = if let Some(path) = config_path {
            let content = std::fs::read_to_string(path)
                .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;
            toml::from_str(&content)
                .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?
        } else {
            Config::default()
        };

        // Override with environment variables
        let prefix = &self.env_prefix;

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database.url = url;
        }
        if let Ok(depth) = std::env::var(format!("{prefix}_MAX_FOLDER_DEPTH")) {
            config.resolver.max_depth = depth.parse().map_err(|e| {
                Error::Config(format!("{prefix}_MAX_FOLDER_DEPTH is not a number: {e}"))
            })?;
        }

        // Override with CLI arguments
        if let Some(url) = cli_database_url {
            config.database.url = url.to_string();
        }
        if let Some(depth) = cli_max_depth {
            config.resolver.max_depth = depth;
        }

        // Validate
        if config.resolver.max_depth == 0 {
            return Err(Error::Config(
                "resolver.max_depth must be at least 1".to_string(),
            ));
        }
        if config.database.url.trim().is_empty() {
            return Err(Error::Config("database.url must not be empty".to_string()));
        }

        Ok(config)
    }
}
