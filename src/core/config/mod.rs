//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! Configuration is resolved once at startup into a [`Config`] value and
//! passed by reference to whatever needs it. There is no global settings
//! object.
//!
//! # Lookup
//!
//! The first existing file wins:
//! 1. An explicit path (the `--config` flag)
//! 2. `$GIT2GRAPH_CONFIG` if set
//! 3. `test_dir/config.toml` when `$GIT2GRAPH_ENV` is `test`
//! 4. `$XDG_CONFIG_HOME/git2graph/config.toml`
//! 5. `~/.git2graph/config.toml`
//!
//! If none exists, defaults are used. An unset `$GIT2GRAPH_ENV` falls back
//! to `development` with a warning.
//!
//! # Example
//!
//! ```no_run
//! use git2graph::core::config::Config;
//!
//! let result = Config::load(None).unwrap();
//! let config = result.config;
//!
//! println!("graph at {}", config.graph_url());
//! println!("batch size {}", config.batch_size());
//! ```

pub mod schema;

pub use schema::{ConfigFile, CredentialsSection, GraphSection, LoadStrategy, SyncSection};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::git::WalkOrder;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "GIT2GRAPH_CONFIG";

/// Environment variable naming the runtime environment.
pub const ENV_NAME_ENV: &str = "GIT2GRAPH_ENV";

const DEFAULT_GRAPH_URL: &str = "http://localhost:7474";
const DEFAULT_DATABASE: &str = "neo4j";
const DEFAULT_BATCH_SIZE: usize = 1000;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("current directory unavailable: {0}")]
    NoCurrentDir(std::io::Error),
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Resolved configuration.
///
/// Accessor methods apply defaults for anything the file leaves unset.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed file contents (all defaults if no file was found)
    pub file: ConfigFile,
    /// Runtime environment name
    env: String,
    /// Path the file was loaded from
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit path does not exist, or if a found
    /// file cannot be read, parsed or validated. A missing file in the
    /// implicit locations is not an error.
    pub fn load(explicit: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();

        let env = match std::env::var(ENV_NAME_ENV) {
            Ok(env) if !env.is_empty() => env,
            _ => {
                warnings.push(ConfigWarning {
                    message: format!(
                        "{} is not set, using the development environment",
                        ENV_NAME_ENV
                    ),
                });
                "development".to_string()
            }
        };

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            let mut config = Self::from_path(path)?;
            config.env = env;
            return Ok(ConfigLoadResult { config, warnings });
        }

        for candidate in Self::candidates(&env) {
            if candidate.exists() {
                let mut config = Self::from_path(&candidate)?;
                config.env = env;
                return Ok(ConfigLoadResult { config, warnings });
            }
        }

        Ok(ConfigLoadResult {
            config: Config {
                env,
                ..Default::default()
            },
            warnings,
        })
    }

    /// Implicit config locations, in lookup order.
    fn candidates(env: &str) -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(path) = std::env::var(CONFIG_ENV) {
            paths.push(PathBuf::from(path));
        }

        if env == "test" {
            paths.push(PathBuf::from("test_dir/config.toml"));
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg_home).join("git2graph/config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".git2graph/config.toml"));
        }

        paths
    }

    /// Read, parse and validate a config file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        file.validate()?;

        Ok(Self {
            file,
            env: String::new(),
            path: Some(path.to_path_buf()),
        })
    }

    /// Build a config from already-parsed contents.
    pub fn from_file(file: ConfigFile) -> Result<Self, ConfigError> {
        file.validate()?;
        Ok(Self {
            file,
            ..Default::default()
        })
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Graph HTTP endpoint. Defaults to `http://localhost:7474`.
    pub fn graph_url(&self) -> &str {
        self.file.graph.url.as_deref().unwrap_or(DEFAULT_GRAPH_URL)
    }

    /// Graph database name. Defaults to `neo4j`.
    pub fn database(&self) -> &str {
        self.file
            .graph
            .database
            .as_deref()
            .unwrap_or(DEFAULT_DATABASE)
    }

    /// Basic auth pair, if a username is configured.
    pub fn graph_auth(&self) -> Option<(&str, Option<&str>)> {
        self.file
            .graph
            .username
            .as_deref()
            .map(|user| (user, self.file.graph.password.as_deref()))
    }

    /// Directory holding transfer batch files.
    ///
    /// Defaults to `tmp/` under the current directory.
    pub fn batch_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.file.sync.batch_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(std::env::current_dir()
                .map_err(ConfigError::NoCurrentDir)?
                .join("tmp")),
        }
    }

    /// Full-sync load strategy. Defaults to [`LoadStrategy::File`].
    pub fn load_strategy(&self) -> LoadStrategy {
        self.file.sync.load.unwrap_or_default()
    }

    /// Rows per periodic commit / inline chunk. Defaults to 1000.
    pub fn batch_size(&self) -> usize {
        self.file.sync.batch_size.unwrap_or(DEFAULT_BATCH_SIZE)
    }

    /// Walk order for full exports. Defaults to [`WalkOrder::Topological`];
    /// loading does not depend on row order.
    pub fn walk_order(&self) -> WalkOrder {
        self.file.sync.order.unwrap_or_default()
    }

    /// Credentials section, if configured.
    pub fn credentials(&self) -> Option<&CredentialsSection> {
        self.file.credentials.as_ref()
    }

    /// Runtime environment name (`development`, `test`, ...).
    pub fn env(&self) -> &str {
        &self.env
    }

    /// Path the config was loaded from, if any.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
