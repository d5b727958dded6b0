//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Example
//!
//! ```toml
//! [graph]
//! url = "http://localhost:7474"
//! database = "neo4j"
//! username = "neo4j"
//! password = "secret"
//!
//! [sync]
//! batch_dir = "/var/tmp/git2graph"
//! load = "file"
//! batch_size = 1000
//! order = "topological"
//!
//! [credentials]
//! username = "git"
//! public_key = "~/.ssh/id_ed25519.pub"
//! private_key = "~/.ssh/id_ed25519"
//! passphrase = ""
//! ```
//!
//! # Validation
//!
//! Config values are validated after parsing: the graph URL must be an
//! http(s) URL, batch size must be positive, and a credentials section
//! must name a private key.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::git::WalkOrder;

/// Placeholder written in place of secrets when a config is displayed.
pub const MASK: &str = "********";

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Graph store connection
    pub graph: GraphSection,

    /// Synchronization behavior
    pub sync: SyncSection,

    /// Transport credentials for fetching remotes
    pub credentials: Option<CredentialsSection>,
}

impl ConfigFile {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.graph.validate()?;
        self.sync.validate()?;
        if let Some(credentials) = &self.credentials {
            credentials.validate()?;
        }
        Ok(())
    }

    /// A copy with passwords and passphrases replaced by [`MASK`].
    pub fn masked(&self) -> Self {
        let mut copy = self.clone();
        if copy.graph.password.is_some() {
            copy.graph.password = Some(MASK.to_string());
        }
        if let Some(credentials) = copy.credentials.as_mut() {
            if credentials.passphrase.as_deref().is_some_and(|p| !p.is_empty()) {
                credentials.passphrase = Some(MASK.to_string());
            }
        }
        copy
    }
}

/// Graph store connection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GraphSection {
    /// Base URL of the HTTP endpoint (default: `http://localhost:7474`)
    pub url: Option<String>,

    /// Database name (default: `neo4j`)
    pub database: Option<String>,

    /// Basic auth user
    pub username: Option<String>,

    /// Basic auth password
    pub password: Option<String>,
}

impl GraphSection {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidValue(format!(
                    "graph url '{}' must start with http:// or https://",
                    url
                )));
            }
        }
        if let Some(database) = &self.database {
            if database.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "graph database cannot be empty".to_string(),
                ));
            }
        }
        if self.password.is_some() && self.username.is_none() {
            return Err(ConfigError::InvalidValue(
                "graph password given without a username".to_string(),
            ));
        }
        Ok(())
    }
}

/// How a full sync moves the exported batch into the graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStrategy {
    /// The graph store reads the transfer file itself (LOAD CSV).
    #[default]
    File,
    /// Rows are sent as statement parameters in chunks.
    Inline,
}

/// Synchronization settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SyncSection {
    /// Directory for transfer batch files (default: `<cwd>/tmp`)
    pub batch_dir: Option<PathBuf>,

    /// Full-sync load strategy (default: `file`)
    pub load: Option<LoadStrategy>,

    /// Rows per periodic commit or inline chunk (default: 1000)
    pub batch_size: Option<usize>,

    /// Walk order for full exports (default: `topological`)
    pub order: Option<WalkOrder>,
}

impl SyncSection {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == Some(0) {
            return Err(ConfigError::InvalidValue(
                "sync batch_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// SSH key credentials used when fetching remotes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CredentialsSection {
    /// SSH user (default: the user from the remote URL, else `git`)
    pub username: Option<String>,

    /// Public key path
    pub public_key: Option<PathBuf>,

    /// Private key path
    pub private_key: Option<PathBuf>,

    /// Key passphrase
    pub passphrase: Option<String>,
}

impl CredentialsSection {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.private_key.is_none() {
            return Err(ConfigError::InvalidValue(
                "credentials section requires private_key".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod config_file {
        use super::*;

        #[test]
        fn defaults_validate() {
            assert!(ConfigFile::default().validate().is_ok());
        }

        #[test]
        fn roundtrip() {
            let config = ConfigFile {
                graph: GraphSection {
                    url: Some("http://db:7474".to_string()),
                    database: Some("graph".to_string()),
                    username: Some("neo4j".to_string()),
                    password: Some("pw".to_string()),
                },
                sync: SyncSection {
                    batch_dir: Some(PathBuf::from("/tmp/x")),
                    load: Some(LoadStrategy::Inline),
                    batch_size: Some(50),
                    order: Some(WalkOrder::Topological),
                },
                credentials: Some(CredentialsSection {
                    username: Some("git".to_string()),
                    public_key: None,
                    private_key: Some(PathBuf::from("/keys/id")),
                    passphrase: None,
                }),
            };

            let toml = toml::to_string_pretty(&config).unwrap();
            let parsed: ConfigFile = toml::from_str(&toml).unwrap();
            assert_eq!(config, parsed);
        }

        #[test]
        fn reject_unknown_fields() {
            let toml = r#"
                [graph]
                url = "http://localhost:7474"
                db_url = "oops"
            "#;
            assert!(toml::from_str::<ConfigFile>(toml).is_err());
        }

        #[test]
        fn masked_hides_secrets() {
            let config = ConfigFile {
                graph: GraphSection {
                    username: Some("neo4j".to_string()),
                    password: Some("hunter2".to_string()),
                    ..Default::default()
                },
                credentials: Some(CredentialsSection {
                    private_key: Some(PathBuf::from("/k")),
                    passphrase: Some("sesame".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            };
            let rendered = toml::to_string(&config.masked()).unwrap();
            assert!(!rendered.contains("hunter2"));
            assert!(!rendered.contains("sesame"));
            assert!(rendered.contains(MASK));
        }
    }

    mod graph_section {
        use super::*;

        #[test]
        fn non_http_url_rejected() {
            let section = GraphSection {
                url: Some("bolt://localhost:7687".to_string()),
                ..Default::default()
            };
            assert!(section.validate().is_err());
        }

        #[test]
        fn password_requires_username() {
            let section = GraphSection {
                password: Some("pw".to_string()),
                ..Default::default()
            };
            assert!(section.validate().is_err());
        }
    }

    mod sync_section {
        use super::*;

        #[test]
        fn zero_batch_size_rejected() {
            let section = SyncSection {
                batch_size: Some(0),
                ..Default::default()
            };
            assert!(section.validate().is_err());
        }

        #[test]
        fn load_strategy_parses_lowercase() {
            let section: SyncSection = toml::from_str("load = \"inline\"").unwrap();
            assert_eq!(section.load, Some(LoadStrategy::Inline));
        }
    }

    #[test]
    fn credentials_require_private_key() {
        assert!(CredentialsSection::default().validate().is_err());
    }
}
