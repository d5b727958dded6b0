//! credentials
//!
//! Transport credentials for fetching remotes.
//!
//! # Design
//!
//! Credentials are a capability passed explicitly to the operations that
//! need them (fetch), never a field baked into the repository handle. A
//! [`CredentialProvider`] is asked once per authentication challenge and
//! decides whether to accept each server certificate.
//!
//! # Security
//!
//! Implementations MUST never log or print passphrases, and their
//! `Debug` output must not include them.
//!
//! # Example
//!
//! ```
//! use git2graph::credentials::{CredentialProvider, SshKeyCredentials};
//!
//! let provider = SshKeyCredentials::new("git", "/home/me/.ssh/id_ed25519")
//!     .with_public_key("/home/me/.ssh/id_ed25519.pub")
//!     .with_passphrase("");
//! assert!(provider.accept_certificate("example.com"));
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::config::CredentialsSection;

/// Errors from credential providers.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// No credential is available for the URL.
    #[error("no credentials available for {0}")]
    Unavailable(String),

    /// A configured key file is missing.
    #[error("key file not found: {0}")]
    MissingKey(PathBuf),
}

/// A credential handed to the transport.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// SSH key pair on disk.
    SshKey {
        username: String,
        public_key: Option<PathBuf>,
        private_key: PathBuf,
        passphrase: Option<String>,
    },
    /// Let the transport use its defaults (ssh-agent, credential helper).
    Default,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::SshKey {
                username,
                public_key,
                private_key,
                passphrase,
            } => f
                .debug_struct("SshKey")
                .field("username", username)
                .field("public_key", public_key)
                .field("private_key", private_key)
                .field("passphrase", &passphrase.as_ref().map(|_| "<redacted>"))
                .finish(),
            Credential::Default => write!(f, "Default"),
        }
    }
}

/// Supplies credentials during remote operations.
pub trait CredentialProvider {
    /// Credential for `url`.
    ///
    /// `username_from_url` is the user embedded in the remote URL, if any
    /// (for example `git` in `git@host:org/repo.git`).
    fn credential(
        &self,
        url: &str,
        username_from_url: Option<&str>,
    ) -> Result<Credential, CredentialError>;

    /// Whether to accept the server certificate for `host`.
    ///
    /// Accepts everything unless overridden. No pinning is done.
    fn accept_certificate(&self, _host: &str) -> bool {
        true
    }
}

/// No configured credentials: defer to the transport's defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialProvider for NoCredentials {
    fn credential(&self, _url: &str, _username: Option<&str>) -> Result<Credential, CredentialError> {
        Ok(Credential::Default)
    }
}

/// SSH key pair credentials.
#[derive(Clone)]
pub struct SshKeyCredentials {
    username: Option<String>,
    public_key: Option<PathBuf>,
    private_key: PathBuf,
    passphrase: Option<String>,
}

impl std::fmt::Debug for SshKeyCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshKeyCredentials")
            .field("username", &self.username)
            .field("public_key", &self.public_key)
            .field("private_key", &self.private_key)
            .finish_non_exhaustive()
    }
}

impl SshKeyCredentials {
    /// Credentials for `username` with a private key and no passphrase.
    pub fn new(username: impl Into<String>, private_key: impl Into<PathBuf>) -> Self {
        Self {
            username: Some(username.into()),
            public_key: None,
            private_key: private_key.into(),
            passphrase: None,
        }
    }

    /// Set the public key path.
    pub fn with_public_key(mut self, path: impl Into<PathBuf>) -> Self {
        self.public_key = Some(path.into());
        self
    }

    /// Set the key passphrase. Empty passphrases are treated as none.
    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        let passphrase = passphrase.into();
        self.passphrase = (!passphrase.is_empty()).then_some(passphrase);
        self
    }

    /// Build from a config section, expanding a leading `~/`.
    ///
    /// Returns `None` if the section names no private key.
    pub fn from_config(section: &CredentialsSection) -> Option<Self> {
        let private_key = expand_home(section.private_key.as_deref()?);
        Some(Self {
            username: section.username.clone(),
            public_key: section.public_key.as_deref().map(expand_home),
            private_key,
            passphrase: section.passphrase.clone().filter(|p| !p.is_empty()),
        })
    }
}

impl CredentialProvider for SshKeyCredentials {
    fn credential(
        &self,
        url: &str,
        username_from_url: Option<&str>,
    ) -> Result<Credential, CredentialError> {
        if !self.private_key.exists() {
            return Err(CredentialError::MissingKey(self.private_key.clone()));
        }

        let username = self
            .username
            .clone()
            .or_else(|| username_from_url.map(String::from))
            .unwrap_or_else(|| "git".to_string());

        if username.is_empty() {
            return Err(CredentialError::Unavailable(url.to_string()));
        }

        Ok(Credential::SshKey {
            username,
            public_key: self.public_key.clone(),
            private_key: self.private_key.clone(),
            passphrase: self.passphrase.clone(),
        })
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}
