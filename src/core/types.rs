//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`Oid`] - Git object identifier (SHA), the commit hash
//! - [`RefName`] - Validated Git reference name
//! - [`BranchName`] - Branch part of a remote-tracking reference
//! - [`RepoId`] - Caller-supplied unique key of a Repository node
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, so an empty or malformed commit hash can never
//! reach the graph.
//!
//! # Examples
//!
//! ```
//! use git2graph::core::types::{Oid, RefName, RepoId};
//!
//! let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
//! let refname = RefName::new("refs/remotes/origin/main").unwrap();
//! let id = RepoId::new("github.com/acme/widgets").unwrap();
//!
//! assert_eq!(refname.remote_branch(), Some(("origin", "main")));
//! assert!(Oid::new("").is_err());
//! assert!(RepoId::new("  ").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("invalid ref name: {0}")]
    InvalidRefName(String),

    #[error("invalid repository id: {0}")]
    InvalidRepoId(String),
}

/// A Git object identifier (SHA-1 or SHA-256).
///
/// OIDs are normalized to lowercase for consistency. The zero OID is
/// representable (Git uses it for null references) but is never a valid
/// commit hash; see [`Oid::is_zero`].
///
/// # Example
///
/// ```
/// use git2graph::core::types::Oid;
///
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
/// assert_eq!(oid.short(7), "abc123d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not a valid hex OID.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        Self::validate(&oid)?;
        Ok(Self(oid))
    }

    /// Check if this is the zero/null OID.
    ///
    /// ```
    /// use git2graph::core::types::Oid;
    ///
    /// assert!(Oid::new("0".repeat(40)).unwrap().is_zero());
    /// ```
    pub fn is_zero(&self) -> bool {
        self.0.chars().all(|c| c == '0')
    }

    /// Get an abbreviated form of the OID.
    ///
    /// Returns the first `len` characters, or the full OID when `len`
    /// exceeds its length.
    pub fn short(&self, len: usize) -> &str {
        let end = len.min(self.0.len());
        &self.0[..end]
    }

    fn validate(oid: &str) -> Result<(), TypeError> {
        // SHA-1 is 40 hex chars, SHA-256 is 64
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(
                "object id must be hexadecimal".into(),
            ));
        }
        Ok(())
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated Git reference name.
///
/// Reference names must conform to Git's refname rules (see
/// `git check-ref-format`).
///
/// # Example
///
/// ```
/// use git2graph::core::types::RefName;
///
/// let refname = RefName::new("refs/remotes/origin/feature/foo").unwrap();
/// assert!(refname.is_remote_ref());
/// assert_eq!(refname.remote_branch(), Some(("origin", "feature/foo")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RefName(String);

impl RefName {
    const REMOTES_PREFIX: &'static str = "refs/remotes/";

    /// Create a new validated ref name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRefName` if the name violates Git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// Strip a prefix from the ref name and return the remainder.
    pub fn strip_prefix(&self, prefix: &str) -> Option<&str> {
        self.0.strip_prefix(prefix)
    }

    /// Check if this ref is a remote-tracking ref (`refs/remotes/...`).
    pub fn is_remote_ref(&self) -> bool {
        self.0.starts_with(Self::REMOTES_PREFIX)
    }

    /// Split a remote-tracking ref into `(remote, branch)`.
    ///
    /// Returns `None` for refs outside `refs/remotes/` or without a
    /// branch component.
    pub fn remote_branch(&self) -> Option<(&str, &str)> {
        let rest = self.strip_prefix(Self::REMOTES_PREFIX)?;
        let (remote, branch) = rest.split_once('/')?;
        if remote.is_empty() || branch.is_empty() {
            return None;
        }
        Some((remote, branch))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidRefName("ref name cannot be empty".into()));
        }
        if name.starts_with('/') {
            return Err(TypeError::InvalidRefName(
                "ref name cannot start with '/'".into(),
            ));
        }
        if name.ends_with('/') {
            return Err(TypeError::InvalidRefName(
                "ref name cannot end with '/'".into(),
            ));
        }
        if name.ends_with(".lock") {
            return Err(TypeError::InvalidRefName(
                "ref name cannot end with '.lock'".into(),
            ));
        }
        for pattern in ["..", "@{", "//"] {
            if name.contains(pattern) {
                return Err(TypeError::InvalidRefName(format!(
                    "ref name cannot contain '{pattern}'"
                )));
            }
        }

        const INVALID_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];
        for c in INVALID_CHARS {
            if name.contains(c) {
                return Err(TypeError::InvalidRefName(format!(
                    "ref name cannot contain '{c}'"
                )));
            }
        }
        if name.chars().any(|c| c.is_ascii_control()) {
            return Err(TypeError::InvalidRefName(
                "ref name cannot contain control characters".into(),
            ));
        }

        for component in name.split('/') {
            if component.starts_with('.') {
                return Err(TypeError::InvalidRefName(
                    "path component cannot start with '.'".into(),
                ));
            }
            if component.ends_with(".lock") {
                return Err(TypeError::InvalidRefName(
                    "path component cannot end with '.lock'".into(),
                ));
            }
        }

        Ok(())
    }

    /// Get the ref name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RefName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RefName> for String {
    fn from(name: RefName) -> Self {
        name.0
    }
}

impl AsRef<str> for RefName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The branch part of a remote-tracking reference, as stored on Branch nodes.
///
/// `refs/remotes/origin/feature/foo` yields remote `origin` and branch
/// `feature/foo`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name is empty or is
    /// not a valid ref component.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.is_empty() {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot be empty".into(),
            ));
        }
        RefName::validate(&format!("refs/heads/{name}"))
            .map_err(|e| TypeError::InvalidBranchName(e.to_string()))?;
        Ok(Self(name))
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique key of a Repository node in the graph.
///
/// Supplied by the caller (for example the origin URL or a slug). The
/// only requirement is that it is non-blank; surrounding whitespace is
/// trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoId(String);

impl RepoId {
    /// Create a new repository id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRepoId` if the id is blank.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(TypeError::InvalidRepoId(
                "repository id cannot be blank".into(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RepoId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RepoId> for String {
    fn from(id: RepoId) -> Self {
        id.0
    }
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod oid {
        use super::*;

        #[test]
        fn sha1_and_sha256_accepted() {
            assert!(Oid::new("a".repeat(40)).is_ok());
            assert!(Oid::new("b".repeat(64)).is_ok());
        }

        #[test]
        fn normalized_to_lowercase() {
            let oid = Oid::new("ABCDEF".repeat(6) + "ABCD").unwrap();
            assert_eq!(oid.as_str(), "abcdef".repeat(6) + "abcd");
        }

        #[test]
        fn empty_rejected() {
            assert!(matches!(Oid::new(""), Err(TypeError::InvalidOid(_))));
        }

        #[test]
        fn non_hex_rejected() {
            assert!(Oid::new("g".repeat(40)).is_err());
        }

        #[test]
        fn zero_detected() {
            assert!(Oid::new("0".repeat(40)).unwrap().is_zero());
            assert!(!Oid::new("1".repeat(40)).unwrap().is_zero());
        }

        #[test]
        fn short_clamps_to_length() {
            let oid = Oid::new("c".repeat(40)).unwrap();
            assert_eq!(oid.short(7), "ccccccc");
            assert_eq!(oid.short(100).len(), 40);
        }

        #[test]
        fn serde_roundtrip_validates() {
            let json = format!("\"{}\"", "d".repeat(40));
            let oid: Oid = serde_json::from_str(&json).unwrap();
            assert_eq!(oid.as_str(), "d".repeat(40));
            assert!(serde_json::from_str::<Oid>("\"nope\"").is_err());
        }
    }

    mod ref_name {
        use super::*;

        #[test]
        fn remote_branch_split() {
            let r = RefName::new("refs/remotes/upstream/release/1.0").unwrap();
            assert!(r.is_remote_ref());
            assert_eq!(r.remote_branch(), Some(("upstream", "release/1.0")));
        }

        #[test]
        fn local_branch_is_not_remote() {
            let r = RefName::new("refs/heads/main").unwrap();
            assert!(!r.is_remote_ref());
            assert_eq!(r.remote_branch(), None);
        }

        #[test]
        fn invalid_names_rejected() {
            assert!(RefName::new("").is_err());
            assert!(RefName::new("refs/heads/a..b").is_err());
            assert!(RefName::new("refs/heads/with space").is_err());
            assert!(RefName::new("refs/heads/x.lock").is_err());
            assert!(RefName::new("refs//heads").is_err());
        }
    }

    mod branch_name {
        use super::*;

        #[test]
        fn accepts_nested() {
            assert_eq!(BranchName::new("feature/x").unwrap().as_str(), "feature/x");
        }

        #[test]
        fn rejects_empty_and_invalid() {
            assert!(BranchName::new("").is_err());
            assert!(BranchName::new("bad..name").is_err());
        }
    }

    mod repo_id {
        use super::*;

        #[test]
        fn trims_whitespace() {
            assert_eq!(RepoId::new("  acme  ").unwrap().as_str(), "acme");
        }

        #[test]
        fn blank_rejected() {
            assert!(matches!(RepoId::new(" "), Err(TypeError::InvalidRepoId(_))));
        }
    }
}
