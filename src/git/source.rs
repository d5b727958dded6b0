//! git::source
//!
//! The commit source seam.
//!
//! The synchronizer only sees a repository through [`CommitSource`]:
//! list the remote-tracking tips, walk commits from a set of starting
//! points, and refresh remotes. [`super::Git`] is the libgit2 backend;
//! [`super::mock::MockSource`] is an in-memory DAG for tests.

use std::path::Path;

use super::walk::{CommitWalk, WalkOrder};
use super::GitError;
use crate::core::types::{BranchName, Oid, RefName};
use crate::credentials::CredentialProvider;

/// A remote-tracking reference and the commit it points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceTip {
    /// Full ref name, e.g. `refs/remotes/origin/main`.
    pub name: RefName,
    /// The commit the ref targets.
    pub target: Oid,
}

impl ReferenceTip {
    /// `(remote, branch)` parts of the ref name.
    ///
    /// Returns `None` if the ref is not under `refs/remotes/<remote>/`.
    pub fn remote_branch(&self) -> Option<(&str, BranchName)> {
        let (remote, branch) = self.name.remote_branch()?;
        Some((remote, BranchName::new(branch).ok()?))
    }
}

/// Read access to a repository's commit history.
pub trait CommitSource {
    /// On-disk location of the repository.
    fn location(&self) -> &Path;

    /// Every remote-tracking reference tip, sorted by ref name.
    ///
    /// Symbolic refs (like `refs/remotes/origin/HEAD`) are skipped.
    /// Failing to iterate references is an error, never an empty list.
    fn reference_tips(&self) -> Result<Vec<ReferenceTip>, GitError>;

    /// Start a walk from `starts` following parent links.
    ///
    /// Each distinct commit is yielded at most once per walk, even when
    /// several starting points share ancestors.
    fn walk(&self, starts: &[Oid], order: WalkOrder) -> Result<CommitWalk<'_>, GitError>;

    /// Fetch every remote, pruning stale remote refs and downloading
    /// tags automatically. Returns the names of the remotes fetched.
    fn fetch_remotes(&self, credentials: &dyn CredentialProvider) -> Result<Vec<String>, GitError>;
}
