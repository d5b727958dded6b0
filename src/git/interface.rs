//! git::interface
//!
//! Commit source implementation using git2.
//!
//! This module is the **single doorway** to libgit2. No other module
//! imports `git2`; everything above sees [`CommitRecord`]s, [`Oid`]s and
//! typed [`GitError`]s.
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::NotARepo`]: Path is not a repository
//! - [`GitError::RefNotFound`] / [`GitError::ObjectNotFound`]: unresolvable history
//! - [`GitError::CorruptCommit`]: A commit with an empty or null hash
//! - [`GitError::ReferenceIteration`]: Enumerating refs failed part way
//! - [`GitError::Transport`]: Fetching a remote failed (auth, network)
//!
//! # Example
//!
//! ```ignore
//! use git2graph::git::{CommitSource, Git, WalkOrder};
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("/srv/mirrors/widgets.git"))?;
//! let tips = git.reference_tips()?;
//! let starts: Vec<_> = tips.iter().map(|t| t.target.clone()).collect();
//! for record in git.walk(&starts, WalkOrder::Time)? {
//!     let record = record?;
//!     println!("{} {}", record.hash.short(7), record.message.lines().next().unwrap_or(""));
//! }
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::source::{CommitSource, ReferenceTip};
use super::walk::{CommitWalk, WalkOrder};
use crate::core::commit::{CommitRecord, CommitTime, Signature};
use crate::core::types::{Oid, RefName, TypeError};
use crate::credentials::{Credential, CredentialProvider};

/// Give up after this many credential challenges for one remote.
///
/// libgit2 keeps asking as long as the callback returns a credential,
/// so a rejected key would otherwise loop forever.
const MAX_CREDENTIAL_ATTEMPTS: usize = 3;

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Path is not a git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was opened
        path: PathBuf,
    },

    /// Requested ref does not exist or does not resolve to a commit.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// Object not found in repository.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The OID that was not found
        oid: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// A commit whose identifier is empty or unreadable.
    ///
    /// The history is corrupt; a sync must abort instead of writing a
    /// partial graph.
    #[error("corrupt commit: {context}")]
    CorruptCommit {
        /// What was being read
        context: String,
    },

    /// Enumerating references failed part way through.
    #[error("reference iteration failed: {message}")]
    ReferenceIteration {
        /// The underlying error message
        message: String,
    },

    /// Fetching a remote failed (authentication, network, protocol).
    #[error("fetch from '{remote}' failed: {message}")]
    Transport {
        /// The remote being fetched
        remote: String,
        /// The underlying error message
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => {
                if context.starts_with("refs/") {
                    GitError::RefNotFound {
                        refname: context.to_string(),
                    }
                } else {
                    GitError::ObjectNotFound {
                        oid: context.to_string(),
                    }
                }
            }
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: context.to_string(),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
            other => GitError::Internal {
                message: other.to_string(),
            },
        }
    }
}

/// The git2-backed commit source.
///
/// Opens bare and non-bare repositories alike; mirrors created with
/// `git clone --mirror` are the usual input.
pub struct Git {
    repo: git2::Repository,
    path: PathBuf,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.path)
            .field("git_dir", &self.repo.path())
            .finish()
    }
}

impl Git {
    /// Open the repository at exactly `path` (no upward discovery).
    ///
    /// The stored location is the canonical form of `path`, so every
    /// spelling of one repository (relative, absolute, through a
    /// symlink) shares one batch file and one lock.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if `path` is not a repository
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let not_a_repo = || GitError::NotARepo {
            path: path.to_path_buf(),
        };
        let repo = git2::Repository::open(path).map_err(|_| not_a_repo())?;
        let path = std::fs::canonicalize(path).map_err(|_| not_a_repo())?;

        Ok(Self { repo, path })
    }

    /// Path to the git directory (`.git` or the bare repo itself).
    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    /// Names of all configured remotes.
    pub fn remote_names(&self) -> Result<Vec<String>, GitError> {
        let remotes = self.repo.remotes()?;
        Ok(remotes.iter().flatten().map(String::from).collect())
    }

    /// Read one commit by id.
    pub fn commit(&self, oid: &Oid) -> Result<CommitRecord, GitError> {
        let id = git2::Oid::from_str(oid.as_str())
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;
        read_commit(&self.repo, id)
    }

    fn fetch_remote(
        &self,
        name: &str,
        credentials: &dyn CredentialProvider,
    ) -> Result<(), GitError> {
        let transport = |e: git2::Error| GitError::Transport {
            remote: name.to_string(),
            message: e.message().to_string(),
        };

        let mut remote = self.repo.find_remote(name).map_err(transport)?;

        let mut attempts = 0;
        let mut callbacks = git2::RemoteCallbacks::new();
        callbacks.credentials(|url, username_from_url, allowed| {
            attempts += 1;
            if attempts > MAX_CREDENTIAL_ATTEMPTS {
                return Err(git2::Error::from_str("authentication failed"));
            }
            let credential = credentials
                .credential(url, username_from_url)
                .map_err(|e| git2::Error::from_str(&e.to_string()))?;
            to_git2_cred(credential, username_from_url, allowed)
        });
        callbacks.certificate_check(|_cert, host| {
            if credentials.accept_certificate(host) {
                Ok(git2::CertificateCheckStatus::CertificateOk)
            } else {
                Err(git2::Error::from_str(&format!(
                    "certificate for {} rejected",
                    host
                )))
            }
        });

        let mut options = git2::FetchOptions::new();
        options
            .remote_callbacks(callbacks)
            .prune(git2::FetchPrune::On)
            .download_tags(git2::AutotagOption::Auto);

        // An empty refspec list means the remote's configured ones.
        remote
            .fetch::<&str>(&[], Some(&mut options), None)
            .map_err(transport)
    }
}

impl CommitSource for Git {
    fn location(&self) -> &Path {
        &self.path
    }

    fn reference_tips(&self) -> Result<Vec<ReferenceTip>, GitError> {
        let refs = self
            .repo
            .references_glob("refs/remotes/*")
            .map_err(|e| GitError::ReferenceIteration {
                message: e.message().to_string(),
            })?;

        let mut tips = Vec::new();
        for reference in refs {
            let reference = reference.map_err(|e| GitError::ReferenceIteration {
                message: e.message().to_string(),
            })?;

            if reference.kind() == Some(git2::ReferenceType::Symbolic) {
                continue;
            }

            let Some(name) = reference.name() else {
                warn!("skipping remote ref with a non-UTF-8 name");
                continue;
            };
            let name = RefName::new(name).map_err(|e| GitError::ReferenceIteration {
                message: e.to_string(),
            })?;

            let commit = reference
                .peel_to_commit()
                .map_err(|e| GitError::from_git2(e, name.as_str()))?;
            if commit.id().is_zero() {
                return Err(GitError::CorruptCommit {
                    context: format!("{} targets the null commit", name),
                });
            }

            tips.push(ReferenceTip {
                target: Oid::new(commit.id().to_string())?,
                name,
            });
        }

        tips.sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));
        debug!(count = tips.len(), "listed remote reference tips");
        Ok(tips)
    }

    fn walk(&self, starts: &[Oid], order: WalkOrder) -> Result<CommitWalk<'_>, GitError> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(sort_for(order))?;

        for start in starts {
            let id = git2::Oid::from_str(start.as_str())
                .map_err(|e| GitError::from_git2(e, start.as_str()))?;
            revwalk
                .push(id)
                .map_err(|e| GitError::from_git2(e, start.as_str()))?;
        }

        let repo = &self.repo;
        Ok(CommitWalk::new(revwalk.map(move |next| {
            let id = next.map_err(|e| GitError::CorruptCommit {
                context: e.message().to_string(),
            })?;
            read_commit(repo, id)
        })))
    }

    fn fetch_remotes(&self, credentials: &dyn CredentialProvider) -> Result<Vec<String>, GitError> {
        let names = self.remote_names()?;
        for name in &names {
            info!(remote = %name, "fetching");
            self.fetch_remote(name, credentials)?;
        }
        Ok(names)
    }
}

fn sort_for(order: WalkOrder) -> git2::Sort {
    match order {
        WalkOrder::Time => git2::Sort::TIME,
        WalkOrder::Topological => git2::Sort::TOPOLOGICAL,
        WalkOrder::TopologicalTime => git2::Sort::TOPOLOGICAL | git2::Sort::TIME,
        WalkOrder::Unsorted => git2::Sort::NONE,
    }
}

fn read_commit(repo: &git2::Repository, id: git2::Oid) -> Result<CommitRecord, GitError> {
    if id.is_zero() {
        return Err(GitError::CorruptCommit {
            context: "walk produced the null commit id".to_string(),
        });
    }

    let hash = id.to_string();
    let commit = repo
        .find_commit(id)
        .map_err(|e| GitError::from_git2(e, &hash))?;
    let hash = Oid::new(hash).map_err(|e| GitError::CorruptCommit {
        context: e.to_string(),
    })?;

    let author = commit.author();
    let committer = commit.committer();

    let mut parents = Vec::with_capacity(commit.parent_count());
    for parent in commit.parent_ids() {
        parents.push(Oid::new(parent.to_string()).map_err(|e| GitError::CorruptCommit {
            context: format!("parent of {}: {}", hash, e),
        })?);
    }

    Ok(CommitRecord {
        message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
        author: signature(&author),
        author_time: time(author.when()),
        committer: signature(&committer),
        commit_time: time(committer.when()),
        parents,
        hash,
    })
}

fn signature(sig: &git2::Signature<'_>) -> Signature {
    Signature::new(
        String::from_utf8_lossy(sig.name_bytes()),
        String::from_utf8_lossy(sig.email_bytes()),
    )
}

fn time(when: git2::Time) -> CommitTime {
    CommitTime::new(when.seconds(), when.offset_minutes())
}

fn to_git2_cred(
    credential: Credential,
    username_from_url: Option<&str>,
    allowed: git2::CredentialType,
) -> Result<git2::Cred, git2::Error> {
    match credential {
        Credential::SshKey {
            username,
            public_key,
            private_key,
            passphrase,
        } => git2::Cred::ssh_key(
            &username,
            public_key.as_deref(),
            &private_key,
            passphrase.as_deref(),
        ),
        Credential::Default if allowed.contains(git2::CredentialType::SSH_KEY) => {
            git2::Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"))
        }
        Credential::Default => git2::Cred::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod git_error {
        use super::*;

        #[test]
        fn display_formatting() {
            let err = GitError::Transport {
                remote: "origin".to_string(),
                message: "authentication required".to_string(),
            };
            assert!(err.to_string().contains("origin"));
            assert!(err.to_string().contains("authentication required"));

            let err = GitError::CorruptCommit {
                context: "empty hash".to_string(),
            };
            assert!(err.to_string().contains("corrupt commit"));
        }

        #[test]
        fn not_found_ref_context() {
            let err = GitError::from_git2(
                git2::Error::new(
                    git2::ErrorCode::NotFound,
                    git2::ErrorClass::Reference,
                    "missing",
                ),
                "refs/remotes/origin/main",
            );
            assert!(matches!(err, GitError::RefNotFound { .. }));
        }

        #[test]
        fn not_found_object_context() {
            let err = GitError::from_git2(
                git2::Error::new(
                    git2::ErrorCode::NotFound,
                    git2::ErrorClass::Odb,
                    "missing",
                ),
                "abc123",
            );
            assert!(matches!(err, GitError::ObjectNotFound { .. }));
        }

        #[test]
        fn type_error_maps_to_invalid_oid() {
            let err: GitError = TypeError::InvalidOid("zz".into()).into();
            assert!(matches!(err, GitError::InvalidOid { .. }));
        }
    }

    #[test]
    fn sort_flags() {
        assert_eq!(sort_for(WalkOrder::Time), git2::Sort::TIME);
        assert_eq!(
            sort_for(WalkOrder::TopologicalTime),
            git2::Sort::TOPOLOGICAL | git2::Sort::TIME
        );
        assert_eq!(sort_for(WalkOrder::Unsorted), git2::Sort::NONE);
    }

    #[test]
    fn time_keeps_offset() {
        let t = time(git2::Time::new(1_000, -60));
        assert_eq!(t.epoch_seconds(), 1_000);
        assert_eq!(t.offset_minutes(), -60);
    }

    #[test]
    fn open_missing_path_is_not_a_repo() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            Git::open(dir.path()),
            Err(GitError::NotARepo { .. })
        ));
    }
}
