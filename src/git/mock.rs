//! git::mock
//!
//! In-memory commit source for deterministic testing.
//!
//! # Design
//!
//! `MockSource` holds a commit DAG and two sets of remote refs: the
//! local view (what [`CommitSource::reference_tips`] returns) and an
//! upstream view that is copied over on [`CommitSource::fetch_remotes`],
//! mimicking a fetch with pruning. Commits are named by short labels
//! (`"A"`, `"B"`, ...) that map to deterministic hashes.
//!
//! Walks always yield newest commit time first, whatever order is
//! requested; ties break on the hash.
//!
//! # Example
//!
//! ```
//! use git2graph::git::mock::MockSource;
//! use git2graph::git::{CommitSource, WalkOrder};
//!
//! let source = MockSource::new("/srv/widgets");
//! let a = source.commit("A", &[], 100);
//! let b = source.commit("B", &["A"], 200);
//! source.set_remote_ref("origin/main", "B");
//!
//! let tips = source.reference_tips().unwrap();
//! assert_eq!(tips[0].target, b);
//!
//! let hashes: Vec<_> = source
//!     .walk(&[b.clone()], WalkOrder::Time)
//!     .unwrap()
//!     .map(|r| r.unwrap().hash)
//!     .collect();
//! assert_eq!(hashes, vec![b, a]);
//! ```

use std::collections::{BTreeMap, BinaryHeap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::source::{CommitSource, ReferenceTip};
use super::walk::{CommitWalk, WalkOrder};
use super::GitError;
use crate::core::commit::{CommitRecord, CommitTime, Signature};
use crate::core::types::{Oid, RefName};
use crate::credentials::CredentialProvider;

/// Mock commit source.
///
/// Clones share state, so a test can keep a handle and "push upstream"
/// while the synchronizer owns another.
#[derive(Debug, Clone)]
pub struct MockSource {
    inner: Arc<Mutex<MockInner>>,
    path: PathBuf,
}

#[derive(Debug, Default)]
struct MockInner {
    commits: HashMap<Oid, CommitRecord>,
    refs: BTreeMap<RefName, Oid>,
    upstream: BTreeMap<RefName, Oid>,
    fail_on: Option<FailOn>,
    fetches: usize,
    walks: usize,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail fetch_remotes with a transport error carrying this message.
    Fetch(String),
    /// Fail reference_tips part way through iteration.
    References,
    /// Yield a corrupt-commit error when the walk reaches this commit.
    CorruptAt(Oid),
}

impl MockSource {
    /// An empty source located at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockInner::default())),
            path: path.into(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The deterministic hash for a commit label.
    pub fn oid(label: &str) -> Oid {
        let hex: String = label.bytes().map(|b| format!("{b:02x}")).collect();
        let hex = format!("{:f<40}", hex);
        Oid::new(&hex[..40]).unwrap_or_else(|e| panic!("invalid mock label '{label}': {e}"))
    }

    /// Add a commit named `label` with the given parents and commit time.
    ///
    /// The author is derived from the label (`<label>@example.com`).
    pub fn commit(&self, label: &str, parents: &[&str], time: i64) -> Oid {
        let email = format!("{}@example.com", label.to_lowercase());
        self.commit_by(label, parents, time, Signature::new(label, email), label)
    }

    /// Add a commit with an explicit author and message.
    pub fn commit_by(
        &self,
        label: &str,
        parents: &[&str],
        time: i64,
        author: Signature,
        message: &str,
    ) -> Oid {
        let hash = Self::oid(label);
        self.add(CommitRecord {
            hash: hash.clone(),
            message: message.to_string(),
            author: author.clone(),
            author_time: CommitTime::new(time, 0),
            committer: author,
            commit_time: CommitTime::new(time, 0),
            parents: parents.iter().map(|p| Self::oid(p)).collect(),
        });
        hash
    }

    /// Add a fully specified record.
    pub fn add(&self, record: CommitRecord) {
        self.lock().commits.insert(record.hash.clone(), record);
    }

    /// Point `refs/remotes/<short>` at commit `label`, locally and upstream.
    pub fn set_remote_ref(&self, short: &str, label: &str) {
        let name = remote_ref(short);
        let mut inner = self.lock();
        inner.refs.insert(name.clone(), Self::oid(label));
        inner.upstream.insert(name, Self::oid(label));
    }

    /// Move `refs/remotes/<short>` upstream only; visible after a fetch.
    pub fn push_upstream(&self, short: &str, label: &str) {
        self.lock().upstream.insert(remote_ref(short), Self::oid(label));
    }

    /// Delete `refs/remotes/<short>` upstream; pruned on the next fetch.
    pub fn delete_upstream(&self, short: &str) {
        self.lock().upstream.remove(&remote_ref(short));
    }

    /// Configure a failure.
    pub fn fail_on(&self, fail: FailOn) {
        self.lock().fail_on = Some(fail);
    }

    /// Clear any configured failure.
    pub fn clear_failure(&self) {
        self.lock().fail_on = None;
    }

    /// Number of fetches performed.
    pub fn fetch_count(&self) -> usize {
        self.lock().fetches
    }

    /// Number of walks started.
    pub fn walk_count(&self) -> usize {
        self.lock().walks
    }
}

fn remote_ref(short: &str) -> RefName {
    RefName::new(format!("refs/remotes/{short}"))
        .unwrap_or_else(|e| panic!("invalid mock ref '{short}': {e}"))
}

impl CommitSource for MockSource {
    fn location(&self) -> &Path {
        &self.path
    }

    fn reference_tips(&self) -> Result<Vec<ReferenceTip>, GitError> {
        let inner = self.lock();
        if matches!(inner.fail_on, Some(FailOn::References)) {
            return Err(GitError::ReferenceIteration {
                message: "mock reference iteration failure".to_string(),
            });
        }
        Ok(inner
            .refs
            .iter()
            .map(|(name, target)| ReferenceTip {
                name: name.clone(),
                target: target.clone(),
            })
            .collect())
    }

    fn walk(&self, starts: &[Oid], _order: WalkOrder) -> Result<CommitWalk<'_>, GitError> {
        let mut inner = self.lock();
        inner.walks += 1;

        let mut heap = BinaryHeap::new();
        let mut seen = HashSet::new();
        for start in starts {
            let record = inner.commits.get(start).ok_or_else(|| GitError::ObjectNotFound {
                oid: start.to_string(),
            })?;
            if seen.insert(start.clone()) {
                heap.push((record.commit_time.epoch_seconds(), start.clone()));
            }
        }

        let corrupt_at = match &inner.fail_on {
            Some(FailOn::CorruptAt(oid)) => Some(oid.clone()),
            _ => None,
        };

        Ok(CommitWalk::new(MockWalk {
            commits: inner.commits.clone(),
            heap,
            seen,
            corrupt_at,
        }))
    }

    fn fetch_remotes(&self, _credentials: &dyn CredentialProvider) -> Result<Vec<String>, GitError> {
        let mut inner = self.lock();
        if let Some(FailOn::Fetch(message)) = &inner.fail_on {
            return Err(GitError::Transport {
                remote: "origin".to_string(),
                message: message.clone(),
            });
        }
        inner.fetches += 1;
        inner.refs = inner.upstream.clone();

        let mut remotes: Vec<String> = inner
            .refs
            .keys()
            .filter_map(|r| r.remote_branch().map(|(remote, _)| remote.to_string()))
            .collect();
        remotes.dedup();
        Ok(remotes)
    }
}

/// Newest-first walk over a snapshot of the DAG.
struct MockWalk {
    commits: HashMap<Oid, CommitRecord>,
    heap: BinaryHeap<(i64, Oid)>,
    seen: HashSet<Oid>,
    corrupt_at: Option<Oid>,
}

impl Iterator for MockWalk {
    type Item = Result<CommitRecord, GitError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (_, oid) = self.heap.pop()?;

        if self.corrupt_at.as_ref() == Some(&oid) {
            return Some(Err(GitError::CorruptCommit {
                context: format!("mock corruption at {}", oid),
            }));
        }

        let Some(record) = self.commits.get(&oid).cloned() else {
            return Some(Err(GitError::ObjectNotFound {
                oid: oid.to_string(),
            }));
        };

        for parent in &record.parents {
            if self.seen.insert(parent.clone()) {
                let time = self
                    .commits
                    .get(parent)
                    .map(|p| p.commit_time.epoch_seconds())
                    .unwrap_or(i64::MIN);
                self.heap.push((time, parent.clone()));
            }
        }

        Some(Ok(record))
    }
}
