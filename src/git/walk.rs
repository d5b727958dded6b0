//! git::walk
//!
//! Lazy, stoppable commit traversal.
//!
//! A [`CommitWalk`] yields [`CommitRecord`]s one at a time from whatever
//! backend produced it. Callers either iterate it directly or drive it
//! with [`CommitWalk::visit`], whose visitor returns [`WalkControl`]. A
//! `Stop` ends the whole remaining traversal, not just the current
//! commit: once a known commit is reached, its ancestors are assumed
//! recorded.
//!
//! An error from the backend is yielded once and ends the walk.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::GitError;
use crate::core::commit::CommitRecord;
use crate::core::types::Oid;

/// Order in which a walk yields commits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WalkOrder {
    /// Newest commit time first.
    Time,
    /// Children before parents.
    #[default]
    Topological,
    /// Children before parents, ties broken newest first.
    TopologicalTime,
    /// Backend order, no sorting.
    Unsorted,
}

impl WalkOrder {
    /// Names accepted by [`FromStr`].
    pub const NAMES: &'static [&'static str] = &["time", "topological", "topological-time", "unsorted"];

    pub fn as_str(&self) -> &'static str {
        match self {
            WalkOrder::Time => "time",
            WalkOrder::Topological => "topological",
            WalkOrder::TopologicalTime => "topological-time",
            WalkOrder::Unsorted => "unsorted",
        }
    }
}

impl std::fmt::Display for WalkOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WalkOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "time" => Ok(WalkOrder::Time),
            "topological" => Ok(WalkOrder::Topological),
            "topological-time" => Ok(WalkOrder::TopologicalTime),
            "unsorted" => Ok(WalkOrder::Unsorted),
            other => Err(format!(
                "unknown walk order '{}', must be one of: {}",
                other,
                Self::NAMES.join(", ")
            )),
        }
    }
}

/// Visitor verdict for one commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkControl {
    /// Keep walking.
    Continue,
    /// End the traversal here.
    Stop,
}

/// How a visited walk ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkOutcome {
    /// The visitor stopped the walk at `at`.
    Stopped {
        /// Commits handed to the visitor, including `at`.
        visited: usize,
        at: Oid,
    },
    /// Every reachable commit was visited.
    Exhausted { visited: usize },
}

impl WalkOutcome {
    /// Commits handed to the visitor.
    pub fn visited(&self) -> usize {
        match self {
            WalkOutcome::Stopped { visited, .. } | WalkOutcome::Exhausted { visited } => *visited,
        }
    }
}

/// A lazy sequence of commits that can be cancelled between elements.
pub struct CommitWalk<'a> {
    inner: Box<dyn Iterator<Item = Result<CommitRecord, GitError>> + 'a>,
    cancelled: bool,
}

impl std::fmt::Debug for CommitWalk<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitWalk")
            .field("cancelled", &self.cancelled)
            .finish_non_exhaustive()
    }
}

impl<'a> CommitWalk<'a> {
    /// Wrap a backend iterator.
    pub fn new(inner: impl Iterator<Item = Result<CommitRecord, GitError>> + 'a) -> Self {
        Self {
            inner: Box::new(inner),
            cancelled: false,
        }
    }

    /// Stop yielding commits. Checked before every element.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Drive the walk with a visitor until it stops or the walk ends.
    ///
    /// Backend errors are converted into the visitor's error type and
    /// abort the walk. Visitor errors abort it too.
    pub fn visit<F, E>(mut self, mut visitor: F) -> Result<WalkOutcome, E>
    where
        F: FnMut(&CommitRecord) -> Result<WalkControl, E>,
        E: From<GitError>,
    {
        let mut visited = 0;
        while let Some(next) = self.next() {
            let record = next?;
            visited += 1;
            if visitor(&record)? == WalkControl::Stop {
                self.cancel();
                return Ok(WalkOutcome::Stopped {
                    visited,
                    at: record.hash,
                });
            }
        }
        Ok(WalkOutcome::Exhausted { visited })
    }
}

impl Iterator for CommitWalk<'_> {
    type Item = Result<CommitRecord, GitError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cancelled {
            return None;
        }
        match self.inner.next() {
            Some(Err(e)) => {
                self.cancelled = true;
                Some(Err(e))
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::commit::{CommitTime, Signature};

    fn record(c: char) -> CommitRecord {
        CommitRecord {
            hash: Oid::new(c.to_string().repeat(40)).unwrap(),
            message: String::new(),
            author: Signature::new("a", "a@x"),
            author_time: CommitTime::new(0, 0),
            committer: Signature::new("a", "a@x"),
            commit_time: CommitTime::new(0, 0),
            parents: vec![],
        }
    }

    fn walk_of(items: Vec<Result<CommitRecord, GitError>>) -> CommitWalk<'static> {
        CommitWalk::new(items.into_iter())
    }

    #[test]
    fn visit_exhausts() {
        let walk = walk_of(vec![Ok(record('a')), Ok(record('b'))]);
        let outcome = walk
            .visit(|_| Ok::<_, GitError>(WalkControl::Continue))
            .unwrap();
        assert_eq!(outcome, WalkOutcome::Exhausted { visited: 2 });
    }

    #[test]
    fn stop_ends_remaining_traversal() {
        let walk = walk_of(vec![Ok(record('a')), Ok(record('b')), Ok(record('c'))]);
        let mut seen = Vec::new();
        let outcome = walk
            .visit(|r| {
                seen.push(r.hash.clone());
                Ok::<_, GitError>(if r.hash.as_str().starts_with('b') {
                    WalkControl::Stop
                } else {
                    WalkControl::Continue
                })
            })
            .unwrap();

        assert_eq!(seen.len(), 2);
        assert_eq!(outcome.visited(), 2);
        assert!(matches!(outcome, WalkOutcome::Stopped { ref at, .. } if at.as_str().starts_with('b')));
    }

    #[test]
    fn backend_error_aborts() {
        let walk = walk_of(vec![
            Ok(record('a')),
            Err(GitError::CorruptCommit {
                context: "empty hash".into(),
            }),
            Ok(record('c')),
        ]);
        let result = walk.visit(|_| Ok::<_, GitError>(WalkControl::Continue));
        assert!(matches!(result, Err(GitError::CorruptCommit { .. })));
    }

    #[test]
    fn iterator_fuses_after_error() {
        let mut walk = walk_of(vec![
            Err(GitError::Internal {
                message: "boom".into(),
            }),
            Ok(record('a')),
        ]);
        assert!(matches!(walk.next(), Some(Err(_))));
        assert!(walk.next().is_none());
    }

    #[test]
    fn cancel_checked_between_elements() {
        let mut walk = walk_of(vec![Ok(record('a')), Ok(record('b'))]);
        assert!(walk.next().is_some());
        walk.cancel();
        assert!(walk.is_cancelled());
        assert!(walk.next().is_none());
    }

    #[test]
    fn order_parses_and_displays() {
        for name in WalkOrder::NAMES {
            let order: WalkOrder = name.parse().unwrap();
            assert_eq!(order.to_string(), *name);
        }
        assert!("sideways".parse::<WalkOrder>().is_err());
    }
}
