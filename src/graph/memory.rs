//! graph::memory
//!
//! In-memory graph sink.
//!
//! # Design
//!
//! `MemoryGraph` interprets [`Statement`]s directly against a small
//! property graph, following the same merge rules as the Cypher each
//! statement renders to:
//!
//! - a statement that `MATCH`es a missing Repository does nothing
//! - commit content is filled only where absent
//! - an Author's name is set when the node is created
//! - relationship merges are set insertions
//!
//! The whole graph lives in a [`GraphState`] so tests can snapshot and
//! compare it. Failures can be injected per statement kind.
//!
//! # Example
//!
//! ```
//! use git2graph::core::types::RepoId;
//! use git2graph::graph::{GraphSink, MemoryGraph, Statement};
//!
//! let mut graph = MemoryGraph::new();
//! graph.run(&Statement::MergeRepository {
//!     id: RepoId::new("widgets").unwrap(),
//!     path: "/srv/widgets".into(),
//! }).unwrap();
//!
//! assert_eq!(graph.repository("widgets").unwrap().path, "/srv/widgets");
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde_json::{json, Value};
use tracing::trace;

use super::{GraphSink, Row, SinkError, Statement, StatementKind};
use crate::export::{BatchReader, CommitRow};

/// A Repository node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryNode {
    pub path: String,
}

/// A Commit node. Placeholders have no content yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitNode {
    pub message: Option<String>,
    pub author_time: Option<String>,
    pub author_timestamp: Option<i64>,
    pub commit_time: Option<String>,
    pub commit_timestamp: Option<i64>,
    pub parents: Option<String>,
}

impl CommitNode {
    /// Whether the node was only created as someone's parent.
    pub fn is_placeholder(&self) -> bool {
        self.message.is_none()
    }

    fn complete_from(&mut self, row: &CommitRow) {
        self.message.get_or_insert_with(|| row.message.clone());
        self.author_time.get_or_insert_with(|| row.author_time.clone());
        self.author_timestamp.get_or_insert(row.author_timestamp);
        self.commit_time.get_or_insert_with(|| row.commit_time.clone());
        self.commit_timestamp.get_or_insert(row.commit_timestamp);
        self.parents.get_or_insert_with(|| row.parents.clone());
    }
}

/// A Branch node and the commit it points to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct BranchNode {
    pub repo_id: String,
    pub name: String,
    pub remote: String,
    pub target: String,
}

/// Relationship types, for edge counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relationship {
    HasCommit,
    Authored,
    AuthoredBy,
    ContributedTo,
    HasParent,
    HasBranch,
    PointsTo,
}

/// Every node and edge of a [`MemoryGraph`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphState {
    pub constraints: BTreeSet<(String, String)>,
    pub repositories: BTreeMap<String, RepositoryNode>,
    pub commits: BTreeMap<String, CommitNode>,
    /// Author email to display name.
    pub authors: BTreeMap<String, String>,
    pub branches: Vec<BranchNode>,
    /// (repository id, commit hash)
    pub has_commit: BTreeSet<(String, String)>,
    /// (author email, commit hash)
    pub authored: BTreeSet<(String, String)>,
    /// (commit hash, author email)
    pub authored_by: BTreeSet<(String, String)>,
    /// (author email, repository id)
    pub contributed_to: BTreeSet<(String, String)>,
    /// (child hash, parent hash)
    pub has_parent: BTreeSet<(String, String)>,
}

#[derive(Debug, Clone, Copy)]
struct Failure {
    kind: StatementKind,
    after: usize,
}

/// In-memory graph sink.
#[derive(Debug, Default)]
pub struct MemoryGraph {
    state: GraphState,
    executed: Vec<StatementKind>,
    failure: Option<Failure>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every `kind` statement once `after` of them have succeeded.
    pub fn fail_on(&mut self, kind: StatementKind, after: usize) {
        self.failure = Some(Failure { kind, after });
    }

    /// Stop injecting failures.
    pub fn clear_failure(&mut self) {
        self.failure = None;
    }

    /// Copy of the full graph.
    pub fn snapshot(&self) -> GraphState {
        self.state.clone()
    }

    /// Kinds of the statements run successfully, in order.
    pub fn executed(&self) -> &[StatementKind] {
        &self.executed
    }

    /// How many `kind` statements ran successfully.
    pub fn count_executed(&self, kind: StatementKind) -> usize {
        self.executed.iter().filter(|k| **k == kind).count()
    }

    pub fn has_constraint(&self, label: &str, property: &str) -> bool {
        self.state
            .constraints
            .contains(&(label.to_string(), property.to_string()))
    }

    pub fn repository(&self, id: &str) -> Option<&RepositoryNode> {
        self.state.repositories.get(id)
    }

    pub fn commit(&self, hash: &str) -> Option<&CommitNode> {
        self.state.commits.get(hash)
    }

    /// All Commit nodes, placeholders included.
    pub fn commit_count(&self) -> usize {
        self.state.commits.len()
    }

    /// Commits linked from the Repository by HAS_COMMIT.
    pub fn commits_of(&self, repo_id: &str) -> Vec<&str> {
        self.state
            .has_commit
            .iter()
            .filter(|(repo, _)| repo == repo_id)
            .map(|(_, hash)| hash.as_str())
            .collect()
    }

    pub fn author_name(&self, email: &str) -> Option<&str> {
        self.state.authors.get(email).map(String::as_str)
    }

    pub fn author_count(&self) -> usize {
        self.state.authors.len()
    }

    /// Parent hashes of a commit, sorted.
    pub fn parents_of(&self, hash: &str) -> Vec<&str> {
        self.state
            .has_parent
            .iter()
            .filter(|(child, _)| child == hash)
            .map(|(_, parent)| parent.as_str())
            .collect()
    }

    /// Branch nodes of the Repository, sorted by remote then name.
    pub fn branches(&self, repo_id: &str) -> Vec<&BranchNode> {
        let mut branches: Vec<&BranchNode> = self
            .state
            .branches
            .iter()
            .filter(|b| b.repo_id == repo_id)
            .collect();
        branches.sort_by(|a, b| (&a.remote, &a.name).cmp(&(&b.remote, &b.name)));
        branches
    }

    pub fn edge_count(&self, relationship: Relationship) -> usize {
        match relationship {
            Relationship::HasCommit => self.state.has_commit.len(),
            Relationship::Authored => self.state.authored.len(),
            Relationship::AuthoredBy => self.state.authored_by.len(),
            Relationship::ContributedTo => self.state.contributed_to.len(),
            Relationship::HasParent => self.state.has_parent.len(),
            Relationship::HasBranch | Relationship::PointsTo => self.state.branches.len(),
        }
    }

    fn check_failure(&self, kind: StatementKind) -> Result<(), SinkError> {
        match self.failure {
            Some(f) if f.kind == kind && self.count_executed(kind) >= f.after => Err(SinkError::Query {
                code: "Memory.Injected".to_string(),
                message: format!("injected failure on {kind}"),
            }),
            _ => Ok(()),
        }
    }

    fn merge_rows(&mut self, repo_id: &str, rows: &[CommitRow]) {
        if !self.state.repositories.contains_key(repo_id) {
            return;
        }
        let state = &mut self.state;
        for row in rows {
            state
                .commits
                .entry(row.hash.clone())
                .or_default()
                .complete_from(row);
            state
                .has_commit
                .insert((repo_id.to_string(), row.hash.clone()));

            state
                .authors
                .entry(row.author_email.clone())
                .or_insert_with(|| row.author_name.clone());
            state
                .authored
                .insert((row.author_email.clone(), row.hash.clone()));
            state
                .authored_by
                .insert((row.hash.clone(), row.author_email.clone()));
            state
                .contributed_to
                .insert((row.author_email.clone(), repo_id.to_string()));

            for parent in row.parent_hashes() {
                state.commits.entry(parent.to_string()).or_default();
                state
                    .has_parent
                    .insert((row.hash.clone(), parent.to_string()));
            }
        }
    }

    fn apply(&mut self, statement: &Statement) -> Result<Vec<Row>, SinkError> {
        match statement {
            Statement::EnsureConstraint { label, property } => {
                self.state
                    .constraints
                    .insert((label.clone(), property.clone()));
                Ok(vec![])
            }
            Statement::MergeRepository { id, path } => {
                self.state
                    .repositories
                    .insert(id.to_string(), RepositoryNode { path: path.clone() });
                Ok(vec![])
            }
            Statement::LoadBatchFile {
                repo_id, file_url, ..
            } => {
                let path = file_url.strip_prefix("file://").unwrap_or(file_url);
                let rows = BatchReader::read(Path::new(path)).map_err(|e| SinkError::Query {
                    code: "Neo.ClientError.Statement.ExternalResourceFailed".to_string(),
                    message: e.to_string(),
                })?;
                self.merge_rows(repo_id.as_str(), &rows);
                Ok(vec![])
            }
            Statement::MergeCommits { repo_id, rows } => {
                self.merge_rows(repo_id.as_str(), rows);
                Ok(vec![])
            }
            Statement::CommitExists { repo_id, hash } => {
                let known = self
                    .state
                    .has_commit
                    .contains(&(repo_id.to_string(), hash.to_string()));
                Ok(vec![row("count", json!(u64::from(known)))])
            }
            Statement::DeleteBranches { repo_id } => {
                self.state.branches.retain(|b| b.repo_id != repo_id.as_str());
                Ok(vec![])
            }
            Statement::CreateBranch {
                repo_id,
                name,
                remote,
                hash,
            } => {
                let linked = self
                    .state
                    .has_commit
                    .contains(&(repo_id.to_string(), hash.to_string()));
                if linked {
                    self.state.branches.push(BranchNode {
                        repo_id: repo_id.to_string(),
                        name: name.to_string(),
                        remote: remote.clone(),
                        target: hash.to_string(),
                    });
                }
                Ok(vec![row("created", json!(u64::from(linked)))])
            }
        }
    }
}

fn row(column: &str, value: Value) -> Row {
    let mut row = Row::new();
    row.insert(column.to_string(), value);
    row
}

impl GraphSink for MemoryGraph {
    fn run(&mut self, statement: &Statement) -> Result<Vec<Row>, SinkError> {
        let kind = statement.kind();
        self.check_failure(kind)?;
        trace!(%kind, "memory graph statement");
        let rows = self.apply(statement)?;
        self.executed.push(kind);
        Ok(rows)
    }
}
