//! graph::statement
//!
//! Every query the engine issues, as a typed value.
//!
//! A [`Statement`] renders to parameterized Cypher for a real graph
//! server ([`Statement::cypher`], [`Statement::parameters`]) and is
//! interpreted directly by [`super::MemoryGraph`]. Values always travel
//! as parameters; only validated identifiers (labels, property names)
//! and integers are spliced into the query text.

use serde_json::{json, Map, Value};

use super::SinkError;
use crate::core::types::{BranchName, Oid, RepoId};
use crate::export::CommitRow;

/// Merges one commit row bound to `row`, with `r` the Repository.
///
/// Content fields are only set when absent, so a parent placeholder is
/// completed by its real row and a populated commit is never rewritten.
const MERGE_COMMIT_ROW: &str = "\
MERGE (c:Commit {hash: row.hash})
SET c.message = coalesce(c.message, row.message),
    c.author_time = coalesce(c.author_time, row.author_time),
    c.author_timestamp = coalesce(c.author_timestamp, toInteger(row.author_timestamp)),
    c.commit_time = coalesce(c.commit_time, row.commit_time),
    c.commit_timestamp = coalesce(c.commit_timestamp, toInteger(row.commit_timestamp)),
    c.parents = coalesce(c.parents, row.parents)
MERGE (r)-[:HAS_COMMIT]->(c)
MERGE (a:Author {email: row.author_email})
  ON CREATE SET a.name = row.author_name
MERGE (a)-[:AUTHORED]->(c)
MERGE (c)-[:AUTHORED_BY]->(a)
MERGE (a)-[:CONTRIBUTED_TO]->(r)
WITH c, row
UNWIND (CASE row.parents WHEN '' THEN [] ELSE split(row.parents, ' ') END) AS parent_hash
MERGE (p:Commit {hash: parent_hash})
MERGE (c)-[:HAS_PARENT]->(p)";

/// Discriminant of a [`Statement`], for logging and fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    EnsureConstraint,
    MergeRepository,
    LoadBatchFile,
    MergeCommits,
    CommitExists,
    DeleteBranches,
    CreateBranch,
}

impl StatementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementKind::EnsureConstraint => "ensure-constraint",
            StatementKind::MergeRepository => "merge-repository",
            StatementKind::LoadBatchFile => "load-batch-file",
            StatementKind::MergeCommits => "merge-commits",
            StatementKind::CommitExists => "commit-exists",
            StatementKind::DeleteBranches => "delete-branches",
            StatementKind::CreateBranch => "create-branch",
        }
    }
}

impl std::fmt::Display for StatementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A graph query.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Create a uniqueness constraint unless it already exists.
    ///
    /// Build with [`Statement::constraint`], which validates identifiers.
    EnsureConstraint { label: String, property: String },

    /// Merge the Repository node by id and record its path.
    MergeRepository { id: RepoId, path: String },

    /// Load a transfer batch file server-side, committing every
    /// `batch_size` rows.
    LoadBatchFile {
        repo_id: RepoId,
        file_url: String,
        batch_size: usize,
    },

    /// Merge rows sent as a parameter.
    MergeCommits { repo_id: RepoId, rows: Vec<CommitRow> },

    /// Count commits with `hash` linked from the Repository. Returns one
    /// row with a `count` column.
    CommitExists { repo_id: RepoId, hash: Oid },

    /// Delete every Branch node of the Repository with its edges.
    DeleteBranches { repo_id: RepoId },

    /// Create a Branch pointing at a commit of the Repository. Returns
    /// one row with a `created` column (0 if the commit is unknown).
    CreateBranch {
        repo_id: RepoId,
        name: BranchName,
        remote: String,
        hash: Oid,
    },
}

impl Statement {
    /// A validated [`Statement::EnsureConstraint`].
    pub fn constraint(label: &str, property: &str) -> Result<Self, SinkError> {
        for ident in [label, property] {
            if !is_identifier(ident) {
                return Err(SinkError::Constraint {
                    label: label.to_string(),
                    property: property.to_string(),
                    message: format!("'{ident}' is not a plain identifier"),
                });
            }
        }
        Ok(Statement::EnsureConstraint {
            label: label.to_string(),
            property: property.to_string(),
        })
    }

    pub fn kind(&self) -> StatementKind {
        match self {
            Statement::EnsureConstraint { .. } => StatementKind::EnsureConstraint,
            Statement::MergeRepository { .. } => StatementKind::MergeRepository,
            Statement::LoadBatchFile { .. } => StatementKind::LoadBatchFile,
            Statement::MergeCommits { .. } => StatementKind::MergeCommits,
            Statement::CommitExists { .. } => StatementKind::CommitExists,
            Statement::DeleteBranches { .. } => StatementKind::DeleteBranches,
            Statement::CreateBranch { .. } => StatementKind::CreateBranch,
        }
    }

    /// Cypher text.
    pub fn cypher(&self) -> String {
        match self {
            Statement::EnsureConstraint { label, property } => format!(
                "CREATE CONSTRAINT {}_{}_unique IF NOT EXISTS FOR (n:{label}) REQUIRE n.{property} IS UNIQUE",
                label.to_lowercase(),
                property.to_lowercase(),
            ),
            Statement::MergeRepository { .. } => {
                "MERGE (r:Repository {id: $id})\nSET r.path = $path".to_string()
            }
            Statement::LoadBatchFile { batch_size, .. } => format!(
                "LOAD CSV WITH HEADERS FROM $file_url AS row\n\
                 CALL {{\nWITH row\nMATCH (r:Repository {{id: $repo_id}})\n{MERGE_COMMIT_ROW}\n}} \
                 IN TRANSACTIONS OF {} ROWS",
                (*batch_size).max(1)
            ),
            Statement::MergeCommits { .. } => format!(
                "MATCH (r:Repository {{id: $repo_id}})\nUNWIND $rows AS row\n{MERGE_COMMIT_ROW}"
            ),
            Statement::CommitExists { .. } => {
                "MATCH (:Repository {id: $repo_id})-[:HAS_COMMIT]->(c:Commit {hash: $hash})\n\
                 RETURN count(c) AS count"
                    .to_string()
            }
            Statement::DeleteBranches { .. } => {
                "MATCH (:Repository {id: $repo_id})-[:HAS_BRANCH]->(b:Branch)\nDETACH DELETE b"
                    .to_string()
            }
            Statement::CreateBranch { .. } => {
                "MATCH (r:Repository {id: $repo_id})-[:HAS_COMMIT]->(c:Commit {hash: $hash})\n\
                 CREATE (r)-[:HAS_BRANCH]->(b:Branch {name: $name, remote: $remote})-[:POINTS_TO]->(c)\n\
                 RETURN count(b) AS created"
                    .to_string()
            }
        }
    }

    /// Query parameters.
    pub fn parameters(&self) -> Map<String, Value> {
        let value = match self {
            Statement::EnsureConstraint { .. } => json!({}),
            Statement::MergeRepository { id, path } => json!({
                "id": id.as_str(),
                "path": path,
            }),
            Statement::LoadBatchFile {
                repo_id, file_url, ..
            } => json!({
                "repo_id": repo_id.as_str(),
                "file_url": file_url,
            }),
            Statement::MergeCommits { repo_id, rows } => json!({
                "repo_id": repo_id.as_str(),
                "rows": rows,
            }),
            Statement::CommitExists { repo_id, hash } => json!({
                "repo_id": repo_id.as_str(),
                "hash": hash.as_str(),
            }),
            Statement::DeleteBranches { repo_id } => json!({
                "repo_id": repo_id.as_str(),
            }),
            Statement::CreateBranch {
                repo_id,
                name,
                remote,
                hash,
            } => json!({
                "repo_id": repo_id.as_str(),
                "name": name.as_str(),
                "remote": remote,
                "hash": hash.as_str(),
            }),
        };
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
