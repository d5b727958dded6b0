//! graph::loader
//!
//! Applies commits and branch pointers to a graph sink.
//!
//! # Graph model
//!
//! ```text
//! (Repository {id, path})
//!   -[:HAS_COMMIT]->  (Commit {hash, message, author_time, author_timestamp,
//!                              commit_time, commit_timestamp, parents})
//!   -[:HAS_BRANCH]->  (Branch {name, remote}) -[:POINTS_TO]-> (Commit)
//! (Author {email, name}) -[:AUTHORED]-> (Commit) -[:AUTHORED_BY]-> (Author)
//! (Author) -[:CONTRIBUTED_TO]-> (Repository)
//! (Commit) -[:HAS_PARENT]-> (Commit)
//! ```
//!
//! Every operation is safe to repeat. Nothing is rolled back on failure:
//! a failed load leaves whatever earlier statements applied, and rerunning
//! converges on the same graph.

use std::path::Path;

use tracing::{debug, info};

use super::{GraphSink, Row, SinkError, Statement};
use crate::core::commit::CommitRecord;
use crate::core::types::{Oid, RepoId};
use crate::export::CommitRow;
use crate::git::ReferenceTip;

/// Uniqueness constraints the loader relies on, as `(label, property)`.
pub const CONSTRAINTS: [(&str, &str); 3] = [
    ("Repository", "id"),
    ("Commit", "hash"),
    ("Author", "email"),
];

/// Loads one repository's commits into a sink.
pub struct GraphLoader<'s> {
    sink: &'s mut dyn GraphSink,
    repo_id: RepoId,
    batch_size: usize,
}

impl std::fmt::Debug for GraphLoader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphLoader")
            .field("repo_id", &self.repo_id)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl<'s> GraphLoader<'s> {
    /// Loader for the Repository `repo_id`. `batch_size` bounds the rows
    /// per periodic commit and per inline chunk.
    pub fn new(sink: &'s mut dyn GraphSink, repo_id: RepoId, batch_size: usize) -> Self {
        Self {
            sink,
            repo_id,
            batch_size: batch_size.max(1),
        }
    }

    pub fn repo_id(&self) -> &RepoId {
        &self.repo_id
    }

    /// Create the Repository, Commit and Author uniqueness constraints.
    pub fn ensure_constraints(&mut self) -> Result<(), SinkError> {
        for (label, property) in CONSTRAINTS {
            self.sink.ensure_constraint(label, property)?;
        }
        Ok(())
    }

    /// Merge the Repository node.
    pub fn merge_repository(&mut self, path: &Path) -> Result<(), SinkError> {
        self.sink.run(&Statement::MergeRepository {
            id: self.repo_id.clone(),
            path: path.display().to_string(),
        })?;
        Ok(())
    }

    /// Have the graph server read a batch file directly.
    ///
    /// The server must be able to read `path` (same host, or a shared
    /// import directory).
    pub fn load_batch_file(&mut self, path: &Path) -> Result<(), SinkError> {
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let file_url = format!("file://{}", absolute.display());
        info!(%file_url, repo = %self.repo_id, "loading batch file");
        self.sink.run(&Statement::LoadBatchFile {
            repo_id: self.repo_id.clone(),
            file_url,
            batch_size: self.batch_size,
        })?;
        Ok(())
    }

    /// Send rows as parameters, `batch_size` at a time. Returns the
    /// number of rows sent.
    pub fn load_rows(&mut self, rows: &[CommitRow]) -> Result<usize, SinkError> {
        for chunk in rows.chunks(self.batch_size) {
            debug!(rows = chunk.len(), repo = %self.repo_id, "merging commit rows");
            self.sink.run(&Statement::MergeCommits {
                repo_id: self.repo_id.clone(),
                rows: chunk.to_vec(),
            })?;
        }
        Ok(rows.len())
    }

    /// Merge a single commit with its author and parent links.
    pub fn load_commit(&mut self, record: &CommitRecord) -> Result<(), SinkError> {
        self.sink.run(&Statement::MergeCommits {
            repo_id: self.repo_id.clone(),
            rows: vec![CommitRow::from_record(record)],
        })?;
        Ok(())
    }

    /// Whether `hash` is already a commit of this Repository.
    ///
    /// A parent placeholder that no HAS_COMMIT edge reaches is not known.
    pub fn is_known(&mut self, hash: &Oid) -> Result<bool, SinkError> {
        let rows = self.sink.run(&Statement::CommitExists {
            repo_id: self.repo_id.clone(),
            hash: hash.clone(),
        })?;
        Ok(count_column(&rows, "count")? > 0)
    }

    /// Replace every Branch node of the Repository with one per remote
    /// tip. Tips whose commit is not in the Repository are skipped.
    /// Returns the number of branches created.
    pub fn refresh_branches(&mut self, tips: &[ReferenceTip]) -> Result<usize, SinkError> {
        self.sink.run(&Statement::DeleteBranches {
            repo_id: self.repo_id.clone(),
        })?;

        let mut created = 0;
        for tip in tips {
            let Some((remote, branch)) = tip.remote_branch() else {
                debug!(reference = %tip.name, "not a remote branch, skipping");
                continue;
            };
            let rows = self.sink.run(&Statement::CreateBranch {
                repo_id: self.repo_id.clone(),
                name: branch,
                remote: remote.to_string(),
                hash: tip.target.clone(),
            })?;
            if count_column(&rows, "created")? > 0 {
                created += 1;
            } else {
                debug!(reference = %tip.name, target = %tip.target, "branch target not loaded, skipping");
            }
        }
        info!(created, repo = %self.repo_id, "refreshed branches");
        Ok(created)
    }
}

fn count_column(rows: &[Row], column: &str) -> Result<u64, SinkError> {
    rows.first()
        .and_then(|row| row.get(column))
        .and_then(|value| value.as_u64())
        .ok_or_else(|| SinkError::Decode(format!("expected a single '{column}' count")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::commit::{CommitTime, Signature};
    use crate::core::types::RefName;
    use crate::graph::{MemoryGraph, StatementKind};

    fn oid(c: char) -> Oid {
        Oid::new(c.to_string().repeat(40)).unwrap()
    }

    fn record(c: char, parents: &[char]) -> CommitRecord {
        CommitRecord {
            hash: oid(c),
            message: format!("commit {c}"),
            author: Signature::new("Ann", "ann@example.com"),
            author_time: CommitTime::new(1_000, 0),
            committer: Signature::new("Ann", "ann@example.com"),
            commit_time: CommitTime::new(1_000, 0),
            parents: parents.iter().map(|p| oid(*p)).collect(),
        }
    }

    fn tip(name: &str, target: char) -> ReferenceTip {
        ReferenceTip {
            name: RefName::new(name).unwrap(),
            target: oid(target),
        }
    }

    fn prepared(graph: &mut MemoryGraph) -> GraphLoader<'_> {
        let mut loader = GraphLoader::new(graph, RepoId::new("widgets").unwrap(), 2);
        loader.ensure_constraints().unwrap();
        loader.merge_repository(Path::new("/srv/widgets")).unwrap();
        loader
    }

    #[test]
    fn constraints_created() {
        let mut graph = MemoryGraph::new();
        prepared(&mut graph);
        for (label, property) in CONSTRAINTS {
            assert!(graph.has_constraint(label, property));
        }
    }

    #[test]
    fn load_rows_in_chunks() {
        let mut graph = MemoryGraph::new();
        let rows: Vec<CommitRow> = ['a', 'b', 'c', 'd', 'e']
            .iter()
            .map(|c| CommitRow::from_record(&record(*c, &[])))
            .collect();
        let sent = prepared(&mut graph).load_rows(&rows).unwrap();

        assert_eq!(sent, 5);
        assert_eq!(graph.count_executed(StatementKind::MergeCommits), 3);
        assert_eq!(graph.commits_of("widgets").len(), 5);
    }

    #[test]
    fn known_after_load() {
        let mut graph = MemoryGraph::new();
        let mut loader = prepared(&mut graph);
        assert!(!loader.is_known(&oid('b')).unwrap());
        loader.load_commit(&record('b', &['a'])).unwrap();
        assert!(loader.is_known(&oid('b')).unwrap());
        assert!(!loader.is_known(&oid('a')).unwrap());
    }

    #[test]
    fn refresh_skips_unknown_and_non_remote() {
        let mut graph = MemoryGraph::new();
        let mut loader = prepared(&mut graph);
        loader.load_commit(&record('a', &[])).unwrap();

        let created = loader
            .refresh_branches(&[
                tip("refs/remotes/origin/main", 'a'),
                tip("refs/remotes/origin/ghost", 'f'),
                tip("refs/heads/local", 'a'),
            ])
            .unwrap();
        assert_eq!(created, 1);

        let branches = graph.branches("widgets");
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].name, "main");
        assert_eq!(branches[0].remote, "origin");
    }

    #[test]
    fn refresh_replaces_previous_branches() {
        let mut graph = MemoryGraph::new();
        let mut loader = prepared(&mut graph);
        loader.load_commit(&record('a', &[])).unwrap();
        loader.load_commit(&record('b', &['a'])).unwrap();

        loader
            .refresh_branches(&[tip("refs/remotes/origin/main", 'a')])
            .unwrap();
        loader
            .refresh_branches(&[tip("refs/remotes/origin/main", 'b')])
            .unwrap();

        let branches = graph.branches("widgets");
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].target, "b".repeat(40));
    }

    #[test]
    fn load_batch_file_uses_file_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.csv");
        let mut writer = crate::export::BatchWriter::create(&path).unwrap();
        writer
            .write_row(&CommitRow::from_record(&record('a', &[])))
            .unwrap();
        writer.finish().unwrap();

        let mut graph = MemoryGraph::new();
        prepared(&mut graph).load_batch_file(&path).unwrap();
        assert!(graph.commit(&"a".repeat(40)).is_some());
    }

    #[test]
    fn malformed_count_is_decode_error() {
        assert!(matches!(count_column(&[], "count"), Err(SinkError::Decode(_))));
    }
}
