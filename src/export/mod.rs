//! export
//!
//! Bulk exporter: a complete commit walk written as a transfer batch.
//!
//! # Contract
//!
//! - One row per commit, in walk order
//! - The header is written exactly once
//! - Any failure (walk or write) is fatal: the partially written file is
//!   removed so it can never be loaded
//!
//! # Example
//!
//! ```
//! use git2graph::export::{export_walk, BatchReader};
//! use git2graph::git::mock::MockSource;
//! use git2graph::git::{CommitSource, WalkOrder};
//!
//! let source = MockSource::new("/srv/widgets");
//! source.commit("A", &[], 1);
//! let b = source.commit("B", &["A"], 2);
//!
//! let dir = tempfile::tempdir().unwrap();
//! let path = dir.path().join("widgets.csv");
//! let summary = export_walk(source.walk(&[b], WalkOrder::Time).unwrap(), &path).unwrap();
//!
//! assert_eq!(summary.rows, 2);
//! assert_eq!(BatchReader::read(&path).unwrap().len(), 2);
//! ```

mod codec;
mod row;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::git::{CommitWalk, GitError};

pub use codec::{BatchReader, BatchWriter};
pub use row::{CommitRow, COLUMNS};

/// Errors from producing or reading a transfer batch.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Reading or writing the batch file failed.
    #[error("batch file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A batch row could not be parsed.
    #[error("malformed batch at line {line}: {message}")]
    Malformed { line: usize, message: String },

    /// The first row is not the expected header.
    #[error("unexpected batch header: {found}")]
    HeaderMismatch { found: String },

    /// The commit walk feeding the export failed.
    #[error(transparent)]
    Source(#[from] GitError),
}

impl ExportError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        ExportError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result of a completed export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// The batch file written.
    pub path: PathBuf,
    /// Commit rows written.
    pub rows: usize,
}

/// Write every commit of `walk` to a fresh batch at `path`.
///
/// Creates the parent directory if needed and overwrites any previous
/// batch at the same path.
pub fn export_walk(walk: CommitWalk<'_>, path: &Path) -> Result<ExportSummary, ExportError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ExportError::io(parent, e))?;
    }

    debug!(path = %path.display(), "exporting commit batch");
    match write_batch(walk, path) {
        Ok(rows) => {
            info!(path = %path.display(), rows, "exported commit batch");
            Ok(ExportSummary {
                path: path.to_path_buf(),
                rows,
            })
        }
        Err(err) => {
            let _ = std::fs::remove_file(path);
            Err(err)
        }
    }
}

fn write_batch(walk: CommitWalk<'_>, path: &Path) -> Result<usize, ExportError> {
    let mut writer = BatchWriter::create(path)?;
    for record in walk {
        writer.write_row(&CommitRow::from_record(&record?))?;
    }
    let rows = writer.rows();
    writer.finish()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::mock::{FailOn, MockSource};
    use crate::git::{CommitSource, WalkOrder};

    fn linear() -> MockSource {
        let source = MockSource::new("/repo");
        source.commit("A", &[], 1);
        source.commit("B", &["A"], 2);
        source.commit("C", &["B"], 3);
        source
    }

    #[test]
    fn exports_in_walk_order() {
        let source = linear();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.csv");

        let walk = source.walk(&[MockSource::oid("C")], WalkOrder::Time).unwrap();
        let summary = export_walk(walk, &path).unwrap();
        assert_eq!(summary.rows, 3);

        let rows = BatchReader::read(&path).unwrap();
        let hashes: Vec<String> = rows.iter().map(|r| r.hash.clone()).collect();
        let expected: Vec<String> = ["C", "B", "A"]
            .iter()
            .map(|l| MockSource::oid(l).to_string())
            .collect();
        assert_eq!(hashes, expected);
        assert_eq!(rows[2].parents, "");
        assert_eq!(rows[0].parents, MockSource::oid("B").to_string());
    }

    #[test]
    fn rerun_overwrites_batch() {
        let source = linear();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        for _ in 0..2 {
            let walk = source.walk(&[MockSource::oid("C")], WalkOrder::Time).unwrap();
            export_walk(walk, &path).unwrap();
        }
        assert_eq!(BatchReader::read(&path).unwrap().len(), 3);
    }

    #[test]
    fn walk_failure_removes_partial_batch() {
        let source = linear();
        source.fail_on(FailOn::CorruptAt(MockSource::oid("A")));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let walk = source.walk(&[MockSource::oid("C")], WalkOrder::Time).unwrap();
        let err = export_walk(walk, &path).unwrap_err();
        assert!(matches!(err, ExportError::Source(GitError::CorruptCommit { .. })));
        assert!(!path.exists());
    }
}
