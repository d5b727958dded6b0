//! core::paths
//!
//! Location of per-repository transfer batch files.
//!
//! # Layout
//!
//! Each repository gets one batch file under the configured batch
//! directory, named after the repository's canonical on-disk path with
//! path separators replaced by `_`:
//!
//! - `<batch_dir>/<flattened-path>.csv` - the transfer batch
//! - `<batch_dir>/<flattened-path>.csv.lock` - the sync lock
//!
//! The name is deterministic, so repeated runs overwrite the same file
//! instead of accumulating new ones.
//!
//! # Example
//!
//! ```
//! use git2graph::core::paths::BatchPaths;
//! use std::path::{Path, PathBuf};
//!
//! let paths = BatchPaths::new(Path::new("/tmp/g2g"), Path::new("/srv/git/widgets.git"));
//! assert_eq!(
//!     paths.batch_file(),
//!     PathBuf::from("/tmp/g2g/_srv_git_widgets.git.csv")
//! );
//! ```

use std::path::{Path, PathBuf};

/// Paths derived from a batch directory and a repository path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPaths {
    /// Directory holding batch files.
    pub batch_dir: PathBuf,
    /// File stem derived from the repository path.
    stem: String,
}

impl BatchPaths {
    /// Derive batch paths for the repository at `repo_path`.
    pub fn new(batch_dir: &Path, repo_path: &Path) -> Self {
        Self {
            batch_dir: batch_dir.to_path_buf(),
            stem: flatten(repo_path),
        }
    }

    /// The transfer batch file.
    pub fn batch_file(&self) -> PathBuf {
        self.batch_dir.join(format!("{}.csv", self.stem))
    }

    /// The lock file guarding a sync of this repository.
    pub fn lock_file(&self) -> PathBuf {
        self.batch_dir.join(format!("{}.csv.lock", self.stem))
    }
}

/// Replace path separators so a path becomes a single file name.
fn flatten(path: &Path) -> String {
    path.to_string_lossy()
        .trim_end_matches(['/', '\\'])
        .replace(['/', '\\'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separators_replaced() {
        let paths = BatchPaths::new(Path::new("/b"), Path::new("/home/u/repo/.git"));
        assert_eq!(paths.batch_file(), PathBuf::from("/b/_home_u_repo_.git.csv"));
    }

    #[test]
    fn trailing_separator_ignored() {
        let a = BatchPaths::new(Path::new("/b"), Path::new("/srv/repo/"));
        let b = BatchPaths::new(Path::new("/b"), Path::new("/srv/repo"));
        assert_eq!(a.batch_file(), b.batch_file());
    }

    #[test]
    fn deterministic_per_repository() {
        let a = BatchPaths::new(Path::new("/b"), Path::new("/srv/one"));
        let b = BatchPaths::new(Path::new("/b"), Path::new("/srv/two"));
        assert_eq!(a, BatchPaths::new(Path::new("/b"), Path::new("/srv/one")));
        assert_ne!(a.batch_file(), b.batch_file());
    }

    #[test]
    fn lock_sits_next_to_batch() {
        let paths = BatchPaths::new(Path::new("/b"), Path::new("/r"));
        assert_eq!(paths.lock_file(), PathBuf::from("/b/_r.csv.lock"));
    }
}
