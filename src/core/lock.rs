//! core::lock
//!
//! Exclusive per-repository sync lock.
//!
//! Two synchronizers writing the same repository are not coordinated
//! with each other (the known-commit check and the following load are
//! separate statements), so a sync holds this lock for its whole run.
//!
//! # Invariants
//!
//! - Lock is held for the entire sync or export
//! - Lock is released on drop, on every exit path
//! - Acquisition is non-blocking (fails fast if locked)
//!
//! # Example
//!
//! ```ignore
//! use git2graph::core::lock::SyncLock;
//!
//! let lock = SyncLock::acquire(&paths)?;
//! // ... sync ...
//! drop(lock);
//! ```

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

use super::paths::BatchPaths;

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another process already holds the lock.
    #[error("repository is being synchronized by another process")]
    AlreadyLocked,

    /// Failed to create lock file or directory.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),
}

/// An exclusive lock on one repository's sync.
#[derive(Debug)]
pub struct SyncLock {
    path: PathBuf,
    file: Option<File>,
}

impl SyncLock {
    /// Attempt to acquire the lock for the repository behind `paths`.
    ///
    /// Creates the batch directory if needed.
    ///
    /// # Errors
    ///
    /// - [`LockError::AlreadyLocked`] if another process holds the lock
    /// - [`LockError::CreateFailed`] if the lock file cannot be created
    /// - [`LockError::AcquireFailed`] if the OS lock cannot be acquired
    pub fn acquire(paths: &BatchPaths) -> Result<Self, LockError> {
        fs::create_dir_all(&paths.batch_dir).map_err(|e| {
            LockError::CreateFailed(format!(
                "cannot create {}: {}",
                paths.batch_dir.display(),
                e
            ))
        })?;

        let path = paths.lock_file();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                LockError::CreateFailed(format!("cannot open {}: {}", path.display(), e))
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Self {
                path,
                file: Some(file),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Err(LockError::AlreadyLocked),
            Err(e) => Err(LockError::AcquireFailed(e.to_string())),
        }
    }

    /// Whether this guard still holds the lock.
    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SyncLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = FileExt::unlock(&file);
        }
    }
}
