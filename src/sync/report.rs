//! sync::report
//!
//! What a synchronization pass did.

use std::path::PathBuf;

use crate::core::types::{Oid, RefName};

/// Which kind of pass ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    Full,
    Incremental,
}

/// How an incremental walk of one tip ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TipOutcome {
    /// Reached `frontier`, a commit already in the graph.
    FoundKnown { frontier: Oid },
    /// Reached the root without finding a known commit.
    Exhausted,
}

/// Result for one reference tip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TipReport {
    pub reference: RefName,
    pub outcome: TipOutcome,
    /// Commits loaded while walking this tip.
    pub loaded: usize,
}

/// Summary of one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub mode: SyncMode,
    /// Per-tip outcomes. Empty for a full sync.
    pub tips: Vec<TipReport>,
    /// Commit rows applied to the graph.
    pub commits_loaded: usize,
    /// Branch nodes created by the final refresh.
    pub branches_refreshed: usize,
    /// The transfer batch used by a full sync.
    pub batch: Option<PathBuf>,
}

impl SyncReport {
    pub(crate) fn new(mode: SyncMode) -> Self {
        Self {
            mode,
            tips: Vec::new(),
            commits_loaded: 0,
            branches_refreshed: 0,
            batch: None,
        }
    }

    /// Whether the pass changed no commits.
    pub fn is_up_to_date(&self) -> bool {
        self.commits_loaded == 0
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        let commits = match self.commits_loaded {
            1 => "1 commit".to_string(),
            n => format!("{n} commits"),
        };
        let branches = match self.branches_refreshed {
            1 => "1 branch".to_string(),
            n => format!("{n} branches"),
        };
        match self.mode {
            SyncMode::Full => format!("Loaded {commits}, refreshed {branches}"),
            SyncMode::Incremental if self.is_up_to_date() => {
                format!("Already up to date, refreshed {branches}")
            }
            SyncMode::Incremental => format!("Added {commits}, refreshed {branches}"),
        }
    }
}
