//! git
//!
//! Single interface for reading repository history.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to Git. Everything the rest of the
//! crate knows about a repository comes through [`CommitSource`]. No other
//! module imports `git2`.
//!
//! # Responsibilities
//!
//! - Opening a repository (bare or with a working tree)
//! - Listing remote-tracking reference tips
//! - Lazy, stoppable commit walks in a chosen order
//! - Fetching every remote with pruning and automatic tags
//!
//! # Invariants
//!
//! - Reference iteration failures surface as errors, never as empty lists
//! - A commit with a zero hash is reported as corrupt, never yielded
//! - All operations return strong types (Oid, RefName, BranchName)
//!
//! # Example
//!
//! ```ignore
//! use git2graph::git::{CommitSource, Git, WalkControl, WalkOrder};
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let tips: Vec<_> = git.reference_tips()?.into_iter().map(|t| t.target).collect();
//!
//! let outcome = git.walk(&tips, WalkOrder::Time)?.visit(|commit| {
//!     println!("{} {}", commit.hash.short(7), commit.message.lines().next().unwrap_or(""));
//!     Ok::<_, git2graph::git::GitError>(WalkControl::Continue)
//! })?;
//! ```

mod interface;
pub mod mock;
mod source;
mod walk;

pub use interface::{Git, GitError};
pub use source::{CommitSource, ReferenceTip};
pub use walk::{CommitWalk, WalkControl, WalkOrder, WalkOutcome};
