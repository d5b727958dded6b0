//! core
//!
//! Domain types shared by every other layer.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Oid, RefName, BranchName, RepoId
//! - [`commit`] - The normalized commit record
//! - [`config`] - Configuration schema and loading
//! - [`paths`] - Transfer batch file locations
//! - [`lock`] - Per-repository sync lock
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - No I/O against git or the graph happens here

pub mod commit;
pub mod config;
pub mod lock;
pub mod paths;
pub mod types;
