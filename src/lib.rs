//! git2graph - Synchronize git commit history into a property graph
//!
//! git2graph walks a repository's commit history and materializes it as
//! a property graph (repository, commits, authors, branches and parent
//! links), either as a full load or as an incremental resync that only
//! appends commits the graph has not seen.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to sync)
//! - [`sync`] - Full and incremental synchronization
//! - [`export`] - Transfer batch format and bulk exporter
//! - [`graph`] - Graph sink abstraction, Neo4j HTTP sink and loader
//! - [`git`] - Single interface for reading repository history
//! - [`credentials`] - Transport credentials for fetching
//! - [`core`] - Domain types, commit records, configuration, paths, locking
//! - [`ui`] - User-facing output
//!
//! # Correctness Invariants
//!
//! 1. Every graph write is a merge keyed by a unique property
//! 2. A commit's content is written once and never overwritten
//! 3. Commits and authors are never deleted; branch nodes are rebuilt wholesale
//! 4. Any source, transport, sink or batch failure aborts the run

pub mod cli;
pub mod core;
pub mod credentials;
pub mod export;
pub mod git;
pub mod graph;
pub mod sync;
pub mod ui;
