//! graph
//!
//! The graph sink and the loader that drives it.
//!
//! # Architecture
//!
//! [`GraphSink`] is the seam to the graph store: it runs typed
//! [`Statement`]s and returns rows. Two sinks exist:
//!
//! - [`HttpGraphSink`] - a Neo4j server over its transactional HTTP API
//! - [`MemoryGraph`] - an in-memory property graph with the same merge
//!   semantics, for tests and dry runs
//!
//! [`GraphLoader`] owns the graph vocabulary (labels, relationships,
//! constraint set) and is the only caller of the sink during a sync.
//!
//! # Invariants
//!
//! - Every write is a merge keyed by a unique property, so replaying any
//!   statement is safe
//! - Commit content is set once and never overwritten
//! - Nothing here deletes a Commit or Author node

mod http;
mod loader;
mod memory;
mod statement;

use serde_json::{Map, Value};
use thiserror::Error;

pub use http::HttpGraphSink;
pub use loader::{GraphLoader, CONSTRAINTS};
pub use memory::{BranchNode, CommitNode, GraphState, MemoryGraph, Relationship, RepositoryNode};
pub use statement::{Statement, StatementKind};

/// One result row, keyed by column name.
pub type Row = Map<String, Value>;

/// Errors from a graph sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The graph server could not be reached.
    #[error("cannot reach graph at {url}: {message}")]
    Connection { url: String, message: String },

    /// The server rejected or failed the query.
    #[error("graph query failed ({code}): {message}")]
    Query { code: String, message: String },

    /// Unexpected HTTP status.
    #[error("graph server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The response did not have the expected shape.
    #[error("cannot decode graph response: {0}")]
    Decode(String),

    /// A constraint could not be expressed.
    #[error("invalid constraint {label}.{property}: {message}")]
    Constraint {
        label: String,
        property: String,
        message: String,
    },
}

/// A graph store that runs statements.
///
/// Calls block until the store answers. Sinks do not retry.
pub trait GraphSink {
    /// Ensure a uniqueness constraint on `label.property` exists.
    ///
    /// Safe to repeat.
    fn ensure_constraint(&mut self, label: &str, property: &str) -> Result<(), SinkError> {
        self.run(&Statement::constraint(label, property)?).map(|_| ())
    }

    /// Run one statement and return its rows.
    fn run(&mut self, statement: &Statement) -> Result<Vec<Row>, SinkError>;
}

impl<S: GraphSink + ?Sized> GraphSink for &mut S {
    fn ensure_constraint(&mut self, label: &str, property: &str) -> Result<(), SinkError> {
        (**self).ensure_constraint(label, property)
    }

    fn run(&mut self, statement: &Statement) -> Result<Vec<Row>, SinkError> {
        (**self).run(statement)
    }
}

impl<S: GraphSink + ?Sized> GraphSink for Box<S> {
    fn ensure_constraint(&mut self, label: &str, property: &str) -> Result<(), SinkError> {
        (**self).ensure_constraint(label, property)
    }

    fn run(&mut self, statement: &Statement) -> Result<Vec<Row>, SinkError> {
        (**self).run(statement)
    }
}
