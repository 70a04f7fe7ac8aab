//! # Ein - Graph data on a single SQLite file
//!
//! Ein layers a small graph model over SQLite:
//! - Schemas: named partitions, each backed by a `<schema>_nodes` and a `<schema>_edges` table
//! - Nodes: schema-scoped ids carrying an opaque JSON body
//! - Edges: directed links between nodes, possibly across schemas, unique per
//!   `(source, target, properties)` with replace-on-conflict semantics
//! - A single [`Graph`] facade that owns the connection and enforces the invariants

pub mod schema;
pub mod storage;
pub mod catalog;
pub mod node;
pub mod edge;
pub mod graph;
pub mod config;
pub mod output;
pub mod ui;


// Re-exports for convenient access
pub use schema::SchemaName;
pub use catalog::SchemaCatalog;
pub use node::{Node, NodeStore, NodeFilter, MatchOperator};
pub use edge::{Edge, EdgeStore, EdgeScan, EdgeFilter};
pub use graph::{Graph, GraphStats, SchemaStats};
pub use config::GraphConfig;
pub use storage::{SqliteStore, RawRow};

use std::path::PathBuf;
use rusqlite::ErrorCode;

/// Result type alias for Ein operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Ein operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid schema name: {0:?}")]
    InvalidSchemaName(String),

    #[error("Unknown schema: {0}")]
    UnknownSchema(String),

    #[error("Duplicate node id {id:?} in schema {schema}")]
    DuplicateNodeId { schema: String, id: String },

    #[error("Node not found: {id:?} in schema {schema}")]
    NodeNotFound { schema: String, id: String },

    #[error("Dangling reference: node {id:?} does not exist in schema {schema}")]
    DanglingReference { schema: String, id: String },

    #[error("Edge not found in schema {schema}: {from:?} -> {to:?}")]
    EdgeNotFound { schema: String, from: String, to: String },

    #[error("Node {id:?} in schema {schema} is still referenced by {edges} edge(s)")]
    NodeReferenced { schema: String, id: String, edges: usize },

    #[error("Storage busy: {0}")]
    StorageBusy(String),

    #[error("Storage unavailable at {}: {reason}", path.display())]
    StorageUnavailable { path: PathBuf, reason: String },

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(rusqlite::Error),
}

impl Error {
    /// Whether a caller may reasonably retry the same call later
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::StorageBusy(_))
    }
}

/// Engine failures are classified here so no raw constraint or lock message
/// reaches a caller untyped.
impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, msg) => {
                let text = msg.clone().unwrap_or_else(|| failure.to_string());
                match failure.code {
                    ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => Error::StorageBusy(text),
                    ErrorCode::ConstraintViolation => Error::ConstraintViolation(text),
                    _ => Error::Storage(err),
                }
            }
            _ => Error::Storage(err),
        }
    }
}

/// Check whether an engine error is a constraint failure (PRIMARY KEY, UNIQUE, ...)
pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _) if failure.code == ErrorCode::ConstraintViolation
    )
}
