//! Storage Layer - SQLite-backed persistence
//!
//! A single SQLite file holds every schema, two tables apiece:
//! - `<schema>_nodes(id, body)`
//! - `<schema>_edges(source, source_schema, target, target_schema, properties)`

pub mod schema;
pub mod sqlite;

pub use sqlite::{SqliteStore, RawRow};
