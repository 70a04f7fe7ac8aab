//! Graph - the single entry point
//!
//! Owns the storage connection and the schema catalog, and hands out node and
//! edge stores that borrow them. Every mutating call is committed before it
//! returns; there is no buffering and no transaction spans two calls.

use std::path::Path;
use rusqlite::Params;
use serde::Serialize;
use serde_json::Value;
use crate::catalog::{self, SchemaCatalog};
use crate::config::GraphConfig;
use crate::edge::{Edge, EdgeFilter, EdgeScan, EdgeStore};
use crate::node::{Node, NodeFilter, NodeStore};
use crate::schema::SchemaName;
use crate::storage::{RawRow, SqliteStore};
use crate::Result;

/// A graph stored in one SQLite file.
///
/// Not safe for concurrent use from several threads; the connection is the
/// single point of mutual exclusion. Other processes may open the same file,
/// in which case lock contention surfaces as `Error::StorageBusy`.
pub struct Graph {
    store: SqliteStore,
    catalog: SchemaCatalog,
    config: GraphConfig,
}

impl Graph {
    /// Open or create the graph file at `path` and discover its schemas
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, GraphConfig::default())
    }

    pub fn open_with_config(path: impl AsRef<Path>, config: GraphConfig) -> Result<Self> {
        let store = SqliteStore::open(path.as_ref(), &config)?;
        Self::from_store(store, config)
    }

    /// Open an in-memory graph (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let config = GraphConfig::default();
        let store = SqliteStore::open_in_memory(&config)?;
        Self::from_store(store, config)
    }

    fn from_store(store: SqliteStore, config: GraphConfig) -> Result<Self> {
        let catalog = SchemaCatalog::discover(&store)?;
        Ok(Self { store, catalog, config })
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    pub fn nodes(&self) -> NodeStore<'_> {
        NodeStore::new(&self.store, &self.catalog, &self.config)
    }

    pub fn edges(&self) -> EdgeStore<'_> {
        EdgeStore::new(&self.store, &self.catalog, &self.config)
    }

    // ========== Schemas ==========

    /// Create a schema (idempotent) and add it to the known set
    pub fn add_schema(&mut self, name: &str) -> Result<SchemaName> {
        self.catalog.ensure_schema(&self.store, name)
    }

    /// Whether a schema is known to this graph
    pub fn has_schema(&self, name: &str) -> bool {
        self.catalog.schema_exists(name)
    }

    /// Known schemas, as discovered at open time plus those added since
    pub fn schemas(&self) -> Vec<SchemaName> {
        self.catalog.schemas().cloned().collect()
    }

    /// Scan the storage file for schemas whose table names contain `fragment`.
    ///
    /// Reads the file's current state; the known set is left untouched.
    pub fn find_schemas(&self, fragment: &str) -> Result<Vec<SchemaName>> {
        Ok(catalog::discover_schemas(&self.store, Some(fragment))?.into_iter().collect())
    }

    // ========== Nodes ==========

    /// Insert a node into a schema
    pub fn add_node(&self, schema: &str, id: &str, body: Value) -> Result<Node> {
        let node = Node::new(self.catalog.require(schema)?.clone(), id, body);
        self.nodes().insert(&node)?;
        Ok(node)
    }

    /// Insert several `(id, body)` pairs into a schema, all or nothing
    pub fn add_nodes<I, S>(&self, schema: &str, nodes: I) -> Result<Vec<Node>>
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        let schema = self.catalog.require(schema)?;
        let nodes: Vec<Node> = nodes
            .into_iter()
            .map(|(id, body)| Node::new(schema.clone(), id, body))
            .collect();
        self.nodes().insert_many(&nodes)?;
        Ok(nodes)
    }

    pub fn get_node(&self, schema: &str, id: &str) -> Result<Node> {
        self.nodes().get(schema, id)
    }

    /// Replace a node's body; fails with `NodeNotFound` if absent
    pub fn update_node(&self, schema: &str, id: &str, body: Value) -> Result<Node> {
        let node = Node::new(self.catalog.require(schema)?.clone(), id, body);
        self.nodes().update(&node)?;
        Ok(node)
    }

    /// Delete a node (idempotent), applying the configured cascade policy
    pub fn delete_node(&self, schema: &str, id: &str) -> Result<bool> {
        self.nodes().delete(schema, id)
    }

    pub fn delete_nodes<S: AsRef<str>>(&self, schema: &str, ids: &[S]) -> Result<usize> {
        self.nodes().delete_many(schema, ids)
    }

    pub fn all_nodes(&self, schema: &str) -> Result<Vec<Node>> {
        self.nodes().all(schema)
    }

    pub fn find_nodes(&self, schema: &str, filter: &NodeFilter) -> Result<Vec<Node>> {
        self.nodes().find(schema, filter)
    }

    // ========== Edges ==========

    /// Link two nodes with an edge stored under `schema`.
    ///
    /// Endpoint schemas come from the nodes. A repeated
    /// `(source, target, properties)` replaces the stored edge.
    pub fn add_edge(&self, schema: &str, source: &Node, target: &Node, properties: Option<Value>) -> Result<Edge> {
        let edge = Edge::between(self.catalog.require(schema)?.clone(), source, target, properties);
        self.edges().insert(&edge)?;
        Ok(edge)
    }

    pub fn add_edges(&self, edges: &[Edge]) -> Result<usize> {
        self.edges().insert_many(edges)
    }

    pub fn get_edge(&self, schema: &str, source: &str, target: &str) -> Result<Edge> {
        self.edges().get(schema, source, target)
    }

    pub fn update_edge(&self, schema: &str, source: &str, target: &str, properties: Option<Value>) -> Result<Edge> {
        self.edges().update(schema, source, target, properties)
    }

    /// Lazily list edges leaving `source`
    pub fn edges_from(&self, schema: &str, source: &str) -> Result<EdgeScan<'_>> {
        self.edges().scan_by_source(schema, source)
    }

    /// Lazily list edges arriving at `target`
    pub fn edges_to(&self, schema: &str, target: &str) -> Result<EdgeScan<'_>> {
        self.edges().scan_by_target(schema, target)
    }

    pub fn all_edges(&self, schema: &str) -> Result<EdgeScan<'_>> {
        self.edges().scan_all(schema)
    }

    pub fn find_edges(&self, schema: &str, filter: &EdgeFilter) -> Result<Vec<Edge>> {
        self.edges().find(schema, filter)
    }

    /// Delete the edge(s) from `source` to `target` (idempotent)
    pub fn delete_edge(&self, schema: &str, source: &str, target: &str) -> Result<usize> {
        self.edges().delete(schema, source, target)
    }

    pub fn delete_edges_touching(&self, schema: &str, node_id: &str) -> Result<usize> {
        self.edges().delete_touching(schema, node_id)
    }

    // ========== Raw Passthrough ==========

    /// Run an arbitrary statement against the storage file.
    ///
    /// No graph invariant is checked here: schema validation, endpoint checks,
    /// and the cascade policy are all bypassed, and the known-schema set is not
    /// updated.
    pub fn execute_raw<P: Params>(&self, sql: &str, params: P) -> Result<Vec<RawRow>> {
        self.store.query(sql, params)
    }

    /// Run several arbitrary statements in one transaction. No invariants enforced.
    pub fn execute_raw_many<S: AsRef<str>>(&self, statements: &[S]) -> Result<()> {
        self.store.execute_many(statements)
    }

    // ========== Statistics ==========

    pub fn stats(&self) -> Result<GraphStats> {
        let nodes = self.nodes();
        let edges = self.edges();
        let schemas = self
            .catalog
            .schemas()
            .map(|schema| {
                Ok(SchemaStats {
                    name: schema.to_string(),
                    nodes: nodes.count(schema.as_str())?,
                    edges: edges.count(schema.as_str())?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(GraphStats { schemas })
    }
}

/// Row counts for one schema
#[derive(Debug, Clone, Serialize)]
pub struct SchemaStats {
    pub name: String,
    pub nodes: usize,
    pub edges: usize,
}

/// Graph statistics
#[derive(Debug, Clone, Serialize)]
pub struct GraphStats {
    pub schemas: Vec<SchemaStats>,
}

impl GraphStats {
    pub fn total_nodes(&self) -> usize {
        self.schemas.iter().map(|s| s.nodes).sum()
    }

    pub fn total_edges(&self) -> usize {
        self.schemas.iter().map(|s| s.edges).sum()
    }
}

impl std::fmt::Display for GraphStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Graph Statistics:")?;
        writeln!(f, "  Schemas: {}", self.schemas.len())?;
        for schema in &self.schemas {
            writeln!(f, "    {}: {} nodes, {} edges", schema.name, schema.nodes, schema.edges)?;
        }
        writeln!(f, "  Nodes: {}", self.total_nodes())?;
        write!(f, "  Edges: {}", self.total_edges())
    }
}
