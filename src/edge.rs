//! Edges - directed relationships between nodes
//!
//! An edge lives in the edge table of its home schema. Each endpoint carries the
//! schema of the node it points at, copied from the `Node` the edge was built
//! from, so an endpoint can sit in any schema's node table.
//!
//! `(source, target, properties)` is unique per edge table. Inserting the same
//! triple again replaces the stored row: re-declaring an edge is not an error.

use std::collections::VecDeque;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::catalog::SchemaCatalog;
use crate::config::GraphConfig;
use crate::node::{node_exists, Node};
use crate::schema::SchemaName;
use crate::storage::SqliteStore;
use crate::{Error, Result};

const EDGE_COLUMNS: &str = "source, source_schema, target, target_schema, properties";

/// A directed edge. A plain value: it holds no connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    schema: SchemaName,
    source: String,
    source_schema: SchemaName,
    target: String,
    target_schema: SchemaName,
    properties: Option<Value>,
}

impl Edge {
    /// Build an edge stored under `schema`, linking two nodes.
    ///
    /// Endpoint schemas are taken from the nodes themselves.
    pub fn between(schema: SchemaName, source: &Node, target: &Node, properties: Option<Value>) -> Self {
        Self {
            schema,
            source: source.id().to_string(),
            source_schema: source.schema().clone(),
            target: target.id().to_string(),
            target_schema: target.schema().clone(),
            properties: properties.filter(|p| !p.is_null()),
        }
    }

    /// Home schema: the edge table this edge lives in
    pub fn schema(&self) -> &SchemaName {
        &self.schema
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn source_schema(&self) -> &SchemaName {
        &self.source_schema
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn target_schema(&self) -> &SchemaName {
        &self.target_schema
    }

    pub fn properties(&self) -> Option<&Value> {
        self.properties.as_ref()
    }

    /// Whether either endpoint lives outside the home schema
    pub fn is_cross_schema(&self) -> bool {
        self.source_schema != self.schema || self.target_schema != self.schema
    }

    /// Check whether this edge touches a node
    pub fn touches(&self, node: &Node) -> bool {
        (self.source == node.id() && &self.source_schema == node.schema())
            || (self.target == node.id() && &self.target_schema == node.schema())
    }
}

/// Any-of lookup over one schema's edges
#[derive(Debug, Clone, Default)]
pub struct EdgeFilter {
    pub source: Option<String>,
    pub target: Option<String>,
    pub properties: Option<Value>,
}

impl EdgeFilter {
    fn to_sql(&self) -> Result<Option<(String, Vec<String>)>> {
        let mut clauses = Vec::new();
        let mut params = Vec::new();

        if let Some(source) = &self.source {
            params.push(source.clone());
            clauses.push(format!("source = ?{}", params.len()));
        }
        if let Some(target) = &self.target {
            params.push(target.clone());
            clauses.push(format!("target = ?{}", params.len()));
        }
        if let Some(properties) = &self.properties {
            params.push(serialize_properties(Some(properties))?);
            clauses.push(format!("properties = ?{}", params.len()));
        }

        if clauses.is_empty() {
            return Ok(None);
        }
        Ok(Some((clauses.join(" OR "), params)))
    }
}

/// CRUD on edges, scoped to the edge's home schema
pub struct EdgeStore<'a> {
    store: &'a SqliteStore,
    catalog: &'a SchemaCatalog,
    config: &'a GraphConfig,
}

impl<'a> EdgeStore<'a> {
    pub fn new(store: &'a SqliteStore, catalog: &'a SchemaCatalog, config: &'a GraphConfig) -> Self {
        Self { store, catalog, config }
    }

    /// Insert an edge, replacing a stored row with the same `(source, target, properties)`.
    ///
    /// Both endpoints must exist, otherwise `DanglingReference`; nothing is written.
    pub fn insert(&self, edge: &Edge) -> Result<()> {
        let tx = self.store.transaction()?;
        insert_edge(&tx, self.catalog, edge)?;
        tx.commit()?;
        tracing::debug!(
            schema = %edge.schema,
            source = %format!("{}.{}", edge.source_schema, edge.source),
            target = %format!("{}.{}", edge.target_schema, edge.target),
            "Inserted edge"
        );
        Ok(())
    }

    /// Insert several edges in one transaction; nothing is kept if any insert fails
    pub fn insert_many(&self, edges: &[Edge]) -> Result<usize> {
        let tx = self.store.transaction()?;
        for edge in edges {
            insert_edge(&tx, self.catalog, edge)?;
        }
        tx.commit()?;
        tracing::debug!(count = edges.len(), "Inserted edges");
        Ok(edges.len())
    }

    /// Point lookup. With several rows for one pair, the earliest stored one wins.
    pub fn get(&self, schema: &str, source: &str, target: &str) -> Result<Edge> {
        let schema = self.catalog.require(schema)?;
        self.store
            .conn()
            .query_row(
                &format!(
                    "SELECT {EDGE_COLUMNS} FROM {} WHERE source = ?1 AND target = ?2 ORDER BY rowid LIMIT 1",
                    schema.edges_table()
                ),
                [source, target],
                |row| row_to_edge(schema, row, 0),
            )
            .optional()?
            .ok_or_else(|| not_found(schema, source, target))
    }

    /// Replace the properties of the edge(s) between `source` and `target`.
    ///
    /// Modeled as delete + insert in one transaction; endpoint schemas are kept.
    pub fn update(&self, schema: &str, source: &str, target: &str, properties: Option<Value>) -> Result<Edge> {
        let schema = self.catalog.require(schema)?;
        let tx = self.store.transaction()?;

        let existing = tx
            .query_row(
                &format!(
                    "SELECT {EDGE_COLUMNS} FROM {} WHERE source = ?1 AND target = ?2 ORDER BY rowid LIMIT 1",
                    schema.edges_table()
                ),
                [source, target],
                |row| row_to_edge(schema, row, 0),
            )
            .optional()?
            .ok_or_else(|| not_found(schema, source, target))?;

        tx.execute(
            &format!("DELETE FROM {} WHERE source = ?1 AND target = ?2", schema.edges_table()),
            [source, target],
        )?;

        let updated = Edge {
            properties: properties.filter(|p| !p.is_null()),
            ..existing
        };
        write_edge(&tx, &updated)?;
        tx.commit()?;

        tracing::debug!(schema = %schema, source, target, "Updated edge properties");
        Ok(updated)
    }

    /// Lazily scan the edges leaving `source`
    pub fn scan_by_source(&self, schema: &str, source: &str) -> Result<EdgeScan<'a>> {
        let schema = self.catalog.require(schema)?;
        Ok(EdgeScan::new(self.store.conn(), schema.clone(), Some(("source", source.to_string())), self.config.scan_page_size))
    }

    /// Lazily scan the edges arriving at `target`
    pub fn scan_by_target(&self, schema: &str, target: &str) -> Result<EdgeScan<'a>> {
        let schema = self.catalog.require(schema)?;
        Ok(EdgeScan::new(self.store.conn(), schema.clone(), Some(("target", target.to_string())), self.config.scan_page_size))
    }

    /// Lazily scan every edge of a schema
    pub fn scan_all(&self, schema: &str) -> Result<EdgeScan<'a>> {
        let schema = self.catalog.require(schema)?;
        Ok(EdgeScan::new(self.store.conn(), schema.clone(), None, self.config.scan_page_size))
    }

    /// Edges matching any field of an [`EdgeFilter`]; an empty filter matches nothing
    pub fn find(&self, schema: &str, filter: &EdgeFilter) -> Result<Vec<Edge>> {
        let schema = self.catalog.require(schema)?;
        let Some((clause, params)) = filter.to_sql()? else {
            return Ok(Vec::new());
        };

        let mut stmt = self.store.conn().prepare(&format!(
            "SELECT {EDGE_COLUMNS} FROM {} WHERE {clause}",
            schema.edges_table()
        ))?;

        let edges = stmt
            .query_map(params_from_iter(params.iter()), |row| row_to_edge(schema, row, 0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(edges)
    }

    /// Delete every edge from `source` to `target`. Idempotent; returns rows removed.
    pub fn delete(&self, schema: &str, source: &str, target: &str) -> Result<usize> {
        let schema = self.catalog.require(schema)?;
        let removed = self.store.execute(
            &format!("DELETE FROM {} WHERE source = ?1 AND target = ?2", schema.edges_table()),
            [source, target],
        )?;
        tracing::debug!(schema = %schema, source, target, removed, "Deleted edge");
        Ok(removed)
    }

    /// Delete every edge of a schema whose source or target is `node_id`
    pub fn delete_touching(&self, schema: &str, node_id: &str) -> Result<usize> {
        let schema = self.catalog.require(schema)?;
        let removed = self.store.execute(
            &format!("DELETE FROM {} WHERE source = ?1 OR target = ?1", schema.edges_table()),
            [node_id],
        )?;
        tracing::debug!(schema = %schema, node_id, removed, "Deleted edges touching node");
        Ok(removed)
    }

    /// Number of edges in a schema
    pub fn count(&self, schema: &str) -> Result<usize> {
        let schema = self.catalog.require(schema)?;
        self.store.count_rows(&schema.edges_table())
    }
}

/// Lazy, finite, restartable sequence of edges.
///
/// Rows are fetched a page at a time. Callers must not rely on the order.
pub struct EdgeScan<'a> {
    conn: &'a Connection,
    schema: SchemaName,
    sql: String,
    key: Option<String>,
    page_size: usize,
    last_rowid: i64,
    buffer: VecDeque<Edge>,
    done: bool,
}

impl<'a> EdgeScan<'a> {
    fn new(conn: &'a Connection, schema: SchemaName, filter: Option<(&str, String)>, page_size: usize) -> Self {
        let (condition, key) = match filter {
            Some((column, key)) => (format!(" AND {column} = ?3"), Some(key)),
            None => (String::new(), None),
        };
        let sql = format!(
            "SELECT rowid, {EDGE_COLUMNS} FROM {} WHERE rowid > ?1{condition} ORDER BY rowid LIMIT ?2",
            schema.edges_table()
        );

        Self {
            conn,
            schema,
            sql,
            key,
            page_size: page_size.max(1),
            last_rowid: 0,
            buffer: VecDeque::new(),
            done: false,
        }
    }

    /// Start over; the next item re-runs the lookup from the beginning
    pub fn restart(&mut self) {
        self.last_rowid = 0;
        self.buffer.clear();
        self.done = false;
    }

    fn fetch_page(&mut self) -> Result<()> {
        let conn = self.conn;
        let mut values = vec![SqlValue::Integer(self.last_rowid), SqlValue::Integer(self.page_size as i64)];
        if let Some(key) = &self.key {
            values.push(SqlValue::Text(key.clone()));
        }

        let mut stmt = conn.prepare_cached(&self.sql)?;
        let schema = &self.schema;
        let rows = stmt
            .query_map(params_from_iter(values), |row| {
                let rowid: i64 = row.get(0)?;
                Ok((rowid, row_to_edge(schema, row, 1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        if rows.len() < self.page_size {
            self.done = true;
        }
        for (rowid, edge) in rows {
            self.last_rowid = rowid;
            self.buffer.push_back(edge);
        }
        Ok(())
    }
}

impl Iterator for EdgeScan<'_> {
    type Item = Result<Edge>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.done {
            if let Err(e) = self.fetch_page() {
                self.done = true;
                return Some(Err(e));
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}

fn not_found(schema: &SchemaName, source: &str, target: &str) -> Error {
    Error::EdgeNotFound {
        schema: schema.to_string(),
        from: source.to_string(),
        to: target.to_string(),
    }
}

/// Absent properties are stored as the JSON text `null` so that the uniqueness
/// rule still applies to property-less edges.
fn serialize_properties(properties: Option<&Value>) -> Result<String> {
    Ok(serde_json::to_string(&properties)?)
}

/// Validate schemas and endpoints, then write the row with every schema name
/// in its stored spelling
fn insert_edge(conn: &Connection, catalog: &SchemaCatalog, edge: &Edge) -> Result<()> {
    let stored = Edge {
        schema: catalog.require(edge.schema.as_str())?.clone(),
        source_schema: resolve_endpoint(conn, catalog, &edge.source_schema, &edge.source)?,
        target_schema: resolve_endpoint(conn, catalog, &edge.target_schema, &edge.target)?,
        ..edge.clone()
    };
    write_edge(conn, &stored)
}

fn resolve_endpoint(conn: &Connection, catalog: &SchemaCatalog, schema: &SchemaName, id: &str) -> Result<SchemaName> {
    let schema = catalog.require(schema.as_str())?;
    if !node_exists(conn, schema, id)? {
        return Err(Error::DanglingReference {
            schema: schema.to_string(),
            id: id.to_string(),
        });
    }
    Ok(schema.clone())
}

fn write_edge(conn: &Connection, edge: &Edge) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO {} ({EDGE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)",
            edge.schema.edges_table()
        ),
        params![
            edge.source,
            edge.source_schema.as_str(),
            edge.target,
            edge.target_schema.as_str(),
            serialize_properties(edge.properties.as_ref())?,
        ],
    )?;
    Ok(())
}

/// Delete the edges of `home` that reference a node. Endpoint schema names
/// compare without case, as table names do.
pub(crate) fn delete_edges_referencing(conn: &Connection, home: &SchemaName, node_schema: &SchemaName, id: &str) -> Result<usize> {
    let removed = conn.execute(
        &format!(
            "DELETE FROM {} WHERE (source = ?1 AND source_schema = ?2 COLLATE NOCASE) OR (target = ?1 AND target_schema = ?2 COLLATE NOCASE)",
            home.edges_table()
        ),
        params![id, node_schema.as_str()],
    )?;
    Ok(removed)
}

/// Count the edges of `home` that reference a node
pub(crate) fn count_edges_referencing(conn: &Connection, home: &SchemaName, node_schema: &SchemaName, id: &str) -> Result<usize> {
    let count: i64 = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM {} WHERE (source = ?1 AND source_schema = ?2 COLLATE NOCASE) OR (target = ?1 AND target_schema = ?2 COLLATE NOCASE)",
            home.edges_table()
        ),
        params![id, node_schema.as_str()],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

/// Helper to convert a row to an Edge, reading columns from `offset`
fn row_to_edge(schema: &SchemaName, row: &rusqlite::Row, offset: usize) -> rusqlite::Result<Edge> {
    let schema_at = |idx: usize| -> rusqlite::Result<SchemaName> {
        let name: String = row.get(idx)?;
        SchemaName::parse(&name).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
    };

    let properties_str: String = row.get(offset + 4)?;
    let properties: Value = serde_json::from_str(&properties_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(offset + 4, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Edge {
        schema: schema.clone(),
        source: row.get(offset)?,
        source_schema: schema_at(offset + 1)?,
        target: row.get(offset + 2)?,
        target_schema: schema_at(offset + 3)?,
        properties: Some(properties).filter(|p| !p.is_null()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeStore;
    use serde_json::json;

    struct Fixture {
        store: SqliteStore,
        catalog: SchemaCatalog,
        config: GraphConfig,
    }

    impl Fixture {
        fn new(schemas: &[&str], config: GraphConfig) -> Self {
            let store = SqliteStore::open_in_memory(&config).unwrap();
            let mut catalog = SchemaCatalog::default();
            for schema in schemas {
                catalog.ensure_schema(&store, schema).unwrap();
            }
            Self { store, catalog, config }
        }

        fn nodes(&self) -> NodeStore<'_> {
            NodeStore::new(&self.store, &self.catalog, &self.config)
        }

        fn edges(&self) -> EdgeStore<'_> {
            EdgeStore::new(&self.store, &self.catalog, &self.config)
        }

        fn node(&self, schema: &str, id: &str) -> Node {
            let node = Node::in_schema(schema, id, json!({"id": id})).unwrap();
            self.nodes().insert(&node).unwrap();
            node
        }
    }

    fn schema(name: &str) -> SchemaName {
        SchemaName::parse(name).unwrap()
    }

    #[test]
    fn test_edge_crud() {
        let fx = Fixture::new(&["test"], GraphConfig::default());
        let n1 = fx.node("test", "n1");
        let n2 = fx.node("test", "n2");
        let edges = fx.edges();

        let edge = Edge::between(schema("test"), &n1, &n2, Some(json!({"w": 1})));
        edges.insert(&edge).unwrap();

        let retrieved = edges.get("test", "n1", "n2").unwrap();
        assert_eq!(retrieved, edge);
        assert!(!retrieved.is_cross_schema());
        assert!(retrieved.touches(&n1) && retrieved.touches(&n2));

        assert_eq!(edges.delete("test", "n1", "n2").unwrap(), 1);
        assert!(matches!(edges.get("test", "n1", "n2"), Err(Error::EdgeNotFound { .. })));
        assert_eq!(edges.delete("test", "n1", "n2").unwrap(), 0);
    }

    #[test]
    fn test_property_less_edge_is_stored_as_null_text() {
        let fx = Fixture::new(&["test"], GraphConfig::default());
        let n1 = fx.node("test", "n1");
        let n2 = fx.node("test", "n2");
        fx.edges().insert(&Edge::between(schema("test"), &n1, &n2, None)).unwrap();

        let rows = fx.store.query("SELECT * FROM test_edges", []).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["source"], "n1");
        assert_eq!(rows[0]["source_schema"], "test");
        assert_eq!(rows[0]["target"], "n2");
        assert_eq!(rows[0]["target_schema"], "test");
        assert_eq!(rows[0]["properties"], "null");
    }

    #[test]
    fn test_duplicate_triple_replaces() {
        let fx = Fixture::new(&["test"], GraphConfig::default());
        let n1 = fx.node("test", "n1");
        let n2 = fx.node("test", "n2");
        let edges = fx.edges();

        let heavy = Edge::between(schema("test"), &n1, &n2, Some(json!({"w": 1})));
        edges.insert(&heavy).unwrap();
        edges.insert(&heavy).unwrap();
        assert_eq!(edges.count("test").unwrap(), 1);

        let plain = Edge::between(schema("test"), &n1, &n2, None);
        edges.insert(&plain).unwrap();
        edges.insert(&plain).unwrap();
        assert_eq!(edges.count("test").unwrap(), 2);

        edges.insert(&Edge::between(schema("test"), &n1, &n2, Some(json!({"w": 2})))).unwrap();
        assert_eq!(edges.count("test").unwrap(), 3);
    }

    #[test]
    fn test_edges_are_directed() {
        let fx = Fixture::new(&["test"], GraphConfig::default());
        let n1 = fx.node("test", "n1");
        let n2 = fx.node("test", "n2");
        let edges = fx.edges();

        edges.insert(&Edge::between(schema("test"), &n1, &n2, None)).unwrap();
        edges.insert(&Edge::between(schema("test"), &n2, &n1, None)).unwrap();
        assert_eq!(edges.count("test").unwrap(), 2);

        edges.delete("test", "n1", "n2").unwrap();
        assert!(edges.get("test", "n2", "n1").is_ok());
    }

    #[test]
    fn test_dangling_reference_writes_nothing() {
        let fx = Fixture::new(&["test"], GraphConfig::default());
        let n1 = fx.node("test", "n1");
        let ghost = Node::in_schema("test", "ghost", json!({})).unwrap();
        let edges = fx.edges();

        let err = edges.insert(&Edge::between(schema("test"), &n1, &ghost, None)).unwrap_err();
        assert!(matches!(err, Error::DanglingReference { ref id, .. } if id == "ghost"));

        let err = edges.insert(&Edge::between(schema("test"), &ghost, &n1, None)).unwrap_err();
        assert!(matches!(err, Error::DanglingReference { .. }));
        assert_eq!(edges.count("test").unwrap(), 0);
    }

    #[test]
    fn test_unknown_endpoint_schema() {
        let fx = Fixture::new(&["test"], GraphConfig::default());
        let n1 = fx.node("test", "n1");
        let elsewhere = Node::in_schema("elsewhere", "n2", json!({})).unwrap();

        let err = fx.edges().insert(&Edge::between(schema("test"), &n1, &elsewhere, None)).unwrap_err();
        assert!(matches!(err, Error::UnknownSchema(ref s) if s == "elsewhere"));
    }

    #[test]
    fn test_cross_schema_edge() {
        let fx = Fixture::new(&["a", "b"], GraphConfig::default());
        let n1 = fx.node("a", "n1");
        let n2 = fx.node("b", "n2");
        let edges = fx.edges();

        edges.insert(&Edge::between(schema("a"), &n1, &n2, None)).unwrap();

        let edge = edges.get("a", "n1", "n2").unwrap();
        assert_eq!(edge.schema().as_str(), "a");
        assert_eq!(edge.source_schema().as_str(), "a");
        assert_eq!(edge.target_schema().as_str(), "b");
        assert!(edge.is_cross_schema());
        assert_eq!(edges.count("b").unwrap(), 0);
    }

    #[test]
    fn test_update_replaces_properties() {
        let fx = Fixture::new(&["a", "b"], GraphConfig::default());
        let n1 = fx.node("a", "n1");
        let n2 = fx.node("b", "n2");
        let edges = fx.edges();
        edges.insert(&Edge::between(schema("a"), &n1, &n2, None)).unwrap();

        let updated = edges.update("a", "n1", "n2", Some(json!({"find-me": "something"}))).unwrap();
        assert_eq!(updated.properties(), Some(&json!({"find-me": "something"})));
        assert_eq!(updated.target_schema().as_str(), "b");

        let stored = edges.get("a", "n1", "n2").unwrap();
        assert_eq!(stored, updated);
        assert_eq!(edges.count("a").unwrap(), 1);

        let err = edges.update("a", "n2", "n1", None).unwrap_err();
        assert!(matches!(err, Error::EdgeNotFound { .. }));
    }

    #[test]
    fn test_scans_page_and_restart() {
        let config = GraphConfig {
            scan_page_size: 2,
            ..GraphConfig::default()
        };
        let fx = Fixture::new(&["test"], config);
        let hub = fx.node("test", "hub");
        let edges = fx.edges();
        for i in 0..5 {
            let leaf = fx.node("test", &format!("leaf{i}"));
            edges.insert(&Edge::between(schema("test"), &hub, &leaf, None)).unwrap();
            edges.insert(&Edge::between(schema("test"), &leaf, &hub, None)).unwrap();
        }

        let mut outgoing = edges.scan_by_source("test", "hub").unwrap();
        let first: Vec<Edge> = outgoing.by_ref().collect::<Result<_>>().unwrap();
        assert_eq!(first.len(), 5);
        assert!(first.iter().all(|e| e.source() == "hub"));
        assert!(outgoing.next().is_none());

        outgoing.restart();
        assert_eq!(outgoing.count(), 5);

        let incoming: Vec<Edge> = edges.scan_by_target("test", "hub").unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(incoming.len(), 5);
        assert!(incoming.iter().all(|e| e.target() == "hub"));

        assert_eq!(edges.scan_all("test").unwrap().count(), 10);
        assert_eq!(edges.scan_by_source("test", "nobody").unwrap().count(), 0);
    }

    #[test]
    fn test_find_and_delete_touching() {
        let fx = Fixture::new(&["test"], GraphConfig::default());
        let a = fx.node("test", "a");
        let b = fx.node("test", "b");
        let c = fx.node("test", "c");
        let edges = fx.edges();
        edges.insert(&Edge::between(schema("test"), &a, &b, Some(json!({"w": 1})))).unwrap();
        edges.insert(&Edge::between(schema("test"), &b, &c, Some(json!({"w": 2})))).unwrap();
        edges.insert(&Edge::between(schema("test"), &c, &a, None)).unwrap();

        let filter = EdgeFilter {
            source: Some("a".into()),
            properties: Some(json!({"w": 2})),
            ..EdgeFilter::default()
        };
        assert_eq!(edges.find("test", &filter).unwrap().len(), 2);
        assert!(edges.find("test", &EdgeFilter::default()).unwrap().is_empty());

        assert_eq!(edges.delete_touching("test", "a").unwrap(), 2);
        assert_eq!(edges.count("test").unwrap(), 1);
        assert!(edges.get("test", "b", "c").is_ok());
    }

    #[test]
    fn test_insert_many_is_atomic() {
        let fx = Fixture::new(&["test"], GraphConfig::default());
        let a = fx.node("test", "a");
        let b = fx.node("test", "b");
        let ghost = Node::in_schema("test", "ghost", json!({})).unwrap();
        let edges = fx.edges();

        let batch = vec![
            Edge::between(schema("test"), &a, &b, None),
            Edge::between(schema("test"), &b, &ghost, None),
        ];
        assert!(matches!(edges.insert_many(&batch), Err(Error::DanglingReference { .. })));
        assert_eq!(edges.count("test").unwrap(), 0);

        assert_eq!(edges.insert_many(&batch[..1]).unwrap(), 1);
    }
}
