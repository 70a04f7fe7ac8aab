//! Nodes - schema-scoped vertices with an opaque JSON body
//!
//! A node's id is unique within its schema only; the same id may exist
//! independently in several schemas. A node never moves between schemas, which
//! keeps the endpoint schema names stored on edges valid.

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::catalog::SchemaCatalog;
use crate::config::GraphConfig;
use crate::edge;
use crate::schema::SchemaName;
use crate::storage::SqliteStore;
use crate::{is_constraint_violation, Error, Result};

/// A graph vertex. A plain value: it holds no connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    schema: SchemaName,
    id: String,
    body: Value,
}

impl Node {
    /// Create a node in a schema
    pub fn new(schema: SchemaName, id: impl Into<String>, body: Value) -> Self {
        Self {
            schema,
            id: id.into(),
            body,
        }
    }

    /// Create a node, validating the schema name
    pub fn in_schema(schema: &str, id: impl Into<String>, body: Value) -> Result<Self> {
        Ok(Self::new(SchemaName::parse(schema)?, id, body))
    }

    /// Owning schema
    pub fn schema(&self) -> &SchemaName {
        &self.schema
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Value {
        &mut self.body
    }

    /// Replace the body, keeping schema and id
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn into_body(self) -> Value {
        self.body
    }
}

/// How the id clause and the body clause of a [`NodeFilter`] combine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchOperator {
    /// Either clause matches
    #[default]
    Or,
    /// Both clauses match
    And,
    /// The id clause matches and the body clause does not.
    /// With a single clause, that clause is negated.
    Not,
}

/// Simple pattern lookup over one schema's nodes.
///
/// `body` is matched by containment: every top-level `"key":value` pair of the
/// filter (or the whole value, for non-objects) must appear in the stored body.
#[derive(Debug, Clone, Default)]
pub struct NodeFilter {
    pub id: Option<String>,
    pub body: Option<Value>,
    pub operator: MatchOperator,
}

impl NodeFilter {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn by_body(body: Value) -> Self {
        Self {
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn operator(mut self, operator: MatchOperator) -> Self {
        self.operator = operator;
        self
    }

    /// Build the WHERE clause and its bound parameters; `None` when empty
    fn to_sql(&self) -> Result<Option<(String, Vec<String>)>> {
        let mut params = Vec::new();

        let id_clause = self.id.as_ref().map(|id| {
            params.push(id.clone());
            format!("id = ?{}", params.len())
        });

        let body_clause = match &self.body {
            Some(body) => {
                let mut parts = Vec::new();
                for fragment in body_fragments(body)? {
                    params.push(format!("%{}%", escape_like(&fragment)));
                    parts.push(format!("body LIKE ?{} ESCAPE '\\'", params.len()));
                }
                Some(if parts.is_empty() { "1".to_string() } else { parts.join(" AND ") })
            }
            None => None,
        };

        let clause = match (id_clause, body_clause, self.operator) {
            (None, None, _) => return Ok(None),
            (Some(id), None, MatchOperator::Not) => format!("NOT ({id})"),
            (Some(id), None, _) => id,
            (None, Some(body), MatchOperator::Not) => format!("NOT ({body})"),
            (None, Some(body), _) => body,
            (Some(id), Some(body), MatchOperator::Or) => format!("{id} OR ({body})"),
            (Some(id), Some(body), MatchOperator::And) => format!("{id} AND ({body})"),
            (Some(id), Some(body), MatchOperator::Not) => format!("{id} AND NOT ({body})"),
        };

        Ok(Some((clause, params)))
    }
}

/// Serialized pieces that must all occur in a matching body
fn body_fragments(body: &Value) -> Result<Vec<String>> {
    match body {
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| {
                Ok(format!("{}:{}", serde_json::to_string(key)?, serde_json::to_string(value)?))
            })
            .collect(),
        other => Ok(vec![serde_json::to_string(other)?]),
    }
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// CRUD on nodes, scoped per schema
pub struct NodeStore<'a> {
    store: &'a SqliteStore,
    catalog: &'a SchemaCatalog,
    config: &'a GraphConfig,
}

impl<'a> NodeStore<'a> {
    pub fn new(store: &'a SqliteStore, catalog: &'a SchemaCatalog, config: &'a GraphConfig) -> Self {
        Self { store, catalog, config }
    }

    /// Insert a new node. Never overwrites: an existing id fails with `DuplicateNodeId`.
    pub fn insert(&self, node: &Node) -> Result<()> {
        let schema = self.catalog.require(node.schema.as_str())?;
        insert_node(self.store.conn(), schema, node)?;
        tracing::debug!(schema = %schema, id = %node.id, "Inserted node");
        Ok(())
    }

    /// Insert several nodes in one transaction; nothing is kept if any insert fails
    pub fn insert_many(&self, nodes: &[Node]) -> Result<usize> {
        let tx = self.store.transaction()?;
        for node in nodes {
            let schema = self.catalog.require(node.schema.as_str())?;
            insert_node(&tx, schema, node)?;
        }
        tx.commit()?;
        tracing::debug!(count = nodes.len(), "Inserted nodes");
        Ok(nodes.len())
    }

    /// Point lookup by primary key
    pub fn get(&self, schema: &str, id: &str) -> Result<Node> {
        let schema = self.catalog.require(schema)?;
        self.store
            .conn()
            .query_row(
                &format!("SELECT id, body FROM {} WHERE id = ?1", schema.nodes_table()),
                [id],
                |row| row_to_node(schema, row),
            )
            .optional()?
            .ok_or_else(|| Error::NodeNotFound {
                schema: schema.to_string(),
                id: id.to_string(),
            })
    }

    /// Check whether a node exists
    pub fn contains(&self, schema: &str, id: &str) -> Result<bool> {
        let schema = self.catalog.require(schema)?;
        node_exists(self.store.conn(), schema, id)
    }

    /// Replace the body of an existing node. Never creates: a missing id fails
    /// with `NodeNotFound`.
    pub fn update(&self, node: &Node) -> Result<()> {
        let schema = self.catalog.require(node.schema.as_str())?;
        let body = serde_json::to_string(&node.body)?;
        let changed = self.store.execute(
            &format!("UPDATE {} SET body = ?1 WHERE id = ?2", schema.nodes_table()),
            params![body, node.id],
        )?;

        if changed == 0 {
            return Err(Error::NodeNotFound {
                schema: schema.to_string(),
                id: node.id.clone(),
            });
        }
        tracing::debug!(schema = %schema, id = %node.id, "Updated node");
        Ok(())
    }

    /// Delete a node, applying the configured cascade policy.
    ///
    /// Deleting an absent id is not an error. Returns whether a row was removed.
    pub fn delete(&self, schema: &str, id: &str) -> Result<bool> {
        let schema = self.catalog.require(schema)?;
        let tx = self.store.transaction()?;
        let removed = self.delete_in(&tx, schema, id)?;
        tx.commit()?;
        Ok(removed)
    }

    /// Delete several nodes of one schema in one transaction
    pub fn delete_many<S: AsRef<str>>(&self, schema: &str, ids: &[S]) -> Result<usize> {
        let schema = self.catalog.require(schema)?;
        let tx = self.store.transaction()?;
        let mut removed = 0;
        for id in ids {
            if self.delete_in(&tx, schema, id.as_ref())? {
                removed += 1;
            }
        }
        tx.commit()?;
        Ok(removed)
    }

    fn delete_in(&self, conn: &Connection, schema: &SchemaName, id: &str) -> Result<bool> {
        if self.config.cascade_on_node_delete {
            let mut cascaded = 0;
            for home in self.catalog.schemas() {
                cascaded += edge::delete_edges_referencing(conn, home, schema, id)?;
            }
            if cascaded > 0 {
                tracing::debug!(schema = %schema, id = %id, edges = cascaded, "Cascaded node delete to edges");
            }
        } else {
            let mut referencing = 0;
            for home in self.catalog.schemas() {
                referencing += edge::count_edges_referencing(conn, home, schema, id)?;
            }
            if referencing > 0 {
                return Err(Error::NodeReferenced {
                    schema: schema.to_string(),
                    id: id.to_string(),
                    edges: referencing,
                });
            }
        }

        let removed = conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", schema.nodes_table()),
            [id],
        )?;
        tracing::debug!(schema = %schema, id = %id, removed, "Deleted node");
        Ok(removed > 0)
    }

    /// Every node of a schema
    pub fn all(&self, schema: &str) -> Result<Vec<Node>> {
        let schema = self.catalog.require(schema)?;
        let mut stmt = self
            .store
            .conn()
            .prepare(&format!("SELECT id, body FROM {}", schema.nodes_table()))?;

        let nodes = stmt
            .query_map([], |row| row_to_node(schema, row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(nodes)
    }

    /// Nodes matching a [`NodeFilter`]; an empty filter matches nothing
    pub fn find(&self, schema: &str, filter: &NodeFilter) -> Result<Vec<Node>> {
        let schema = self.catalog.require(schema)?;
        let Some((clause, params)) = filter.to_sql()? else {
            return Ok(Vec::new());
        };

        let mut stmt = self.store.conn().prepare(&format!(
            "SELECT id, body FROM {} WHERE {clause}",
            schema.nodes_table()
        ))?;

        let nodes = stmt
            .query_map(params_from_iter(params.iter()), |row| row_to_node(schema, row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(nodes)
    }

    /// Number of nodes in a schema
    pub fn count(&self, schema: &str) -> Result<usize> {
        let schema = self.catalog.require(schema)?;
        self.store.count_rows(&schema.nodes_table())
    }
}

fn insert_node(conn: &Connection, schema: &SchemaName, node: &Node) -> Result<()> {
    let body = serde_json::to_string(&node.body)?;
    conn.execute(
        &format!("INSERT INTO {} (id, body) VALUES (?1, ?2)", schema.nodes_table()),
        params![node.id, body],
    )
    .map_err(|e| {
        if is_constraint_violation(&e) {
            Error::DuplicateNodeId {
                schema: schema.to_string(),
                id: node.id.clone(),
            }
        } else {
            e.into()
        }
    })?;
    Ok(())
}

/// Check a node row exists in a schema's node table
pub(crate) fn node_exists(conn: &Connection, schema: &SchemaName, id: &str) -> Result<bool> {
    let found = conn
        .query_row(
            &format!("SELECT 1 FROM {} WHERE id = ?1", schema.nodes_table()),
            [id],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Helper to convert a row to a Node
fn row_to_node(schema: &SchemaName, row: &rusqlite::Row) -> rusqlite::Result<Node> {
    let body_str: String = row.get(1)?;
    let body = serde_json::from_str(&body_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Node {
        schema: schema.clone(),
        id: row.get(0)?,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Fixture {
        store: SqliteStore,
        catalog: SchemaCatalog,
        config: GraphConfig,
    }

    impl Fixture {
        fn new(schemas: &[&str]) -> Self {
            let config = GraphConfig::default();
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
    }

    fn sample_node(schema: &str, id: &str) -> Node {
        Node::in_schema(schema, id, json!({"id": id, "other-data": ["string-one", "string-two"]})).unwrap()
    }

    #[test]
    fn test_node_crud() {
        let fx = Fixture::new(&["test"]);
        let nodes = fx.nodes();

        let node = sample_node("test", "n1");
        nodes.insert(&node).unwrap();

        let retrieved = nodes.get("test", "n1").unwrap();
        assert_eq!(retrieved, node);

        let updated = retrieved.with_body(json!({"some-other-data": ["string-three"]}));
        nodes.update(&updated).unwrap();
        assert_eq!(nodes.get("test", "n1").unwrap().body(), updated.body());

        assert!(nodes.delete("test", "n1").unwrap());
        assert!(matches!(nodes.get("test", "n1"), Err(Error::NodeNotFound { .. })));
    }

    #[test]
    fn test_body_is_stored_compact() {
        let fx = Fixture::new(&["test"]);
        fx.nodes().insert(&sample_node("test", "n1")).unwrap();

        let rows = fx.store.query("SELECT body FROM test_nodes", []).unwrap();
        assert_eq!(rows[0]["body"], r#"{"id":"n1","other-data":["string-one","string-two"]}"#);
    }

    #[test]
    fn test_duplicate_id_is_typed_error() {
        let fx = Fixture::new(&["a", "b"]);
        let nodes = fx.nodes();

        nodes.insert(&sample_node("a", "n1")).unwrap();
        let err = nodes.insert(&sample_node("a", "n1")).unwrap_err();
        assert!(matches!(err, Error::DuplicateNodeId { ref schema, ref id } if schema == "a" && id == "n1"));

        nodes.insert(&sample_node("b", "n1")).unwrap();
        assert_eq!(nodes.count("a").unwrap(), 1);
        assert_eq!(nodes.count("b").unwrap(), 1);
    }

    #[test]
    fn test_unknown_schema() {
        let fx = Fixture::new(&["a"]);
        let nodes = fx.nodes();

        assert!(matches!(nodes.insert(&sample_node("zzz", "n1")), Err(Error::UnknownSchema(_))));
        assert!(matches!(nodes.get("zzz", "n1"), Err(Error::UnknownSchema(_))));
        assert!(matches!(nodes.delete("zzz", "n1"), Err(Error::UnknownSchema(_))));
    }

    #[test]
    fn test_update_never_creates() {
        let fx = Fixture::new(&["test"]);
        let nodes = fx.nodes();

        let err = nodes.update(&sample_node("test", "ghost")).unwrap_err();
        assert!(matches!(err, Error::NodeNotFound { .. }));
        assert_eq!(nodes.count("test").unwrap(), 0);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let fx = Fixture::new(&["test"]);
        let nodes = fx.nodes();

        assert!(!nodes.delete("test", "never-inserted").unwrap());
        nodes.insert(&sample_node("test", "n1")).unwrap();
        assert!(nodes.delete("test", "n1").unwrap());
        assert!(!nodes.delete("test", "n1").unwrap());
    }

    #[test]
    fn test_insert_many_rolls_back_on_duplicate() {
        let fx = Fixture::new(&["test"]);
        let nodes = fx.nodes();

        let batch = vec![sample_node("test", "n1"), sample_node("test", "n2"), sample_node("test", "n1")];
        assert!(matches!(nodes.insert_many(&batch), Err(Error::DuplicateNodeId { .. })));
        assert_eq!(nodes.count("test").unwrap(), 0);

        assert_eq!(nodes.insert_many(&batch[..2]).unwrap(), 2);
        assert_eq!(nodes.all("test").unwrap().len(), 2);
    }

    #[test]
    fn test_delete_many() {
        let fx = Fixture::new(&["test"]);
        let nodes = fx.nodes();
        for id in ["n1", "n2", "n3"] {
            nodes.insert(&sample_node("test", id)).unwrap();
        }

        assert_eq!(nodes.delete_many("test", &["n1", "n3", "missing"]).unwrap(), 2);
        let remaining: Vec<_> = nodes.all("test").unwrap().into_iter().map(|n| n.id().to_string()).collect();
        assert_eq!(remaining, vec!["n2"]);
    }

    #[test]
    fn test_find_by_id_and_body() {
        let fx = Fixture::new(&["test"]);
        let nodes = fx.nodes();
        nodes.insert(&Node::in_schema("test", "alice", json!({"kind": "person", "age": 30})).unwrap()).unwrap();
        nodes.insert(&Node::in_schema("test", "bob", json!({"kind": "person", "age": 41})).unwrap()).unwrap();
        nodes.insert(&Node::in_schema("test", "acme", json!({"kind": "company"})).unwrap()).unwrap();

        let ids = |found: Vec<Node>| {
            let mut ids: Vec<_> = found.into_iter().map(|n| n.id().to_string()).collect();
            ids.sort();
            ids
        };

        assert_eq!(ids(nodes.find("test", &NodeFilter::by_id("bob")).unwrap()), vec!["bob"]);
        assert_eq!(
            ids(nodes.find("test", &NodeFilter::by_body(json!({"kind": "person"}))).unwrap()),
            vec!["alice", "bob"]
        );
        assert_eq!(
            ids(nodes.find("test", &NodeFilter::by_body(json!({"kind": "person", "age": 41}))).unwrap()),
            vec!["bob"]
        );

        let either = NodeFilter {
            id: Some("acme".into()),
            body: Some(json!({"age": 30})),
            operator: MatchOperator::Or,
        };
        assert_eq!(ids(nodes.find("test", &either).unwrap()), vec!["acme", "alice"]);

        let both = either.clone().operator(MatchOperator::And);
        assert!(nodes.find("test", &both).unwrap().is_empty());

        let excluded = NodeFilter::by_body(json!({"kind": "person"})).operator(MatchOperator::Not);
        assert_eq!(ids(nodes.find("test", &excluded).unwrap()), vec!["acme"]);

        assert!(nodes.find("test", &NodeFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn test_find_escapes_wildcards() {
        let fx = Fixture::new(&["test"]);
        let nodes = fx.nodes();
        nodes.insert(&Node::in_schema("test", "pct", json!({"label": "100%"})).unwrap()).unwrap();
        nodes.insert(&Node::in_schema("test", "plain", json!({"label": "1000"})).unwrap()).unwrap();

        let found = nodes.find("test", &NodeFilter::by_body(json!({"label": "100%"}))).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), "pct");

        let found = nodes.find("test", &NodeFilter::by_body(json!({"label": "1_00"}))).unwrap();
        assert!(found.is_empty());
    }
}
