//! Schema catalog - which schemas exist in the storage file
//!
//! The known-schema set is filled once by [`SchemaCatalog::discover`] and then only
//! grows through [`SchemaCatalog::ensure_schema`]. It is never rescanned behind the
//! caller's back, so every operation within one `Graph` sees the same set.

use std::collections::{BTreeMap, BTreeSet};
use crate::schema::{SchemaName, EDGES_SUFFIX, NODES_SUFFIX};
use crate::storage::{schema, SqliteStore};
use crate::{Error, Result};

/// The set of schemas a `Graph` knows about
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    known: BTreeSet<SchemaName>,
}

impl SchemaCatalog {
    /// Build a catalog from the schemas already present in the storage file
    pub fn discover(store: &SqliteStore) -> Result<Self> {
        let known = discover_schemas(store, None)?;
        tracing::info!(count = known.len(), "Discovered schemas");
        Ok(Self { known })
    }

    /// Create a schema's tables and indexes if missing, then remember the name.
    ///
    /// Idempotent. The name is validated before any SQL is built; on failure no
    /// table is created. A name differing only in case from a known schema
    /// resolves to that schema, spelled as it was first created.
    pub fn ensure_schema(&mut self, store: &SqliteStore, name: &str) -> Result<SchemaName> {
        let parsed = SchemaName::parse(name)?;
        let schema = self.known.get(&parsed).cloned().unwrap_or(parsed);
        store.execute_many(&schema::schema_statements(&schema))?;

        if self.known.insert(schema.clone()) {
            tracing::info!(schema = %schema, "Created schema");
        }
        Ok(schema)
    }

    /// Check whether a schema has been created or discovered, ignoring case
    pub fn schema_exists(&self, name: &str) -> bool {
        SchemaName::parse(name).is_ok_and(|schema| self.known.contains(&schema))
    }

    /// Resolve a name to a known schema.
    ///
    /// Fails with `InvalidSchemaName` for unsafe names and `UnknownSchema` for
    /// names never created or discovered. The returned name carries the stored
    /// spelling.
    pub fn require(&self, name: &str) -> Result<&SchemaName> {
        let schema = SchemaName::parse(name)?;
        self.known
            .get(&schema)
            .ok_or_else(|| Error::UnknownSchema(name.to_string()))
    }

    /// All known schemas in name order
    pub fn schemas(&self) -> impl Iterator<Item = &SchemaName> {
        self.known.iter()
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

/// Scan the table catalog for schemas.
///
/// A base name counts as a schema only when both `<name>_nodes` and
/// `<name>_edges` exist. `fragment` restricts the scan to tables whose name
/// contains it.
pub fn discover_schemas(store: &SqliteStore, fragment: Option<&str>) -> Result<BTreeSet<SchemaName>> {
    let fragment = fragment.unwrap_or("");
    let mut stmt = store.conn().prepare(schema::SELECT_SCHEMA_TABLES)?;
    let tables = stmt
        .query_map([fragment], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    // (has nodes table, has edges table) per base name
    let mut seen: BTreeMap<SchemaName, (bool, bool)> = BTreeMap::new();
    for table in tables.iter().filter(|t| t.contains(fragment)) {
        let Some(schema) = SchemaName::from_table_name(table) else {
            tracing::debug!(table = %table, "Ignoring table outside schema naming convention");
            continue;
        };
        let entry = seen.entry(schema).or_default();
        if table.ends_with(NODES_SUFFIX) {
            entry.0 = true;
        } else if table.ends_with(EDGES_SUFFIX) {
            entry.1 = true;
        }
    }

    Ok(seen
        .into_iter()
        .filter(|(_, (nodes, edges))| *nodes && *edges)
        .map(|(schema, _)| schema)
        .collect())
}
