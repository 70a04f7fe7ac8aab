//! Table shapes for one schema
//!
//! Each schema owns two tables:
//! - `<schema>_nodes(id, body)`
//! - `<schema>_edges(source, source_schema, target, target_schema, properties)`
//!
//! Edge endpoints may live in another schema's node table, which a foreign key
//! cannot express, so referential integrity is checked by the stores instead.

use crate::schema::SchemaName;

/// SQL to create a schema's node table
pub fn create_nodes_table(schema: &SchemaName) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS {nodes} (
    id TEXT PRIMARY KEY NOT NULL,
    body TEXT NOT NULL
)
"#,
        nodes = schema.nodes_table()
    )
}

/// SQL to create a schema's edge table
///
/// A repeated `(source, target, properties)` triple replaces the stored row.
pub fn create_edges_table(schema: &SchemaName) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS {edges} (
    source TEXT NOT NULL,
    source_schema TEXT NOT NULL,
    target TEXT NOT NULL,
    target_schema TEXT NOT NULL,
    properties TEXT NOT NULL DEFAULT 'null',
    UNIQUE(source, target, properties) ON CONFLICT REPLACE
)
"#,
        edges = schema.edges_table()
    )
}

/// SQL to create a schema's indexes.
///
/// Index names share one namespace per database file, hence the schema prefix.
pub fn create_indexes(schema: &SchemaName) -> Vec<String> {
    let nodes = schema.nodes_table();
    let edges = schema.edges_table();
    vec![
        format!("CREATE INDEX IF NOT EXISTS idx_{nodes}_id ON {nodes}(id)"),
        format!("CREATE INDEX IF NOT EXISTS idx_{edges}_source ON {edges}(source)"),
        format!("CREATE INDEX IF NOT EXISTS idx_{edges}_target ON {edges}(target)"),
    ]
}

/// All statements that bring one schema into existence
pub fn schema_statements(schema: &SchemaName) -> Vec<String> {
    let mut stmts = vec![create_nodes_table(schema), create_edges_table(schema)];
    stmts.extend(create_indexes(schema));
    stmts
}

/// Table catalog query: every table following the `_nodes` / `_edges` convention
/// whose name contains `?1`.
pub const SELECT_SCHEMA_TABLES: &str = r#"
SELECT DISTINCT name
FROM sqlite_master
WHERE type = 'table'
  AND name LIKE '%' || ?1 || '%'
  AND (name LIKE '%\_nodes' ESCAPE '\' OR name LIKE '%\_edges' ESCAPE '\')
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statements_target_schema_tables() {
        let schema = SchemaName::parse("test").unwrap();
        let stmts = schema_statements(&schema);

        assert_eq!(stmts.len(), 5);
        assert!(stmts[0].contains("CREATE TABLE IF NOT EXISTS test_nodes"));
        assert!(stmts[1].contains("CREATE TABLE IF NOT EXISTS test_edges"));
        assert!(stmts[1].contains("UNIQUE(source, target, properties) ON CONFLICT REPLACE"));
        assert!(stmts.iter().skip(2).all(|s| s.contains("idx_test_")));
    }
}
