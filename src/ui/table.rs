use tabled::{settings::Style, Table, Tabled};
use crate::graph::SchemaStats;
use crate::{Edge, Node};

#[derive(Tabled)]
pub struct NodeRow {
    #[tabled(rename = "Id")]
    pub id: String,
    #[tabled(rename = "Body")]
    pub body: String,
}

#[derive(Tabled)]
pub struct EdgeRow {
    #[tabled(rename = "Source")]
    pub source: String,
    #[tabled(rename = "Target")]
    pub target: String,
    #[tabled(rename = "Properties")]
    pub properties: String,
}

#[derive(Tabled)]
pub struct SchemaRow {
    #[tabled(rename = "Schema")]
    pub name: String,
    #[tabled(rename = "Nodes")]
    pub nodes: usize,
    #[tabled(rename = "Edges")]
    pub edges: usize,
}

fn render<T: Tabled>(rows: &[T]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn node_table(nodes: &[Node]) -> String {
    let rows: Vec<_> = nodes
        .iter()
        .map(|n| NodeRow {
            id: n.id().to_string(),
            body: n.body().to_string(),
        })
        .collect();
    render(&rows)
}

/// Endpoints in another schema are shown as `schema:id`
pub fn edge_table(edges: &[Edge]) -> String {
    let endpoint = |schema: &str, id: &str, home: &str| {
        if schema.eq_ignore_ascii_case(home) {
            id.to_string()
        } else {
            format!("{}:{}", schema, id)
        }
    };
    let rows: Vec<_> = edges
        .iter()
        .map(|e| EdgeRow {
            source: endpoint(e.source_schema().as_str(), e.source(), e.schema().as_str()),
            target: endpoint(e.target_schema().as_str(), e.target(), e.schema().as_str()),
            properties: e.properties().map(|p| p.to_string()).unwrap_or_default(),
        })
        .collect();
    render(&rows)
}

pub fn stats_table(schemas: &[SchemaStats]) -> String {
    let rows: Vec<_> = schemas
        .iter()
        .map(|s| SchemaRow {
            name: s.name.clone(),
            nodes: s.nodes,
            edges: s.edges,
        })
        .collect();
    render(&rows)
}
