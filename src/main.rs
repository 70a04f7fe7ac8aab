//! Ein CLI - Command-line interface for SQLite-backed graphs

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use ein::config::{self, EinConfig};
use ein::ui::{self, Icons};
use ein::{EdgeFilter, Graph, MatchOperator, NodeFilter};
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "ein")]
#[command(version)]
#[command(about = "Graph data on a single SQLite file - schemas, nodes and edges")]
#[command(long_about = r#"
Ein stores graphs in one SQLite file:
  • Schemas partition the graph (one node table, one edge table each)
  • Nodes carry a JSON body and an id unique within their schema
  • Edges link nodes, also across schemas, and replace on re-insert

Example usage:
  ein schema add people
  ein node add people alice --body '{"age": 30}'
  ein node add people bob
  ein edge add people alice bob --properties '{"knows": true}'
  ein edge list people --source alice
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the database file (overrides ein.toml)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of human output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write an ein.toml and create the database file
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Manage schemas
    Schema {
        #[command(subcommand)]
        action: SchemaAction,
    },

    /// Manage nodes
    Node {
        #[command(subcommand)]
        action: NodeAction,
    },

    /// Manage edges
    Edge {
        #[command(subcommand)]
        action: EdgeAction,
    },

    /// Run a raw SQL statement (no graph invariants are enforced)
    Sql {
        /// Statement to execute
        statement: String,

        /// Positional parameters bound to ?1, ?2, ...
        #[arg(short, long)]
        param: Vec<String>,
    },

    /// Show node and edge counts per schema
    Stats,
}

#[derive(Subcommand)]
enum SchemaAction {
    /// Create a schema (idempotent)
    Add { name: String },
    /// List known schemas
    List {
        /// Only schemas whose table names contain this fragment
        #[arg(short, long)]
        filter: Option<String>,
    },
}

#[derive(Subcommand)]
enum NodeAction {
    /// Insert a node
    Add {
        schema: String,
        id: String,
        /// JSON body
        #[arg(short, long, default_value = "{}")]
        body: String,
    },
    /// Show one node
    Get { schema: String, id: String },
    /// Replace a node's body
    Update {
        schema: String,
        id: String,
        /// JSON body
        #[arg(short, long)]
        body: String,
    },
    /// Delete nodes (edges referencing them follow the cascade policy)
    Delete {
        schema: String,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// List every node of a schema
    List { schema: String },
    /// Find nodes by id and/or body fragment
    Find {
        schema: String,
        #[arg(long)]
        id: Option<String>,
        /// JSON object whose key/value pairs must appear in the body
        #[arg(short, long)]
        body: Option<String>,
        #[arg(short, long, value_enum, default_value_t = Operator::Or)]
        operator: Operator,
    },
}

#[derive(Subcommand)]
enum EdgeAction {
    /// Link two nodes; the edge is stored under SCHEMA
    Add {
        schema: String,
        source: String,
        target: String,
        /// Schema of the source node (defaults to SCHEMA)
        #[arg(long)]
        source_schema: Option<String>,
        /// Schema of the target node (defaults to SCHEMA)
        #[arg(long)]
        target_schema: Option<String>,
        /// JSON properties
        #[arg(short, long)]
        properties: Option<String>,
    },
    /// Show one edge
    Get { schema: String, source: String, target: String },
    /// Replace an edge's properties
    Update {
        schema: String,
        source: String,
        target: String,
        #[arg(short, long)]
        properties: Option<String>,
    },
    /// List edges of a schema, optionally by source or target
    List {
        schema: String,
        #[arg(short, long, conflicts_with = "target")]
        source: Option<String>,
        #[arg(short, long)]
        target: Option<String>,
    },
    /// Find edges matching any of source, target or properties
    Find {
        schema: String,
        #[arg(short, long)]
        source: Option<String>,
        #[arg(short, long)]
        target: Option<String>,
        #[arg(short, long)]
        properties: Option<String>,
    },
    /// Delete the edge(s) from SOURCE to TARGET, or every edge touching --node
    Delete {
        schema: String,
        #[arg(required_unless_present = "node")]
        source: Option<String>,
        #[arg(required_unless_present = "node")]
        target: Option<String>,
        #[arg(long, conflicts_with_all = ["source", "target"])]
        node: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Operator {
    Or,
    And,
    Not,
}

impl From<Operator> for MatchOperator {
    fn from(op: Operator) -> Self {
        match op {
            Operator::Or => MatchOperator::Or,
            Operator::And => MatchOperator::And,
            Operator::Not => MatchOperator::Not,
        }
    }
}

/// How results are printed
#[derive(Clone, Copy)]
struct Output {
    json: bool,
    quiet: bool,
}

impl Output {
    fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce()) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else if !self.quiet {
            human();
        }
        Ok(())
    }
}

fn parse_json(label: &str, text: &str) -> anyhow::Result<Value> {
    serde_json::from_str(text).map_err(|e| anyhow::anyhow!("invalid JSON for {}: {}", label, e))
}

fn parse_optional_json(label: &str, text: Option<&str>) -> anyhow::Result<Option<Value>> {
    text.map(|t| parse_json(label, t)).transpose()
}

fn open_graph(database: &Path, config: &EinConfig) -> anyhow::Result<Graph> {
    config::ensure_db_dir(database)?;
    Ok(Graph::open_with_config(database, config.graph.clone())?)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let settings = config::load_config(cli.config.as_deref())?.unwrap_or_default();
    let database = cli
        .database
        .clone()
        .or_else(|| settings.database.as_ref().map(PathBuf::from))
        .unwrap_or_else(config::default_database_path);
    let out = Output {
        json: cli.json,
        quiet: ein::output::is_quiet(),
    };

    tracing::debug!("Using database {}", database.display());

    match cli.command {
        Commands::Init { force } => {
            let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
            let written = EinConfig {
                database: Some(database.to_string_lossy().to_string()),
                graph: settings.graph.clone(),
            };
            config::write_config(&config_path, &written, force)?;
            open_graph(&database, &written)?;

            out.emit(&written, || {
                ui::header("Initialized ein");
                ui::info("Config", &config_path.display().to_string());
                ui::info("Database", &database.display().to_string());
            })?;
        }

        Commands::Schema { action } => {
            let mut graph = open_graph(&database, &settings)?;
            match action {
                SchemaAction::Add { name } => {
                    let schema = graph.add_schema(&name)?;
                    out.emit(&schema, || {
                        ui::success(&format!("Schema {} ready", schema));
                    })?;
                }
                SchemaAction::List { filter } => {
                    let schemas = match filter {
                        Some(fragment) => graph.find_schemas(&fragment)?,
                        None => graph.schemas(),
                    };
                    out.emit(&schemas, || {
                        if schemas.is_empty() {
                            println!("{} No schemas found.", Icons::EMPTY);
                        }
                        for schema in &schemas {
                            println!("{} {}", Icons::SCHEMA, schema);
                        }
                    })?;
                }
            }
        }

        Commands::Node { action } => {
            let graph = open_graph(&database, &settings)?;
            match action {
                NodeAction::Add { schema, id, body } => {
                    let node = graph.add_node(&schema, &id, parse_json("body", &body)?)?;
                    out.emit(&node, || ui::node_line(&node))?;
                }
                NodeAction::Get { schema, id } => {
                    let node = graph.get_node(&schema, &id)?;
                    out.emit(&node, || ui::node_line(&node))?;
                }
                NodeAction::Update { schema, id, body } => {
                    let node = graph.update_node(&schema, &id, parse_json("body", &body)?)?;
                    out.emit(&node, || ui::node_line(&node))?;
                }
                NodeAction::Delete { schema, ids } => {
                    let removed = graph.delete_nodes(&schema, &ids)?;
                    out.emit(&serde_json::json!({ "removed": removed }), || {
                        ui::success(&format!("Removed {} node(s) from {}", removed, schema));
                    })?;
                }
                NodeAction::List { schema } => {
                    let nodes = graph.all_nodes(&schema)?;
                    out.emit(&nodes, || print_nodes(&nodes))?;
                }
                NodeAction::Find { schema, id, body, operator } => {
                    let filter = NodeFilter {
                        id,
                        body: parse_optional_json("body", body.as_deref())?,
                        operator: operator.into(),
                    };
                    let nodes = graph.find_nodes(&schema, &filter)?;
                    out.emit(&nodes, || print_nodes(&nodes))?;
                }
            }
        }

        Commands::Edge { action } => {
            let graph = open_graph(&database, &settings)?;
            match action {
                EdgeAction::Add { schema, source, target, source_schema, target_schema, properties } => {
                    let source = graph.get_node(source_schema.as_deref().unwrap_or(&schema), &source)?;
                    let target = graph.get_node(target_schema.as_deref().unwrap_or(&schema), &target)?;
                    let properties = parse_optional_json("properties", properties.as_deref())?;

                    let edge = graph.add_edge(&schema, &source, &target, properties)?;
                    out.emit(&edge, || ui::edge_line(&edge))?;
                }
                EdgeAction::Get { schema, source, target } => {
                    let edge = graph.get_edge(&schema, &source, &target)?;
                    out.emit(&edge, || ui::edge_line(&edge))?;
                }
                EdgeAction::Update { schema, source, target, properties } => {
                    let properties = parse_optional_json("properties", properties.as_deref())?;
                    let edge = graph.update_edge(&schema, &source, &target, properties)?;
                    out.emit(&edge, || ui::edge_line(&edge))?;
                }
                EdgeAction::List { schema, source, target } => {
                    let scan = match (source, target) {
                        (Some(source), _) => graph.edges_from(&schema, &source)?,
                        (None, Some(target)) => graph.edges_to(&schema, &target)?,
                        (None, None) => graph.all_edges(&schema)?,
                    };
                    let edges = scan.collect::<ein::Result<Vec<_>>>()?;
                    out.emit(&edges, || print_edges(&edges))?;
                }
                EdgeAction::Find { schema, source, target, properties } => {
                    let filter = EdgeFilter {
                        source,
                        target,
                        properties: parse_optional_json("properties", properties.as_deref())?,
                    };
                    let edges = graph.find_edges(&schema, &filter)?;
                    out.emit(&edges, || print_edges(&edges))?;
                }
                EdgeAction::Delete { schema, source, target, node } => {
                    let removed = match (node, source, target) {
                        (Some(node), _, _) => graph.delete_edges_touching(&schema, &node)?,
                        (None, Some(source), Some(target)) => graph.delete_edge(&schema, &source, &target)?,
                        _ => anyhow::bail!("either SOURCE and TARGET or --node is required"),
                    };
                    out.emit(&serde_json::json!({ "removed": removed }), || {
                        ui::success(&format!("Removed {} edge(s) from {}", removed, schema));
                    })?;
                }
            }
        }

        Commands::Sql { statement, param } => {
            let graph = open_graph(&database, &settings)?;
            if !out.json {
                ui::warn("Raw SQL bypasses every graph invariant");
            }
            let rows = graph.execute_raw(&statement, rusqlite::params_from_iter(param.iter()))?;
            out.emit(&rows, || {
                for row in &rows {
                    println!("{}", Value::Object(row.clone()));
                }
                println!("{}", ui::dim(&format!("{} row(s)", rows.len())));
            })?;
        }

        Commands::Stats => {
            let graph = open_graph(&database, &settings)?;
            let stats = graph.stats()?;
            out.emit(&stats, || {
                println!("{} Ein Statistics ({})", Icons::STATS, database.display());
                let table = ui::stats_table(&stats.schemas);
                if table.is_empty() {
                    println!("{} No schemas yet.", Icons::EMPTY);
                } else {
                    println!("{}", table);
                }
                ui::section("Totals");
                ui::info("Nodes", &stats.total_nodes().to_string());
                ui::info("Edges", &stats.total_edges().to_string());
            })?;
        }
    }

    Ok(())
}

fn print_nodes(nodes: &[ein::Node]) {
    if nodes.is_empty() {
        println!("{} No nodes found.", Icons::EMPTY);
    } else {
        println!("{}", ui::node_table(nodes));
    }
}

fn print_edges(edges: &[ein::Edge]) {
    if edges.is_empty() {
        println!("{} No edges found.", Icons::EMPTY);
    } else {
        println!("{}", ui::edge_table(edges));
    }
}
