use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Behavior switches for a [`crate::Graph`] instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Deleting a node also deletes every edge, in any known schema, that
    /// references it. When off, such a delete fails with `NodeReferenced`.
    pub cascade_on_node_delete: bool,
    /// How long to wait on a locked database before reporting `StorageBusy`
    pub busy_timeout_ms: u64,
    /// Use write-ahead logging (adds `-wal`/`-shm` files next to the database)
    pub wal_mode: bool,
    /// Rows fetched per round trip by lazy edge scans
    pub scan_page_size: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            cascade_on_node_delete: true,
            busy_timeout_ms: 5_000,
            wal_mode: false,
            scan_page_size: 256,
        }
    }
}

/// Contents of `ein.toml`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EinConfig {
    pub database: Option<String>,
    #[serde(default)]
    pub graph: GraphConfig,
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("ein.toml")
}

pub fn default_database_path() -> PathBuf {
    PathBuf::from("ein.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<EinConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: EinConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &EinConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
