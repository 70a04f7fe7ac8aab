//! SQLite storage implementation
//!
//! The narrow handle every store goes through: one connection to one file,
//! plus statement execution, batched execution and row queries.

use std::path::Path;
use std::time::Duration;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, Params, Transaction};
use serde_json::{Map, Value};
use crate::config::GraphConfig;
use crate::{Error, Result};

/// One result row from a raw query, keyed by column name
pub type RawRow = Map<String, Value>;

/// SQLite-backed storage handle
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path, config: &GraphConfig) -> Result<Self> {
        let unavailable = |e: rusqlite::Error| Error::StorageUnavailable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        let conn = Connection::open(path).map_err(unavailable)?;
        let store = Self { conn };
        store.configure(config).map_err(unavailable)?;
        tracing::info!(path = %path.display(), "Opened graph storage");
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory(config: &GraphConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.configure(config)?;
        Ok(store)
    }

    /// Apply connection-level settings
    fn configure(&self, config: &GraphConfig) -> rusqlite::Result<()> {
        self.conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;

        if config.wal_mode {
            let mode: String = self.conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
            tracing::debug!(journal_mode = %mode, "Configured journal mode");
        }

        // Forces the file header to be read so an unusable file fails at open time
        self.conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    /// Borrow the underlying connection
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Start a transaction. Each public mutating call runs in its own.
    pub(crate) fn transaction(&self) -> Result<Transaction<'_>> {
        Ok(self.conn.unchecked_transaction()?)
    }

    // ========== Narrow Interface ==========

    /// Execute one statement, returning the number of changed rows
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize> {
        tracing::debug!(sql = sql.trim(), "execute");
        Ok(self.conn.execute(sql, params)?)
    }

    /// Execute several statements as one transaction; all apply or none do
    pub fn execute_many<S: AsRef<str>>(&self, statements: &[S]) -> Result<()> {
        let tx = self.transaction()?;
        for stmt in statements {
            tracing::debug!(sql = stmt.as_ref().trim(), "execute_many");
            tx.execute_batch(stmt.as_ref())?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Run a statement and collect every row it returns.
    ///
    /// Statements that produce no columns are executed and yield no rows.
    pub fn query<P: Params>(&self, sql: &str, params: P) -> Result<Vec<RawRow>> {
        tracing::debug!(sql = sql.trim(), "query");
        let mut stmt = self.conn.prepare(sql)?;

        if stmt.column_count() == 0 {
            stmt.execute(params)?;
            return Ok(Vec::new());
        }

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt.query(params)?;
        let mut results = Vec::new();

        while let Some(row) = rows.next()? {
            let mut record = Map::with_capacity(columns.len());
            for (idx, column) in columns.iter().enumerate() {
                record.insert(column.clone(), value_to_json(row.get_ref(idx)?));
            }
            results.push(record);
        }

        Ok(results)
    }

    /// List every table name in the file's table catalog
    pub fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name"
        )?;

        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;

        Ok(names)
    }

    /// Count rows in a table whose name has already been validated
    pub(crate) fn count_rows(&self, table: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// Convert a SQLite value into JSON for raw rows
fn value_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Value::from(f),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
    }
}
