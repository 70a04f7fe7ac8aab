//! Schema names - the identifier boundary
//!
//! A schema name is interpolated into table names (`<name>_nodes`, `<name>_edges`),
//! which cannot be bound as statement parameters. Every name therefore passes
//! through [`SchemaName::parse`] before it reaches any SQL text.
//!
//! Accepted: `^[A-Za-z_][A-Za-z0-9_]{0,63}$`, minus the `sqlite_` prefix (any
//! case) that the engine reserves. Nothing is ever sanitized; anything else is
//! rejected with [`Error::InvalidSchemaName`].
//!
//! Table names are case-insensitive in SQLite, so two names differing only in
//! ASCII case are the same schema: they compare, order and hash as equal, while
//! each value keeps the spelling it was created with.

use crate::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::OnceLock;

/// Longest accepted schema name
pub const MAX_SCHEMA_NAME_LEN: usize = 64;

/// Prefix SQLite reserves for its own objects
const RESERVED_PREFIX: &str = "sqlite_";

/// Suffix of a schema's node table
pub const NODES_SUFFIX: &str = "_nodes";
/// Suffix of a schema's edge table
pub const EDGES_SUFFIX: &str = "_edges";

static PATTERN: OnceLock<Regex> = OnceLock::new();

fn pattern() -> &'static Regex {
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,63}$").expect("schema name pattern is valid")
    })
}

/// A validated schema name, safe to interpolate into a table name.
#[derive(Debug, Clone)]
pub struct SchemaName(String);

impl SchemaName {
    /// Validate a schema name
    pub fn parse(name: &str) -> Result<Self> {
        if name.len() > MAX_SCHEMA_NAME_LEN || !pattern().is_match(name) || is_reserved(name) {
            return Err(Error::InvalidSchemaName(name.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    /// Get the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of this schema's node table
    pub fn nodes_table(&self) -> String {
        format!("{}{}", self.0, NODES_SUFFIX)
    }

    /// Name of this schema's edge table
    pub fn edges_table(&self) -> String {
        format!("{}{}", self.0, EDGES_SUFFIX)
    }

    /// Recover the schema name from a `<name>_nodes` / `<name>_edges` table name.
    ///
    /// Returns `None` for tables outside the naming convention.
    pub fn from_table_name(table: &str) -> Option<Self> {
        let base = table
            .strip_suffix(NODES_SUFFIX)
            .or_else(|| table.strip_suffix(EDGES_SUFFIX))?;
        Self::parse(base).ok()
    }

    /// ASCII-lowercased bytes, the form SQLite compares table names in
    fn folded(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.bytes().map(|b| b.to_ascii_lowercase())
    }
}

fn is_reserved(name: &str) -> bool {
    name.get(..RESERVED_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(RESERVED_PREFIX))
}

impl PartialEq for SchemaName {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for SchemaName {}

impl Ord for SchemaName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.folded().cmp(other.folded())
    }
}

impl PartialOrd for SchemaName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for SchemaName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.folded() {
            state.write_u8(b);
        }
        state.write_u8(0xff);
    }
}

impl fmt::Display for SchemaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SchemaName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for SchemaName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for SchemaName {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SchemaName {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        SchemaName::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        let longest = "x".repeat(MAX_SCHEMA_NAME_LEN);
        for name in ["a", "test", "test_1", "_private", "CamelCase", longest.as_str()] {
            let parsed = SchemaName::parse(name).unwrap();
            assert_eq!(parsed.as_str(), name);
        }
    }

    #[test]
    fn test_invalid_names() {
        let long = "x".repeat(65);
        for name in [
            "",
            "1abc",
            "has space",
            "drop;table",
            "a-b",
            "a.b",
            "quote\"d",
            "tab\there",
            "x; DROP TABLE a_nodes; --",
            "ünicode",
            "sqlite_meta",
            "SQLite_Stat",
            "sqlite_",
            long.as_str(),
        ] {
            assert!(
                matches!(SchemaName::parse(name), Err(Error::InvalidSchemaName(_))),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_reserved_prefix_only() {
        assert!(SchemaName::parse("sqlite").is_ok());
        assert!(SchemaName::parse("sqlitegraph").is_ok());
        assert!(SchemaName::parse("my_sqlite_data").is_ok());
    }

    #[test]
    fn test_names_differing_in_case_are_equal() {
        use std::collections::{BTreeSet, HashSet};

        let upper = SchemaName::parse("People").unwrap();
        let lower = SchemaName::parse("people").unwrap();
        assert_eq!(upper, lower);
        assert_eq!(upper.cmp(&lower), Ordering::Equal);
        assert_eq!(upper.to_string(), "People");

        let ordered: BTreeSet<_> = [upper.clone(), lower.clone()].into_iter().collect();
        let hashed: HashSet<_> = [upper, lower].into_iter().collect();
        assert_eq!(ordered.len(), 1);
        assert_eq!(hashed.len(), 1);

        let mut names: Vec<_> = ["beta", "Alpha", "gamma"].iter().map(|n| SchemaName::parse(n).unwrap()).collect();
        names.sort();
        let sorted: Vec<_> = names.iter().map(|n| n.as_str()).collect();
        assert_eq!(sorted, vec!["Alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_table_names() {
        let name = SchemaName::parse("people").unwrap();
        assert_eq!(name.nodes_table(), "people_nodes");
        assert_eq!(name.edges_table(), "people_edges");
    }

    #[test]
    fn test_from_table_name() {
        assert_eq!(SchemaName::from_table_name("people_nodes").unwrap().as_str(), "people");
        assert_eq!(SchemaName::from_table_name("my_graph_edges").unwrap().as_str(), "my_graph");
        assert!(SchemaName::from_table_name("people").is_none());
        assert!(SchemaName::from_table_name("_nodes").is_none());
        assert!(SchemaName::from_table_name("bad-name_nodes").is_none());
    }

    #[test]
    fn test_serde_validates() {
        let name: SchemaName = serde_json::from_str("\"ok_name\"").unwrap();
        assert_eq!(name.as_str(), "ok_name");
        assert!(serde_json::from_str::<SchemaName>("\"no way\"").is_err());
    }
}
