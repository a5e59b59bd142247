//! Migration units: the nodes of the migration graph

use crate::unit_name::UnitName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// Dialect key of the SQL body the runner applies.
pub const POSTGRES_DIALECT: &str = "postgres";

/// Kind of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    /// Applies SQL and is recorded in the ledger (default)
    #[default]
    Migration,
    /// Groups other units through `depends_on`; applies nothing
    Target,
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitKind::Migration => write!(f, "migration"),
            UnitKind::Target => write!(f, "target"),
        }
    }
}

/// On-disk shape of a unit file.
///
/// The name is not part of the document: it comes from the file path.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct UnitFile {
    #[serde(default)]
    pub(crate) description: String,

    #[serde(default)]
    pub(crate) depends_on: Vec<UnitName>,

    #[serde(default)]
    pub(crate) always_exec: bool,

    #[serde(rename = "type", default)]
    pub(crate) kind: UnitKind,

    #[serde(default)]
    pub(crate) sql: BTreeMap<String, String>,
}

/// A declarative migration node.
///
/// Equality and hashing consider only `name`. The `executed` flag can only be
/// flipped by the graph that owns the unit.
#[derive(Debug, Clone, Serialize)]
pub struct Unit {
    /// Canonical unit name
    pub name: UnitName,

    /// Human-readable description
    pub description: String,

    /// Units that must be applied first; `nothing` means no real dependency
    pub depends_on: Vec<UnitName>,

    /// Re-applied on every run and never recorded in the ledger
    pub always_exec: bool,

    /// Migration or target
    #[serde(rename = "type")]
    pub kind: UnitKind,

    /// SQL bodies keyed by dialect
    pub sql: BTreeMap<String, String>,

    #[serde(skip)]
    pub(crate) executed: bool,
}

impl Unit {
    /// Build a migration unit with a postgres SQL body.
    pub fn migration(name: UnitName, depends_on: Vec<UnitName>, sql: impl Into<String>) -> Self {
        let mut bodies = BTreeMap::new();
        bodies.insert(POSTGRES_DIALECT.to_string(), sql.into());
        Self {
            name,
            description: String::new(),
            depends_on,
            always_exec: false,
            kind: UnitKind::Migration,
            sql: bodies,
            executed: false,
        }
    }

    /// Build a target unit grouping `depends_on`.
    pub fn target(name: UnitName, depends_on: Vec<UnitName>) -> Self {
        Self {
            name,
            description: String::new(),
            depends_on,
            always_exec: false,
            kind: UnitKind::Target,
            sql: BTreeMap::new(),
            executed: false,
        }
    }

    /// The sentinel unit: executed, no SQL, no dependencies.
    pub(crate) fn sentinel() -> Self {
        Self {
            name: UnitName::nothing(),
            description: "sentinel for units without dependencies".to_string(),
            depends_on: Vec::new(),
            always_exec: false,
            kind: UnitKind::Migration,
            sql: BTreeMap::new(),
            executed: true,
        }
    }

    pub(crate) fn from_file(name: UnitName, file: UnitFile) -> Self {
        Self {
            name,
            description: file.description,
            depends_on: file.depends_on,
            always_exec: file.always_exec,
            kind: file.kind,
            sql: file.sql,
            executed: false,
        }
    }

    /// Mark the unit as re-applied on every run.
    pub fn with_always_exec(mut self) -> Self {
        self.always_exec = true;
        self
    }

    /// Whether the owning graph has observed this unit as applied.
    pub fn is_executed(&self) -> bool {
        self.executed
    }

    /// Whether this unit is a target.
    pub fn is_target(&self) -> bool {
        self.kind == UnitKind::Target
    }

    /// SQL body for a dialect, if present.
    pub fn sql_for(&self, dialect: &str) -> Option<&str> {
        self.sql.get(dialect).map(String::as_str)
    }

    /// The postgres SQL body, or `""` when absent.
    pub fn postgres_sql(&self) -> &str {
        self.sql_for(POSTGRES_DIALECT).unwrap_or("")
    }

    /// Whether the ledger should record this unit once applied.
    pub fn is_recorded(&self) -> bool {
        self.kind == UnitKind::Migration && !self.always_exec
    }

    /// `depends_on` with the sentinel removed, order preserved.
    pub fn depends_on_without_nothing(&self) -> impl Iterator<Item = &UnitName> {
        self.depends_on.iter().filter(|d| !d.is_nothing())
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Unit {}

impl Hash for Unit {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

#[cfg(test)]
#[path = "unit_test.rs"]
mod tests;
