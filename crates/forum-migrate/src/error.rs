//! Error types for forum-migrate

use forum_core::CoreError;
use forum_db::DbError;
use thiserror::Error;

/// Migration run errors, one variant per failing phase
#[derive(Error, Debug)]
pub enum MigrateError {
    /// M001: Unit tree could not be loaded
    #[error("[M001] Failed to load units: {0}")]
    Load(#[source] CoreError),

    /// M002: Loaded graph violates an invariant
    #[error("[M002] Unit graph is invalid: {0}")]
    Validate(#[source] CoreError),

    /// M003: Target subgraph could not be extracted
    #[error("[M003] Cannot resolve target '{target}': {source}")]
    Subgraph { target: String, source: CoreError },

    /// M004: Ledger contents could not be applied to the graph
    #[error("[M004] Failed to seed executed units: {0}")]
    Seed(#[source] CoreError),

    /// M005: Database failure outside any single unit
    #[error("[M005] Database error during {phase}: {source}")]
    Database {
        phase: &'static str,
        source: DbError,
    },

    /// M006: A unit's SQL or its ledger insert failed
    #[error("[M006] Unit '{unit}' failed: {source}")]
    UnitFailed { unit: String, source: DbError },

    /// M007: Pending units remain but none can run
    #[error("[M007] Migration stuck on nodes [{}]{}", .nodes.join(", "), cycle_suffix(.cycle))]
    Stuck {
        nodes: Vec<String>,
        cycle: Option<String>,
    },

    /// M008: Graph bookkeeping failed mid-run
    #[error("[M008] Graph update failed: {0}")]
    Graph(#[source] CoreError),
}

fn cycle_suffix(cycle: &Option<String>) -> String {
    match cycle {
        Some(path) => format!(" (cycle: {path})"),
        None => String::new(),
    }
}

impl MigrateError {
    pub(crate) fn db(phase: &'static str) -> impl FnOnce(DbError) -> MigrateError {
        move |source| MigrateError::Database { phase, source }
    }

    /// Name of the unit the error is about, if any
    pub fn unit(&self) -> Option<&str> {
        match self {
            MigrateError::UnitFailed { unit, .. } => Some(unit),
            _ => None,
        }
    }

    /// True when the underlying database error only reports that an earlier
    /// statement already aborted the transaction
    pub fn is_transaction_aborted(&self) -> bool {
        match self {
            MigrateError::UnitFailed { source, .. } | MigrateError::Database { source, .. } => {
                source.is_transaction_aborted()
            }
            _ => false,
        }
    }
}

/// Result type alias for MigrateError
pub type MigrateResult<T> = Result<T, MigrateError>;
