//! Ledger of applied migration units.
//!
//! Rows live in `vape_migrations` inside the target database. Only units of
//! type `migration` without `always_exec` are ever recorded.

use crate::error::DbResult;
use crate::traits::Database;
use forum_core::Unit;
use std::sync::Arc;

/// Ledger table name
pub const LEDGER_TABLE: &str = "vape_migrations";

/// Value of the `type` column for recorded units
pub const MIGRATION_TYPE: &str = "migration";

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS vape_migrations (
    name        VARCHAR(1024) NOT NULL PRIMARY KEY,
    type        VARCHAR(1024) NOT NULL,
    executed_on TIMESTAMPTZ NOT NULL DEFAULT (now() AT TIME ZONE 'utc')
)";

const CREATE_INDEXES: &str = "DROP INDEX IF EXISTS vape_migrations_type_idx;
CREATE INDEX vape_migrations_type_idx ON vape_migrations (type);
DROP INDEX IF EXISTS vape_migrations_name_type_idx;
CREATE INDEX vape_migrations_name_type_idx ON vape_migrations (name, type);";

const SELECT_APPLIED: &str = "SELECT name FROM vape_migrations WHERE type = $1";

const INSERT_APPLIED: &str = "INSERT INTO vape_migrations (name, type) VALUES ($1, $2)";

/// Read/write access to the ledger table
#[derive(Clone)]
pub struct Ledger {
    db: Arc<dyn Database>,
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("db", &self.db.db_type())
            .finish()
    }
}

impl Ledger {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Create the ledger table and its indexes. Safe to call repeatedly.
    pub async fn bootstrap(&self) -> DbResult<()> {
        self.db.ping().await?;
        self.db.begin().await?;

        let created = async {
            self.db.execute_batch(CREATE_TABLE).await?;
            self.db.execute_batch(CREATE_INDEXES).await
        }
        .await;

        match created {
            Ok(()) => self.db.commit().await,
            Err(e) => {
                if let Err(rb) = self.db.rollback().await {
                    log::warn!("Ledger bootstrap rollback failed: {}", rb);
                }
                Err(e)
            }
        }
    }

    /// Names of every recorded migration, unordered
    pub async fn list_applied(&self) -> DbResult<Vec<String>> {
        self.db.query_strings(SELECT_APPLIED, &[MIGRATION_TYPE]).await
    }

    /// Record a unit as applied.
    ///
    /// Returns `false` without touching the database for targets and
    /// `always_exec` units. A second insert of the same name is a
    /// primary-key conflict and surfaces as an error.
    pub async fn mark_applied(&self, unit: &Unit) -> DbResult<bool> {
        if !unit.is_recorded() {
            return Ok(false);
        }
        self.db
            .execute(INSERT_APPLIED, &[unit.name.as_str(), MIGRATION_TYPE])
            .await?;
        Ok(true)
    }
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;
