//! Database trait definition

use crate::error::DbResult;
use async_trait::async_trait;

/// Database abstraction used by the ledger and the migration runner.
///
/// One implementation holds one session, so `begin`/`commit`/`rollback`
/// bracket every statement issued through it in between. Implementations
/// must be Send + Sync: statements of one round are issued concurrently.
#[async_trait]
pub trait Database: Send + Sync {
    /// Round-trip to the server
    async fn ping(&self) -> DbResult<()>;

    /// Execute one or more SQL statements without parameters
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Execute a single statement with text parameters, returns affected rows
    async fn execute(&self, sql: &str, params: &[&str]) -> DbResult<u64>;

    /// Run a query and return the first column of every row as text
    async fn query_strings(&self, sql: &str, params: &[&str]) -> DbResult<Vec<String>>;

    /// Open a transaction on this session
    async fn begin(&self) -> DbResult<()> {
        self.execute_batch("BEGIN").await
    }

    /// Commit the open transaction
    async fn commit(&self) -> DbResult<()> {
        self.execute_batch("COMMIT").await
    }

    /// Abort the open transaction
    async fn rollback(&self) -> DbResult<()> {
        self.execute_batch("ROLLBACK").await
    }

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}
