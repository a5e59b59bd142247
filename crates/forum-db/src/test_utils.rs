//! In-memory `Database` for tests
//!
//! Understands just enough SQL to stand in for PostgreSQL under the ledger:
//! transaction control, inserts into and selects from `vape_migrations`.
//! Everything else is recorded verbatim.

use crate::error::{DbError, DbResult};
use crate::ledger::LEDGER_TABLE;
use crate::traits::Database;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
struct FakeState {
    ledger: BTreeSet<String>,
    pending_ledger: Vec<String>,
    in_transaction: bool,
    statements: Vec<String>,
    pending_statements: Vec<String>,
    committed_statements: Vec<String>,
    commits: usize,
    rollbacks: usize,
    aborted: bool,
}

const ABORTED: &str =
    "current transaction is aborted, commands ignored until end of transaction block";

/// Transaction-aware fake database
#[derive(Debug, Default)]
pub struct FakeDatabase {
    state: Mutex<FakeState>,
    fail_on: Vec<String>,
    fail_ping: bool,
    aborts_session: bool,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the ledger with already applied units
    pub fn with_applied<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lock().ledger.extend(names.into_iter().map(Into::into));
        self
    }

    /// Fail any statement containing `needle`
    pub fn fail_on(mut self, needle: impl Into<String>) -> Self {
        self.fail_on.push(needle.into());
        self
    }

    /// After an injected failure inside a transaction, reject every further
    /// statement until `ROLLBACK`, as PostgreSQL does
    pub fn fail_aborts_session(mut self) -> Self {
        self.aborts_session = true;
        self
    }

    /// Make `ping` fail
    pub fn fail_ping(mut self) -> Self {
        self.fail_ping = true;
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Every statement received, in order, including transaction control
    pub fn statements(&self) -> Vec<String> {
        self.lock().statements.clone()
    }

    /// Non-control statements that were part of a committed transaction
    /// (or ran outside one)
    pub fn committed_statements(&self) -> Vec<String> {
        self.lock().committed_statements.clone()
    }

    /// Committed ledger rows, sorted
    pub fn ledger(&self) -> Vec<String> {
        self.lock().ledger.iter().cloned().collect()
    }

    pub fn commits(&self) -> usize {
        self.lock().commits
    }

    pub fn rollbacks(&self) -> usize {
        self.lock().rollbacks
    }

    pub fn in_transaction(&self) -> bool {
        self.lock().in_transaction
    }

    /// Highest number of statements that were in flight at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Reject `sql` if the session is aborted or `sql` matches an injected
    /// failure. `ROLLBACK` always gets through.
    fn check_failure(&self, state: &mut FakeState, sql: &str) -> DbResult<()> {
        let is_rollback = sql.trim().eq_ignore_ascii_case("ROLLBACK");
        if state.aborted && !is_rollback {
            return Err(DbError::TransactionAborted(ABORTED.to_string()));
        }
        match self.fail_on.iter().find(|needle| sql.contains(needle.as_str())) {
            Some(needle) => {
                if self.aborts_session && state.in_transaction {
                    state.aborted = true;
                }
                Err(DbError::ExecutionError(format!(
                    "injected failure on '{}'",
                    needle
                )))
            }
            None => Ok(()),
        }
    }

    /// Hold an in-flight slot across one scheduler yield so concurrent
    /// callers overlap.
    async fn in_flight(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn record(&self, state: &mut FakeState, sql: &str) {
        if state.in_transaction {
            state.pending_statements.push(sql.to_string());
        } else {
            state.committed_statements.push(sql.to_string());
        }
    }
}

#[async_trait]
impl Database for FakeDatabase {
    async fn ping(&self) -> DbResult<()> {
        if self.fail_ping {
            return Err(DbError::ConnectionError("injected ping failure".to_string()));
        }
        Ok(())
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.in_flight().await;
        let mut state = self.lock();
        state.statements.push(sql.to_string());
        self.check_failure(&mut state, sql)?;

        match sql.trim().to_ascii_uppercase().as_str() {
            "BEGIN" => {
                if state.in_transaction {
                    return Err(DbError::TransactionError(
                        "transaction already open".to_string(),
                    ));
                }
                state.in_transaction = true;
            }
            "COMMIT" => {
                if !state.in_transaction {
                    return Err(DbError::TransactionError("no open transaction".to_string()));
                }
                let rows = std::mem::take(&mut state.pending_ledger);
                state.ledger.extend(rows);
                let statements = std::mem::take(&mut state.pending_statements);
                state.committed_statements.extend(statements);
                state.in_transaction = false;
                state.commits += 1;
            }
            "ROLLBACK" => {
                state.aborted = false;
                state.pending_ledger.clear();
                state.pending_statements.clear();
                state.in_transaction = false;
                state.rollbacks += 1;
            }
            _ => self.record(&mut state, sql),
        }
        Ok(())
    }

    async fn execute(&self, sql: &str, params: &[&str]) -> DbResult<u64> {
        self.in_flight().await;
        let mut state = self.lock();
        state.statements.push(sql.to_string());
        self.check_failure(&mut state, sql)?;

        if sql.starts_with(&format!("INSERT INTO {LEDGER_TABLE}")) {
            let name = params
                .first()
                .ok_or_else(|| DbError::ExecutionError("missing name parameter".to_string()))?
                .to_string();
            if state.ledger.contains(&name) || state.pending_ledger.contains(&name) {
                return Err(DbError::UniqueViolation(format!(
                    "{LEDGER_TABLE}.name = '{name}'"
                )));
            }
            if state.in_transaction {
                state.pending_ledger.push(name);
            } else {
                state.ledger.insert(name);
            }
        } else {
            self.record(&mut state, sql);
        }
        Ok(1)
    }

    async fn query_strings(&self, sql: &str, _params: &[&str]) -> DbResult<Vec<String>> {
        let mut state = self.lock();
        state.statements.push(sql.to_string());
        self.check_failure(&mut state, sql)?;

        if sql.contains(&format!("FROM {LEDGER_TABLE}")) {
            let mut rows: Vec<String> = state.ledger.iter().cloned().collect();
            rows.extend(state.pending_ledger.iter().cloned());
            return Ok(rows);
        }
        Ok(Vec::new())
    }

    fn db_type(&self) -> &'static str {
        "fake"
    }
}
