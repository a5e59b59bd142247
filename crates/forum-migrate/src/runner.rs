//! The migration runner.
//!
//! A run extracts the target's subgraph, seeds it with what the ledger says is
//! already applied, then applies the remaining units round by round: every
//! runnable unit of a round executes concurrently, and the next round starts
//! only after the whole round succeeded. The entire run shares one database
//! transaction, so any failure leaves both schema and ledger untouched.

use crate::error::{MigrateError, MigrateResult};
use forum_core::{load_graph, AssetSource, MigrationGraph, Unit, UnitName};
use forum_db::{Database, Ledger};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;

/// Target applied when the operator names none
pub const DEFAULT_TARGET: &str = "default";

/// Default bound on concurrently executing units within a round
pub const DEFAULT_MAX_PARALLEL: usize = 8;

/// What a successful run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Units executed per round, each round sorted by name
    pub rounds: Vec<Vec<String>>,
    /// Units whose SQL was submitted
    pub executed_sql: usize,
    /// Units newly recorded in the ledger
    pub recorded: usize,
    /// Units skipped because the ledger already had them
    pub already_applied: usize,
}

impl RunReport {
    /// Total units run across all rounds
    pub fn units_run(&self) -> usize {
        self.rounds.iter().map(Vec::len).sum()
    }
}

/// Rounds a run would execute, computed without applying anything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub target: String,
    pub already_applied: usize,
    pub rounds: Vec<Vec<String>>,
}

/// Outcome of one unit inside a round
#[derive(Debug, Clone, Copy)]
struct UnitOutcome {
    executed_sql: bool,
    recorded: bool,
}

/// Applies migration units against one database session
pub struct Runner {
    db: Arc<dyn Database>,
    ledger: Ledger,
    max_parallel: usize,
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("db", &self.db.db_type())
            .field("max_parallel", &self.max_parallel)
            .finish()
    }
}

/// Runnable units sorted by name
fn frontier(graph: &MigrationGraph) -> Vec<UnitName> {
    let mut names: Vec<UnitName> = graph.runnable().into_iter().collect();
    names.sort();
    names
}

fn stuck(graph: &MigrationGraph) -> MigrateError {
    MigrateError::Stuck {
        nodes: graph
            .units()
            .into_iter()
            .filter(|u| !u.is_executed())
            .map(|u| u.name.to_string())
            .collect(),
        cycle: graph.cycle_path(),
    }
}

fn names(units: &[UnitName]) -> Vec<String> {
    units.iter().map(ToString::to_string).collect()
}

impl Runner {
    pub fn new(db: Arc<dyn Database>) -> Self {
        let ledger = Ledger::new(Arc::clone(&db));
        Self {
            db,
            ledger,
            max_parallel: DEFAULT_MAX_PARALLEL,
        }
    }

    /// Bound the number of units executing at once within a round
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Ping the database and make sure the ledger table exists
    async fn open(&self) -> MigrateResult<()> {
        self.db.ping().await.map_err(MigrateError::db("ping"))?;
        log::info!("Connected to {} database", self.db.db_type());

        self.ledger
            .bootstrap()
            .await
            .map_err(MigrateError::db("ledger bootstrap"))?;
        log::info!("Ledger bootstrapped");
        Ok(())
    }

    /// Validate the full graph, extract `target`, and mark what the ledger
    /// already holds as executed.
    async fn resolve(
        &self,
        graph: MigrationGraph,
        target: &str,
    ) -> MigrateResult<(MigrationGraph, usize)> {
        graph.validate().map_err(MigrateError::Validate)?;
        log::info!("Validated {} units", graph.size());

        let mut sub = graph
            .subgraph(target)
            .map_err(|source| MigrateError::Subgraph {
                target: target.to_string(),
                source,
            })?;
        log::info!("Target '{}' spans {} units", target, sub.size());

        let applied = self
            .ledger
            .list_applied()
            .await
            .map_err(MigrateError::db("ledger read"))?;
        let (known, foreign): (Vec<String>, Vec<String>) =
            applied.into_iter().partition(|name| sub.contains(name));
        if !foreign.is_empty() {
            log::debug!(
                "{} applied units belong to other targets: {}",
                foreign.len(),
                foreign.join(", ")
            );
        }
        sub.mark_run(&known).map_err(MigrateError::Seed)?;
        log::info!(
            "Seeded {} applied units, {} remaining",
            known.len(),
            sub.remaining_size()
        );
        Ok((sub, known.len()))
    }

    /// Load the unit tree under `base` and apply `target`
    pub async fn run(
        &self,
        source: &dyn AssetSource,
        base: &str,
        target: &str,
    ) -> MigrateResult<RunReport> {
        self.open().await?;
        let graph = load_graph(source, base).map_err(MigrateError::Load)?;
        let (sub, already_applied) = self.resolve(graph, target).await?;
        let mut report = self.apply(sub).await?;
        report.already_applied = already_applied;
        Ok(report)
    }

    /// Apply `target` from an already built graph
    pub async fn run_graph(&self, graph: MigrationGraph, target: &str) -> MigrateResult<RunReport> {
        self.open().await?;
        let (sub, already_applied) = self.resolve(graph, target).await?;
        let mut report = self.apply(sub).await?;
        report.already_applied = already_applied;
        Ok(report)
    }

    /// Compute the rounds `run` would execute without opening a transaction
    pub async fn plan(
        &self,
        source: &dyn AssetSource,
        base: &str,
        target: &str,
    ) -> MigrateResult<Plan> {
        let graph = load_graph(source, base).map_err(MigrateError::Load)?;
        self.plan_graph(graph, target).await
    }

    /// Compute the rounds for an already built graph
    pub async fn plan_graph(&self, graph: MigrationGraph, target: &str) -> MigrateResult<Plan> {
        self.open().await?;
        let (mut sub, already_applied) = self.resolve(graph, target).await?;

        let mut rounds = Vec::new();
        loop {
            let next = frontier(&sub);
            if next.is_empty() {
                break;
            }
            sub.mark_run(&next).map_err(MigrateError::Graph)?;
            rounds.push(names(&next));
        }
        if sub.is_stuck() {
            return Err(stuck(&sub));
        }

        Ok(Plan {
            target: target.to_string(),
            already_applied,
            rounds,
        })
    }

    /// Roll back after `err`, logging rather than masking a rollback failure
    async fn abort(&self, err: MigrateError) -> MigrateError {
        match err.unit() {
            Some(unit) => log::error!("Migration failed on unit '{}': {}", unit, err),
            None => log::error!("Migration failed: {}", err),
        }
        if let Err(rb) = self.db.rollback().await {
            log::warn!("Rollback failed: {}", rb);
        } else {
            log::info!("Rolled back");
        }
        err
    }

    /// Execute every pending unit of a resolved subgraph inside one transaction
    async fn apply(&self, mut graph: MigrationGraph) -> MigrateResult<RunReport> {
        let mut report = RunReport::default();
        self.db.begin().await.map_err(MigrateError::db("begin"))?;

        if graph.is_stuck() {
            return Err(self.abort(stuck(&graph)).await);
        }

        loop {
            let round = frontier(&graph);
            if round.is_empty() {
                break;
            }
            let started = Instant::now();
            log::info!(
                "Round {}: {} units ({})",
                report.rounds.len() + 1,
                round.len(),
                round.join(", ")
            );

            let outcomes = match self.apply_round(&graph, &round).await {
                Ok(outcomes) => outcomes,
                Err(e) => return Err(self.abort(e).await),
            };
            if let Err(e) = graph.mark_run(&round) {
                return Err(self.abort(MigrateError::Graph(e)).await);
            }

            report.executed_sql += outcomes.iter().filter(|o| o.executed_sql).count();
            report.recorded += outcomes.iter().filter(|o| o.recorded).count();
            report.rounds.push(names(&round));
            log::debug!(
                "Round {} finished in {}ms",
                report.rounds.len(),
                started.elapsed().as_millis()
            );

            if graph.is_stuck() {
                return Err(self.abort(stuck(&graph)).await);
            }
        }

        self.db.commit().await.map_err(MigrateError::db("commit"))?;
        log::info!(
            "Committed {} units in {} rounds",
            report.units_run(),
            report.rounds.len()
        );
        Ok(report)
    }

    /// Run one frontier concurrently, at most `max_parallel` units at a time.
    ///
    /// Every unit is awaited even after a failure. Results arrive in
    /// completion order; the first failure that is not an echo of an aborted
    /// transaction names the culprit.
    async fn apply_round(
        &self,
        graph: &MigrationGraph,
        round: &[UnitName],
    ) -> MigrateResult<Vec<UnitOutcome>> {
        let tasks = round.iter().map(|name| async move {
            let unit = graph.get(name).map_err(MigrateError::Graph)?;
            self.apply_unit(&unit).await
        });
        let results: Vec<MigrateResult<UnitOutcome>> = stream::iter(tasks)
            .buffer_unordered(self.max_parallel)
            .collect()
            .await;

        let mut outcomes = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => failures.push(e),
            }
        }
        if failures.is_empty() {
            return Ok(outcomes);
        }

        let culprit = failures
            .iter()
            .position(|e| !e.is_transaction_aborted())
            .unwrap_or(0);
        let err = failures.remove(culprit);
        for other in &failures {
            log::debug!("Also failed in this round: {}", other);
        }
        Err(err)
    }

    /// Apply one unit's SQL, then record it in the ledger
    async fn apply_unit(&self, unit: &Unit) -> MigrateResult<UnitOutcome> {
        let failed = |source| MigrateError::UnitFailed {
            unit: unit.name.to_string(),
            source,
        };

        let sql = unit.postgres_sql();
        let executed_sql = !sql.trim().is_empty();
        if executed_sql {
            log::debug!("Applying {} ({})", unit.name, unit.kind);
            self.db.execute_batch(sql).await.map_err(failed)?;
        }

        let recorded = self.ledger.mark_applied(unit).await.map_err(failed)?;
        Ok(UnitOutcome {
            executed_sql,
            recorded,
        })
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
