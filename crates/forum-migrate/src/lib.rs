//! forum-migrate - Migration runner for the forum backend
//!
//! Applies the units a target depends on, in dependency order, inside a
//! single transaction, recording each applied migration in the ledger.

pub mod error;
pub mod runner;

pub use error::{MigrateError, MigrateResult};
pub use runner::{Plan, RunReport, Runner, DEFAULT_MAX_PARALLEL, DEFAULT_TARGET};
