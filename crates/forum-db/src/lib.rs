//! forum-db - Database layer for the forum backend
//!
//! This crate provides the `Database` trait, its PostgreSQL implementation,
//! and the ledger of applied migration units.

pub mod error;
pub mod ledger;
pub mod postgres;
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
pub mod traits;

pub use error::{DbError, DbResult};
pub use ledger::{Ledger, LEDGER_TABLE};
pub use postgres::PostgresBackend;
pub use traits::Database;
