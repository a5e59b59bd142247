//! forum-core - Core library for the forum backend
//!
//! This crate provides the migration unit model, asset sources and the unit
//! loader, the migration graph, configuration parsing, and the snowflake ID
//! generator.

pub mod assets;
pub mod config;
pub mod error;
pub mod graph;
pub mod id;
pub mod loader;
pub mod unit;
pub mod unit_name;

pub use assets::{AssetSource, DirSource, EmbeddedSource, LayeredSource};
pub use config::{Config, PostgresConfig, SslMode};
pub use error::{CoreError, CoreResult};
pub use graph::MigrationGraph;
pub use id::{IdParts, Snowflake};
pub use loader::{load_graph, load_unit, walk};
pub use unit::{Unit, UnitKind};
pub use unit_name::{UnitName, NOTHING};
