//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use forum_core::{Config, LayeredSource};
use std::path::{Path, PathBuf};

use crate::assets::MigrationAssets;
use crate::cli::GlobalArgs;

/// Resolve configuration from `--config`, the working directory, and the
/// environment.
pub(crate) fn load_config(global: &GlobalArgs) -> Result<Config> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let config = Config::resolve(global.config.as_deref().map(Path::new), &cwd)
        .context("Failed to load configuration")?;
    log::debug!(
        "Database {} (sslmode {:?})",
        config.db.postgres.summary(),
        config.db.postgres.sslmode
    );
    Ok(config)
}

/// Embedded units, then `--migrations-dir`, then the working directory
pub(crate) fn migration_source(global: &GlobalArgs) -> Result<LayeredSource> {
    LayeredSource::standard::<MigrationAssets>(global.migrations_dir.as_ref().map(PathBuf::from))
        .context("Failed to set up migration sources")
}
