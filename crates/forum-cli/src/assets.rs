//! Migration units compiled into the binary

use rust_embed::Embed;

/// Everything under `migrations/`, addressable with the `migrations` base
#[derive(Embed)]
#[folder = "migrations/"]
#[prefix = "migrations/"]
pub(crate) struct MigrationAssets;

#[cfg(test)]
#[path = "assets_test.rs"]
mod tests;
