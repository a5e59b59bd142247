//! Unit loading from an asset source

use crate::assets::AssetSource;
use crate::error::{CoreError, CoreResult};
use crate::graph::MigrationGraph;
use crate::unit::{Unit, UnitFile};
use crate::unit_name::UnitName;

/// The one extension unit files may carry.
pub const UNIT_EXTENSION: &str = "yaml";

fn display_path(base: &str, relpath: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        relpath.to_string()
    } else {
        format!("{base}/{relpath}")
    }
}

/// Load and decode a single unit file.
///
/// The unit name is `relpath` with the `.yaml` extension stripped, so
/// `extras/audit.yaml` yields the unit `extras/audit`.
pub fn load_unit(source: &dyn AssetSource, base: &str, relpath: &str) -> CoreResult<Unit> {
    let path = display_path(base, relpath);

    let Some(stem) = relpath
        .strip_suffix(UNIT_EXTENSION)
        .and_then(|s| s.strip_suffix('.'))
    else {
        return Err(CoreError::UnknownExtension {
            path,
            expected: UNIT_EXTENSION,
        });
    };

    let name = UnitName::try_new(stem).ok_or_else(|| CoreError::EmptyUnitName {
        path: path.clone(),
    })?;

    let data = source
        .read(base, relpath)?
        .ok_or_else(|| CoreError::UnitFileNotFound { path: path.clone() })?;

    let file: UnitFile =
        serde_yaml::from_slice(&data).map_err(|e| CoreError::UnitDecode { path, source: e })?;

    Ok(Unit::from_file(name, file))
}

/// Load every file under `base`, in path order.
pub fn walk(source: &dyn AssetSource, base: &str) -> CoreResult<Vec<Unit>> {
    source
        .list(base)?
        .iter()
        .map(|relpath| load_unit(source, base, relpath))
        .collect()
}

/// Load every unit under `base` into a fresh graph.
///
/// The graph is not validated here; callers decide when to validate.
pub fn load_graph(source: &dyn AssetSource, base: &str) -> CoreResult<MigrationGraph> {
    let units = walk(source, base)?;
    log::info!(
        "Loaded {} units from '{}' ({})",
        units.len(),
        base,
        source.describe()
    );

    let mut graph = MigrationGraph::new();
    for unit in units {
        graph.insert(unit)?;
    }
    Ok(graph)
}

#[cfg(test)]
#[path = "loader_test.rs"]
mod tests;
