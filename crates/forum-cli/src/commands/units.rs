//! Units command: list the dependency closure of a migration target offline

use anyhow::{Context, Result};
use forum_core::{load_graph, AssetSource, UnitKind};
use serde::Serialize;

use crate::cli::{GlobalArgs, UnitsArgs, UnitsOutput};
use crate::commands::common::{load_config, migration_source};

/// Unit information for display
#[derive(Debug, Serialize)]
pub(crate) struct UnitInfo {
    name: String,
    #[serde(rename = "type")]
    kind: UnitKind,
    always_exec: bool,
    depends_on: Vec<String>,
    description: String,
}

/// Execute the units command
pub(crate) async fn execute(args: &UnitsArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let source = migration_source(global)?;
    let units = collect(&source, &config.migrations.base, &args.migtarget)?;

    match args.output {
        UnitsOutput::Table => print_table(&units),
        UnitsOutput::Json => print_json(&units)?,
    }
    Ok(())
}

/// Units of `target`'s subgraph, sorted by name, sentinel excluded
pub(crate) fn collect(source: &dyn AssetSource, base: &str, target: &str) -> Result<Vec<UnitInfo>> {
    let graph = load_graph(source, base)
        .with_context(|| format!("Failed to load units from {}", source.describe()))?;
    graph.validate().context("Unit graph is invalid")?;
    let sub = graph
        .subgraph(target)
        .with_context(|| format!("Cannot resolve target '{}'", target))?;

    Ok(sub
        .units()
        .into_iter()
        .filter(|u| !u.name.is_nothing())
        .map(|u| UnitInfo {
            name: u.name.to_string(),
            kind: u.kind,
            always_exec: u.always_exec,
            depends_on: u
                .depends_on_without_nothing()
                .map(ToString::to_string)
                .collect(),
            description: u.description.clone(),
        })
        .collect())
}

fn print_table(units: &[UnitInfo]) {
    let name_width = units.iter().map(|u| u.name.len()).max().unwrap_or(4).max(4);
    let type_width = 9;
    let always_width = 6;

    println!(
        "{:<name_width$}  {:<type_width$}  {:<always_width$}  DEPENDS_ON",
        "NAME", "TYPE", "ALWAYS",
    );
    println!(
        "{:-<name_width$}  {:-<type_width$}  {:-<always_width$}  {}",
        "",
        "",
        "",
        "-".repeat(40),
    );

    for unit in units {
        let deps = if unit.depends_on.is_empty() {
            "-".to_string()
        } else {
            unit.depends_on.join(", ")
        };
        let always = if unit.always_exec { "yes" } else { "-" };
        println!(
            "{:<name_width$}  {:<type_width$}  {:<always_width$}  {}",
            unit.name,
            unit.kind.to_string(),
            always,
            deps,
        );
    }

    println!();
    println!("{} units", units.len());
}

fn print_json(units: &[UnitInfo]) -> Result<()> {
    let json = serde_json::to_string_pretty(units).context("Failed to serialize units")?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
#[path = "units_test.rs"]
mod tests;
