//! The migration graph: units keyed by name plus their executed state

use crate::error::{CoreError, CoreResult};
use crate::unit::Unit;
use crate::unit_name::UnitName;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};

/// Units keyed by name.
///
/// Every graph contains the executed sentinel `nothing`. The only way to flip
/// a unit to executed is [`mark_run`](Self::mark_run).
#[derive(Debug, Clone)]
pub struct MigrationGraph {
    units: HashMap<UnitName, Unit>,
}

impl MigrationGraph {
    /// Create a graph holding only the sentinel
    pub fn new() -> Self {
        let sentinel = Unit::sentinel();
        let mut units = HashMap::new();
        units.insert(sentinel.name.clone(), sentinel);
        Self { units }
    }

    /// Add a unit under its own name
    pub fn insert(&mut self, unit: Unit) -> CoreResult<()> {
        if self.units.contains_key(&unit.name) {
            return Err(CoreError::DuplicateUnit {
                name: unit.name.to_string(),
            });
        }
        self.units.insert(unit.name.clone(), unit);
        Ok(())
    }

    /// Number of units, sentinel included
    pub fn size(&self) -> usize {
        self.units.len()
    }

    /// Number of units not yet executed
    pub fn remaining_size(&self) -> usize {
        self.units.values().filter(|u| !u.executed).count()
    }

    /// Check if a unit exists
    pub fn contains(&self, name: &str) -> bool {
        self.units.contains_key(name)
    }

    /// Snapshot copy of a unit
    pub fn get(&self, name: &str) -> CoreResult<Unit> {
        self.units
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::UnitNotFound {
                name: name.to_string(),
            })
    }

    /// All units sorted by name
    pub fn units(&self) -> Vec<&Unit> {
        let mut units: Vec<&Unit> = self.units.values().collect();
        units.sort_by(|a, b| a.name.cmp(&b.name));
        units
    }

    /// Check structural invariants.
    ///
    /// Executed units are exempt from the dependency checks: a trimmed
    /// subgraph may legitimately drop what they depended on.
    pub fn validate(&self) -> CoreResult<()> {
        let mut keys: Vec<&UnitName> = self.units.keys().collect();
        keys.sort();

        for key in keys {
            let unit = &self.units[key];
            if unit.name != *key {
                return Err(CoreError::NameMismatch {
                    key: key.to_string(),
                    name: unit.name.to_string(),
                });
            }
            if unit.is_target() && !unit.postgres_sql().trim().is_empty() {
                return Err(CoreError::TargetHasSql {
                    name: unit.name.to_string(),
                });
            }
            if unit.executed {
                continue;
            }
            if unit.depends_on.is_empty() {
                return Err(CoreError::NoDependencies {
                    name: unit.name.to_string(),
                });
            }
            if let Some(missing) = unit.depends_on.iter().find(|d| !self.contains(d)) {
                return Err(CoreError::MissingDependency {
                    unit: unit.name.to_string(),
                    dependency: missing.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Whether a unit exists, is pending, and has every dependency executed
    pub fn can_run(&self, name: &str) -> bool {
        let Some(unit) = self.units.get(name) else {
            return false;
        };
        if unit.executed {
            return false;
        }
        unit.depends_on.iter().all(|dep| {
            dep.is_nothing() || self.units.get(dep.as_str()).is_some_and(|d| d.executed)
        })
    }

    /// Every unit that can run now. No ordering is implied.
    pub fn runnable(&self) -> HashSet<UnitName> {
        self.units
            .keys()
            .filter(|name| self.can_run(name))
            .cloned()
            .collect()
    }

    /// Pending units remain but none can run
    pub fn is_stuck(&self) -> bool {
        self.remaining_size() > 0 && self.runnable().is_empty()
    }

    /// Mark units as executed.
    ///
    /// Stops at the first unknown name; marks applied before it are kept.
    pub fn mark_run<I, S>(&mut self, names: I) -> CoreResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let name = name.as_ref();
            let unit = self.units.get_mut(name).ok_or_else(|| CoreError::UnitNotFound {
                name: name.to_string(),
            })?;
            unit.executed = true;
        }
        Ok(())
    }

    /// Extract the transitive dependency closure of a target unit.
    ///
    /// Executed flags carry over. The result is validated before return.
    pub fn subgraph(&self, target: &str) -> CoreResult<MigrationGraph> {
        let root = self.units.get(target).ok_or_else(|| CoreError::UnitNotFound {
            name: target.to_string(),
        })?;
        if !root.is_target() {
            return Err(CoreError::NotATarget {
                name: target.to_string(),
                kind: root.kind.to_string(),
            });
        }

        let mut sub = MigrationGraph::new();
        let mut stack: Vec<(&UnitName, &UnitName)> = vec![(&root.name, &root.name)];

        while let Some((parent, name)) = stack.pop() {
            if sub.contains(name) {
                continue;
            }
            let unit = self
                .units
                .get(name)
                .ok_or_else(|| CoreError::MissingDependency {
                    unit: parent.to_string(),
                    dependency: name.to_string(),
                })?;
            for dep in unit.depends_on_without_nothing() {
                if !sub.contains(dep) {
                    stack.push((&unit.name, dep));
                }
            }
            sub.units.insert(unit.name.clone(), unit.clone());
        }

        sub.validate()?;
        Ok(sub)
    }

    /// Describe a dependency cycle among pending units, if there is one.
    ///
    /// Reads as "a -> b -> a" where each arrow means "depends on".
    pub fn cycle_path(&self) -> Option<String> {
        let mut graph: DiGraph<&UnitName, ()> = DiGraph::new();
        let mut index: HashMap<&UnitName, NodeIndex> = HashMap::new();

        let mut pending: Vec<&Unit> = self.units.values().filter(|u| !u.executed).collect();
        pending.sort_by(|a, b| a.name.cmp(&b.name));
        for unit in &pending {
            index.insert(&unit.name, graph.add_node(&unit.name));
        }
        for unit in &pending {
            for dep in unit.depends_on_without_nothing() {
                if let Some(&to) = index.get(dep) {
                    graph.update_edge(index[&unit.name], to, ());
                }
            }
        }

        let component = tarjan_scc(&graph).into_iter().find(|scc| {
            scc.len() > 1 || graph.find_edge(scc[0], scc[0]).is_some()
        })?;
        let members: HashSet<NodeIndex> = component.iter().copied().collect();
        let start = component.iter().copied().min_by_key(|n| graph[*n])?;

        let mut path = vec![start];
        let mut seen: HashMap<NodeIndex, usize> = HashMap::new();
        seen.insert(start, 0);
        let mut current = start;
        loop {
            let next = graph.neighbors(current).find(|n| members.contains(n))?;
            if let Some(&pos) = seen.get(&next) {
                let names: Vec<&str> = path[pos..]
                    .iter()
                    .chain(std::iter::once(&next))
                    .map(|n| graph[*n].as_str())
                    .collect();
                return Some(names.join(" -> "));
            }
            seen.insert(next, path.len());
            path.push(next);
            current = next;
        }
    }
}

impl Default for MigrationGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "graph_test.rs"]
mod tests;
