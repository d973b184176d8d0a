//! Dependency validation
//!
//! The scheduler requires an acyclic graph of known units. This module
//! checks that precondition before anything is dispatched and can compute
//! a build order for display.

use std::collections::{BTreeMap, BTreeSet};

use crate::core::unit::Unit;
use crate::error::ResolverError;

/// Dependency graph for build units
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Adjacency list: unit -> dependencies
    edges: BTreeMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from unit descriptors, rejecting duplicate names
    pub fn from_units(units: &[Unit]) -> Result<Self, ResolverError> {
        let mut graph = Self::new();
        for unit in units {
            if graph.edges.contains_key(&unit.name) {
                return Err(ResolverError::DuplicateUnit {
                    name: unit.name.clone(),
                });
            }
            graph.add_unit(&unit.name, unit.depends_on.clone());
        }
        Ok(graph)
    }

    /// Add a unit to the graph
    pub fn add_unit(&mut self, name: &str, dependencies: Vec<String>) {
        self.edges.insert(name.to_string(), dependencies);
    }

    /// Check every dependency names a known unit and that there are no cycles
    pub fn validate(&self) -> Result<(), ResolverError> {
        for (unit, deps) in &self.edges {
            if let Some(missing) = deps.iter().find(|d| !self.edges.contains_key(*d)) {
                return Err(ResolverError::MissingDependency {
                    unit: unit.clone(),
                    dependency: missing.clone(),
                });
            }
        }
        self.topological_sort().map(|_| ())
    }

    /// Compute topological sort (build order)
    ///
    /// Returns units in order such that dependencies come before dependents.
    pub fn topological_sort(&self) -> Result<Vec<String>, ResolverError> {
        let mut visited = BTreeSet::new();
        let mut in_progress = BTreeSet::new();
        let mut result = Vec::new();
        let mut path = Vec::new();

        for node in self.edges.keys() {
            self.visit(node, &mut visited, &mut in_progress, &mut result, &mut path)?;
        }

        Ok(result)
    }

    fn visit(
        &self,
        node: &str,
        visited: &mut BTreeSet<String>,
        in_progress: &mut BTreeSet<String>,
        result: &mut Vec<String>,
        path: &mut Vec<String>,
    ) -> Result<(), ResolverError> {
        if in_progress.contains(node) {
            // Report only the looping part of the path
            let start = path.iter().position(|n| n == node).unwrap_or(0);
            let mut cycle = path[start..].to_vec();
            cycle.push(node.to_string());
            return Err(ResolverError::CircularDependency { cycle });
        }

        if visited.contains(node) {
            return Ok(());
        }

        in_progress.insert(node.to_string());
        path.push(node.to_string());

        if let Some(deps) = self.edges.get(node) {
            for dep in deps {
                self.visit(dep, visited, in_progress, result, path)?;
            }
        }

        path.pop();
        in_progress.remove(node);
        visited.insert(node.to_string());
        result.push(node.to_string());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::unit::UnitKind;

    fn unit(name: &str, deps: &[&str]) -> Unit {
        Unit::new(name, UnitKind::Npm, name).with_dependencies(deps.iter().copied())
    }

    #[test]
    fn test_simple_dependency_order() {
        let mut graph = DependencyGraph::new();
        graph.add_unit("app", vec!["lib".to_string()]);
        graph.add_unit("lib", vec![]);

        let order = graph.topological_sort().unwrap();
        let lib_pos = order.iter().position(|x| x == "lib").unwrap();
        let app_pos = order.iter().position(|x| x == "app").unwrap();

        assert!(lib_pos < app_pos, "lib should be built before app");
    }

    #[test]
    fn test_circular_dependency_detection() {
        let graph =
            DependencyGraph::from_units(&[unit("a", &["b"]), unit("b", &["c"]), unit("c", &["a"])])
                .unwrap();

        match graph.validate() {
            Err(ResolverError::CircularDependency { cycle }) => {
                assert_eq!(cycle.first(), cycle.last());
                assert_eq!(cycle.len(), 4);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let graph = DependencyGraph::from_units(&[unit("a", &["a"])]).unwrap();
        assert!(matches!(
            graph.topological_sort(),
            Err(ResolverError::CircularDependency { .. })
        ));
    }

    #[test]
    fn test_missing_dependency() {
        let graph = DependencyGraph::from_units(&[unit("a", &["ghost"])]).unwrap();
        assert_eq!(
            graph.validate(),
            Err(ResolverError::MissingDependency {
                unit: "a".to_string(),
                dependency: "ghost".to_string(),
            })
        );
    }

    #[test]
    fn test_duplicate_unit() {
        let result = DependencyGraph::from_units(&[unit("a", &[]), unit("a", &[])]);
        assert!(matches!(result, Err(ResolverError::DuplicateUnit { name }) if name == "a"));
    }

    #[test]
    fn test_diamond_is_valid() {
        let graph = DependencyGraph::from_units(&[
            unit("a", &[]),
            unit("b", &["a"]),
            unit("c", &["a"]),
            unit("d", &["b", "c"]),
        ])
        .unwrap();

        assert!(graph.validate().is_ok());
        let order = graph.topological_sort().unwrap();
        assert_eq!(order.first().map(String::as_str), Some("a"));
        assert_eq!(order.last().map(String::as_str), Some("d"));
    }
}
