// src/dag/graph.rs

//! The dependency graph itself: incremental construction, cycle detection,
//! and ready-set computation.

use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::{debug, warn};

use crate::errors::{RegisterError, Result};

/// A directed acyclic graph of task names with "must-run-after" edges.
///
/// Two adjacency views are kept in sync:
/// - `parents[name]` — names `name` must run after; mutated as parents
///   complete and removed from the graph.
/// - `children[name]` — names that depend on `name`.
///
/// `original_parents` is a separate, immutable snapshot of `parents` taken at
/// insertion time, kept around for the scheduler's skip-dependents policy
/// even after the live `parents` list has been stripped down.
#[derive(Debug, Default)]
pub struct Dag {
    parents: HashMap<String, Vec<String>>,
    children: HashMap<String, HashSet<String>>,
    original_parents: HashMap<String, Vec<String>>,
}

impl Dag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `name` with the given `after` dependencies.
    ///
    /// Fails with [`RegisterError::AlreadyAdded`] if `name` is already
    /// present, [`RegisterError::UnknownDependency`] if any `after` name is
    /// absent (a self-dependency counts as unknown-at-insertion-time only if
    /// `name` hasn't been added yet, which it never has here — self-loops are
    /// instead caught by the cycle check below), or
    /// [`RegisterError::WouldCreateCycle`] if the insertion would introduce a
    /// cycle. On any error the graph is left exactly as it was before the
    /// call: edges are added, checked, then rolled back before the error is
    /// returned.
    pub fn add(&mut self, name: &str, after: &[String]) -> Result<()> {
        if self.parents.contains_key(name) {
            return Err(RegisterError::AlreadyAdded(name.to_string()));
        }

        let unknown: Vec<String> = after
            .iter()
            .filter(|dep| dep.as_str() != name && !self.parents.contains_key(dep.as_str()))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(RegisterError::UnknownDependency {
                name: name.to_string(),
                unknown,
            });
        }

        let after = after.to_vec();
        self.parents.insert(name.to_string(), after.clone());
        self.children.entry(name.to_string()).or_default();
        for dep in &after {
            self.children
                .entry(dep.clone())
                .or_default()
                .insert(name.to_string());
        }

        if after.iter().any(|dep| dep == name) || self.has_cycle() {
            // Roll back both directions of every edge we just added.
            for dep in &after {
                if let Some(kids) = self.children.get_mut(dep) {
                    kids.remove(name);
                }
            }
            self.parents.remove(name);
            self.children.remove(name);
            return Err(RegisterError::WouldCreateCycle(name.to_string()));
        }

        self.original_parents.insert(name.to_string(), after);
        debug!(task = name, "added to graph");
        Ok(())
    }

    /// Erase `name` and strip it from every child's parent list.
    ///
    /// Never fails. Tolerates a `name` that is already absent (a no-op) or
    /// partially-removed state, since the scheduler only ever removes a node
    /// it just observed completing.
    pub fn remove(&mut self, name: &str) {
        let children = self.children.remove(name).unwrap_or_default();
        for child in &children {
            if let Some(list) = self.parents.get_mut(child) {
                list.retain(|p| p != name);
            }
        }
        self.parents.remove(name);
        self.original_parents.remove(name);

        for kids in self.children.values_mut() {
            kids.remove(name);
        }
    }

    /// Names with no remaining parents, excluding anything in `active`.
    pub fn ready(&self, active: &HashSet<String>) -> Vec<String> {
        self.parents
            .iter()
            .filter(|(name, parents)| parents.is_empty() && !active.contains(name.as_str()))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Up to `k` ready names. Sorted lexicographically when `sort` is true,
    /// for a deterministic tie-break among simultaneously-ready tasks.
    pub fn get_candidates(&self, active: &HashSet<String>, k: usize, sort: bool) -> Vec<String> {
        let mut candidates = self.ready(active);
        if sort {
            candidates.sort();
        }
        candidates.truncate(k);
        candidates
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn original_parents_of(&self, name: &str) -> &[String] {
        self.original_parents
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parents.contains_key(name)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.parents.keys().map(String::as_str)
    }

    /// DFS cycle check over the live `parents` adjacency.
    fn has_cycle(&self) -> bool {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack: HashSet<&str> = HashSet::new();

        for name in self.parents.keys() {
            if !visited.contains(name.as_str()) && self.has_cycle_from(name, &mut visited, &mut stack) {
                warn!(task = %name, "cycle detected during insertion");
                return true;
            }
        }
        false
    }

    fn has_cycle_from<'a>(
        &'a self,
        name: &'a str,
        visited: &mut HashSet<&'a str>,
        stack: &mut HashSet<&'a str>,
    ) -> bool {
        visited.insert(name);
        stack.insert(name);

        if let Some(parents) = self.parents.get(name) {
            for parent in parents {
                let parent = parent.as_str();
                if stack.contains(parent) {
                    return true;
                }
                if !visited.contains(parent) && self.has_cycle_from(parent, visited, stack) {
                    return true;
                }
            }
        }

        stack.remove(name);
        false
    }

    /// Kahn-style layering of the *current* graph: each inner vector is a set
    /// of names that could run in parallel once every earlier level has
    /// completed. Diagnostic only; not used by the scheduling algorithm.
    pub fn levels(&self) -> Vec<Vec<String>> {
        let mut indegree: HashMap<&str, usize> = self
            .parents
            .iter()
            .map(|(name, parents)| (name.as_str(), parents.len()))
            .collect();

        let mut queue: Vec<&str> = indegree
            .iter()
            .filter(|(_, deg)| **deg == 0)
            .map(|(name, _)| *name)
            .collect();
        queue.sort();

        let mut levels = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();

        while !queue.is_empty() {
            let mut level: Vec<&str> = Vec::new();
            let mut next_queue: Vec<&str> = Vec::new();

            for name in queue {
                if !seen.insert(name) {
                    continue;
                }
                level.push(name);
                if let Some(children) = self.children.get(name) {
                    for child in children {
                        if let Some(deg) = indegree.get_mut(child.as_str()) {
                            *deg -= 1;
                            if *deg == 0 {
                                next_queue.push(child.as_str());
                            }
                        }
                    }
                }
            }

            if !level.is_empty() {
                level.sort();
                levels.push(level.into_iter().map(str::to_string).collect());
            }
            next_queue.sort();
            queue = next_queue;
        }

        levels
    }
}

impl fmt::Display for Dag {
    /// A plain-text diagnostic summary, in the spirit of the original's
    /// graph-summary formatter: node/edge counts, roots, leaves, and level
    /// count. Uncolored; not a CLI renderer.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut nodes: Vec<&str> = self.nodes().collect();
        nodes.sort();

        if nodes.is_empty() {
            return write!(f, "Graph: 0 nodes, 0 edges");
        }

        let num_edges: usize = self.children.values().map(HashSet::len).sum();
        let roots: Vec<&str> = nodes
            .iter()
            .copied()
            .filter(|n| self.parents.get(*n).map(Vec::is_empty).unwrap_or(true))
            .collect();
        let leaves: Vec<&str> = nodes
            .iter()
            .copied()
            .filter(|n| self.children.get(*n).map(HashSet::is_empty).unwrap_or(true))
            .collect();
        let levels = self.levels();

        writeln!(f, "Graph: {} nodes, {} edges", nodes.len(), num_edges)?;
        writeln!(f, "Roots: {}", roots.join(", "))?;
        writeln!(f, "Leaves: {}", leaves.join(", "))?;
        write!(f, "Levels: {}", levels.len())
    }
}
