//! Task dependency graph for cycle detection.
//!
//! Edges point from a task to each task it depends on. Dependencies on tasks
//! outside the supplied set still become nodes, so a graph built from a
//! partial view never hides an edge.

use super::{Task, TaskId};
use petgraph::algo::{has_path_connecting, tarjan_scc};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use std::collections::HashMap;

/// Directed "depends on" graph over task identifiers.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<TaskId, ()>,
    index: HashMap<TaskId, NodeIndex>,
}

impl DependencyGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph from the dependency lists of `tasks`.
    #[must_use]
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut graph = Self::new();
        for task in tasks {
            graph.add_node(task.id());
            for dependency in task.dependencies() {
                graph.add_edge(task.id(), *dependency);
            }
        }
        graph
    }

    /// Adds a task node if it is not present yet.
    pub fn add_node(&mut self, task_id: TaskId) -> NodeIndex {
        if let Some(&existing) = self.index.get(&task_id) {
            return existing;
        }
        let node = self.graph.add_node(task_id);
        self.index.insert(task_id, node);
        node
    }

    /// Records that `task_id` depends on `dependency_id`.
    pub fn add_edge(&mut self, task_id: TaskId, dependency_id: TaskId) {
        let from = self.add_node(task_id);
        let to = self.add_node(dependency_id);
        if self.graph.find_edge(from, to).is_none() {
            self.graph.add_edge(from, to, ());
        }
    }

    /// Returns whether making `task_id` depend on `dependency_id` would close
    /// a cycle, including the trivial self-dependency.
    #[must_use]
    pub fn would_create_cycle(&self, task_id: TaskId, dependency_id: TaskId) -> bool {
        if task_id == dependency_id {
            return true;
        }
        match (self.index.get(&dependency_id), self.index.get(&task_id)) {
            (Some(&from), Some(&to)) => has_path_connecting(&self.graph, from, to, None),
            _ => false,
        }
    }

    /// Returns `task_id` and every task it transitively depends on.
    ///
    /// These are the tasks whose dependency lists decide
    /// [`Self::would_create_cycle`] for an edge pointing at `task_id`.
    #[must_use]
    pub fn reachable_from(&self, task_id: TaskId) -> Vec<TaskId> {
        let Some(&start) = self.index.get(&task_id) else {
            return vec![task_id];
        };
        let mut reached = Vec::new();
        let mut dfs = Dfs::new(&self.graph, start);
        while let Some(node) = dfs.next(&self.graph) {
            if let Some(id) = self.graph.node_weight(node) {
                reached.push(*id);
            }
        }
        reached
    }

    /// Returns the tasks on one dependency cycle, if the graph has any.
    ///
    /// The returned identifiers are sorted for stable reporting.
    #[must_use]
    pub fn find_cycle(&self) -> Option<Vec<TaskId>> {
        tarjan_scc(&self.graph).into_iter().find_map(|component| {
            let is_cycle = match component.as_slice() {
                [single] => self.graph.find_edge(*single, *single).is_some(),
                nodes => nodes.len() > 1,
            };
            if !is_cycle {
                return None;
            }
            let mut members: Vec<TaskId> = component
                .iter()
                .filter_map(|node| self.graph.node_weight(*node).copied())
                .collect();
            members.sort();
            Some(members)
        })
    }

    /// Returns whether the graph contains any cycle.
    #[must_use]
    pub fn has_cycle(&self) -> bool {
        self.find_cycle().is_some()
    }
}
