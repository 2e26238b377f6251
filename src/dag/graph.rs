// src/dag/graph.rs

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::dag::registry::TaskRegistry;
use crate::engine::TaskName;

/// `petgraph` view of the registry.
///
/// Edge direction is prerequisite → dependent: for `styles` depending on
/// `sprite` there is an edge `sprite -> styles`. Prerequisites that are not
/// registered are left out; [`TaskRegistry::resolve`] reports those.
#[derive(Debug, Clone)]
pub struct DagGraph {
    graph: DiGraph<TaskName, ()>,
    index: HashMap<TaskName, NodeIndex>,
}

impl DagGraph {
    pub fn from_registry(registry: &TaskRegistry) -> Self {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();

        for name in registry.names() {
            let idx = graph.add_node(name.to_string());
            index.insert(name.to_string(), idx);
        }

        for def in registry.tasks() {
            let to = index[def.name()];
            for dep in def.prerequisites() {
                if let Some(&from) = index.get(dep) {
                    graph.add_edge(from, to, ());
                }
            }
        }

        Self { graph, index }
    }

    /// Return all task names.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(|s| s.as_str())
    }

    /// Tasks that list `name` as a prerequisite.
    pub fn dependents_of(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Outgoing)
    }

    /// Registered prerequisites of `name`.
    pub fn dependencies_of(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Incoming)
    }

    /// Tasks nothing depends on (entry points such as `default`).
    pub fn entry_points(&self) -> Vec<&str> {
        let mut entries: Vec<&str> = self
            .tasks()
            .filter(|name| self.dependents_of(name).is_empty())
            .collect();
        entries.sort_unstable();
        entries
    }

    /// A whole-graph topological order, or `None` if the graph has a cycle.
    pub fn topological_order(&self) -> Option<Vec<&str>> {
        toposort(&self.graph, None).ok().map(|nodes| {
            nodes
                .into_iter()
                .map(|idx| self.graph[idx].as_str())
                .collect()
        })
    }

    fn neighbors(&self, name: &str, dir: Direction) -> Vec<&str> {
        let Some(&idx) = self.index.get(name) else {
            return Vec::new();
        };
        let mut names: Vec<&str> = self
            .graph
            .neighbors_directed(idx, dir)
            .map(|n| self.graph[n].as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::exec::NoopAction;

    #[test]
    fn dependents_and_entry_points() {
        let mut reg = TaskRegistry::new();
        reg.register("sprite", Vec::<String>::new(), Arc::new(NoopAction)).unwrap();
        reg.register("styles", ["sprite"], Arc::new(NoopAction)).unwrap();
        reg.register("default", ["styles"], Arc::new(NoopAction)).unwrap();

        let graph = reg.graph();
        assert_eq!(graph.dependents_of("sprite"), vec!["styles"]);
        assert_eq!(graph.dependencies_of("default"), vec!["styles"]);
        assert_eq!(graph.entry_points(), vec!["default"]);

        let order = graph.topological_order().unwrap();
        assert_eq!(order, vec!["sprite", "styles", "default"]);
    }
}
