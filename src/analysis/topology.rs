use crate::error::{ReportError, Result};
use crate::store::{Label, Registry};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;

/// The dependency closure of a set of labels. Edges point from a dependency
/// to the label that consumes it.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: DiGraph<Label, ()>,
    index: HashMap<Label, NodeIndex>,
}

impl DependencyGraph {
    pub fn len(&self) -> usize { self.graph.node_count() }
    pub fn is_empty(&self) -> bool { self.graph.node_count() == 0 }
    pub fn contains(&self, label: &Label) -> bool { self.index.contains_key(label) }

    fn node(&mut self, label: &Label) -> (NodeIndex, bool) {
        if let Some(&idx) = self.index.get(label) {
            return (idx, false);
        }
        let idx = self.graph.add_node(label.clone());
        self.index.insert(label.clone(), idx);
        (idx, true)
    }

    /// Every dependency appears before its consumers.
    pub fn order(&self) -> Result<Vec<Label>> {
        toposort(&self.graph, None)
            .map(|nodes| nodes.into_iter().map(|n| self.graph[n].clone()).collect())
            .map_err(|cycle| ReportError::Cycle(self.graph[cycle.node_id()].clone()))
    }

    /// Groups labels by depth: layer 0 has no dependencies, layer `n` only
    /// depends on layers below `n`. Labels within a layer are independent.
    pub fn layers(&self) -> Result<Vec<Vec<Label>>> {
        let order = toposort(&self.graph, None)
            .map_err(|cycle| ReportError::Cycle(self.graph[cycle.node_id()].clone()))?;

        let mut depth = vec![0usize; self.graph.node_count()];
        let mut layers: Vec<Vec<Label>> = Vec::new();
        for node in order {
            let d = self
                .graph
                .neighbors_directed(node, Direction::Incoming)
                .map(|dep| depth[dep.index()] + 1)
                .max()
                .unwrap_or(0);
            depth[node.index()] = d;
            if layers.len() <= d {
                layers.resize_with(d + 1, Vec::new);
            }
            layers[d].push(self.graph[node].clone());
        }
        Ok(layers)
    }
}

/// Collects `targets` and everything they reach through label references.
/// A referenced label with no binding is an error.
pub fn closure(registry: &Registry, targets: &[Label]) -> Result<DependencyGraph> {
    let mut deps = DependencyGraph::default();
    let mut stack: Vec<Label> = Vec::new();

    for target in targets {
        if deps.node(target).1 {
            stack.push(target.clone());
        }
    }

    while let Some(label) = stack.pop() {
        let computation = registry
            .get(&label)
            .ok_or_else(|| ReportError::UnresolvedLabel(label.clone()))?;
        let consumer = deps.index[&label];
        for dep in computation.dependencies() {
            let (producer, is_new) = deps.node(dep);
            deps.graph.update_edge(producer, consumer, ());
            if is_new {
                stack.push(dep.clone());
            }
        }
    }
    Ok(deps)
}

/// Topological order of the whole registry. Fails on the first cycle or
/// dangling reference found.
pub fn sort(registry: &Registry) -> Result<Vec<Label>> {
    let all: Vec<Label> = registry.labels().cloned().collect();
    closure(registry, &all)?.order()
}
