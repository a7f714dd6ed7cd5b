//! Dependency adjacency built from `dependsOn` lists (spec §4.7 "Graph
//! construction").

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};

use super::definition::WorkflowDefinition;

/// Adjacency structure plus the `petgraph` graph used by [`super::validate`]
/// for cycle/depth checks.
pub struct DependencyGraph {
    pub(crate) graph: DiGraph<String, ()>,
    pub(crate) index_of: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Build the graph with an edge `dependency -> dependent` for every
    /// declared `dependsOn` entry.
    #[must_use]
    pub fn build(definition: &WorkflowDefinition) -> Self {
        let mut graph = DiGraph::new();
        let mut index_of = HashMap::new();

        for step in &definition.steps {
            let idx = graph.add_node(step.id.clone());
            index_of.insert(step.id.clone(), idx);
        }

        for step in &definition.steps {
            let Some(&to) = index_of.get(&step.id) else {
                continue;
            };
            for dep in &step.depends_on {
                if let Some(&from) = index_of.get(dep) {
                    graph.add_edge(from, to, ());
                }
            }
        }

        Self { graph, index_of }
    }

    #[must_use]
    pub fn direct_dependencies<'a>(&self, definition: &'a WorkflowDefinition, step_id: &str) -> &'a [String] {
        definition
            .step(step_id)
            .map(|s| s.depends_on.as_slice())
            .unwrap_or(&[])
    }
}
