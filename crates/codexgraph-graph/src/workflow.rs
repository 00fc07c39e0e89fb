//! Workflow layering
//!
//! Groups the nodes of a user-composed workflow into ordered layers with
//! Kahn's algorithm. Nodes inside one layer have no ordering constraint
//! between them and may run in parallel.

use crate::digraph::Digraph;
use crate::error::{GraphError, Result};
use codexgraph_types::{Workflow, WorkflowEdge, WorkflowNode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What to do with nodes that never reach in-degree zero
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CyclePolicy {
    /// Leave the cyclic remainder out of the output
    #[default]
    Exclude,
    /// Fail with [`GraphError::CyclicWorkflow`]
    Reject,
}

/// Result of layering a workflow
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layering {
    /// Node ids per layer, in execution order
    pub layers: Vec<Vec<String>>,
    /// Node ids left out because they sit on or behind a cycle
    pub excluded: Vec<String>,
}

impl Layering {
    /// Index of the layer holding `node_id`
    pub fn layer_of(&self, node_id: &str) -> Option<usize> {
        self.layers
            .iter()
            .position(|layer| layer.iter().any(|id| id == node_id))
    }
}

/// Parse a saved workflow document
///
/// A document whose `nodes` or `edges` is not an array, or whose records
/// miss required fields, is a caller error.
pub fn workflow_from_json(json: &str) -> Result<Workflow> {
    serde_json::from_str(json).map_err(|e| GraphError::InvalidWorkflow(e.to_string()))
}

/// Build the workflow adjacency, dropping edges with unknown endpoints
///
/// Duplicate node ids keep their first occurrence.
pub fn workflow_digraph(nodes: &[WorkflowNode], edges: &[WorkflowEdge]) -> Digraph {
    let mut graph = Digraph::new();
    for node in nodes {
        graph.add_node(&node.id);
    }

    let mut dangling = 0;
    for edge in edges {
        if !graph.add_edge(&edge.source_node_id, &edge.target_node_id) {
            dangling += 1;
        }
    }
    if dangling > 0 {
        debug!("Ignoring {} dangling workflow edge(s)", dangling);
    }

    graph
}

/// Layer workflow nodes, silently excluding any cyclic remainder
#[must_use]
pub fn layer_nodes(nodes: &[WorkflowNode], edges: &[WorkflowEdge]) -> Vec<Vec<String>> {
    kahn_layers(&workflow_digraph(nodes, edges)).layers
}

/// Layer workflow nodes under an explicit cycle policy
pub fn layer_nodes_with(
    nodes: &[WorkflowNode],
    edges: &[WorkflowEdge],
    policy: CyclePolicy,
) -> Result<Layering> {
    let layering = kahn_layers(&workflow_digraph(nodes, edges));

    if !layering.excluded.is_empty() {
        match policy {
            CyclePolicy::Exclude => debug!(
                "Excluding {} node(s) caught in a workflow cycle",
                layering.excluded.len()
            ),
            CyclePolicy::Reject => {
                return Err(GraphError::CyclicWorkflow {
                    node_ids: layering.excluded,
                })
            }
        }
    }

    Ok(layering)
}

/// Cycles of a workflow graph, for callers validating before compiling
#[must_use]
pub fn workflow_cycles(nodes: &[WorkflowNode], edges: &[WorkflowEdge]) -> Vec<Vec<String>> {
    workflow_digraph(nodes, edges).find_cycles()
}

/// Layered Kahn's algorithm
///
/// Each frontier becomes one layer in discovery order; successors whose
/// in-degree drops to zero form the next frontier.
fn kahn_layers(graph: &Digraph) -> Layering {
    let mut degrees = graph.in_degrees();
    let mut placed = vec![false; graph.node_count()];
    let mut layers = Vec::new();

    let mut frontier: Vec<usize> = (0..graph.node_count())
        .filter(|&idx| degrees[idx] == 0)
        .collect();

    while !frontier.is_empty() {
        let mut next = Vec::new();

        for &node in &frontier {
            placed[node] = true;
            for &succ in graph.successor_indices(node) {
                degrees[succ] = degrees[succ].saturating_sub(1);
                if degrees[succ] == 0 {
                    next.push(succ);
                }
            }
        }

        layers.push(
            frontier
                .iter()
                .map(|&idx| graph.id_at(idx).to_string())
                .collect(),
        );
        frontier = next;
    }

    let excluded = (0..graph.node_count())
        .filter(|&idx| !placed[idx])
        .map(|idx| graph.id_at(idx).to_string())
        .collect();

    Layering { layers, excluded }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use codexgraph_types::{ComponentRef, ComponentType};

    fn node(id: &str) -> WorkflowNode {
        WorkflowNode::new(id, ComponentRef::new(id, ComponentType::Command, id))
    }

    fn nodes(ids: &[&str]) -> Vec<WorkflowNode> {
        ids.iter().map(|id| node(id)).collect()
    }

    fn edges(pairs: &[(&str, &str)]) -> Vec<WorkflowEdge> {
        pairs.iter().map(|(s, t)| WorkflowEdge::new(*s, *t)).collect()
    }

    fn ids(layers: &[&[&str]]) -> Vec<Vec<String>> {
        layers
            .iter()
            .map(|l| l.iter().map(|s| (*s).to_string()).collect())
            .collect()
    }

    #[test]
    fn test_empty_workflow() {
        assert!(layer_nodes(&[], &[]).is_empty());
    }

    #[test]
    fn test_diamond_layers() {
        let layers = layer_nodes(
            &nodes(&["A", "B", "C", "D"]),
            &edges(&[("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")]),
        );
        assert_eq!(layers, ids(&[&["A"], &["B", "C"], &["D"]]));
    }

    #[test]
    fn test_independent_nodes_share_first_layer() {
        let layers = layer_nodes(&nodes(&["x", "y", "z"]), &[]);
        assert_eq!(layers, ids(&[&["x", "y", "z"]]));
    }

    #[test]
    fn test_dangling_edges_ignored() {
        let layers = layer_nodes(
            &nodes(&["A", "B"]),
            &edges(&[("A", "B"), ("ghost", "A"), ("B", "nowhere")]),
        );
        assert_eq!(layers, ids(&[&["A"], &["B"]]));
    }

    #[test]
    fn test_two_node_cycle_excluded() {
        let layers = layer_nodes(&nodes(&["X", "Y"]), &edges(&[("X", "Y"), ("Y", "X")]));
        assert!(layers.is_empty());
    }

    #[test]
    fn test_cycle_downstream_of_valid_prefix() {
        let layering = layer_nodes_with(
            &nodes(&["A", "B", "C"]),
            &edges(&[("A", "B"), ("B", "C"), ("C", "B")]),
            CyclePolicy::Exclude,
        )
        .unwrap();
        assert_eq!(layering.layers, ids(&[&["A"]]));
        assert_eq!(layering.excluded, vec!["B".to_string(), "C".to_string()]);
    }

    #[test]
    fn test_reject_policy_reports_cyclic_nodes() {
        let err = layer_nodes_with(
            &nodes(&["X", "Y"]),
            &edges(&[("X", "Y"), ("Y", "X")]),
            CyclePolicy::Reject,
        )
        .unwrap_err();
        match err {
            GraphError::CyclicWorkflow { node_ids } => assert_eq!(node_ids, vec!["X", "Y"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_node_ids_layered_once() {
        let layers = layer_nodes(&nodes(&["A", "A", "B"]), &edges(&[("A", "B")]));
        assert_eq!(layers, ids(&[&["A"], &["B"]]));
    }

    #[test]
    fn test_layers_partition_and_respect_edges() {
        let all = nodes(&["a", "b", "c", "d", "e", "f"]);
        let deps = edges(&[
            ("a", "c"),
            ("b", "c"),
            ("c", "d"),
            ("a", "e"),
            ("e", "d"),
            ("d", "f"),
            ("b", "f"),
        ]);
        let layering = layer_nodes_with(&all, &deps, CyclePolicy::Reject).unwrap();

        let mut flat: Vec<_> = layering.layers.iter().flatten().cloned().collect();
        flat.sort();
        assert_eq!(flat, vec!["a", "b", "c", "d", "e", "f"]);
        assert!(layering.layers.iter().all(|l| !l.is_empty()));

        for edge in &deps {
            let from = layering.layer_of(&edge.source_node_id).unwrap();
            let to = layering.layer_of(&edge.target_node_id).unwrap();
            assert!(from < to, "{} must precede {}", edge.source_node_id, edge.target_node_id);
        }
    }

    #[test]
    fn test_workflow_from_json() {
        let json = r#"{
            "id": "wf-1",
            "name": "release",
            "nodes": [
                {"id": "n1", "component_ref": {"component_id": "c1", "component_type": "command", "name": "test"}},
                {"id": "n2", "component_ref": {"component_id": "c2", "component_type": "agent", "name": "deployer"}}
            ],
            "edges": [{"id": "e1", "source_node_id": "n1", "target_node_id": "n2"}]
        }"#;
        let workflow = workflow_from_json(json).unwrap();
        assert_eq!(
            layer_nodes(&workflow.nodes, &workflow.edges),
            ids(&[&["n1"], &["n2"]])
        );
    }

    #[test]
    fn test_workflow_from_json_rejects_non_array_nodes() {
        let err = workflow_from_json(r#"{"id":"w","name":"n","nodes":"oops","edges":[]}"#)
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidWorkflow(_)));
    }

    #[test]
    fn test_workflow_cycles_reuses_cycle_detection() {
        let cycles = workflow_cycles(&nodes(&["X", "Y"]), &edges(&[("X", "Y"), ("Y", "X")]));
        assert_eq!(cycles, vec![vec!["X".to_string(), "Y".to_string()]]);
    }
}
