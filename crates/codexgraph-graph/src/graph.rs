//! Relationship graph over one component snapshot

use crate::digraph::{canonical_cycles, Digraph};
use codexgraph_types::{Component, ComponentType, Confidence, Relationship, RelationshipKind};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Node of the relationship graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub component_type: ComponentType,
    pub name: String,
    pub category: Option<String>,
}

/// Queryable graph built from components and their relationships
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<GraphNode>,
    relationships: Vec<Relationship>,
    digraph: Digraph,
    by_source: HashMap<String, Vec<usize>>,
    by_target: HashMap<String, Vec<usize>>,
    with_outgoing: HashSet<String>,
}

/// Headline numbers for a relationship graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphSummary {
    pub total_relationships: usize,
    /// Components with at least one outgoing relationship
    pub components_with_dependencies: usize,
    /// Relationships at [`Confidence::High`]
    pub high_confidence_links: usize,
    /// Relationships at [`Confidence::Low`], to be confirmed by a person
    pub needs_review: usize,
    pub by_kind: BTreeMap<RelationshipKind, usize>,
}

/// Build the relationship graph in O(V+E)
#[must_use]
pub fn build_graph(components: &[Component], relationships: &[Relationship]) -> Graph {
    let mut graph = Graph::default();

    for component in components {
        graph.digraph.add_node(&component.id);
        graph.nodes.push(GraphNode {
            id: component.id.clone(),
            component_type: component.component_type,
            name: component.name.clone(),
            category: component.category.clone(),
        });
    }

    for (idx, rel) in relationships.iter().enumerate() {
        graph
            .digraph
            .link(&rel.from_component_id, &rel.to_component_id);
        graph
            .by_source
            .entry(rel.from_component_id.clone())
            .or_default()
            .push(idx);
        graph
            .by_target
            .entry(rel.to_component_id.clone())
            .or_default()
            .push(idx);
        graph.with_outgoing.insert(rel.from_component_id.clone());
    }

    graph.relationships = relationships.to_vec();
    graph
}

/// Report every simple cycle of the relationship graph
///
/// Two relationships of different kinds between the same pair are parallel
/// edges, so a cycle may be listed more than once; use
/// [`canonical_cycles`] when a de-duplicated list is needed.
#[must_use]
pub fn find_cycles(graph: &Graph) -> Vec<Vec<String>> {
    graph.digraph.find_cycles()
}

impl Graph {
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// The underlying adjacency structure
    pub fn digraph(&self) -> &Digraph {
        &self.digraph
    }

    /// Relationships leaving `component_id`
    pub fn outgoing(&self, component_id: &str) -> Vec<&Relationship> {
        self.collect(self.by_source.get(component_id))
    }

    /// Relationships pointing at `component_id`
    pub fn incoming(&self, component_id: &str) -> Vec<&Relationship> {
        self.collect(self.by_target.get(component_id))
    }

    fn collect(&self, indices: Option<&Vec<usize>>) -> Vec<&Relationship> {
        indices
            .map(|idx| idx.iter().map(|&i| &self.relationships[i]).collect())
            .unwrap_or_default()
    }

    /// Whether a component has any outgoing relationship
    pub fn has_outgoing(&self, component_id: &str) -> bool {
        self.with_outgoing.contains(component_id)
    }

    /// Nodes with outgoing relationships, in component order, for views
    /// that skip isolated components
    pub fn nodes_with_outgoing(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter().filter(|n| self.with_outgoing.contains(&n.id))
    }

    /// Relationships at or above a confidence tier
    pub fn relationships_at_least(&self, min: Confidence) -> impl Iterator<Item = &Relationship> {
        self.relationships.iter().filter(move |r| r.confidence >= min)
    }

    /// Cycles with rotations and repeats folded together
    pub fn unique_cycles(&self) -> Vec<Vec<String>> {
        canonical_cycles(&find_cycles(self))
    }

    pub fn summary(&self) -> GraphSummary {
        let mut by_kind = BTreeMap::new();
        for rel in &self.relationships {
            *by_kind.entry(rel.kind).or_insert(0) += 1;
        }

        GraphSummary {
            total_relationships: self.relationships.len(),
            components_with_dependencies: self.with_outgoing.len(),
            high_confidence_links: self
                .relationships
                .iter()
                .filter(|r| r.confidence == Confidence::High)
                .count(),
            needs_review: self
                .relationships
                .iter()
                .filter(|r| r.confidence.needs_review())
                .count(),
            by_kind,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn components(ids: &[&str]) -> Vec<Component> {
        ids.iter()
            .map(|id| Component::new(*id, ComponentType::Skill, *id, *id))
            .collect()
    }

    fn rel(from: &str, to: &str, kind: RelationshipKind, confidence: Confidence) -> Relationship {
        Relationship::new(from, to, kind, confidence)
    }

    #[test]
    fn test_acyclic_graph_has_no_cycles() {
        let comps = components(&["a", "b", "c"]);
        let rels = vec![
            rel("a", "b", RelationshipKind::Uses, Confidence::High),
            rel("b", "c", RelationshipKind::Calls, Confidence::Medium),
            rel("a", "c", RelationshipKind::DependsOn, Confidence::High),
        ];
        let graph = build_graph(&comps, &rels);
        assert!(find_cycles(&graph).is_empty());
    }

    #[test]
    fn test_self_loop_reported_as_one_element_cycle() {
        let comps = components(&["a"]);
        let rels = vec![rel("a", "a", RelationshipKind::Extends, Confidence::High)];
        let graph = build_graph(&comps, &rels);
        assert_eq!(find_cycles(&graph), vec![vec!["a".to_string()]]);
    }

    #[test]
    fn test_two_node_cycle() {
        let comps = components(&["a", "b"]);
        let rels = vec![
            rel("a", "b", RelationshipKind::Uses, Confidence::High),
            rel("b", "a", RelationshipKind::Uses, Confidence::High),
        ];
        let graph = build_graph(&comps, &rels);
        assert_eq!(
            graph.unique_cycles(),
            vec![vec!["a".to_string(), "b".to_string()]]
        );
    }

    #[test]
    fn test_every_simple_cycle_reported() {
        let comps = components(&["a", "b", "c"]);
        let rels = vec![
            rel("a", "b", RelationshipKind::Uses, Confidence::High),
            rel("b", "c", RelationshipKind::Uses, Confidence::High),
            rel("c", "a", RelationshipKind::Uses, Confidence::High),
            rel("a", "c", RelationshipKind::Calls, Confidence::Medium),
        ];
        let graph = build_graph(&comps, &rels);
        let cycles = canonical_cycles(&find_cycles(&graph));

        assert_eq!(
            cycles,
            vec![
                vec!["a".to_string(), "b".to_string(), "c".to_string()],
                vec!["a".to_string(), "c".to_string()],
            ]
        );
        assert_eq!(graph.unique_cycles(), cycles);
    }

    #[test]
    fn test_incoming_outgoing_and_isolated_nodes() {
        let comps = components(&["a", "b", "c"]);
        let rels = vec![
            rel("a", "b", RelationshipKind::Uses, Confidence::Low),
            rel("c", "b", RelationshipKind::Requires, Confidence::High),
        ];
        let graph = build_graph(&comps, &rels);

        assert_eq!(graph.outgoing("a").len(), 1);
        assert_eq!(graph.incoming("b").len(), 2);
        assert!(graph.incoming("a").is_empty());
        assert!(!graph.has_outgoing("b"));
        let with_out: Vec<_> = graph.nodes_with_outgoing().map(|n| n.id.as_str()).collect();
        assert_eq!(with_out, vec!["a", "c"]);
    }

    #[test]
    fn test_summary_counts() {
        let comps = components(&["a", "b", "c"]);
        let rels = vec![
            rel("a", "b", RelationshipKind::Uses, Confidence::Low),
            rel("a", "c", RelationshipKind::Uses, Confidence::High),
            rel("c", "b", RelationshipKind::Requires, Confidence::High),
        ];
        let summary = build_graph(&comps, &rels).summary();

        assert_eq!(summary.total_relationships, 3);
        assert_eq!(summary.components_with_dependencies, 2);
        assert_eq!(summary.high_confidence_links, 2);
        assert_eq!(summary.needs_review, 1);
        assert_eq!(summary.by_kind.get(&RelationshipKind::Uses), Some(&2));
        assert_eq!(summary.by_kind.get(&RelationshipKind::Calls), None);
    }

    #[test]
    fn test_confidence_filter() {
        let comps = components(&["a", "b"]);
        let rels = vec![
            rel("a", "b", RelationshipKind::Uses, Confidence::Low),
            rel("a", "b", RelationshipKind::Calls, Confidence::Medium),
        ];
        let graph = build_graph(&comps, &rels);
        assert_eq!(graph.relationships_at_least(Confidence::Medium).count(), 1);
        assert_eq!(graph.relationships_at_least(Confidence::Low).count(), 2);
    }
}
