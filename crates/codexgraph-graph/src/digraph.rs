//! Directed graph primitive shared by the relationship graph and the
//! workflow compiler
//!
//! Nodes are string ids kept in insertion order; edges are successor lists
//! of node indices. Parallel edges are kept.

use std::collections::{HashMap, HashSet};

/// Insertion-ordered directed graph over string ids
#[derive(Debug, Clone, Default)]
pub struct Digraph {
    order: Vec<String>,
    index: HashMap<String, usize>,
    successors: Vec<Vec<usize>>,
    edge_count: usize,
}

impl Digraph {
    /// Create an empty graph
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, returning its index. Re-adding an id is a no-op.
    pub fn add_node(&mut self, id: &str) -> usize {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.order.len();
        self.order.push(id.to_string());
        self.index.insert(id.to_string(), idx);
        self.successors.push(Vec::new());
        idx
    }

    /// Add an edge between two existing nodes
    ///
    /// Returns `false` and leaves the graph untouched when either endpoint
    /// is unknown.
    pub fn add_edge(&mut self, from: &str, to: &str) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&f), Some(&t)) => {
                self.successors[f].push(t);
                self.edge_count += 1;
                true
            }
            _ => false,
        }
    }

    /// Add an edge, creating missing endpoints
    pub fn link(&mut self, from: &str, to: &str) {
        let f = self.add_node(from);
        let t = self.add_node(to);
        self.successors[f].push(t);
        self.edge_count += 1;
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Node ids in insertion order
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Direct successors of `id`, one entry per edge
    pub fn successors<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.index
            .get(id)
            .map(|&idx| self.successors[idx].as_slice())
            .unwrap_or_default()
            .iter()
            .map(|&t| self.order[t].as_str())
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub(crate) fn id_at(&self, idx: usize) -> &str {
        &self.order[idx]
    }

    pub(crate) fn successor_indices(&self, idx: usize) -> &[usize] {
        &self.successors[idx]
    }

    /// In-degree of every node, indexed like [`Digraph::node_ids`]
    pub(crate) fn in_degrees(&self) -> Vec<usize> {
        let mut degrees = vec![0; self.order.len()];
        for targets in &self.successors {
            for &t in targets {
                degrees[t] += 1;
            }
        }
        degrees
    }

    /// Find every simple cycle with a depth-first search rooted at every node
    ///
    /// The search from root `r` stays among nodes inserted at or after `r`
    /// and records the current path whenever an edge leads back to `r`, so
    /// each cycle starts at its earliest-inserted node and a self-loop is a
    /// one-element cycle. Nodes on the path are blocked; a node stays
    /// blocked after backtracking until one of its successors reaches the
    /// root, which keeps dead ends from being walked twice. Parallel edges
    /// can repeat a cycle; see [`canonical_cycles`].
    #[must_use]
    pub fn find_cycles(&self) -> Vec<Vec<String>> {
        let n = self.order.len();
        let mut cycles = Vec::new();

        for root in 0..n {
            let mut blocked = vec![false; n];
            // waiting[w]: nodes to unblock once w is unblocked
            let mut waiting: Vec<Vec<usize>> = vec![Vec::new(); n];

            // Explicit stack: path[i] is a node, cursor[i] its next successor
            // slot, closed[i] whether anything below it reached the root
            let mut path = vec![root];
            let mut cursor = vec![0usize];
            let mut closed = vec![false];
            blocked[root] = true;

            while let Some(&node) = path.last() {
                let depth = path.len() - 1;
                match self.successors[node].get(cursor[depth]) {
                    Some(&next) => {
                        cursor[depth] += 1;
                        if next < root {
                            continue;
                        }
                        if next == root {
                            cycles.push(path.iter().map(|&p| self.order[p].clone()).collect());
                            closed[depth] = true;
                        } else if !blocked[next] {
                            blocked[next] = true;
                            path.push(next);
                            cursor.push(0);
                            closed.push(false);
                        }
                    }
                    None => {
                        path.pop();
                        cursor.pop();
                        let reached_root = closed.pop().unwrap_or(false);
                        if reached_root {
                            Self::unblock(node, &mut blocked, &mut waiting);
                        } else {
                            for &next in &self.successors[node] {
                                if next >= root && !waiting[next].contains(&node) {
                                    waiting[next].push(node);
                                }
                            }
                        }
                        if let Some(parent) = closed.last_mut() {
                            *parent |= reached_root;
                        }
                    }
                }
            }
        }

        cycles
    }

    fn unblock(node: usize, blocked: &mut [bool], waiting: &mut [Vec<usize>]) {
        let mut pending = vec![node];
        while let Some(idx) = pending.pop() {
            if blocked[idx] {
                blocked[idx] = false;
                pending.append(&mut waiting[idx]);
            }
        }
    }
}

/// Rotate every cycle to start at its smallest id and drop repeats
///
/// Keeps the order in which distinct cycles were first reported.
#[must_use]
pub fn canonical_cycles(cycles: &[Vec<String>]) -> Vec<Vec<String>> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();

    for cycle in cycles {
        let Some(start) = cycle
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.cmp(b.1))
            .map(|(i, _)| i)
        else {
            continue;
        };

        let mut rotated = cycle[start..].to_vec();
        rotated.extend_from_slice(&cycle[..start]);

        if seen.insert(rotated.clone()) {
            unique.push(rotated);
        }
    }

    unique
}
