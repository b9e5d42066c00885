//! Label propagation community detection.
//!
//! Every node starts labelled with its own id. Passes then visit nodes in
//! insertion order and relabel each node with the most frequent label among
//! its neighbours. Updates are written in place, so a node sees labels
//! already changed earlier in the same pass. Passes repeat until one changes
//! nothing or `max_passes` is reached.
//!
//! Neighbour lists are built from links in insertion order; a link `a -> b`
//! adds `b` to `a`'s list and `a` to `b`'s. Two links between the same pair
//! (one per direction) therefore count twice in each vote.

use crate::model::Graph;
use std::collections::HashMap;
use tracing::{debug, warn};

pub const DEFAULT_MAX_PASSES: usize = 100;

#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Upper bound on full passes before giving up on convergence.
    pub max_passes: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

/// Node id to cluster label, in node insertion order. Labels are node ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterAssignment {
    entries: Vec<(String, String)>,
    lookup: HashMap<String, usize>,
}

impl ClusterAssignment {
    pub fn get(&self, node_id: &str) -> Option<&str> {
        self.lookup
            .get(node_id)
            .map(|&slot| self.entries[slot].1.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(node, label)| (node.as_str(), label.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct labels.
    pub fn cluster_count(&self) -> usize {
        let mut labels: Vec<&str> = self.entries.iter().map(|(_, l)| l.as_str()).collect();
        labels.sort_unstable();
        labels.dedup();
        labels.len()
    }

    fn insert(&mut self, node_id: String, label: String) {
        self.lookup.insert(node_id.clone(), self.entries.len());
        self.entries.push((node_id, label));
    }
}

/// Outcome of one clustering run.
#[derive(Debug, Clone)]
pub struct Clustering {
    pub assignment: ClusterAssignment,
    /// Full passes executed, including the final unchanged one.
    pub passes: usize,
    /// False when `max_passes` ran out while labels were still changing.
    pub converged: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ClusterEngine {
    config: ClusterConfig,
}

impl ClusterEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ClusterConfig) -> Self {
        Self { config }
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.config.max_passes = max_passes;
        self
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn cluster(&self, graph: &Graph) -> Clustering {
        let neighbors = neighbor_lists(graph);
        let mut labels: Vec<usize> = (0..neighbors.len()).collect();

        let mut passes = 0;
        let mut converged = neighbors.is_empty();
        while !converged && passes < self.config.max_passes {
            passes += 1;
            converged = !propagate_pass(&neighbors, &mut labels);
        }

        if converged {
            debug!("Label propagation converged after {} passes", passes);
        } else {
            warn!(
                "Label propagation did not converge within {} passes; using last assignment",
                self.config.max_passes
            );
        }

        Clustering {
            assignment: to_assignment(graph, &labels),
            passes,
            converged,
        }
    }

    /// True when one more pass over `assignment` would change no label.
    /// Nodes missing from the assignment start from their own id.
    pub fn is_stable(graph: &Graph, assignment: &ClusterAssignment) -> bool {
        let neighbors = neighbor_lists(graph);
        let pg = graph.as_petgraph();
        let position: HashMap<&str, usize> = pg
            .node_indices()
            .map(|idx| (pg[idx].id.as_str(), idx.index()))
            .collect();

        let mut labels: Vec<usize> = pg
            .node_indices()
            .map(|idx| {
                assignment
                    .get(&pg[idx].id)
                    .and_then(|label| position.get(label).copied())
                    .unwrap_or(idx.index())
            })
            .collect();

        !propagate_pass(&neighbors, &mut labels)
    }
}

/// Neighbour positions per node, duplicates kept.
fn neighbor_lists(graph: &Graph) -> Vec<Vec<usize>> {
    let pg = graph.as_petgraph();
    let mut neighbors = vec![Vec::new(); pg.node_count()];
    for edge in pg.edge_indices() {
        if let Some((source, target)) = pg.edge_endpoints(edge) {
            neighbors[source.index()].push(target.index());
            neighbors[target.index()].push(source.index());
        }
    }
    neighbors
}

/// One in-place pass in node order. Returns whether any label changed.
fn propagate_pass(neighbors: &[Vec<usize>], labels: &mut [usize]) -> bool {
    let mut changed = false;
    for node in 0..neighbors.len() {
        let Some(best) = mode(neighbors[node].iter().map(|&n| labels[n])) else {
            continue;
        };
        if labels[node] != best {
            labels[node] = best;
            changed = true;
        }
    }
    changed
}

/// Most frequent value; ties go to the value encountered first.
pub fn mode<T: Copy + Eq + std::hash::Hash>(values: impl IntoIterator<Item = T>) -> Option<T> {
    let mut counts: Vec<(T, usize)> = Vec::new();
    let mut slots: HashMap<T, usize> = HashMap::new();

    for value in values {
        match slots.get(&value) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                slots.insert(value, counts.len());
                counts.push((value, 1));
            }
        }
    }

    let mut best: Option<(T, usize)> = None;
    for (value, count) in counts {
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((value, count)),
        }
    }
    best.map(|(value, _)| value)
}

fn to_assignment(graph: &Graph, labels: &[usize]) -> ClusterAssignment {
    let pg = graph.as_petgraph();
    let mut assignment = ClusterAssignment::default();
    for idx in pg.node_indices() {
        let label_idx = petgraph::graph::NodeIndex::new(labels[idx.index()]);
        assignment.insert(pg[idx].id.clone(), pg[label_idx].id.clone());
    }
    assignment
}
