// Domain graph: one node per domain, one link per directed transition

use histograph_history::Timestamp;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::cluster::ClusterAssignment;

/// A visited domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// The domain, which is also the node's identity.
    pub id: String,
    /// First URL seen for this domain.
    pub sample_url: String,
    pub visit_count: u64,
    pub last_visit: Timestamp,
    pub cluster: Option<String>,
}

/// Consecutive visits from `source` to a different domain `target`.
///
/// Links are directed: `a -> b` and `b -> a` are separate links with their
/// own weights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub source: String,
    pub target: String,
    pub weight: u64,
}

/// Domains and their co-visitation links, both kept in first-seen order.
///
/// Every link's endpoints are nodes of the same graph; the only ways to
/// change the graph are the visit/transition recorders used while building
/// and [`delete_cluster`].
#[derive(Debug, Clone, Default)]
pub struct Graph {
    inner: DiGraph<Node, Link>,
    node_lookup: HashMap<String, NodeIndex>,
    link_lookup: HashMap<(NodeIndex, NodeIndex), EdgeIndex>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a visit to `domain`, creating its node on first sight.
    pub fn record_visit(&mut self, domain: &str, url: &str, visited_at: Timestamp) -> NodeIndex {
        if let Some(&idx) = self.node_lookup.get(domain) {
            let node = &mut self.inner[idx];
            node.visit_count += 1;
            node.last_visit = node.last_visit.max(visited_at);
            return idx;
        }

        let idx = self.inner.add_node(Node {
            id: domain.to_string(),
            sample_url: url.to_string(),
            visit_count: 1,
            last_visit: visited_at,
            cluster: None,
        });
        self.node_lookup.insert(domain.to_string(), idx);
        idx
    }

    /// Count one transition `from -> to`. Self transitions are ignored.
    pub fn record_transition(&mut self, from: NodeIndex, to: NodeIndex) {
        if from == to {
            return;
        }

        if let Some(&edge) = self.link_lookup.get(&(from, to)) {
            self.inner[edge].weight += 1;
            return;
        }

        let link = Link {
            source: self.inner[from].id.clone(),
            target: self.inner[to].id.clone(),
            weight: 1,
        };
        let edge = self.inner.add_edge(from, to, link);
        self.link_lookup.insert((from, to), edge);
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_lookup.get(id).map(|&idx| &self.inner[idx])
    }

    pub fn link(&self, source: &str, target: &str) -> Option<&Link> {
        let from = *self.node_lookup.get(source)?;
        let to = *self.node_lookup.get(target)?;
        self.link_lookup.get(&(from, to)).map(|&edge| &self.inner[edge])
    }

    /// Nodes in first-seen order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.inner.node_weights()
    }

    /// Links in first-seen order.
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.inner.edge_weights()
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn link_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.node_count() == 0
    }

    /// The underlying petgraph, for algorithms that work on indices.
    pub fn as_petgraph(&self) -> &DiGraph<Node, Link> {
        &self.inner
    }

    /// Write cluster labels onto nodes. Nodes missing from the assignment
    /// keep their current label.
    pub fn apply_clusters(&mut self, assignment: &ClusterAssignment) {
        for node in self.inner.node_weights_mut() {
            if let Some(label) = assignment.get(&node.id) {
                node.cluster = Some(label.to_string());
            }
        }
    }

    /// Nodes grouped by cluster label, groups in order of first member.
    /// Unclustered nodes are left out.
    pub fn clusters(&self) -> Vec<(String, Vec<&Node>)> {
        let mut groups: Vec<(String, Vec<&Node>)> = Vec::new();
        let mut slots: HashMap<&str, usize> = HashMap::new();

        for node in self.inner.node_weights() {
            let Some(label) = node.cluster.as_deref() else {
                continue;
            };
            match slots.get(label) {
                Some(&slot) => groups[slot].1.push(node),
                None => {
                    slots.insert(label, groups.len());
                    groups.push((label.to_string(), vec![node]));
                }
            }
        }

        groups
    }

    fn from_petgraph(inner: DiGraph<Node, Link>) -> Self {
        let node_lookup = inner
            .node_indices()
            .map(|idx| (inner[idx].id.clone(), idx))
            .collect();
        let link_lookup = inner
            .edge_indices()
            .filter_map(|edge| inner.edge_endpoints(edge).map(|ends| (ends, edge)))
            .collect();

        Self {
            inner,
            node_lookup,
            link_lookup,
        }
    }
}

/// Copy of `graph` without the nodes labelled `label` and without any link
/// touching them. Surviving nodes keep their labels; nothing is re-clustered.
pub fn delete_cluster(graph: &Graph, label: &str) -> Graph {
    let reduced = graph.inner.filter_map(
        |_, node| (node.cluster.as_deref() != Some(label)).then(|| node.clone()),
        |_, link| Some(link.clone()),
    );
    Graph::from_petgraph(reduced)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_visit_accumulates() {
        let mut graph = Graph::new();
        graph.record_visit("a.com", "https://a.com/1", 5);
        graph.record_visit("a.com", "https://a.com/2", 3);

        let node = graph.node("a.com").unwrap();
        assert_eq!(node.visit_count, 2);
        assert_eq!(node.last_visit, 5);
        assert_eq!(node.sample_url, "https://a.com/1");
        assert_eq!(node.cluster, None);
    }

    #[test]
    fn test_transitions_are_directed() {
        let mut graph = Graph::new();
        let a = graph.record_visit("a.com", "https://a.com/", 1);
        let b = graph.record_visit("b.com", "https://b.com/", 2);
        graph.record_transition(a, b);
        graph.record_transition(a, b);
        graph.record_transition(b, a);
        graph.record_transition(a, a);

        assert_eq!(graph.link_count(), 2);
        assert_eq!(graph.link("a.com", "b.com").unwrap().weight, 2);
        assert_eq!(graph.link("b.com", "a.com").unwrap().weight, 1);
    }

    #[test]
    fn test_delete_cluster_rebuilds_lookups() {
        let mut graph = Graph::new();
        let a = graph.record_visit("a.com", "https://a.com/", 1);
        let b = graph.record_visit("b.com", "https://b.com/", 2);
        let c = graph.record_visit("c.com", "https://c.com/", 3);
        graph.record_transition(a, b);
        graph.record_transition(b, c);
        graph.inner[a].cluster = Some("x".to_string());
        graph.inner[b].cluster = Some("y".to_string());
        graph.inner[c].cluster = Some("y".to_string());

        let reduced = delete_cluster(&graph, "x");
        assert!(reduced.node("a.com").is_none());
        assert_eq!(reduced.link("b.com", "c.com").unwrap().weight, 1);
        assert!(reduced.link("a.com", "b.com").is_none());

        // Lookups on the reduced graph still update the right entries.
        let mut reduced = reduced;
        let b = reduced.record_visit("b.com", "https://b.com/", 9);
        let c = reduced.record_visit("c.com", "https://c.com/", 9);
        reduced.record_transition(b, c);
        assert_eq!(reduced.link("b.com", "c.com").unwrap().weight, 2);
        assert_eq!(reduced.node("b.com").unwrap().visit_count, 2);
    }
}
