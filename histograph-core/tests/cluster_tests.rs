// Tests for label propagation clustering

use histograph_core::{ClusterConfig, ClusterEngine, Graph, GraphBuilder};
use histograph_history::HistoryRecord;

fn scenario_graph() -> Graph {
    GraphBuilder::from_records(&[
        HistoryRecord::new("https://a.com/", 1),
        HistoryRecord::new("https://b.com/", 2),
        HistoryRecord::new("https://a.com/next", 3),
        HistoryRecord::new("https://c.com/", 4),
    ])
}

/// Two pairs visited back and forth with nothing between them.
fn two_pairs() -> Graph {
    let mut graph = Graph::new();
    let x = graph.record_visit("x.com", "https://x.com/", 1);
    let y = graph.record_visit("y.com", "https://y.com/", 2);
    let p = graph.record_visit("p.com", "https://p.com/", 3);
    let q = graph.record_visit("q.com", "https://q.com/", 4);
    graph.record_transition(x, y);
    graph.record_transition(y, x);
    graph.record_transition(p, q);
    graph.record_transition(q, p);
    graph
}

fn browsing_session() -> Graph {
    let domains = [
        "news.com", "mail.com", "news.com", "docs.rs", "crates.io", "docs.rs", "github.com",
        "crates.io", "mail.com", "calendar.com", "mail.com", "docs.rs", "github.com", "docs.rs",
    ];
    let records: Vec<_> = domains
        .iter()
        .enumerate()
        .map(|(i, d)| HistoryRecord::new(format!("https://{}/{}", d, i), i as i64))
        .collect();
    GraphBuilder::from_records(&records)
}

// ============================================================================
// Convergence Tests
// ============================================================================

#[test]
fn test_scenario_converges_to_single_cluster() {
    let clustering = ClusterEngine::new().cluster(&scenario_graph());

    assert_eq!(clustering.assignment.get("a.com"), Some("b.com"));
    assert_eq!(clustering.assignment.get("b.com"), Some("b.com"));
    assert_eq!(clustering.assignment.get("c.com"), Some("b.com"));
    assert_eq!(clustering.passes, 2);
    assert!(clustering.converged);
    assert_eq!(clustering.assignment.cluster_count(), 1);
}

#[test]
fn test_disconnected_pairs_form_separate_clusters() {
    let clustering = ClusterEngine::new().cluster(&two_pairs());

    assert_eq!(clustering.assignment.get("x.com"), Some("y.com"));
    assert_eq!(clustering.assignment.get("y.com"), Some("y.com"));
    assert_eq!(clustering.assignment.get("p.com"), Some("q.com"));
    assert_eq!(clustering.assignment.get("q.com"), Some("q.com"));
    assert_eq!(clustering.assignment.cluster_count(), 2);
}

#[test]
fn test_assignment_follows_node_order() {
    let graph = browsing_session();
    let clustering = ClusterEngine::new().cluster(&graph);

    let assigned: Vec<_> = clustering.assignment.iter().map(|(node, _)| node).collect();
    let nodes: Vec<_> = graph.nodes().map(|n| n.id.as_str()).collect();
    assert_eq!(assigned, nodes);
}

#[test]
fn test_labels_are_node_ids() {
    let graph = browsing_session();
    let clustering = ClusterEngine::new().cluster(&graph);

    for (_, label) in clustering.assignment.iter() {
        assert!(graph.node(label).is_some(), "label {} is not a node", label);
    }
}

// ============================================================================
// Stability Tests
// ============================================================================

#[test]
fn test_converged_assignment_is_stable() {
    let graph = browsing_session();
    let clustering = ClusterEngine::new().cluster(&graph);

    assert!(clustering.converged);
    assert!(ClusterEngine::is_stable(&graph, &clustering.assignment));
}

#[test]
fn test_clustering_is_deterministic() {
    let graph = browsing_session();
    let first = ClusterEngine::new().cluster(&graph);
    let second = ClusterEngine::new().cluster(&graph);
    assert_eq!(first.assignment, second.assignment);
    assert_eq!(first.passes, second.passes);
}

#[test]
fn test_initial_labels_are_not_stable_when_linked() {
    let graph = scenario_graph();
    let clustering = ClusterEngine::new().with_max_passes(0).cluster(&graph);

    assert_eq!(clustering.passes, 0);
    assert!(!clustering.converged);
    assert_eq!(clustering.assignment.get("a.com"), Some("a.com"));
    assert!(!ClusterEngine::is_stable(&graph, &clustering.assignment));
}

// ============================================================================
// Edge Cases
// ============================================================================

#[test]
fn test_nodes_without_links_are_singletons() {
    let mut graph = Graph::new();
    graph.record_visit("a.com", "https://a.com/", 1);
    graph.record_visit("b.com", "https://b.com/", 2);
    graph.record_visit("c.com", "https://c.com/", 3);

    let clustering = ClusterEngine::new().cluster(&graph);

    assert!(clustering.converged);
    assert_eq!(clustering.passes, 1);
    for id in ["a.com", "b.com", "c.com"] {
        assert_eq!(clustering.assignment.get(id), Some(id));
    }
}

#[test]
fn test_empty_graph() {
    let clustering = ClusterEngine::new().cluster(&Graph::new());
    assert!(clustering.assignment.is_empty());
    assert!(clustering.converged);
    assert_eq!(clustering.passes, 0);
}

#[test]
fn test_pass_cap_reports_non_convergence() {
    let clustering = ClusterEngine::with_config(ClusterConfig { max_passes: 1 })
        .cluster(&scenario_graph());

    assert_eq!(clustering.passes, 1);
    assert!(!clustering.converged);
    // The last assignment is still returned.
    assert_eq!(clustering.assignment.get("c.com"), Some("b.com"));
}

#[test]
fn test_default_config() {
    let engine = ClusterEngine::new();
    assert_eq!(engine.config().max_passes, histograph_core::cluster::DEFAULT_MAX_PASSES);
}

#[test]
fn test_apply_clusters_groups_nodes() {
    let mut graph = two_pairs();
    let clustering = ClusterEngine::new().cluster(&graph);
    graph.apply_clusters(&clustering.assignment);

    let groups: Vec<_> = graph
        .clusters()
        .into_iter()
        .map(|(label, members)| (label, members.iter().map(|n| n.id.clone()).collect::<Vec<_>>()))
        .collect();

    assert_eq!(
        groups,
        vec![
            ("y.com".to_string(), vec!["x.com".to_string(), "y.com".to_string()]),
            ("q.com".to_string(), vec!["p.com".to_string(), "q.com".to_string()]),
        ]
    );
}
