use crate::model::Graph;
use histograph_history::HistoryRecord;
use petgraph::graph::NodeIndex;
use tracing::{debug, warn};
use url::Url;

/// Host of `url`, or the raw URL when it has none or does not parse.
pub fn extract_domain(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => host.to_string(),
            None => {
                warn!("URL has no host, using it as its own domain: {}", url);
                url.to_string()
            }
        },
        Err(e) => {
            warn!("Failed to parse URL {}: {}", url, e);
            url.to_string()
        }
    }
}

/// Folds chronologically ordered history records into a [`Graph`].
///
/// Each record counts a visit to its domain; each pair of consecutive
/// records on different domains counts a transition from the earlier
/// domain to the later one.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: Graph,
    previous: Option<NodeIndex>,
    records_seen: usize,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_record(&mut self, record: &HistoryRecord) {
        let domain = extract_domain(&record.url);
        let current = self
            .graph
            .record_visit(&domain, &record.url, record.last_visit_time);

        if let Some(previous) = self.previous {
            self.graph.record_transition(previous, current);
        }

        self.previous = Some(current);
        self.records_seen += 1;
    }

    pub fn build(self) -> Graph {
        debug!(
            "Built graph from {} items: {} domains, {} links",
            self.records_seen,
            self.graph.node_count(),
            self.graph.link_count()
        );
        self.graph
    }

    pub fn from_records(records: &[HistoryRecord]) -> Graph {
        let mut builder = Self::new();
        for record in records {
            builder.add_record(record);
        }
        builder.build()
    }
}
