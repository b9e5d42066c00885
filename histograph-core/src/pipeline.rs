use crate::build::GraphBuilder;
use crate::cluster::{ClusterConfig, ClusterEngine, Clustering};
use crate::model::{self, Graph};
use histograph_history::{
    HistoryError, HistoryFetcher, HistoryProvider, Timestamp, filter_by_horizon,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("History fetch failed: {0}")]
    Fetch(#[from] HistoryError),

    #[error("No graph has been built yet")]
    NoGraph,
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Receives every graph the orchestrator applies (the renderer's hook).
pub type GraphCallback = Arc<dyn Fn(&Graph) + Send + Sync>;

/// Callback for reporting pipeline progress
pub type PipelineProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub generation: u64,
    pub horizon_days: u32,
    pub fetched_items: usize,
    pub filtered_items: usize,
    pub domains: usize,
    pub links: usize,
    pub clusters: usize,
    pub passes: usize,
    pub converged: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The run's graph is now the current graph.
    Applied(RunSummary),
    /// A newer run was issued before this one finished; its result was dropped.
    Superseded { generation: u64 },
}

/// Drives fetch, filter, build and cluster for a horizon and keeps the
/// latest result.
///
/// Runs may overlap. Each run takes a generation number when it starts and
/// only applies its graph if no newer run has started since, so a slow run
/// can never overwrite the result of a faster, more recent one.
pub struct Orchestrator<P> {
    fetcher: HistoryFetcher<P>,
    engine: ClusterEngine,
    generation: AtomicU64,
    current: Mutex<Option<Graph>>,
    graph_callback: Option<GraphCallback>,
    progress_callback: Option<PipelineProgressCallback>,
}

impl<P: HistoryProvider> Orchestrator<P> {
    pub fn new(provider: P) -> Self {
        Self {
            fetcher: HistoryFetcher::new(provider),
            engine: ClusterEngine::new(),
            generation: AtomicU64::new(0),
            current: Mutex::new(None),
            graph_callback: None,
            progress_callback: None,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.fetcher = self.fetcher.with_page_size(page_size);
        self
    }

    pub fn with_cluster_config(mut self, config: ClusterConfig) -> Self {
        self.engine = ClusterEngine::with_config(config);
        self
    }

    pub fn with_graph_callback(mut self, callback: GraphCallback) -> Self {
        self.graph_callback = Some(callback);
        self
    }

    pub fn with_progress_callback(mut self, callback: PipelineProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn provider(&self) -> &P {
        self.fetcher.provider()
    }

    /// Run the pipeline for the last `days` days, as of now.
    pub async fn run(&self, days: u32) -> Result<RunOutcome> {
        self.run_at(days, chrono::Utc::now().timestamp_millis()).await
    }

    pub async fn run_at(&self, days: u32, now: Timestamp) -> Result<RunOutcome> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Pipeline run {} started for {} days", generation, days);

        self.report(format!("Fetching history for the last {} days...", days));
        let fetched = match self.fetcher.fetch(days, now).await {
            Ok(records) => records,
            Err(_) if !self.is_latest(generation) => {
                debug!("Pipeline run {} failed after being superseded", generation);
                return Ok(RunOutcome::Superseded { generation });
            }
            Err(e) => return Err(e.into()),
        };
        let fetched_items = fetched.len();

        let filtered = filter_by_horizon(fetched, days, now);
        let filtered_items = filtered.len();

        self.report(format!("Building graph from {} items...", filtered_items));
        let mut graph = GraphBuilder::from_records(&filtered);

        self.report(format!("Clustering {} domains...", graph.node_count()));
        let clustering = self.engine.cluster(&graph);
        graph.apply_clusters(&clustering.assignment);

        let summary = RunSummary {
            generation,
            horizon_days: days,
            fetched_items,
            filtered_items,
            domains: graph.node_count(),
            links: graph.link_count(),
            clusters: clustering.assignment.cluster_count(),
            passes: clustering.passes,
            converged: clustering.converged,
        };

        if !self.apply_if_latest(generation, graph) {
            debug!("Pipeline run {} superseded, discarding result", generation);
            return Ok(RunOutcome::Superseded { generation });
        }

        info!(
            "Showing {} items: {} domains, {} links, {} clusters",
            filtered_items, summary.domains, summary.links, summary.clusters
        );
        Ok(RunOutcome::Applied(summary))
    }

    /// The most recently applied graph.
    pub fn current(&self) -> Option<Graph> {
        self.lock_current().clone()
    }

    /// Drop a cluster from the current graph and apply the reduced graph.
    /// Surviving nodes keep their labels.
    pub fn delete_cluster(&self, label: &str) -> Result<Graph> {
        let mut current = self.lock_current();
        let graph = current.as_ref().ok_or(PipelineError::NoGraph)?;

        let reduced = model::delete_cluster(graph, label);
        info!(
            "Deleted cluster {}: {} domains remain",
            label,
            reduced.node_count()
        );
        self.notify(&reduced);
        *current = Some(reduced.clone());
        Ok(reduced)
    }

    /// Recompute clusters for the current graph from scratch.
    pub fn recluster(&self) -> Result<Clustering> {
        let mut current = self.lock_current();
        let graph = current.as_mut().ok_or(PipelineError::NoGraph)?;

        let clustering = self.engine.cluster(graph);
        graph.apply_clusters(&clustering.assignment);
        self.notify(graph);
        Ok(clustering)
    }

    fn is_latest(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn apply_if_latest(&self, generation: u64, graph: Graph) -> bool {
        let mut current = self.lock_current();
        if !self.is_latest(generation) {
            return false;
        }
        self.notify(&graph);
        *current = Some(graph);
        true
    }

    fn notify(&self, graph: &Graph) {
        if let Some(ref callback) = self.graph_callback {
            callback(graph);
        }
    }

    fn report(&self, message: String) {
        if let Some(ref callback) = self.progress_callback {
            callback(message);
        }
    }

    fn lock_current(&self) -> MutexGuard<'_, Option<Graph>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
