use anyhow::{Context, Result, anyhow, bail};
use clap::ArgMatches;
use colored::Colorize;
use histograph_core::cluster::DEFAULT_MAX_PASSES;
use histograph_core::data::ClusterNames;
use histograph_core::pipeline::PipelineProgressCallback;
use histograph_core::report::{
    ReportFormat, generate_json_report, generate_text_report, save_report,
};
use histograph_core::{ClusterConfig, Graph, Orchestrator, RunOutcome, RunSummary};
use histograph_history::{
    ChromeHistory, HistoryProvider, HistoryRecord, MAX_RESULTS_PER_SEARCH, MemoryProvider,
    Timestamp, load_records_from_file,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_CONFIG_DIR: &str = "~/.config/histograph/";
const NAMES_DB_FILE: &str = "names.db";

/// Where the graph command reads history from.
pub enum HistorySource {
    Chrome(ChromeHistory),
    Records(MemoryProvider),
}

impl HistoryProvider for HistorySource {
    async fn search(
        &self,
        start: Timestamp,
        end: Timestamp,
        max_results: usize,
    ) -> histograph_history::error::Result<Vec<HistoryRecord>> {
        match self {
            HistorySource::Chrome(history) => history.search(start, end, max_results).await,
            HistorySource::Records(records) => records.search(start, end, max_results).await,
        }
    }
}

/// Knobs for one `graph` invocation.
#[derive(Debug, Clone)]
pub struct GraphOptions {
    pub days: u32,
    pub page_size: usize,
    pub max_passes: usize,
    /// Cluster labels removed, in order, after the run.
    pub delete_clusters: Vec<String>,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            days: 7,
            page_size: MAX_RESULTS_PER_SEARCH,
            max_passes: DEFAULT_MAX_PASSES,
            delete_clusters: Vec::new(),
        }
    }
}

// Helper functions for graph handler

/// Expand `~` in a config directory argument
pub fn resolve_config_dir(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

pub fn names_db_path(config_dir: &Path) -> PathBuf {
    config_dir.join(NAMES_DB_FILE)
}

/// Open the history source named on the command line
pub fn load_history_source(
    history: Option<&PathBuf>,
    records: Option<&PathBuf>,
) -> Result<HistorySource> {
    if let Some(records_path) = records {
        let records = load_records_from_file(records_path)
            .with_context(|| format!("Failed to load records from {}", records_path.display()))?;
        debug!("Loaded {} records from {}", records.len(), records_path.display());
        Ok(HistorySource::Records(MemoryProvider::new(records)))
    } else if let Some(history_path) = history {
        let history = ChromeHistory::open(history_path).with_context(|| {
            format!("Failed to open history database {}", history_path.display())
        })?;
        Ok(HistorySource::Chrome(history))
    } else {
        bail!("Either --history or --records must be provided")
    }
}

/// Cluster names for report titles. A missing database means no names.
pub fn load_cluster_names(config_dir: &Path) -> Result<HashMap<String, String>> {
    let db_path = names_db_path(config_dir);
    if !ClusterNames::exists(&db_path) {
        return Ok(HashMap::new());
    }
    let store = ClusterNames::new(&db_path)
        .with_context(|| format!("Failed to open names database {}", db_path.display()))?;
    Ok(store.all_names()?)
}

/// Run the pipeline once as of `now`, then delete the requested clusters.
/// Returns the final graph and the summary of the run that built it.
pub async fn build_graph<P: HistoryProvider>(
    provider: P,
    options: &GraphOptions,
    now: Timestamp,
    progress: Option<PipelineProgressCallback>,
) -> Result<(Graph, RunSummary)> {
    let mut orchestrator = Orchestrator::new(provider)
        .with_page_size(options.page_size)
        .with_cluster_config(ClusterConfig {
            max_passes: options.max_passes,
        });
    if let Some(callback) = progress {
        orchestrator = orchestrator.with_progress_callback(callback);
    }

    let summary = match orchestrator.run_at(options.days, now).await? {
        RunOutcome::Applied(summary) => summary,
        RunOutcome::Superseded { generation } => {
            bail!("Run {} was superseded before it finished", generation)
        }
    };

    for label in &options.delete_clusters {
        let before = orchestrator.current().map(|g| g.node_count()).unwrap_or(0);
        let reduced = orchestrator.delete_cluster(label)?;
        if reduced.node_count() == before {
            warn!("No cluster labelled {}", label);
        }
    }

    let graph = orchestrator
        .current()
        .ok_or_else(|| anyhow!("The pipeline produced no graph"))?;
    Ok((graph, summary))
}

pub fn render_report(
    graph: &Graph,
    format: &ReportFormat,
    names: &HashMap<String, String>,
) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(graph, names)),
        ReportFormat::Json => Ok(generate_json_report(graph)?),
    }
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn config_dir_arg(args: &ArgMatches, id: &str) -> PathBuf {
    let raw = args
        .get_one::<String>(id)
        .map(String::as_str)
        .unwrap_or(DEFAULT_CONFIG_DIR);
    resolve_config_dir(raw)
}

pub fn handle_init(args: &ArgMatches) -> Result<()> {
    print_divider();
    println!("{}", "  HISTOGRAPH INITIALIZATION".bright_white().bold());
    print_divider();
    println!();

    let config_dir = config_dir_arg(args, "PATH");
    let force = args.get_flag("force");
    let db_path = names_db_path(&config_dir);

    println!(
        "{} Target: {}",
        "→".blue(),
        config_dir.display().to_string().bright_white()
    );
    println!();

    fs::create_dir_all(&config_dir)
        .with_context(|| format!("Failed to create {}", config_dir.display()))?;

    if ClusterNames::exists(&db_path) {
        if !force {
            println!("{}", "⚠ WARNING".yellow().bold());
            println!("Names database already exists at:");
            println!(
                "  {} {}",
                "•".yellow(),
                db_path.display().to_string().bright_white()
            );
            println!("Run again with --force to overwrite it.");
            println!();
            return Ok(());
        }

        println!(
            "{} Deleting existing database (force mode)",
            "→".yellow().bold()
        );
        ClusterNames::remove(&db_path)
            .with_context(|| format!("Failed to remove {}", db_path.display()))?;
        println!("{} Existing database removed", "✓".green().bold());
        println!();
    }

    println!("{} Creating database...", "→".blue());
    ClusterNames::new(&db_path)
        .with_context(|| format!("Failed to create {}", db_path.display()))?;

    println!();
    print_divider();
    println!("{}", "  INITIALIZATION COMPLETE".green().bold());
    print_divider();
    println!();
    println!(
        "{} Config directory: {}",
        "✓".green().bold(),
        config_dir.display().to_string().bright_white()
    );
    println!(
        "{} Database: {}",
        "✓".green().bold(),
        db_path.display().to_string().bright_white()
    );
    println!();
    Ok(())
}

pub async fn handle_graph(sub_matches: &ArgMatches) -> Result<()> {
    let history = sub_matches.get_one::<PathBuf>("history");
    let records = sub_matches.get_one::<PathBuf>("records");
    let output = sub_matches.get_one::<PathBuf>("output");
    let format = sub_matches
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text);
    let config_dir = config_dir_arg(sub_matches, "config-dir");

    let options = GraphOptions {
        days: *sub_matches.get_one::<u32>("days").unwrap_or(&7),
        page_size: *sub_matches
            .get_one::<usize>("page-size")
            .unwrap_or(&MAX_RESULTS_PER_SEARCH),
        max_passes: *sub_matches
            .get_one::<usize>("max-passes")
            .unwrap_or(&DEFAULT_MAX_PASSES),
        delete_clusters: sub_matches
            .get_many::<String>("delete-cluster")
            .map(|labels| labels.cloned().collect())
            .unwrap_or_default(),
    };

    let source = load_history_source(history, records)?;
    let names = load_cluster_names(&config_dir)?;

    println!("\n🕸️  Mapping the last {} days of history", options.days);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));
    let bar = spinner.clone();
    let progress: PipelineProgressCallback = Arc::new(move |msg: String| bar.set_message(msg));

    let now = chrono::Utc::now().timestamp_millis();
    let result = build_graph(source, &options, now, Some(progress)).await;
    spinner.finish_and_clear();
    let (graph, summary) = result?;

    println!(
        "{} Fetched {} items, {} within the horizon",
        "✓".green().bold(),
        summary.fetched_items,
        summary.filtered_items
    );
    println!(
        "{} {} domains, {} links, {} clusters",
        "✓".green().bold(),
        summary.domains,
        summary.links,
        summary.clusters
    );
    if !summary.converged {
        println!(
            "{} Clustering stopped after {} passes without settling",
            "⚠".yellow().bold(),
            summary.passes
        );
    }
    for label in &options.delete_clusters {
        println!("{} Deleted cluster {}", "→".blue(), label.bright_white());
    }
    if !options.delete_clusters.is_empty() {
        println!(
            "{} {} domains remain",
            "✓".green().bold(),
            graph.node_count()
        );
    }
    println!();

    let report = render_report(&graph, &format, &names)?;
    match output {
        Some(path) => {
            save_report(&report, path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!(
                "{} Report saved to {}",
                "✓".green().bold(),
                path.display().to_string().bright_white()
            );
        }
        None => print!("{}", report),
    }
    Ok(())
}

pub fn handle_name(args: &ArgMatches) -> Result<()> {
    let label = args
        .get_one::<String>("label")
        .ok_or_else(|| anyhow!("--label is required"))?;
    let name = args
        .get_one::<String>("name")
        .ok_or_else(|| anyhow!("--name is required"))?;
    let config_dir = config_dir_arg(args, "config-dir");

    fs::create_dir_all(&config_dir)
        .with_context(|| format!("Failed to create {}", config_dir.display()))?;
    let store = ClusterNames::new(&names_db_path(&config_dir))?;

    if store.set_name(label, name)? {
        println!(
            "{} Cluster {} is now called {}",
            "✓".green().bold(),
            label.bright_white(),
            name.trim().bright_white()
        );
    } else {
        println!("{} Blank name ignored for {}", "⚠".yellow().bold(), label);
    }
    Ok(())
}

pub fn handle_names(args: &ArgMatches) -> Result<()> {
    let config_dir = config_dir_arg(args, "config-dir");
    let names = load_cluster_names(&config_dir)?;

    if names.is_empty() {
        println!("No named clusters");
        return Ok(());
    }

    let mut entries: Vec<_> = names.into_iter().collect();
    entries.sort();
    for (label, name) in entries {
        println!("  {} {}  {}", "•".cyan(), name.bright_white(), label.dimmed());
    }
    Ok(())
}
