pub mod build;
pub mod cluster;
pub mod data;
pub mod model;
pub mod pipeline;
pub mod report;

pub use build::{GraphBuilder, extract_domain};
pub use cluster::{ClusterAssignment, ClusterConfig, ClusterEngine, Clustering};
pub use model::{Graph, Link, Node, delete_cluster};
pub use pipeline::{Orchestrator, PipelineError, RunOutcome, RunSummary};

use colored::Colorize;

pub fn print_banner() {
    let banner = r#"
   _     _     _                              _
  | |__ (_)___| |_ ___   __ _ _ __ __ _ _ __ | |__
  | '_ \| / __| __/ _ \ / _` | '__/ _` | '_ \| '_ \
  | | | | \__ \ || (_) | (_| | | | (_| | |_) | | | |
  |_| |_|_|___/\__\___/ \__, |_|  \__,_| .__/|_| |_|
                        |___/          |_|
"#;
    println!("{}", banner.bright_cyan().bold());
    println!(
        "  {} v{}\n",
        "where your browsing actually goes".bright_white(),
        env!("CARGO_PKG_VERSION")
    );
}
