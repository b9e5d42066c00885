// Report generation and JSON export of a clustered graph

use crate::model::Graph;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

/// The graph model as handed to renderers and written by JSON export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphExport {
    pub nodes: Vec<ExportNode>,
    pub links: Vec<ExportLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportNode {
    pub id: String,
    pub url: String,
    pub visit_count: u64,
    pub last_visit: i64,
    pub cluster: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportLink {
    pub source: String,
    pub target: String,
    pub value: u64,
}

impl From<&Graph> for GraphExport {
    fn from(graph: &Graph) -> Self {
        Self {
            nodes: graph
                .nodes()
                .map(|node| ExportNode {
                    id: node.id.clone(),
                    url: node.sample_url.clone(),
                    visit_count: node.visit_count,
                    last_visit: node.last_visit,
                    cluster: node.cluster.clone(),
                })
                .collect(),
            links: graph
                .links()
                .map(|link| ExportLink {
                    source: link.source.clone(),
                    target: link.target.clone(),
                    value: link.weight,
                })
                .collect(),
        }
    }
}

pub fn generate_json_report(graph: &Graph) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&GraphExport::from(graph))
}

/// Human readable cluster listing. `names` maps labels to display names;
/// labels without one are shown as-is.
pub fn generate_text_report(graph: &Graph, names: &HashMap<String, String>) -> String {
    let clusters = graph.clusters();
    let mut report = String::new();

    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Domains: {}\n", graph.node_count()));
    report.push_str(&format!("  Links: {}\n", graph.link_count()));
    report.push_str(&format!("  Clusters: {}\n", clusters.len()));

    let total_visits: u64 = graph.nodes().map(|n| n.visit_count).sum();
    report.push_str(&format!("  Total visits: {}\n", total_visits));

    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    for (label, members) in &clusters {
        let title = names.get(label).map(String::as_str).unwrap_or(label);
        if title == label.as_str() {
            report.push_str(&format!("## {}\n", title));
        } else {
            report.push_str(&format!("## {} ({})\n", title, label));
        }
        report.push_str(&format!("  {} domains\n\n", members.len()));

        for node in members {
            report.push_str(&format!(
                "  {:>5}  {}  \x1b[90mlast visit {}\x1b[0m\n",
                node.visit_count,
                node.id,
                format_timestamp(node.last_visit)
            ));
        }
        report.push('\n');
    }

    report
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

fn format_timestamp(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ms.to_string())
}
