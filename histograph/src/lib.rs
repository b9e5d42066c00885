// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

pub use handlers::{
    DEFAULT_CONFIG_DIR, GraphOptions, HistorySource, build_graph, load_cluster_names,
    load_history_source, names_db_path, render_report, resolve_config_dir,
};
