use thiserror::Error;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("History provider failed: {0}")]
    Provider(String),

    #[error("History database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid page size: {0} (must be at least 1)")]
    InvalidPageSize(usize),

    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HistoryError>;
