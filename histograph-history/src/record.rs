use crate::error::Result;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

/// A single visited URL as reported by a history provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub url: String,
    #[serde(deserialize_with = "millis_from_number")]
    pub last_visit_time: Timestamp,
}

/// Browser exports carry fractional milliseconds; whole milliseconds are kept.
fn millis_from_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Timestamp, D::Error> {
    let ms = f64::deserialize(deserializer)?;
    Ok(ms.floor() as Timestamp)
}

impl HistoryRecord {
    pub fn new(url: impl Into<String>, last_visit_time: Timestamp) -> Self {
        Self {
            url: url.into(),
            last_visit_time,
        }
    }
}

/// Load a JSON array of `{ "url", "lastVisitTime" }` objects, the shape the
/// browser history API hands out.
pub fn load_records_from_file(path: &Path) -> Result<Vec<HistoryRecord>> {
    let content = fs::read_to_string(path)?;
    let records: Vec<HistoryRecord> = serde_json::from_str(&content)?;
    Ok(records)
}
