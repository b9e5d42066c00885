// Chromium-family `History` database reader

use crate::error::{HistoryError, Result};
use crate::provider::HistoryProvider;
use crate::record::{HistoryRecord, Timestamp};
use rusqlite::{Connection, OpenFlags, params};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

/// Milliseconds between 1601-01-01 (WebKit epoch) and 1970-01-01.
const WEBKIT_EPOCH_OFFSET_MS: i64 = 11_644_473_600_000;

pub struct ChromeHistory {
    conn: Mutex<Connection>,
}

/// Convert a Unix millisecond timestamp to WebKit microseconds.
pub fn unix_ms_to_webkit(ms: Timestamp) -> i64 {
    ms.saturating_add(WEBKIT_EPOCH_OFFSET_MS).saturating_mul(1000)
}

/// Convert WebKit microseconds to a Unix millisecond timestamp.
pub fn webkit_to_unix_ms(webkit_us: i64) -> Timestamp {
    webkit_us.div_euclid(1000) - WEBKIT_EPOCH_OFFSET_MS
}

impl ChromeHistory {
    /// Open a `History` file read-only. The browser keeps the live file
    /// locked, so point this at a copy when the browser is running.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn query_window(
        &self,
        start: Timestamp,
        end: Timestamp,
        max_results: usize,
    ) -> Result<Vec<HistoryRecord>> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| HistoryError::Provider("history connection poisoned".to_string()))?;

        let mut stmt = conn.prepare(
            "SELECT url, last_visit_time FROM urls
             WHERE hidden = 0 AND last_visit_time >= ?1 AND last_visit_time < ?2
             ORDER BY last_visit_time DESC
             LIMIT ?3",
        )?;

        let limit = i64::try_from(max_results).unwrap_or(i64::MAX);
        let records = stmt
            .query_map(
                params![unix_ms_to_webkit(start), unix_ms_to_webkit(end), limit],
                |row| {
                    Ok(HistoryRecord {
                        url: row.get(0)?,
                        last_visit_time: webkit_to_unix_ms(row.get(1)?),
                    })
                },
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        debug!("History query [{}, {}) returned {} rows", start, end, records.len());
        Ok(records)
    }
}

impl HistoryProvider for ChromeHistory {
    async fn search(
        &self,
        start: Timestamp,
        end: Timestamp,
        max_results: usize,
    ) -> Result<Vec<HistoryRecord>> {
        self.query_window(start, end, max_results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_fixture(rows: &[(&str, Timestamp, bool)]) -> (TempDir, std::path::PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("History");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE urls (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url LONGVARCHAR,
                title LONGVARCHAR,
                visit_count INTEGER DEFAULT 0 NOT NULL,
                typed_count INTEGER DEFAULT 0 NOT NULL,
                last_visit_time INTEGER NOT NULL,
                hidden INTEGER DEFAULT 0 NOT NULL
            );",
        )
        .unwrap();
        for (url, ms, hidden) in rows {
            conn.execute(
                "INSERT INTO urls (url, title, last_visit_time, hidden) VALUES (?1, '', ?2, ?3)",
                params![url, unix_ms_to_webkit(*ms), *hidden as i64],
            )
            .unwrap();
        }
        (temp_dir, path)
    }

    #[test]
    fn test_webkit_conversion_round_trips_milliseconds() {
        assert_eq!(unix_ms_to_webkit(0), 11_644_473_600_000_000);
        assert_eq!(webkit_to_unix_ms(unix_ms_to_webkit(1_700_000_000_123)), 1_700_000_000_123);
        // Sub-millisecond precision is truncated.
        assert_eq!(webkit_to_unix_ms(unix_ms_to_webkit(5) + 999), 5);
    }

    #[tokio::test]
    async fn test_search_reads_newest_first_and_skips_hidden() {
        let (_dir, path) = create_fixture(&[
            ("https://a.com/", 1_000, false),
            ("https://b.com/", 2_000, false),
            ("https://hidden.com/", 2_500, true),
            ("https://c.com/", 3_000, false),
        ]);
        let history = ChromeHistory::open(&path).unwrap();

        let records = history.search(0, 10_000, 10).await.unwrap();
        let urls: Vec<_> = records.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://c.com/", "https://b.com/", "https://a.com/"]);
        assert_eq!(records[0].last_visit_time, 3_000);
    }

    #[tokio::test]
    async fn test_search_honours_window_and_cap() {
        let (_dir, path) = create_fixture(&[
            ("https://a.com/", 1_000, false),
            ("https://b.com/", 2_000, false),
            ("https://c.com/", 3_000, false),
        ]);
        let history = ChromeHistory::open(&path).unwrap();

        let records = history.search(1_000, 3_000, 10).await.unwrap();
        assert_eq!(records.len(), 2);

        let capped = history.search(0, 10_000, 1).await.unwrap();
        assert_eq!(capped.len(), 1);
        assert_eq!(capped[0].url, "https://c.com/");
    }

    #[test]
    fn test_open_missing_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let result = ChromeHistory::open(&temp_dir.path().join("missing"));
        assert!(matches!(result, Err(HistoryError::Database(_))));
    }
}
