// Paging through a Chromium history database

use histograph_history::chrome::unix_ms_to_webkit;
use histograph_history::{
    ChromeHistory, HistoryFetcher, HistoryRecord, MS_PER_DAY, filter_by_horizon,
};
use rusqlite::{Connection, params};
use tempfile::TempDir;

const NOW: i64 = 1_700_000_000_000;

fn create_history(visits: &[(String, i64)]) -> (TempDir, std::path::PathBuf) {
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
    for (url, ms) in visits {
        conn.execute(
            "INSERT INTO urls (url, title, last_visit_time) VALUES (?1, '', ?2)",
            params![url, unix_ms_to_webkit(*ms)],
        )
        .unwrap();
    }
    (temp_dir, path)
}

/// 250 visits spread over ten days, four of them sharing each 10-minute mark.
fn visits() -> Vec<(String, i64)> {
    (0..250i64)
        .map(|i| {
            let at = NOW - 10 * MS_PER_DAY + (i / 4) * 10 * 60 * 1000 * 23;
            (format!("https://site{}.example/{}", i % 9, i), at)
        })
        .collect()
}

#[tokio::test]
async fn test_paged_fetch_matches_single_query() {
    let (_dir, path) = create_history(&visits());

    let paged = HistoryFetcher::new(ChromeHistory::open(&path).unwrap())
        .with_page_size(7)
        .fetch(30, NOW)
        .await
        .unwrap();
    let whole = HistoryFetcher::new(ChromeHistory::open(&path).unwrap())
        .fetch(30, NOW)
        .await
        .unwrap();

    assert_eq!(paged.len(), 250);
    assert!(paged.windows(2).all(|w| w[0].last_visit_time <= w[1].last_visit_time));

    // Order within one instant is up to the database.
    let key = |r: &HistoryRecord| (r.last_visit_time, r.url.clone());
    let mut paged: Vec<_> = paged.iter().map(key).collect();
    let mut whole: Vec<_> = whole.iter().map(key).collect();
    paged.sort();
    whole.sort();
    assert_eq!(paged, whole);
}

#[tokio::test]
async fn test_fetch_then_filter_keeps_horizon() {
    let (_dir, path) = create_history(&visits());
    let fetcher = HistoryFetcher::new(ChromeHistory::open(&path).unwrap()).with_page_size(16);

    let fetched = fetcher.fetch(3, NOW).await.unwrap();
    let cutoff = NOW - 3 * MS_PER_DAY;
    assert!(fetched.iter().all(|r| r.last_visit_time >= cutoff && r.last_visit_time < NOW));

    let expected = visits()
        .iter()
        .filter(|(_, at)| *at > cutoff && *at < NOW)
        .count();
    let filtered = filter_by_horizon(fetched, 3, NOW);
    assert_eq!(filtered.len(), expected);
}
