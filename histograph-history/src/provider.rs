use crate::error::Result;
use crate::record::{HistoryRecord, Timestamp};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A source of browsing history.
///
/// `search` returns records with `start <= last_visit_time < end`. When more
/// than `max_results` records match, only the `max_results` most recent are
/// returned, newest first. Callers that need the whole window page through it
/// with [`crate::HistoryFetcher`].
pub trait HistoryProvider: Send + Sync {
    fn search(
        &self,
        start: Timestamp,
        end: Timestamp,
        max_results: usize,
    ) -> impl Future<Output = Result<Vec<HistoryRecord>>> + Send;
}

/// Provider over an in-memory record list.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    records: Vec<HistoryRecord>,
    queries: AtomicUsize,
}

impl MemoryProvider {
    pub fn new(records: Vec<HistoryRecord>) -> Self {
        Self {
            records,
            queries: AtomicUsize::new(0),
        }
    }

    /// Every record in the window, newest first, with no cap applied.
    pub fn search_all(&self, start: Timestamp, end: Timestamp) -> Vec<HistoryRecord> {
        let mut matching: Vec<HistoryRecord> = self
            .records
            .iter()
            .filter(|r| r.last_visit_time >= start && r.last_visit_time < end)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.last_visit_time.cmp(&a.last_visit_time));
        matching
    }

    /// Number of `search` calls served so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl HistoryProvider for MemoryProvider {
    async fn search(
        &self,
        start: Timestamp,
        end: Timestamp,
        max_results: usize,
    ) -> Result<Vec<HistoryRecord>> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        let mut matching = self.search_all(start, end);
        matching.truncate(max_results);
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> MemoryProvider {
        MemoryProvider::new(vec![
            HistoryRecord::new("https://a.com/", 10),
            HistoryRecord::new("https://b.com/", 20),
            HistoryRecord::new("https://c.com/", 30),
            HistoryRecord::new("https://d.com/", 40),
        ])
    }

    #[tokio::test]
    async fn test_search_window_is_half_open() {
        let provider = provider();
        let records = provider.search(20, 40, 10).await.unwrap();
        let times: Vec<_> = records.iter().map(|r| r.last_visit_time).collect();
        assert_eq!(times, vec![30, 20]);
    }

    #[tokio::test]
    async fn test_search_cap_keeps_most_recent() {
        let provider = provider();
        let records = provider.search(0, 100, 2).await.unwrap();
        let times: Vec<_> = records.iter().map(|r| r.last_visit_time).collect();
        assert_eq!(times, vec![40, 30]);
        assert_eq!(provider.query_count(), 1);
    }
}
