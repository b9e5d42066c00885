use crate::error::{HistoryError, Result};
use crate::filter::horizon_cutoff;
use crate::provider::HistoryProvider;
use crate::record::{HistoryRecord, Timestamp};
use tracing::{debug, info, warn};

/// Per-query cap handed to the provider unless overridden.
pub const MAX_RESULTS_PER_SEARCH: usize = 1000;

/// Pages through a provider's capped `search` until a time window is exhausted.
///
/// The provider answers each query with the newest records of the window, so
/// the fetcher walks backwards in time: after every full page the window's
/// exclusive end moves down to the oldest timestamp returned. Records sharing
/// that oldest timestamp may have been cut off by the cap, so they are held
/// back and re-read on the next page, which keeps the result free of gaps and
/// duplicates.
pub struct HistoryFetcher<P> {
    provider: P,
    page_size: usize,
}

impl<P: HistoryProvider> HistoryFetcher<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            page_size: MAX_RESULTS_PER_SEARCH,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Everything visited in the last `days` days before `now`, oldest first.
    pub async fn fetch(&self, days: u32, now: Timestamp) -> Result<Vec<HistoryRecord>> {
        info!("Fetching history for the last {} days", days);
        self.fetch_window(horizon_cutoff(days, now), now).await
    }

    /// Every record with `start <= last_visit_time < end`, oldest first.
    ///
    /// Any provider error aborts the whole fetch.
    pub async fn fetch_window(&self, start: Timestamp, end: Timestamp) -> Result<Vec<HistoryRecord>> {
        if self.page_size == 0 {
            return Err(HistoryError::InvalidPageSize(self.page_size));
        }

        let mut all_history: Vec<HistoryRecord> = Vec::new();
        let mut window_end = end;
        let mut pages = 0usize;

        while window_end > start {
            debug!("Fetching history page [{}, {})", start, window_end);
            let chunk = self.provider.search(start, window_end, self.page_size).await?;
            pages += 1;

            if chunk.len() < self.page_size {
                all_history.extend(chunk);
                break;
            }

            // A full page: len >= page_size >= 1.
            let (oldest, newest) = chunk.iter().fold(
                (Timestamp::MAX, Timestamp::MIN),
                |(lo, hi), r| (lo.min(r.last_visit_time), hi.max(r.last_visit_time)),
            );

            let next_end = if newest > oldest {
                all_history.extend(chunk.into_iter().filter(|r| r.last_visit_time > oldest));
                oldest + 1
            } else {
                warn!(
                    "More than {} history items share timestamp {}; items beyond the cap cannot be paged",
                    self.page_size, oldest
                );
                all_history.extend(chunk);
                oldest
            };

            if next_end >= window_end {
                return Err(HistoryError::Provider(format!(
                    "provider returned items outside the window [{}, {})",
                    start, window_end
                )));
            }
            window_end = next_end;
        }

        all_history.sort_by_key(|r| r.last_visit_time);
        info!(
            "Finished fetching history. Total items: {} ({} pages)",
            all_history.len(),
            pages
        );
        Ok(all_history)
    }
}
