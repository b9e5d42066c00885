use crate::record::{HistoryRecord, Timestamp};
use tracing::debug;

pub const MS_PER_DAY: i64 = 1000 * 60 * 60 * 24;

/// Oldest timestamp (exclusive) still inside a horizon of `days` ending at `now`.
pub fn horizon_cutoff(days: u32, now: Timestamp) -> Timestamp {
    now.saturating_sub(i64::from(days).saturating_mul(MS_PER_DAY))
}

/// Keep only records visited strictly after `now - days`.
///
/// A zero-day horizon is always empty, even for records stamped in the future.
pub fn filter_by_horizon(
    records: Vec<HistoryRecord>,
    days: u32,
    now: Timestamp,
) -> Vec<HistoryRecord> {
    let total = records.len();
    if days == 0 {
        debug!("Zero-day horizon, dropping all {} items", total);
        return Vec::new();
    }

    let cutoff = horizon_cutoff(days, now);
    let filtered: Vec<HistoryRecord> = records
        .into_iter()
        .filter(|r| r.last_visit_time > cutoff)
        .collect();

    debug!("Filtered {} items to {} for last {} days", total, filtered.len(), days);
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: Timestamp = 100 * MS_PER_DAY;

    fn records() -> Vec<HistoryRecord> {
        vec![
            HistoryRecord::new("https://old.com/", NOW - 3 * MS_PER_DAY),
            HistoryRecord::new("https://edge.com/", NOW - MS_PER_DAY),
            HistoryRecord::new("https://recent.com/", NOW - MS_PER_DAY + 1),
            HistoryRecord::new("https://now.com/", NOW),
        ]
    }

    #[test]
    fn test_cutoff_is_exclusive() {
        let kept = filter_by_horizon(records(), 1, NOW);
        let urls: Vec<_> = kept.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://recent.com/", "https://now.com/"]);
    }

    #[test]
    fn test_wider_horizon_keeps_more() {
        let kept = filter_by_horizon(records(), 7, NOW);
        assert_eq!(kept.len(), 4);
    }

    #[test]
    fn test_zero_days_is_empty() {
        let mut all = records();
        all.push(HistoryRecord::new("https://future.com/", NOW + MS_PER_DAY));
        assert!(filter_by_horizon(all, 0, NOW).is_empty());
    }

    #[test]
    fn test_filter_preserves_order() {
        let kept = filter_by_horizon(records(), 30, NOW);
        let times: Vec<_> = kept.iter().map(|r| r.last_visit_time).collect();
        let mut sorted = times.clone();
        sorted.sort();
        assert_eq!(times, sorted);
    }
}
