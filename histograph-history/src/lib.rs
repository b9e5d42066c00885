pub mod chrome;
pub mod error;
pub mod fetcher;
pub mod filter;
pub mod provider;
pub mod record;

pub use chrome::ChromeHistory;
pub use error::HistoryError;
pub use fetcher::{HistoryFetcher, MAX_RESULTS_PER_SEARCH};
pub use filter::{MS_PER_DAY, filter_by_horizon};
pub use provider::{HistoryProvider, MemoryProvider};
pub use record::{HistoryRecord, Timestamp, load_records_from_file};
