/// Book record model.
pub mod record;
/// JSON-backed store.
pub mod store;

pub use record::{BookRecord, Menu, parse_timestamp};
pub use store::{LibraryStats, LibraryStore};

/// Default recency window in days.
pub const DEFAULT_RECENT_DAYS: i64 = 7;

/// Author used when none is known.
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";
