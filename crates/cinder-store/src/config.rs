//! Store limits

use std::time::Duration;

/// Views granted to a vault note when the caller does not ask for a count
pub const DEFAULT_VIEWS: u32 = 3;
/// Floor for vault notes; a single view is what burn-after-read is for
pub const MIN_VIEWS: u32 = 2;
/// Ceiling for vault notes
pub const MAX_VIEWS: u32 = 50;

/// Tunables for a `NoteStore`
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Largest accepted blob, in bytes
    pub max_blob_bytes: usize,
    /// Longest lifetime a note may ask for (7 days)
    pub max_ttl_minutes: f64,
    /// View budget for vault notes created without `max_views`
    pub default_views: u32,
    /// How often the background sweep runs
    pub sweep_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_blob_bytes: 64 * 1024, // 64KB
            max_ttl_minutes: 7.0 * 24.0 * 60.0,
            default_views: DEFAULT_VIEWS,
            sweep_interval: Duration::from_secs(60),
        }
    }
}
