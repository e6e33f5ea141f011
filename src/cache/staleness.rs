//! Staleness policy.

use std::time::Duration;

use tokio::time::Instant;

use super::store::CacheEntry;

/// Window used when a caller does not override it (5 minutes).
pub const DEFAULT_MAX_AGE: Duration = Duration::from_millis(300_000);

/// An entry is fresh iff it exists, is not loading, has completed a fetch,
/// and that fetch is younger than `max_age`.
pub fn is_fresh<T>(entry: Option<&CacheEntry<T>>, max_age: Duration, now: Instant) -> bool {
    let Some(entry) = entry else {
        return false;
    };
    if entry.loading {
        return false;
    }
    match entry.last_fetched_at {
        Some(fetched_at) => now.saturating_duration_since(fetched_at) < max_age,
        None => false,
    }
}
