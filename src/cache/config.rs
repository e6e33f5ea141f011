//! Cache configuration.
//!
//! Controls staleness windows and page sizes via the `[cache]` table.

use std::time::Duration;

use serde::Deserialize;

const DEFAULT_MAX_AGE_MS: u64 = 300_000;
const DEFAULT_PAGE_SIZE: u32 = 10;
const DEFAULT_PHOTO_PAGE_SIZE: u32 = 24;

/// Cache configuration from `folio.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Staleness window applied when a caller does not pass one.
    pub max_age_ms: u64,
    /// Blog posts requested per page.
    pub page_size: u32,
    /// Photos requested per page.
    pub photo_page_size: u32,
    /// Drop appended list items whose id is already loaded.
    pub dedupe_by_id: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age_ms: DEFAULT_MAX_AGE_MS,
            page_size: DEFAULT_PAGE_SIZE,
            photo_page_size: DEFAULT_PHOTO_PAGE_SIZE,
            dedupe_by_id: false,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            max_age_ms: settings.max_age.as_millis().try_into().unwrap_or(u64::MAX),
            page_size: settings.page_size.get(),
            photo_page_size: settings.photo_page_size.get(),
            dedupe_by_id: settings.dedupe_by_id,
        }
    }
}

impl CacheConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_millis(self.max_age_ms)
    }

    /// Blog page size, clamped to 1 if zero.
    pub fn page_size_non_zero(&self) -> u32 {
        self.page_size.max(1)
    }

    /// Photo page size, clamped to 1 if zero.
    pub fn photo_page_size_non_zero(&self) -> u32 {
        self.photo_page_size.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert_eq!(config.max_age(), Duration::from_secs(300));
        assert_eq!(config.page_size, 10);
        assert_eq!(config.photo_page_size, 24);
        assert!(!config.dedupe_by_id);
    }

    #[test]
    fn page_sizes_clamp_to_one() {
        let config = CacheConfig {
            page_size: 0,
            photo_page_size: 0,
            ..Default::default()
        };
        assert_eq!(config.page_size_non_zero(), 1);
        assert_eq!(config.photo_page_size_non_zero(), 1);
    }
}
