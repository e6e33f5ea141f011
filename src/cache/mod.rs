//! Folio resource cache.
//!
//! Session-scoped, in-memory storage for content-store responses:
//!
//! - **Keys**: one [`ResourceKey`] per collection, page cursor or item
//! - **Store**: [`ResourceCache`] entries of `{data, loading, last_fetched_at}`
//! - **Staleness**: [`is_fresh`] decides whether an entry can be reused
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! max_age_ms = 300000
//! page_size = 10
//! photo_page_size = 24
//! dedupe_by_id = false
//! ```

mod config;
mod keys;
pub(crate) mod lock;
mod staleness;
mod store;

pub use config::CacheConfig;
pub use keys::{ListKind, ListQuery, ResourceKey};
pub use staleness::{DEFAULT_MAX_AGE, is_fresh};
pub use store::{BeginFetch, CacheEntry, Generation, ResourceCache};
