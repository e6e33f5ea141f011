//! Session-scoped content cache for a portfolio and blog front end.
//!
//! Views read through a [`ContentCache`]: a per-kind [`cache::ResourceCache`]
//! written only by its [`fetch::FetchCoordinator`], plus
//! [`list::PaginatedListController`]s for the incrementally loaded blog index
//! and photo gallery.

pub mod cache;
pub mod config;
pub mod context;
pub mod fetch;
pub mod list;
pub mod revalidate;
pub mod telemetry;

pub use context::{ContentCache, ContentCacheBuilder};
