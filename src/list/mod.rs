//! Incremental list loading for the blog index and photo gallery.

mod controller;
mod search;
mod state;

pub use controller::{ListOptions, ListOutcome, PaginatedListController};
pub use search::{ListItem, filter_items, matches, normalize_query};
pub use state::{ListFilter, ListSnapshot};
