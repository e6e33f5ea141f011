//! Client-side search over already loaded list items.
//!
//! Search never queries the content store; it narrows whatever pages have
//! been paginated into memory.

use folio_api_types::{BlogPost, Photo};

/// An item a list controller can accumulate and search.
pub trait ListItem: Clone + Send + Sync + 'static {
    /// Unique id used for de-duplication.
    fn id(&self) -> &str;

    /// Text fields matched by free-text search.
    fn search_fields(&self) -> Vec<&str>;
}

impl ListItem for BlogPost {
    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str(), self.summary.as_str()];
        fields.extend(self.tags.iter().map(String::as_str));
        fields
    }
}

impl ListItem for Photo {
    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str(), self.description.as_str()];
        fields.extend(self.tags.iter().map(String::as_str));
        fields
    }
}

/// Normalize a raw search box value; blank input means "no query".
pub fn normalize_query(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Case-insensitive substring match against any searchable field.
///
/// `needle` must already be normalized with [`normalize_query`].
pub fn matches<T: ListItem>(item: &T, needle: &str) -> bool {
    item.search_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

pub fn filter_items<T: ListItem>(items: &[T], query: Option<&str>) -> Vec<T> {
    match query {
        Some(needle) => items
            .iter()
            .filter(|item| matches(*item, needle))
            .cloned()
            .collect(),
        None => items.to_vec(),
    }
}
