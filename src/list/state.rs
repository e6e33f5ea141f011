use folio_api_types::ListPayload;

use super::search::{ListItem, filter_items};

/// Filters applied to a list view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Server-side category filter; changing it resets pagination.
    pub category: Option<String>,
    /// Normalized client-side search text.
    pub query: Option<String>,
}

/// Mutable state of one list view. Lives only as long as the controller.
#[derive(Debug, Clone)]
pub(crate) struct ListState<T> {
    pub items: Vec<T>,
    pub has_more: bool,
    pub current_page: u32,
    pub total_count: u64,
    pub filter: ListFilter,
    pub loading: bool,
    pub error: Option<String>,
    /// Bumped whenever a fetch starts; results from older fetches are dropped.
    pub generation: u64,
    /// Set once the first page has been seeded or fetched.
    pub initialized: bool,
}

impl<T: ListItem> ListState<T> {
    pub fn new(category: Option<String>) -> Self {
        Self {
            items: Vec::new(),
            has_more: false,
            current_page: 1,
            total_count: 0,
            filter: ListFilter {
                category,
                query: None,
            },
            loading: false,
            error: None,
            generation: 0,
            initialized: false,
        }
    }

    /// Start a fetch and return its generation.
    pub fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.loading = true;
        self.error = None;
        self.generation
    }

    /// Replace everything with a first page.
    pub fn replace_with(&mut self, payload: ListPayload<T>, page_size: u32) {
        self.has_more = has_more_after(&payload, page_size);
        self.total_count = payload.total_count;
        self.items = payload.items;
        self.current_page = 1;
        self.initialized = true;
    }

    /// Append page `page` to the accumulated items.
    pub fn append(&mut self, payload: ListPayload<T>, page: u32, page_size: u32, dedupe: bool) {
        self.has_more = has_more_after(&payload, page_size);
        self.total_count = payload.total_count;
        if dedupe {
            let known: std::collections::HashSet<String> =
                self.items.iter().map(|item| item.id().to_string()).collect();
            self.items.extend(
                payload
                    .items
                    .into_iter()
                    .filter(|item| !known.contains(item.id())),
            );
        } else {
            self.items.extend(payload.items);
        }
        self.current_page = page;
    }

    pub fn snapshot(&self) -> ListSnapshot<T> {
        let query_active = self.filter.query.is_some();
        ListSnapshot {
            items: self.items.clone(),
            visible: filter_items(&self.items, self.filter.query.as_deref()),
            has_more: self.has_more,
            can_load_more: self.has_more && !self.loading && !query_active,
            current_page: self.current_page,
            total_count: self.total_count,
            filter: self.filter.clone(),
            loading: self.loading,
            error: self.error.clone(),
        }
    }
}

/// A page ends the list when the server says so or when it came back short.
pub(crate) fn has_more_after<T>(payload: &ListPayload<T>, page_size: u32) -> bool {
    payload.has_more && payload.items.len() >= page_size as usize
}

/// Read-only view handed to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ListSnapshot<T> {
    /// Every loaded item, in server pagination order.
    pub items: Vec<T>,
    /// `items` narrowed by the active search query.
    pub visible: Vec<T>,
    pub has_more: bool,
    /// Whether a "load more" action would do anything right now.
    pub can_load_more: bool,
    pub current_page: u32,
    pub total_count: u64,
    pub filter: ListFilter,
    pub loading: bool,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_page_ends_list_even_if_server_claims_more() {
        let payload = ListPayload::new(vec![1u8; 6], true, 16);
        assert!(!has_more_after(&payload, 10));
    }

    #[test]
    fn full_page_follows_server_flag() {
        assert!(has_more_after(&ListPayload::new(vec![1u8; 10], true, 30), 10));
        assert!(!has_more_after(
            &ListPayload::new(vec![1u8; 10], false, 10),
            10
        ));
    }
}
