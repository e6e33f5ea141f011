//! Paginated list controller.
//!
//! Drives one list view (blog index, photo gallery): seeds from a
//! server-provided first page, appends pages on "load more", resets on
//! category changes and narrows loaded items by free-text search.
//!
//! Per view the state machine is `Idle -> Loading -> Idle`. A fetch started
//! by a category change or reload supersedes any pending fetch; the pending
//! result is dropped when it arrives.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use folio_api_types::ListPayload;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::cache::lock::mutex_lock;
use crate::cache::{CacheConfig, ListKind, ListQuery};
use crate::fetch::FetchCoordinator;

use super::search::{ListItem, normalize_query};
use super::state::{ListSnapshot, ListState};

const SOURCE: &str = "list::controller";

/// What a controller call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOutcome {
    /// Preconditions not met (already loading, no more pages, search active,
    /// filter unchanged); no request made.
    Skipped,
    /// The page was applied to the list.
    Loaded,
    /// The fetch failed; loaded items are kept and the error is set.
    Failed,
    /// A newer fetch started meanwhile; this result was dropped.
    Discarded,
}

#[derive(Debug, Clone, Copy)]
pub struct ListOptions {
    pub page_size: u32,
    pub max_age: Duration,
    pub dedupe_by_id: bool,
}

impl ListOptions {
    pub fn for_kind(kind: ListKind, config: &CacheConfig) -> Self {
        let page_size = match kind {
            ListKind::Posts => config.page_size_non_zero(),
            ListKind::Photos => config.photo_page_size_non_zero(),
        };
        Self {
            page_size,
            max_age: config.max_age(),
            dedupe_by_id: config.dedupe_by_id,
        }
    }
}

pub struct PaginatedListController<T: ListItem> {
    kind: ListKind,
    coordinator: Arc<FetchCoordinator<ListPayload<T>>>,
    options: ListOptions,
    state: Mutex<ListState<T>>,
    updates: watch::Sender<ListSnapshot<T>>,
}

impl<T: ListItem> PaginatedListController<T> {
    pub fn new(
        kind: ListKind,
        coordinator: Arc<FetchCoordinator<ListPayload<T>>>,
        options: ListOptions,
        category: Option<String>,
    ) -> Self {
        let options = ListOptions {
            page_size: options.page_size.max(1),
            ..options
        };
        let state = ListState::new(category);
        let (updates, _) = watch::channel(state.snapshot());
        Self {
            kind,
            coordinator,
            options,
            state: Mutex::new(state),
            updates,
        }
    }

    pub fn kind(&self) -> ListKind {
        self.kind
    }

    pub fn page_size(&self) -> u32 {
        self.options.page_size
    }

    pub fn snapshot(&self) -> ListSnapshot<T> {
        mutex_lock(&self.state, SOURCE, "snapshot").snapshot()
    }

    /// Receiver that sees a new snapshot after every state transition.
    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot<T>> {
        self.updates.subscribe()
    }

    /// Seed the view from a server-rendered first page without a request.
    ///
    /// The page is also stored in the cache so returning to this filter later
    /// is served locally while fresh.
    pub fn initialize(&self, payload: ListPayload<T>) {
        let mut state = mutex_lock(&self.state, SOURCE, "initialize");
        let key = self.kind.key(ListQuery::first(
            self.options.page_size,
            state.filter.category.clone(),
        ));
        self.coordinator.store().seed(key, payload.clone());

        // Any fetch still pending belongs to an older view of the list.
        state.generation += 1;
        state.loading = false;
        state.error = None;
        state.items = payload.items;
        state.has_more = payload.has_more;
        state.total_count = payload.total_count;
        state.current_page = 1;
        state.initialized = true;
        debug!(
            list = self.kind.as_str(),
            items = state.items.len(),
            has_more = state.has_more,
            "List seeded from initial payload"
        );
        self.publish(&state);
    }

    /// Fetch the first page unless the view was already seeded.
    pub async fn mount(&self) -> ListOutcome {
        let (generation, category) = {
            let mut state = mutex_lock(&self.state, SOURCE, "mount");
            if state.initialized || state.loading {
                return ListOutcome::Skipped;
            }
            let generation = state.begin();
            self.publish(&state);
            (generation, state.filter.category.clone())
        };
        self.load_first_page(generation, category, Some(self.options.max_age))
            .await
    }

    /// Append the next page under the current filter.
    pub async fn load_more(&self) -> ListOutcome {
        let (generation, query) = {
            let mut state = mutex_lock(&self.state, SOURCE, "load_more");
            if state.loading || !state.has_more || state.filter.query.is_some() {
                debug!(
                    list = self.kind.as_str(),
                    loading = state.loading,
                    has_more = state.has_more,
                    searching = state.filter.query.is_some(),
                    "Load more skipped"
                );
                return ListOutcome::Skipped;
            }
            let query = ListQuery::new(
                state.current_page.saturating_add(1),
                self.options.page_size,
                state.filter.category.clone(),
            );
            let generation = state.begin();
            self.publish(&state);
            (generation, query)
        };

        let key = self.kind.key(query.clone());
        let result = self
            .coordinator
            .resolve(&key, Some(self.options.max_age))
            .await;

        let mut state = mutex_lock(&self.state, SOURCE, "load_more.apply");
        if state.generation != generation {
            debug!(list = self.kind.as_str(), page = query.page, "Stale page dropped");
            return ListOutcome::Discarded;
        }
        state.loading = false;
        let outcome = match result {
            Ok(payload) => {
                let received = payload.items.len();
                state.append(
                    payload,
                    query.page,
                    self.options.page_size,
                    self.options.dedupe_by_id,
                );
                info!(
                    list = self.kind.as_str(),
                    page = query.page,
                    received,
                    total = state.items.len(),
                    has_more = state.has_more,
                    "Page appended"
                );
                ListOutcome::Loaded
            }
            Err(message) => {
                warn!(list = self.kind.as_str(), page = query.page, "Load more failed");
                state.error = Some(message);
                ListOutcome::Failed
            }
        };
        self.publish(&state);
        outcome
    }

    /// Switch the server-side category; reloads from page 1.
    pub async fn set_category(&self, category: Option<String>) -> ListOutcome {
        let (generation, category) = {
            let mut state = mutex_lock(&self.state, SOURCE, "set_category");
            if state.initialized && state.filter.category == category {
                return ListOutcome::Skipped;
            }
            debug!(
                list = self.kind.as_str(),
                from = ?state.filter.category,
                to = ?category,
                "Category changed"
            );
            state.filter.category = category.clone();
            // Nothing from the previous category stays visible.
            state.items.clear();
            state.has_more = false;
            state.current_page = 1;
            state.total_count = 0;
            let generation = state.begin();
            self.publish(&state);
            (generation, category)
        };
        self.load_first_page(generation, category, Some(self.options.max_age))
            .await
    }

    /// Narrow loaded items by free text. Never fetches.
    pub fn set_query(&self, text: &str) {
        let mut state = mutex_lock(&self.state, SOURCE, "set_query");
        state.filter.query = normalize_query(text);
        self.publish(&state);
    }

    /// Refetch page 1 under the current filter, bypassing the staleness
    /// window. Used as the manual retry and after a cache-bust.
    ///
    /// Every cached page of the filter is dropped first, so later pages are
    /// fetched against the same server ordering as the new page 1.
    pub async fn reload(&self) -> ListOutcome {
        let (generation, category) = {
            let mut state = mutex_lock(&self.state, SOURCE, "reload");
            let generation = state.begin();
            self.publish(&state);
            (generation, state.filter.category.clone())
        };
        let dropped = self.coordinator.invalidate_where(|key| {
            key.list_query()
                .is_some_and(|query| query.category == category)
        });
        debug!(list = self.kind.as_str(), dropped, "Cached pages dropped for reload");
        self.load_first_page(generation, category, None).await
    }

    async fn load_first_page(
        &self,
        generation: u64,
        category: Option<String>,
        max_age: Option<Duration>,
    ) -> ListOutcome {
        let key = self
            .kind
            .key(ListQuery::first(self.options.page_size, category));
        let result = self.coordinator.resolve(&key, max_age).await;

        let mut state = mutex_lock(&self.state, SOURCE, "first_page.apply");
        if state.generation != generation {
            debug!(list = self.kind.as_str(), key = %key, "Stale first page dropped");
            return ListOutcome::Discarded;
        }
        state.loading = false;
        let outcome = match result {
            Ok(payload) => {
                state.replace_with(payload, self.options.page_size);
                info!(
                    list = self.kind.as_str(),
                    key = %key,
                    items = state.items.len(),
                    has_more = state.has_more,
                    "First page loaded"
                );
                ListOutcome::Loaded
            }
            Err(message) => {
                warn!(list = self.kind.as_str(), key = %key, "First page failed");
                state.error = Some(message);
                ListOutcome::Failed
            }
        };
        self.publish(&state);
        outcome
    }

    fn publish(&self, state: &ListState<T>) {
        self.updates.send_replace(state.snapshot());
    }
}
