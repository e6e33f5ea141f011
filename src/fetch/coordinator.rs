//! Fetch coordinator.
//!
//! Sole writer of a [`ResourceCache`]: decides whether a key needs a network
//! call, suppresses duplicate in-flight requests, and records outcomes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use tracing::{debug, info, instrument, warn};

use crate::cache::{BeginFetch, CacheEntry, Generation, ResourceCache, ResourceKey};

use super::source::ContentSource;

const METRIC_FRESH_HIT: &str = "folio_cache_fresh_hit_total";
const METRIC_FETCH_STARTED: &str = "folio_fetch_started_total";
const METRIC_FETCH_SUPPRESSED: &str = "folio_fetch_suppressed_total";
const METRIC_FETCH_FAILED: &str = "folio_fetch_failed_total";
const METRIC_FETCH_DISCARDED: &str = "folio_fetch_discarded_total";
const METRIC_FETCH_MS: &str = "folio_fetch_ms";

const CANCELLED_MESSAGE: &str = "Loading was interrupted. Please try again.";

/// What a call to [`FetchCoordinator::ensure_fresh`] did.
///
/// Informational only: views read the cache, not this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Cached data was within its staleness window; no request was made.
    Fresh,
    /// A request for the key was already outstanding; no request was made.
    InFlight,
    /// A request completed and its data was stored.
    Fetched,
    /// A request failed; previous data was kept and the error recorded.
    Failed,
    /// A request completed after its key was invalidated; result dropped.
    Superseded,
}

pub struct FetchCoordinator<T> {
    store: Arc<ResourceCache<T>>,
    source: Arc<dyn ContentSource<T>>,
    default_max_age: Duration,
}

impl<T> FetchCoordinator<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(
        store: Arc<ResourceCache<T>>,
        source: Arc<dyn ContentSource<T>>,
        default_max_age: Duration,
    ) -> Self {
        Self {
            store,
            source,
            default_max_age,
        }
    }

    pub fn store(&self) -> &Arc<ResourceCache<T>> {
        &self.store
    }

    pub fn default_max_age(&self) -> Duration {
        self.default_max_age
    }

    pub fn entry(&self, key: &ResourceKey) -> Option<CacheEntry<T>> {
        self.store.get(key)
    }

    pub fn data(&self, key: &ResourceKey) -> Option<T> {
        self.store.get(key).and_then(|entry| entry.data)
    }

    /// Error side channel for `key`.
    pub fn error(&self, key: &ResourceKey) -> Option<String> {
        self.store.get(key).and_then(|entry| entry.error)
    }

    pub fn is_fresh(&self, key: &ResourceKey, max_age: Duration) -> bool {
        self.store.is_fresh(key, max_age)
    }

    /// Fetch `key` unless it is fresh or already being fetched.
    ///
    /// Never fails: errors land in the entry's error field and `loading` is
    /// always cleared.
    pub async fn ensure_fresh(&self, key: &ResourceKey, max_age: Duration) -> FetchOutcome {
        self.run(key, Some(max_age)).await
    }

    pub async fn ensure_fresh_default(&self, key: &ResourceKey) -> FetchOutcome {
        self.run(key, Some(self.default_max_age)).await
    }

    /// Fetch `key` regardless of age; still suppressed while one is in flight.
    pub async fn refetch(&self, key: &ResourceKey) -> FetchOutcome {
        self.run(key, None).await
    }

    /// Wait until no fetch for `key` is outstanding.
    pub async fn settled(&self, key: &ResourceKey) {
        let mut revisions = self.store.subscribe();
        while self.store.is_loading(key) {
            if revisions.changed().await.is_err() {
                break;
            }
        }
    }

    /// Make `key` usable and return its data or the recorded error message.
    ///
    /// Waits for another caller's in-flight request instead of issuing one.
    /// `max_age = None` forces a refetch.
    pub async fn resolve(
        &self,
        key: &ResourceKey,
        max_age: Option<Duration>,
    ) -> Result<T, String> {
        let outcome = self.run(key, max_age).await;
        if matches!(outcome, FetchOutcome::InFlight | FetchOutcome::Superseded) {
            self.settled(key).await;
        }
        match self.store.get(key) {
            Some(CacheEntry {
                error: Some(message),
                ..
            }) => Err(message),
            Some(CacheEntry {
                data: Some(data), ..
            }) => Ok(data),
            _ => Err(format!("{key} is no longer cached. Please try again.")),
        }
    }

    /// Drop the local entry for `key`; an outstanding response is discarded.
    pub fn invalidate(&self, key: &ResourceKey) {
        debug!(key = %key, "Cache entry invalidated");
        self.store.invalidate(key);
    }

    pub fn invalidate_where<F>(&self, predicate: F) -> usize
    where
        F: FnMut(&ResourceKey) -> bool,
    {
        let removed = self.store.invalidate_where(predicate);
        debug!(removed, "Cache entries invalidated");
        removed
    }

    pub fn invalidate_all(&self) {
        debug!(entries = self.store.len(), "Cache cleared");
        self.store.clear();
    }

    #[instrument(skip_all, fields(key = %key, forced = max_age.is_none()))]
    async fn run(&self, key: &ResourceKey, max_age: Option<Duration>) -> FetchOutcome {
        let generation = match self.store.begin_fetch(key, max_age) {
            BeginFetch::Fresh => {
                debug!("Cache entry fresh; fetch skipped");
                counter!(METRIC_FRESH_HIT, "kind" => key.kind()).increment(1);
                return FetchOutcome::Fresh;
            }
            BeginFetch::InFlight => {
                debug!("Fetch already in flight; request suppressed");
                counter!(METRIC_FETCH_SUPPRESSED, "kind" => key.kind()).increment(1);
                return FetchOutcome::InFlight;
            }
            BeginFetch::Started(generation) => generation,
        };

        counter!(METRIC_FETCH_STARTED, "kind" => key.kind()).increment(1);
        let mut guard = FetchGuard::new(&self.store, key, generation);
        let started_at = Instant::now();
        let result = self.source.fetch(key).await;
        histogram!(METRIC_FETCH_MS, "kind" => key.kind())
            .record(started_at.elapsed().as_secs_f64() * 1000.0);

        match result {
            Ok(data) => {
                if guard.finish(Ok(data)) {
                    info!(generation, "Fetch completed");
                    FetchOutcome::Fetched
                } else {
                    warn!(generation, "Discarded response from superseded fetch");
                    counter!(METRIC_FETCH_DISCARDED, "kind" => key.kind()).increment(1);
                    FetchOutcome::Superseded
                }
            }
            Err(error) => {
                warn!(
                    generation,
                    error_kind = error.kind(),
                    error = %error,
                    "Fetch failed"
                );
                counter!(METRIC_FETCH_FAILED, "kind" => key.kind(), "error" => error.kind())
                    .increment(1);
                if guard.finish(Err(error.user_message(key))) {
                    FetchOutcome::Failed
                } else {
                    counter!(METRIC_FETCH_DISCARDED, "kind" => key.kind()).increment(1);
                    FetchOutcome::Superseded
                }
            }
        }
    }
}

/// Clears `loading` for a started fetch even if the awaiting future is
/// dropped before the response arrives.
struct FetchGuard<'a, T: Clone> {
    store: &'a ResourceCache<T>,
    key: &'a ResourceKey,
    generation: Generation,
    finished: bool,
}

impl<'a, T: Clone> FetchGuard<'a, T> {
    fn new(store: &'a ResourceCache<T>, key: &'a ResourceKey, generation: Generation) -> Self {
        Self {
            store,
            key,
            generation,
            finished: false,
        }
    }

    fn finish(&mut self, result: Result<T, String>) -> bool {
        self.finished = true;
        self.store.finish_fetch(self.key, self.generation, result)
    }
}

impl<T: Clone> Drop for FetchGuard<'_, T> {
    fn drop(&mut self) {
        if !self.finished {
            warn!(key = %self.key, generation = self.generation, "Fetch dropped before completion");
            self.store
                .finish_fetch(self.key, self.generation, Err(CANCELLED_MESSAGE.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::oneshot;

    use super::*;
    use crate::fetch::FetchError;

    type Reply = Result<Vec<u32>, FetchError>;

    /// Source whose responses are released by the test, one per call.
    #[derive(Default)]
    struct ScriptedSource {
        calls: AtomicUsize,
        replies: Mutex<VecDeque<oneshot::Receiver<Reply>>>,
    }

    impl ScriptedSource {
        fn push(&self) -> oneshot::Sender<Reply> {
            let (tx, rx) = oneshot::channel();
            self.replies.lock().expect("replies lock").push_back(rx);
            tx
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ContentSource<Vec<u32>> for ScriptedSource {
        async fn fetch(&self, _key: &ResourceKey) -> Reply {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let rx = self
                .replies
                .lock()
                .expect("replies lock")
                .pop_front()
                .expect("a scripted reply per call");
            rx.await.unwrap_or_else(|_| Err(FetchError::http(599, "dropped")))
        }
    }

    fn coordinator(source: Arc<ScriptedSource>) -> FetchCoordinator<Vec<u32>> {
        FetchCoordinator::new(
            Arc::new(ResourceCache::new()),
            source,
            Duration::from_secs(300),
        )
    }

    const WINDOW: Duration = Duration::from_secs(300);

    #[tokio::test]
    async fn first_fetch_makes_entry_fresh() {
        let source = Arc::new(ScriptedSource::default());
        let coordinator = coordinator(source.clone());
        let key = ResourceKey::Projects;

        assert!(!coordinator.is_fresh(&key, WINDOW));
        source.push().send(Ok(vec![1, 2])).expect("send");

        assert_eq!(
            coordinator.ensure_fresh(&key, WINDOW).await,
            FetchOutcome::Fetched
        );
        assert!(coordinator.is_fresh(&key, WINDOW));
        assert_eq!(coordinator.data(&key), Some(vec![1, 2]));

        assert_eq!(
            coordinator.ensure_fresh(&key, WINDOW).await,
            FetchOutcome::Fresh
        );
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn concurrent_calls_issue_one_request() {
        let source = Arc::new(ScriptedSource::default());
        let coordinator = coordinator(source.clone());
        let key = ResourceKey::Projects;
        let reply = source.push();

        let (first, second, third) = tokio::join!(
            coordinator.ensure_fresh(&key, WINDOW),
            coordinator.ensure_fresh(&key, WINDOW),
            async {
                reply.send(Ok(vec![9])).expect("send");
                coordinator.refetch(&key).await
            }
        );

        assert_eq!(first, FetchOutcome::Fetched);
        assert_eq!(second, FetchOutcome::InFlight);
        assert_eq!(third, FetchOutcome::InFlight);
        assert_eq!(source.calls(), 1);
        assert_eq!(coordinator.data(&key), Some(vec![9]));
    }

    #[tokio::test]
    async fn failure_keeps_data_and_clears_loading() {
        let source = Arc::new(ScriptedSource::default());
        let coordinator = coordinator(source.clone());
        let key = ResourceKey::Experience;

        source.push().send(Ok(vec![1])).expect("send");
        coordinator.ensure_fresh(&key, WINDOW).await;

        source
            .push()
            .send(Err(FetchError::http(500, "boom")))
            .expect("send");
        assert_eq!(coordinator.refetch(&key).await, FetchOutcome::Failed);

        let entry = coordinator.entry(&key).expect("entry");
        assert!(!entry.loading);
        assert_eq!(entry.data, Some(vec![1]));
        assert_eq!(
            coordinator.error(&key).as_deref(),
            Some("Could not load experience. Please try again.")
        );
    }

    #[tokio::test]
    async fn failure_on_empty_entry_is_not_fresh() {
        let source = Arc::new(ScriptedSource::default());
        let coordinator = coordinator(source.clone());
        let key = ResourceKey::Education;

        source
            .push()
            .send(Err(FetchError::http(404, "missing")))
            .expect("send");
        assert_eq!(
            coordinator.ensure_fresh(&key, WINDOW).await,
            FetchOutcome::Failed
        );
        assert!(!coordinator.is_fresh(&key, WINDOW));
        assert!(coordinator.data(&key).is_none());

        // Manual retry issues a new request.
        source.push().send(Ok(vec![4])).expect("send");
        assert_eq!(
            coordinator.ensure_fresh(&key, WINDOW).await,
            FetchOutcome::Fetched
        );
        assert_eq!(source.calls(), 2);
        assert!(coordinator.error(&key).is_none());
    }

    #[tokio::test]
    async fn invalidated_response_cannot_clobber_newer_fetch() {
        let source = Arc::new(ScriptedSource::default());
        let coordinator = coordinator(source.clone());
        let key = ResourceKey::Projects;
        let slow = source.push();
        let fast = source.push();

        let (old, new) = tokio::join!(coordinator.refetch(&key), async {
            coordinator.invalidate(&key);
            fast.send(Ok(vec![2])).expect("send");
            let outcome = coordinator.refetch(&key).await;
            slow.send(Ok(vec![1])).expect("send");
            outcome
        });

        assert_eq!(new, FetchOutcome::Fetched);
        assert_eq!(old, FetchOutcome::Superseded);
        assert_eq!(coordinator.data(&key), Some(vec![2]));
    }

    #[tokio::test]
    async fn dropped_fetch_releases_in_flight_guard() {
        let source = Arc::new(ScriptedSource::default());
        let coordinator = coordinator(source.clone());
        let key = ResourceKey::Projects;
        let _never = source.push();

        let pending = coordinator.refetch(&key);
        tokio::select! {
            biased;
            _ = pending => panic!("reply is never sent"),
            _ = tokio::task::yield_now() => {}
        }

        let entry = coordinator.entry(&key).expect("entry");
        assert!(!entry.loading);
        assert!(entry.error.is_some());
    }

    #[tokio::test]
    async fn resolve_waits_for_in_flight_request() {
        let source = Arc::new(ScriptedSource::default());
        let coordinator = coordinator(source.clone());
        let key = ResourceKey::Projects;
        let reply = source.push();

        let (owner, waiter, ()) = tokio::join!(
            coordinator.resolve(&key, Some(WINDOW)),
            coordinator.resolve(&key, Some(WINDOW)),
            async move {
                tokio::task::yield_now().await;
                reply.send(Ok(vec![5])).expect("send");
            }
        );

        assert_eq!(owner, Ok(vec![5]));
        assert_eq!(waiter, Ok(vec![5]));
        assert_eq!(source.calls(), 1);
    }
}
