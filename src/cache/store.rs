//! Resource cache storage.
//!
//! One [`ResourceCache`] holds every entry of one resource kind for the
//! lifetime of the owning [`crate::ContentCache`]. Entries are never evicted;
//! the key space is one entry per collection plus one per visited page.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use super::keys::ResourceKey;
use super::lock::{rw_read, rw_write};
use super::staleness::is_fresh;

const SOURCE: &str = "cache::store";

/// Token identifying one fetch of one key.
///
/// Generations are unique across the whole store, so a token issued before an
/// entry was invalidated can never match the entry that replaces it.
pub type Generation = u64;

/// Cached state of a single resource.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub last_fetched_at: Option<Instant>,
    /// User-facing message of the last failed fetch; cleared when a new
    /// fetch starts.
    pub error: Option<String>,
    pub(crate) generation: Generation,
}

impl<T> CacheEntry<T> {
    pub(crate) fn empty() -> Self {
        Self {
            data: None,
            loading: false,
            last_fetched_at: None,
            error: None,
            generation: 0,
        }
    }

    /// Generation of the most recently started fetch.
    pub fn generation(&self) -> Generation {
        self.generation
    }
}

/// Result of an atomic check-and-mark on a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeginFetch {
    /// The entry is within its staleness window; nothing to do.
    Fresh,
    /// Another fetch for the key is outstanding.
    InFlight,
    /// The caller owns the fetch and must finish it with this generation.
    Started(Generation),
}

/// Keyed store of [`CacheEntry`] values with change notification.
pub struct ResourceCache<T> {
    entries: RwLock<HashMap<ResourceKey, CacheEntry<T>>>,
    next_generation: AtomicU64,
    revision: watch::Sender<u64>,
}

impl<T: Clone> ResourceCache<T> {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            entries: RwLock::new(HashMap::new()),
            next_generation: AtomicU64::new(1),
            revision,
        }
    }

    pub fn get(&self, key: &ResourceKey) -> Option<CacheEntry<T>> {
        rw_read(&self.entries, SOURCE, "get").get(key).cloned()
    }

    /// Overwrite `data` and `loading` for `key`.
    ///
    /// `last_fetched_at` is stamped only when `loading` goes from true to
    /// false with data present; while loading it is left untouched.
    pub fn set(&self, key: ResourceKey, data: Option<T>, loading: bool) {
        {
            let mut entries = rw_write(&self.entries, SOURCE, "set");
            let entry = entries.entry(key).or_insert_with(CacheEntry::empty);
            let was_loading = entry.loading;
            entry.data = data;
            entry.loading = loading;
            if was_loading && !loading && entry.data.is_some() {
                entry.last_fetched_at = Some(Instant::now());
            }
        }
        self.bump();
    }

    /// Store a server-provided payload as if it had just been fetched.
    pub fn seed(&self, key: ResourceKey, data: T) {
        {
            let mut entries = rw_write(&self.entries, SOURCE, "seed");
            let entry = entries.entry(key).or_insert_with(CacheEntry::empty);
            entry.data = Some(data);
            // A pending fetch stamps the entry when it lands.
            if !entry.loading {
                entry.last_fetched_at = Some(Instant::now());
            }
        }
        self.bump();
    }

    pub fn is_fresh(&self, key: &ResourceKey, max_age: Duration) -> bool {
        let entries = rw_read(&self.entries, SOURCE, "is_fresh");
        is_fresh(entries.get(key), max_age, Instant::now())
    }

    pub fn is_loading(&self, key: &ResourceKey) -> bool {
        rw_read(&self.entries, SOURCE, "is_loading")
            .get(key)
            .is_some_and(|entry| entry.loading)
    }

    /// Atomically decide whether the caller should fetch `key`.
    ///
    /// With `max_age = None` the staleness check is skipped (forced refetch);
    /// the in-flight guard always applies.
    pub fn begin_fetch(&self, key: &ResourceKey, max_age: Option<Duration>) -> BeginFetch {
        let outcome = {
            let mut entries = rw_write(&self.entries, SOURCE, "begin_fetch");
            if let Some(max_age) = max_age {
                if is_fresh(entries.get(key), max_age, Instant::now()) {
                    return BeginFetch::Fresh;
                }
            }
            let entry = entries.entry(key.clone()).or_insert_with(CacheEntry::empty);
            if entry.loading {
                return BeginFetch::InFlight;
            }
            let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
            entry.loading = true;
            entry.error = None;
            entry.generation = generation;
            BeginFetch::Started(generation)
        };
        self.bump();
        outcome
    }

    /// Complete the fetch identified by `generation`.
    ///
    /// `Ok(data)` replaces the entry's data and stamps it; `Err(message)`
    /// keeps the previous data and records the message. Returns false,
    /// leaving the entry untouched, when the generation has been superseded.
    pub fn finish_fetch(
        &self,
        key: &ResourceKey,
        generation: Generation,
        result: Result<T, String>,
    ) -> bool {
        {
            let mut entries = rw_write(&self.entries, SOURCE, "finish_fetch");
            let Some(entry) = entries.get_mut(key) else {
                return false;
            };
            if entry.generation != generation || !entry.loading {
                return false;
            }
            entry.loading = false;
            match result {
                Ok(data) => {
                    entry.data = Some(data);
                    entry.last_fetched_at = Some(Instant::now());
                    entry.error = None;
                }
                Err(message) => entry.error = Some(message),
            }
        }
        self.bump();
        true
    }

    /// Drop the entry for `key`; a pending fetch for it will be discarded.
    pub fn invalidate(&self, key: &ResourceKey) {
        let removed = rw_write(&self.entries, SOURCE, "invalidate")
            .remove(key)
            .is_some();
        if removed {
            self.bump();
        }
    }

    /// Drop every entry whose key matches; returns how many were removed.
    pub fn invalidate_where<F>(&self, mut predicate: F) -> usize
    where
        F: FnMut(&ResourceKey) -> bool,
    {
        let removed = {
            let mut entries = rw_write(&self.entries, SOURCE, "invalidate_where");
            let before = entries.len();
            entries.retain(|key, _| !predicate(key));
            before - entries.len()
        };
        if removed > 0 {
            self.bump();
        }
        removed
    }

    pub fn clear(&self) {
        rw_write(&self.entries, SOURCE, "clear").clear();
        self.bump();
    }

    pub fn keys(&self) -> Vec<ResourceKey> {
        rw_read(&self.entries, SOURCE, "keys")
            .keys()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Receiver that observes a new revision after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn bump(&self) {
        self.revision.send_modify(|revision| *revision = revision.wrapping_add(1));
    }
}

impl<T: Clone> Default for ResourceCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
