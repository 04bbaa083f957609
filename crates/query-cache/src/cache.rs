//! The cache proper.

use crate::key::QueryKey;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use tracing::debug;

/// A memoized query result.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedEntry<V> {
    pub data: V,
    pub fetched_at: DateTime<Utc>,
    /// Set by invalidation; a stale entry is shown but never reused as fresh.
    pub stale: bool,
}

/// Proof that a fetch started at a given invalidation generation.
#[derive(Debug)]
#[must_use = "a fetch ticket must be completed to populate the cache"]
pub struct FetchTicket {
    key: QueryKey,
    key_epoch: u64,
    collection_epoch: u64,
}

impl FetchTicket {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }
}

/// A stored entry plus the invalidation generation its fetch started at.
struct Stored<V> {
    entry: CachedEntry<V>,
    key_epoch: u64,
    collection_epoch: u64,
}

impl<V> Stored<V> {
    /// True when this entry was fetched after an invalidation `ticket` predates.
    fn is_newer_than(&self, ticket: &FetchTicket) -> bool {
        self.key_epoch > ticket.key_epoch
            || (ticket.key.is_listing() && self.collection_epoch > ticket.collection_epoch)
    }
}

struct CacheState<V> {
    entries: HashMap<QueryKey, Stored<V>>,
    key_epochs: HashMap<QueryKey, u64>,
    collection_epochs: HashMap<String, u64>,
}

impl<V> CacheState<V> {
    fn key_epoch(&self, key: &QueryKey) -> u64 {
        self.key_epochs.get(key).copied().unwrap_or(0)
    }

    fn collection_epoch(&self, collection: &str) -> u64 {
        self.collection_epochs.get(collection).copied().unwrap_or(0)
    }
}

/// Keyed query cache.
///
/// Share it as an `Arc<QueryCache<V>>`. All mutation goes through
/// [`invalidate`](Self::invalidate), [`invalidate_collection`](Self::invalidate_collection)
/// and [`complete_fetch`](Self::complete_fetch). The internal lock is never
/// held across an await point.
pub struct QueryCache<V> {
    state: Mutex<CacheState<V>>,
}

impl<V: Clone> QueryCache<V> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                key_epochs: HashMap::new(),
                collection_epochs: HashMap::new(),
            }),
        }
    }

    /// Last stored value for `key`, fresh or stale.
    pub fn read(&self, key: &QueryKey) -> Option<CachedEntry<V>> {
        self.state
            .lock()
            .entries
            .get(key)
            .map(|stored| stored.entry.clone())
    }

    /// Value for `key` only if it has not been invalidated.
    pub fn fresh(&self, key: &QueryKey) -> Option<V> {
        self.state
            .lock()
            .entries
            .get(key)
            .filter(|stored| !stored.entry.stale)
            .map(|stored| stored.entry.data.clone())
    }

    /// Record the invalidation generation a fetch starts from.
    pub fn begin_fetch(&self, key: QueryKey) -> FetchTicket {
        let state = self.state.lock();
        FetchTicket {
            key_epoch: state.key_epoch(&key),
            collection_epoch: state.collection_epoch(key.collection()),
            key,
        }
    }

    /// Store a fetched value.
    ///
    /// When the key (or, for listings, its collection) was invalidated after
    /// the ticket was issued the value is stored stale, unless a fetch begun
    /// after that invalidation already stored its result, in which case the
    /// older value is dropped. Returns whether the value was stored fresh.
    pub fn complete_fetch(&self, ticket: FetchTicket, data: V) -> bool {
        let mut state = self.state.lock();

        let key_moved = state.key_epoch(&ticket.key) != ticket.key_epoch;
        let collection_moved = ticket.key.is_listing()
            && state.collection_epoch(ticket.key.collection()) != ticket.collection_epoch;
        let stale = key_moved || collection_moved;

        if let Some(existing) = state.entries.get(&ticket.key) {
            if existing.is_newer_than(&ticket) {
                debug!(key = %ticket.key, "Dropping fetch older than the stored entry");
                return false;
            }
        }

        if stale {
            debug!(key = %ticket.key, "Fetch overtaken by invalidation; storing as stale");
        }

        let FetchTicket {
            key,
            key_epoch,
            collection_epoch,
        } = ticket;
        state.entries.insert(
            key,
            Stored {
                entry: CachedEntry {
                    data,
                    fetched_at: Utc::now(),
                    stale,
                },
                key_epoch,
                collection_epoch,
            },
        );
        !stale
    }

    /// Mark one entry stale and bump its generation.
    pub fn invalidate(&self, key: &QueryKey) {
        let mut state = self.state.lock();
        *state.key_epochs.entry(key.clone()).or_insert(0) += 1;
        if let Some(stored) = state.entries.get_mut(key) {
            stored.entry.stale = true;
        }
        debug!(%key, "Invalidated cache entry");
    }

    /// Mark every listing entry (pages and unpaged listing) of `collection`
    /// stale, including fetches still in flight. Returns how many stored
    /// entries were marked.
    pub fn invalidate_collection(&self, collection: &str) -> usize {
        let mut state = self.state.lock();
        *state
            .collection_epochs
            .entry(collection.to_string())
            .or_insert(0) += 1;

        let mut marked = 0;
        for (key, stored) in state.entries.iter_mut() {
            if key.collection() == collection && key.is_listing() {
                stored.entry.stale = true;
                marked += 1;
            }
        }

        debug!(collection, marked, "Invalidated collection listings");
        marked
    }

    /// Serve `key` from cache when fresh, otherwise run `fetch` and store
    /// its result. Errors are returned as-is and cache nothing.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: QueryKey, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(data) = self.fresh(&key) {
            debug!(%key, "Query cache hit");
            return Ok(data);
        }

        let ticket = self.begin_fetch(key);
        let data = fetch().await?;
        self.complete_fetch(ticket, data.clone());
        Ok(data)
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone> Default for QueryCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> std::fmt::Debug for QueryCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.state.lock().entries.len())
            .finish_non_exhaustive()
    }
}
