//! Keyed query cache with de-duplicated fetches and generation tagging.
//!
//! Each [`QueryKey`] owns one entry holding the last fetched value, its
//! freshness and the last error. Entries are published through tokio `watch`
//! channels so views can observe them, and a key counts as *observed* while at
//! least one [`QuerySubscription`] for it is alive.
//!
//! The cache is single-threaded: it is a cheap `Rc` handle and background
//! refetches are spawned with [`tokio::task::spawn_local`], so anything that
//! can trigger one ([`QueryCache::observe`], [`QueryCache::invalidate`]) must
//! run inside a [`tokio::task::LocalSet`].

use crate::events::{ClientEvent, SharedEventBroadcaster};
use crate::Result;
use chrono::{DateTime, Utc};
use futures::future::{FutureExt, LocalBoxFuture, Shared};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use tokio::sync::watch;

use crate::error::Top5Error;

/// Identifies one cached query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// Public top list, approved songs only
    TopSongs,
    /// One page of the public song listing
    Songs { page: u32, per_page: u32 },
    /// Songs waiting for review
    PendingSongs,
    /// The administrator's listing of every song
    AdminSongs,
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::TopSongs => f.write_str("top-songs"),
            QueryKey::Songs { page, per_page } => write!(f, "songs:page={page},per_page={per_page}"),
            QueryKey::PendingSongs => f.write_str("pending-songs"),
            QueryKey::AdminSongs => f.write_str("admin-songs"),
        }
    }
}

/// How current an entry's value is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Value came from the latest completed fetch and nothing invalidated it
    Fresh,
    /// Never fetched, invalidated, or the last fetch failed
    Stale,
    /// A fetch for the latest generation is in flight
    Fetching,
}

/// Snapshot of one cache entry as seen by observers.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<V> {
    /// Last successfully fetched value, kept across failures and invalidations
    pub data: Option<V>,
    pub freshness: Freshness,
    /// Error from the most recent fetch, cleared by the next success
    pub error: Option<Top5Error>,
    /// Generation that produced `data` (or `error`)
    pub generation: u64,
    /// When `data` was stored
    pub updated_at: Option<DateTime<Utc>>,
}

impl<V> QueryState<V> {
    pub(crate) fn empty() -> Self {
        Self {
            data: None,
            freshness: Freshness::Stale,
            error: None,
            generation: 0,
            updated_at: None,
        }
    }

    /// Nothing to show yet and a fetch is running.
    pub fn is_loading(&self) -> bool {
        self.data.is_none() && self.freshness == Freshness::Fetching
    }

    pub fn is_fresh(&self) -> bool {
        self.freshness == Freshness::Fresh
    }
}

/// Produces the value for one key. Called once per fetch attempt.
pub type Fetcher<V> = Rc<dyn Fn() -> LocalBoxFuture<'static, Result<V>>>;

type SharedFetch<V> = Shared<LocalBoxFuture<'static, Result<V>>>;

struct InFlight<V> {
    generation: u64,
    future: SharedFetch<V>,
}

struct Entry<V> {
    state: watch::Sender<QueryState<V>>,
    fetcher: Option<Fetcher<V>>,
    /// Latest requested generation; responses tagged with anything else are dropped
    generation: u64,
    in_flight: Option<InFlight<V>>,
}

impl<V> Entry<V> {
    fn new() -> Self {
        let (state, _) = watch::channel(QueryState::empty());
        Self {
            state,
            fetcher: None,
            generation: 0,
            in_flight: None,
        }
    }

    fn is_observed(&self) -> bool {
        self.state.receiver_count() > 0
    }
}

enum Lookup<V> {
    Cached(V),
    Join(SharedFetch<V>),
    Start,
}

/// A view's registration of interest in one key.
///
/// Dropping the subscription stops observing the key. A fetch that is already
/// running is not aborted; its result still lands in the cache.
pub struct QuerySubscription<V> {
    key: QueryKey,
    receiver: watch::Receiver<QueryState<V>>,
}

impl<V: Clone> QuerySubscription<V> {
    pub fn key(&self) -> QueryKey {
        self.key
    }

    /// Current state of the entry.
    pub fn current(&self) -> QueryState<V> {
        self.receiver.borrow().clone()
    }

    /// Whether the entry changed since it was last read with [`changed`](Self::changed).
    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }

    /// Wait for the next value, error or freshness transition.
    ///
    /// Returns `None` once the cache that owns the entry is gone.
    pub async fn changed(&mut self) -> Option<QueryState<V>> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }
}

/// The query cache. Cloning yields another handle to the same entries.
pub struct QueryCache<V> {
    entries: Rc<RefCell<HashMap<QueryKey, Entry<V>>>>,
    broadcaster: Arc<SharedEventBroadcaster>,
}

impl<V> Clone for QueryCache<V> {
    fn clone(&self) -> Self {
        Self {
            entries: Rc::clone(&self.entries),
            broadcaster: Arc::clone(&self.broadcaster),
        }
    }
}

impl<V: Clone + 'static> Default for QueryCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + 'static> QueryCache<V> {
    pub fn new() -> Self {
        Self::with_broadcaster(Arc::new(SharedEventBroadcaster::new()))
    }

    /// Create a cache that reports fetch and invalidation events on `broadcaster`.
    pub fn with_broadcaster(broadcaster: Arc<SharedEventBroadcaster>) -> Self {
        Self {
            entries: Rc::new(RefCell::new(HashMap::new())),
            broadcaster,
        }
    }

    /// Snapshot of the entry for `key`, if it was ever requested.
    pub fn state(&self, key: QueryKey) -> Option<QueryState<V>> {
        self.entries
            .borrow()
            .get(&key)
            .map(|entry| entry.state.borrow().clone())
    }

    /// Last stored value for `key`, fresh or not.
    pub fn data(&self, key: QueryKey) -> Option<V> {
        self.state(key).and_then(|state| state.data)
    }

    pub fn is_observed(&self, key: QueryKey) -> bool {
        self.entries
            .borrow()
            .get(&key)
            .is_some_and(|entry| entry.is_observed())
    }

    pub fn is_fetching(&self, key: QueryKey) -> bool {
        self.entries
            .borrow()
            .get(&key)
            .is_some_and(|entry| entry.in_flight.is_some())
    }

    /// Return the cached value for `key`, fetching it if needed.
    ///
    /// A fresh value is returned without calling `fetcher`. If a fetch for the
    /// key is already running, this joins it instead of starting another one.
    pub async fn get_or_fetch(&self, key: QueryKey, fetcher: Fetcher<V>) -> Result<V> {
        match self.lookup(key, &fetcher) {
            Lookup::Cached(value) => {
                log::debug!("{key}: served from cache");
                Ok(value)
            }
            Lookup::Join(future) => {
                log::debug!("{key}: joining in-flight fetch");
                future.await
            }
            Lookup::Start => self.begin_fetch(key, fetcher).await,
        }
    }

    /// Start a new fetch for `key` even if one is running or the value is fresh.
    ///
    /// The new fetch supersedes any in-flight one: whichever finishes first,
    /// only this generation's result is stored.
    pub async fn refetch(&self, key: QueryKey, fetcher: Fetcher<V>) -> Result<V> {
        self.register(key, Rc::clone(&fetcher));
        self.begin_fetch(key, fetcher).await
    }

    /// Observe `key`, fetching it in the background if it is not fresh.
    pub fn observe(&self, key: QueryKey, fetcher: Fetcher<V>) -> QuerySubscription<V> {
        let (receiver, needs_fetch) = {
            let mut entries = self.entries.borrow_mut();
            let entry = entries.entry(key).or_insert_with(Entry::new);
            entry.fetcher = Some(Rc::clone(&fetcher));
            let receiver = entry.state.subscribe();
            let needs_fetch =
                entry.in_flight.is_none() && entry.state.borrow().freshness != Freshness::Fresh;
            (receiver, needs_fetch)
        };

        if needs_fetch {
            log::debug!("{key}: observed while stale, refetching");
            drive_in_background(self.begin_fetch(key, fetcher));
        }

        QuerySubscription { key, receiver }
    }

    /// Mark `key` stale.
    ///
    /// Any in-flight fetch is superseded. An observed key is refetched right
    /// away; an unobserved one waits for its next observation or lookup.
    pub fn invalidate(&self, key: QueryKey) {
        let refetch = {
            let mut entries = self.entries.borrow_mut();
            let Some(entry) = entries.get_mut(&key) else {
                log::debug!("{key}: nothing cached, invalidation is a no-op");
                return;
            };
            entry.generation += 1;
            entry.in_flight = None;
            entry
                .state
                .send_modify(|state| state.freshness = Freshness::Stale);
            if entry.is_observed() {
                entry.fetcher.clone()
            } else {
                None
            }
        };

        let refetching = refetch.is_some();
        log::debug!("{key}: invalidated (refetching: {refetching})");
        self.broadcaster
            .broadcast_event(ClientEvent::QueryInvalidated { key, refetching });

        if let Some(fetcher) = refetch {
            drive_in_background(self.begin_fetch(key, fetcher));
        }
    }

    pub fn invalidate_all(&self, keys: &[QueryKey]) {
        for key in keys {
            self.invalidate(*key);
        }
    }

    /// Wait until no key has a fetch in flight.
    ///
    /// Superseded fetches are not waited for; their results are discarded
    /// whenever they arrive.
    pub async fn settle(&self) {
        loop {
            let pending: Vec<SharedFetch<V>> = self
                .entries
                .borrow()
                .values()
                .filter_map(|entry| entry.in_flight.as_ref().map(|f| f.future.clone()))
                .collect();

            if pending.is_empty() {
                return;
            }
            futures::future::join_all(pending).await;
        }
    }

    fn register(&self, key: QueryKey, fetcher: Fetcher<V>) {
        self.entries
            .borrow_mut()
            .entry(key)
            .or_insert_with(Entry::new)
            .fetcher = Some(fetcher);
    }

    fn lookup(&self, key: QueryKey, fetcher: &Fetcher<V>) -> Lookup<V> {
        let mut entries = self.entries.borrow_mut();
        let entry = entries.entry(key).or_insert_with(Entry::new);
        entry.fetcher = Some(Rc::clone(fetcher));

        if let Some(in_flight) = &entry.in_flight {
            return Lookup::Join(in_flight.future.clone());
        }

        let state = entry.state.borrow();
        if state.freshness == Freshness::Fresh {
            if let Some(value) = &state.data {
                return Lookup::Cached(value.clone());
            }
        }
        Lookup::Start
    }

    fn begin_fetch(&self, key: QueryKey, fetcher: Fetcher<V>) -> SharedFetch<V> {
        let mut entries = self.entries.borrow_mut();
        let entry = entries.entry(key).or_insert_with(Entry::new);
        entry.generation += 1;
        let generation = entry.generation;

        let cache = self.clone();
        let future = async move {
            let result = fetcher().await;
            cache.complete(key, generation, &result);
            result
        }
        .boxed_local()
        .shared();

        entry.in_flight = Some(InFlight {
            generation,
            future: future.clone(),
        });
        entry
            .state
            .send_modify(|state| state.freshness = Freshness::Fetching);
        drop(entries);

        log::debug!("{key}: fetch started (generation {generation})");
        self.broadcaster
            .broadcast_event(ClientEvent::FetchStarted { key, generation });
        future
    }

    fn complete(&self, key: QueryKey, generation: u64, result: &Result<V>) {
        let mut entries = self.entries.borrow_mut();
        let Some(entry) = entries.get_mut(&key) else {
            return;
        };

        if entry
            .in_flight
            .as_ref()
            .is_some_and(|in_flight| in_flight.generation == generation)
        {
            entry.in_flight = None;
        }

        if generation != entry.generation {
            let latest = entry.generation;
            drop(entries);
            log::debug!("{key}: discarding response from generation {generation}, latest is {latest}");
            self.broadcaster
                .broadcast_event(ClientEvent::StaleResponseDiscarded {
                    key,
                    generation,
                    latest,
                });
            return;
        }

        match result {
            Ok(value) => entry.state.send_modify(|state| {
                state.data = Some(value.clone());
                state.freshness = Freshness::Fresh;
                state.error = None;
                state.generation = generation;
                state.updated_at = Some(Utc::now());
            }),
            Err(error) => {
                log::warn!("{key}: fetch failed: {error}");
                entry.state.send_modify(|state| {
                    state.freshness = Freshness::Stale;
                    state.error = Some(error.clone());
                    state.generation = generation;
                });
            }
        }
        drop(entries);

        self.broadcaster.broadcast_event(ClientEvent::FetchCompleted {
            key,
            generation,
            success: result.is_ok(),
        });
    }
}

fn drive_in_background<V: Clone + 'static>(future: SharedFetch<V>) {
    tokio::task::spawn_local(async move {
        let _ = future.await;
    });
}
