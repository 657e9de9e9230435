//! # Client Events
//!
//! This module provides a broadcast channel system for emitting request, cache
//! and mutation events that consumers can listen to and react to.

use crate::cache::QueryKey;
use crate::mutation::MutationKind;
use tokio::sync::{broadcast, watch};

/// Request information for client events
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestInfo {
    /// The HTTP method (GET, POST, etc.)
    pub method: String,
    /// Path without query parameters
    pub path: String,
    /// Query parameters as key-value pairs
    pub query_params: Vec<(String, String)>,
}

impl RequestInfo {
    /// Create RequestInfo from a URL string and method
    pub fn from_url_and_method(url: &str, method: &str) -> Self {
        let (path, query_params) = match url.split_once('?') {
            Some((path, query)) => {
                let params = query
                    .split('&')
                    .filter(|pair| !pair.is_empty())
                    .map(|pair| match pair.split_once('=') {
                        Some((key, value)) => (key.to_string(), value.to_string()),
                        None => (pair.to_string(), String::new()),
                    })
                    .collect();
                (path.to_string(), params)
            }
            None => (url.to_string(), Vec::new()),
        };

        Self {
            method: method.to_string(),
            path,
            query_params,
        }
    }

    /// Short description such as `GET /songs?page=2`
    pub fn short_description(&self) -> String {
        let mut description = format!("{} {}", self.method, self.path);
        if !self.query_params.is_empty() {
            let query = self
                .query_params
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("&");
            description.push('?');
            description.push_str(&query);
        }
        description
    }
}

/// Events emitted by the song client.
#[derive(Clone, Debug)]
pub enum ClientEvent {
    /// Request started
    RequestStarted {
        /// Request details
        request: RequestInfo,
    },
    /// Request completed, successfully or not
    RequestCompleted {
        /// Request details
        request: RequestInfo,
        /// HTTP status code
        status_code: u16,
        /// Duration of the request in milliseconds
        duration_ms: u64,
    },
    /// A query fetch was started
    FetchStarted { key: QueryKey, generation: u64 },
    /// A query fetch result was stored in the cache
    FetchCompleted {
        key: QueryKey,
        generation: u64,
        success: bool,
    },
    /// A response arrived for a generation that is no longer the latest
    StaleResponseDiscarded {
        key: QueryKey,
        generation: u64,
        latest: u64,
    },
    /// A query was marked stale
    QueryInvalidated {
        key: QueryKey,
        /// Whether a background refetch was started right away
        refetching: bool,
    },
    /// A mutation succeeded and its invalidation set was applied
    MutationSucceeded {
        kind: MutationKind,
        invalidated: Vec<QueryKey>,
    },
    /// A mutation failed; the cache was left untouched
    MutationFailed { kind: MutationKind, error: String },
    /// The stored credential was dropped
    SessionCleared,
}

/// Type alias for the broadcast receiver
pub type ClientEventReceiver = broadcast::Receiver<ClientEvent>;

/// Type alias for the watch receiver
pub type ClientEventWatcher = watch::Receiver<Option<ClientEvent>>;

/// Shared event broadcasting state that persists across client clones
#[derive(Clone)]
pub struct SharedEventBroadcaster {
    event_tx: broadcast::Sender<ClientEvent>,
    last_event_tx: watch::Sender<Option<ClientEvent>>,
}

impl SharedEventBroadcaster {
    /// Create a new shared event broadcaster
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(100);
        let (last_event_tx, _) = watch::channel(None);

        Self {
            event_tx,
            last_event_tx,
        }
    }

    /// Broadcast an event to all subscribers
    pub fn broadcast_event(&self, event: ClientEvent) {
        let _ = self.event_tx.send(event.clone());
        self.last_event_tx.send_replace(Some(event));
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> ClientEventReceiver {
        self.event_tx.subscribe()
    }

    /// Watch the most recent event
    pub fn watch(&self) -> ClientEventWatcher {
        self.last_event_tx.subscribe()
    }

    /// Get the latest event
    pub fn latest_event(&self) -> Option<ClientEvent> {
        self.last_event_tx.borrow().clone()
    }
}

impl Default for SharedEventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SharedEventBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedEventBroadcaster")
            .field("subscribers", &self.event_tx.receiver_count())
            .finish()
    }
}
