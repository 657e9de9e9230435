use crate::events::{ClientEvent, SharedEventBroadcaster};
use crate::session_persistence::SessionPersistence;
use crate::types::{AuthSession, Credentials, User};
use crate::Result;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

/// The authenticated session, owned explicitly and handed to whoever needs it.
///
/// Created at startup (empty, or restored from disk), replaced on login and
/// cleared on logout or when the service rejects the credential. Clones share
/// the same state, so clearing through one handle is seen by all of them.
#[derive(Clone)]
pub struct SessionContext {
    current: Rc<RefCell<Option<AuthSession>>>,
    store: Option<SessionPersistence>,
    broadcaster: Arc<SharedEventBroadcaster>,
}

impl SessionContext {
    /// An unauthenticated session that is never persisted.
    pub fn new(broadcaster: Arc<SharedEventBroadcaster>) -> Self {
        Self {
            current: Rc::new(RefCell::new(None)),
            store: None,
            broadcaster,
        }
    }

    /// Restore the session saved in `store`, and persist future changes there.
    ///
    /// A saved session that cannot be read is discarded, leaving the context
    /// unauthenticated.
    pub fn restore(store: SessionPersistence, broadcaster: Arc<SharedEventBroadcaster>) -> Self {
        let saved = match store.load() {
            Ok(saved) => saved,
            Err(e) => {
                log::warn!("Discarding unreadable session: {e}");
                let _ = store.remove();
                None
            }
        };
        if let Some(session) = &saved {
            log::debug!("Restored session for {}", session.user.email);
        }

        Self {
            current: Rc::new(RefCell::new(saved)),
            store: Some(store),
            broadcaster,
        }
    }

    /// Replace the current session, persisting it when a store is attached.
    pub fn establish(&self, session: AuthSession) -> Result<()> {
        if let Some(store) = &self.store {
            store.save(&session)?;
        }
        log::debug!("Session established for {}", session.user.email);
        *self.current.borrow_mut() = Some(session);
        Ok(())
    }

    /// Drop the credential, in memory and on disk.
    pub fn clear(&self) {
        let previous = self.current.borrow_mut().take();
        if let Some(store) = &self.store {
            if let Err(e) = store.remove() {
                log::warn!("Failed to remove saved session: {e}");
            }
        }
        if previous.is_some() {
            log::debug!("Session cleared");
            self.broadcaster.broadcast_event(ClientEvent::SessionCleared);
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.borrow().is_some()
    }

    pub fn current_user(&self) -> Option<User> {
        self.current
            .borrow()
            .as_ref()
            .map(|session| session.user.clone())
    }

    /// Credentials to attach to the next request.
    pub fn credentials(&self) -> Credentials {
        match self.current.borrow().as_ref() {
            Some(session) => Credentials::bearer(session.token.clone()),
            None => Credentials::anonymous(),
        }
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("authenticated", &self.is_authenticated())
            .field("store", &self.store)
            .finish()
    }
}
