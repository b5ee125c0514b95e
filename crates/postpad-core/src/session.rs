//! Session store: the single source of truth for who is signed in.
//!
//! The store owns the `Identity` lifecycle. It restores a persisted identity
//! once at startup, persists every change, and broadcasts the current
//! `Session` through a `tokio::sync::watch` channel so views and the access
//! gate observe changes without polling.
//!
//! ## Epochs
//!
//! Every transition bumps an epoch counter. Long-running operations capture a
//! `SessionTicket` when they start and check `is_current` before applying
//! their result, so responses that arrive after a logout (or a login as
//! someone else) are discarded.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::storage::SessionStorage;

/// The authenticated user's minimal profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
}

/// The client's belief about the current authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identity: Option<Identity>,
    /// True only until the persisted record has been restored.
    pub loading: bool,
}

impl Session {
    fn loading() -> Self {
        Self {
            identity: None,
            loading: true,
        }
    }

    fn settled(identity: Option<Identity>) -> Self {
        Self {
            identity,
            loading: false,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

/// Identifies the session that issued a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTicket {
    epoch: u64,
    authenticated: bool,
}

impl SessionTicket {
    pub fn is_authenticated(self) -> bool {
        self.authenticated
    }
}

/// Holds the current identity and persists it under a well-known key.
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    key: String,
    tx: watch::Sender<Session>,
    epoch: AtomicU64,
    restored: AtomicBool,
}

impl SessionStore {
    /// Creates a store in the loading state. Call `restore` before
    /// evaluating any access gate.
    pub fn new(storage: Arc<dyn SessionStorage>, key: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(Session::loading());
        Self {
            storage,
            key: key.into(),
            tx,
            epoch: AtomicU64::new(0),
            restored: AtomicBool::new(false),
        }
    }

    /// Loads the persisted identity, if any, and leaves the loading state.
    ///
    /// Runs once; later calls return the current session unchanged. A
    /// missing, unreadable or corrupt record yields a logged-out session.
    pub fn restore(&self) -> Session {
        if self.restored.swap(true, Ordering::SeqCst) {
            return self.snapshot();
        }

        let identity = self.read_persisted();
        match &identity {
            Some(identity) => tracing::info!(user_id = %identity.id, "session restored"),
            None => tracing::debug!("no persisted session"),
        }
        self.publish(Session::settled(identity));
        self.snapshot()
    }

    fn read_persisted(&self) -> Option<Identity> {
        let raw = match self.storage.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "failed to read persisted session");
                return None;
            }
        };

        match serde_json::from_str::<Identity>(&raw) {
            Ok(identity) if !identity.id.trim().is_empty() => Some(identity),
            Ok(_) => {
                tracing::warn!("persisted session has no user id; discarding");
                self.discard_persisted();
                None
            }
            Err(err) => {
                tracing::warn!(error = %err, "persisted session is corrupt; discarding");
                self.discard_persisted();
                None
            }
        }
    }

    fn discard_persisted(&self) {
        if let Err(err) = self.storage.remove(&self.key) {
            tracing::warn!(error = %format!("{err:#}"), "failed to remove persisted session");
        }
    }

    /// Replaces the current identity, persists it and notifies subscribers.
    pub fn set_identity(&self, identity: Identity) {
        match serde_json::to_string(&identity) {
            Ok(json) => {
                if let Err(err) = self.storage.set(&self.key, &json) {
                    tracing::warn!(error = %format!("{err:#}"), "failed to persist session");
                }
            }
            Err(err) => tracing::warn!(error = %err, "failed to serialize session"),
        }

        tracing::info!(user_id = %identity.id, "session started");
        self.restored.store(true, Ordering::SeqCst);
        self.publish(Session::settled(Some(identity)));
    }

    /// Removes the identity and its durable copy, then notifies subscribers.
    pub fn clear(&self) {
        self.discard_persisted();
        tracing::info!("session cleared");
        self.restored.store(true, Ordering::SeqCst);
        self.publish(Session::settled(None));
    }

    /// Bumps the epoch under the channel's write lock so `ticket` never
    /// pairs an epoch with another transition's session.
    fn publish(&self, session: Session) {
        self.tx.send_modify(|current| {
            self.epoch.fetch_add(1, Ordering::SeqCst);
            *current = session;
        });
    }

    /// Returns the current session.
    pub fn snapshot(&self) -> Session {
        self.tx.borrow().clone()
    }

    /// Returns the current identity, if signed in.
    pub fn identity(&self) -> Option<Identity> {
        self.tx.borrow().identity.clone()
    }

    /// Returns a receiver that observes every session change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    /// Captures the current session for later staleness checks.
    pub fn ticket(&self) -> SessionTicket {
        let current = self.tx.borrow();
        SessionTicket {
            epoch: self.epoch.load(Ordering::SeqCst),
            authenticated: current.is_authenticated(),
        }
    }

    /// Returns true if no session transition happened since `ticket` was taken.
    pub fn is_current(&self, ticket: SessionTicket) -> bool {
        self.epoch.load(Ordering::SeqCst) == ticket.epoch
    }
}
