use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use headgate_core::types::Address;
use parking_lot::RwLock;
use tracing::debug;

pub type SessionId = u64;

/// Per-client state. Lives from `openSession` until `closeSession`.
pub struct SessionContext {
    id: SessionId,
    opened_at: DateTime<Utc>,
    subscribed: RwLock<HashSet<Address>>,
}

impl SessionContext {
    fn new(id: SessionId) -> Self {
        Self {
            id,
            opened_at: Utc::now(),
            subscribed: RwLock::new(HashSet::new()),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// Replace the subscription set wholesale.
    pub fn set_addresses(&self, addresses: impl IntoIterator<Item = Address>) -> usize {
        let next: HashSet<Address> = addresses.into_iter().collect();
        let count = next.len();
        *self.subscribed.write() = next;
        count
    }

    pub fn addresses(&self) -> HashSet<Address> {
        self.subscribed.read().clone()
    }

    pub fn is_subscribed(&self, address: &Address) -> bool {
        self.subscribed.read().contains(address)
    }
}

/// All open sessions. The notification pusher reads it through
/// [`SessionRegistry::subscribers_of`].
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Arc<SessionContext>>>,
    next_id: AtomicU64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self) -> Arc<SessionContext> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let session = Arc::new(SessionContext::new(id));
        self.sessions.write().insert(id, session.clone());
        debug!(session = id, "session opened");
        session
    }

    /// Drop a session and its subscriptions. False if it was not open.
    pub fn close(&self, id: SessionId) -> bool {
        let closed = self.sessions.write().remove(&id).is_some();
        if closed {
            debug!(session = id, "session closed");
        }
        closed
    }

    pub fn get(&self, id: SessionId) -> Option<Arc<SessionContext>> {
        self.sessions.read().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Sessions currently subscribed to `address`, in ascending id order.
    pub fn subscribers_of(&self, address: &Address) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self
            .sessions
            .read()
            .values()
            .filter(|s| s.is_subscribed(address))
            .map(|s| s.id)
            .collect();
        ids.sort_unstable();
        ids
    }
}
