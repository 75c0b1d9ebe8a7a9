//! Connection registry: every live hub session, keyed by connection id.
//!
//! A single coarse lock guards membership and lookups. The lock is never
//! held across an `.await` on a connection, so per-connection work never
//! contends with registry lookups.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use hubgate_domain::error::NotFoundError;
use hubgate_domain::id::ConnectionId;
use hubgate_domain::time::Timestamp;

use crate::connection::Connection;

/// Who a hub session belongs to, known once `RequestAuthorize` succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HubIdentity {
    /// Never exposed through status listings.
    #[serde(skip_serializing)]
    pub username: String,
    pub hub_id: String,
    pub display_name: String,
}

/// An authenticated connection together with its identity.
#[derive(Debug, Clone)]
pub struct HubHandle {
    pub identity: HubIdentity,
    pub connection: Arc<Connection>,
}

/// Snapshot of one registry entry.
#[derive(Debug, Clone)]
pub struct RegisteredConnection {
    pub connection: Arc<Connection>,
    pub identity: Option<HubIdentity>,
}

impl RegisteredConnection {
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.connection.id()
    }

    #[must_use]
    pub fn connected_at(&self) -> Timestamp {
        self.connection.connected_at()
    }
}

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    entries: Mutex<Vec<RegisteredConnection>>,
}

impl ConnectionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // Entries hold no invariant a panicking holder could break halfway.
    fn entries(&self) -> MutexGuard<'_, Vec<RegisteredConnection>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a freshly accepted, not yet authenticated connection.
    pub fn register(&self, connection: Arc<Connection>) {
        let mut entries = self.entries();
        if entries.iter().any(|e| e.id() == connection.id()) {
            return;
        }
        entries.push(RegisteredConnection {
            connection,
            identity: None,
        });
    }

    /// Remove a connection, returning it if it was registered.
    pub fn unregister(&self, id: ConnectionId) -> Option<Arc<Connection>> {
        let mut entries = self.entries();
        let index = entries.iter().position(|e| e.id() == id)?;
        Some(entries.remove(index).connection)
    }

    /// Attach an authenticated identity to a registered connection.
    ///
    /// At most one session per `(username, hub_id)` stays registered: older
    /// sessions of the same hub are removed and returned so the caller can
    /// close them.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] if the connection is no longer registered.
    pub fn authenticate(
        &self,
        id: ConnectionId,
        identity: HubIdentity,
    ) -> Result<Vec<Arc<Connection>>, NotFoundError> {
        let mut entries = self.entries();
        let entry = entries
            .iter_mut()
            .find(|e| e.id() == id)
            .ok_or_else(|| NotFoundError {
                entity: "Connection",
                id: id.to_string(),
            })?;
        entry.identity = Some(identity.clone());

        let mut superseded = Vec::new();
        entries.retain(|e| {
            let stale = e.id() != id
                && e.identity.as_ref().is_some_and(|other| {
                    other.username == identity.username && other.hub_id == identity.hub_id
                });
            if stale {
                superseded.push(Arc::clone(&e.connection));
            }
            !stale
        });
        Ok(superseded)
    }

    /// First authenticated connection owned by `username`.
    #[must_use]
    pub fn find_by_username(&self, username: &str) -> Option<HubHandle> {
        self.find(|identity| identity.username == username)
    }

    /// The authenticated connection of hub `hub_id` owned by `username`.
    ///
    /// Hub ids are only unique per owner: another user's hub announcing the
    /// same id never shadows this one.
    #[must_use]
    pub fn find_by_hub_id(&self, username: &str, hub_id: &str) -> Option<HubHandle> {
        self.find(|identity| identity.username == username && identity.hub_id == hub_id)
    }

    /// Every authenticated connection owned by `username`, in registration order.
    #[must_use]
    pub fn hubs_for_username(&self, username: &str) -> Vec<HubHandle> {
        self.entries()
            .iter()
            .filter_map(handle)
            .filter(|h| h.identity.username == username)
            .collect()
    }

    #[must_use]
    pub fn list(&self) -> Vec<RegisteredConnection> {
        self.entries().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    fn find(&self, matches: impl Fn(&HubIdentity) -> bool) -> Option<HubHandle> {
        self.entries()
            .iter()
            .filter_map(handle)
            .find(|h| matches(&h.identity))
    }
}

fn handle(entry: &RegisteredConnection) -> Option<HubHandle> {
    entry.identity.as_ref().map(|identity| HubHandle {
        identity: identity.clone(),
        connection: Arc::clone(&entry.connection),
    })
}
