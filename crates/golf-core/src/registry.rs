//! Connection registry.
//!
//! The registry is the only shared mutable state in the core. It is backed by
//! a sharded concurrent map, so callers never lock it themselves.

use crate::connection::Connection;
use crate::session::SessionId;
use dashmap::DashMap;
use std::borrow::Borrow;
use std::hash::Hash;
use tracing::trace;

/// Map of session id to live connection.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: DashMap<SessionId, Connection>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection under its session id.
    ///
    /// The last writer wins: a previous connection with the same id is
    /// replaced and returned.
    pub fn register(&self, connection: Connection) -> Option<Connection> {
        let session_id = connection.session_id().clone();
        trace!(session = %session_id, "Registering connection");
        self.connections.insert(session_id, connection)
    }

    /// Remove a session. Absent ids are ignored.
    pub fn unregister<Q>(&self, session_id: &Q) -> Option<Connection>
    where
        SessionId: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.connections.remove(session_id).map(|(_, conn)| conn)
    }

    /// Remove `connection` only if it is still the one registered for its
    /// session. Returns whether it was removed.
    ///
    /// A connection displaced by a later [`register`](Self::register) under
    /// the same id leaves the newer entry in place.
    pub fn unregister_link(&self, connection: &Connection) -> bool {
        self.connections
            .remove_if(connection.session_id(), |_, current| {
                current.same_link(connection)
            })
            .is_some()
    }

    /// Look up the connection for a session.
    #[must_use]
    pub fn get<Q>(&self, session_id: &Q) -> Option<Connection>
    where
        SessionId: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.connections.get(session_id).map(|e| e.value().clone())
    }

    /// Check whether a session is registered.
    #[must_use]
    pub fn contains<Q>(&self, session_id: &Q) -> bool
    where
        SessionId: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.connections.contains_key(session_id)
    }

    /// Snapshot of every registered connection.
    ///
    /// Each session appears at most once. Registrations racing with the
    /// snapshot may or may not be included.
    #[must_use]
    pub fn all_connections(&self) -> Vec<Connection> {
        self.connections.iter().map(|e| e.value().clone()).collect()
    }

    /// Snapshot of every registered session id.
    #[must_use]
    pub fn session_ids(&self) -> Vec<SessionId> {
        self.connections.iter().map(|e| e.key().clone()).collect()
    }

    /// Number of registered connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether no connections are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
