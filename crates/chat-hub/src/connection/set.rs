//! Connection set
//!
//! Owns every live connection, keyed by ID, using `DashMap` for concurrent access.

use super::Connection;
use chat_core::{ConnectionId, HubError, HubResult};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;

/// The authoritative set of live connections
///
/// Lookups and removals go straight to the sharded map. Admission takes a short
/// mutex so the capacity check and the insert cannot interleave with another
/// admission.
pub struct ConnectionSet {
    /// Active connections by ID
    connections: DashMap<ConnectionId, Arc<Connection>>,

    /// Serializes check-and-insert against the capacity limit
    admission: Mutex<()>,
}

impl ConnectionSet {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            admission: Mutex::new(()),
        }
    }

    /// Admit a connection unless `limit` connections are already present
    pub fn insert(&self, connection: Arc<Connection>, limit: usize) -> HubResult<()> {
        let _admission = self.admission.lock();

        if self.connections.len() >= limit {
            return Err(HubError::CapacityExhausted { limit });
        }

        let id = connection.id();
        self.connections.insert(id, connection);

        tracing::debug!(connection_id = %id, "Connection added");

        Ok(())
    }

    /// Remove a connection by ID
    ///
    /// The removed connection is closed before it is returned. Absent IDs yield `None`.
    pub fn remove(&self, id: &ConnectionId) -> Option<Arc<Connection>> {
        let (_, connection) = self.connections.remove(id)?;
        connection.close();

        tracing::debug!(connection_id = %id, "Connection removed");

        Some(connection)
    }

    /// Remove the entry for `connection` only if it is still the registered instance
    pub fn remove_instance(&self, connection: &Arc<Connection>) -> bool {
        let removed = self
            .connections
            .remove_if(&connection.id(), |_, current| Arc::ptr_eq(current, connection))
            .is_some();

        if removed {
            connection.close();
            tracing::debug!(connection_id = %connection.id(), "Connection evicted");
        }

        removed
    }

    /// Get a connection by ID
    pub fn get(&self, id: &ConnectionId) -> Option<Arc<Connection>> {
        self.connections.get(id).map(|r| r.clone())
    }

    /// Check if a connection exists
    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.contains_key(id)
    }

    /// Clone out every connection present right now
    ///
    /// The returned vector holds no map locks, so callers may do slow work with it.
    pub fn snapshot(&self) -> Vec<Arc<Connection>> {
        self.connections.iter().map(|r| r.value().clone()).collect()
    }

    /// Get all connection IDs
    pub fn ids(&self) -> Vec<ConnectionId> {
        self.connections.iter().map(|r| *r.key()).collect()
    }

    /// Number of live connections
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Check if no connections are registered
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Default for ConnectionSet {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConnectionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSet")
            .field("connections", &self.connections.len())
            .finish()
    }
}
