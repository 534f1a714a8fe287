//! Broadcast hub
//!
//! Tracks live connections and fans messages out to them.
//!
//! Every fan-out works on a snapshot of the connection set taken at call time.
//! Map locks are released before any sink is touched, and sinks never block, so
//! one slow or broken client cannot stall registration or delivery to others.
//! A recipient whose sink refuses a message is evicted on the spot.

use crate::connection::{Connection, ConnectionSet, MessageSink};
use chat_common::HubLimits;
use chat_core::{ConnectionId, HubError, HubResult, Message};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Maximum length of a display name, in characters
pub const MAX_DISPLAY_NAME_LEN: usize = 32;

/// Configuration for the hub
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubConfig {
    /// Connections admitted before `connect` reports exhaustion
    pub max_connections: usize,
    /// Queue depth of channels created by `connect_channel`
    pub outbound_buffer: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        let limits = HubLimits::default();
        Self {
            max_connections: limits.max_connections,
            outbound_buffer: limits.outbound_buffer,
        }
    }
}

impl From<&HubLimits> for HubConfig {
    fn from(limits: &HubLimits) -> Self {
        Self {
            max_connections: limits.max_connections,
            outbound_buffer: limits.outbound_buffer,
        }
    }
}

/// The connection-and-broadcast hub
pub struct Hub {
    /// Live connections
    connections: ConnectionSet,
    /// Limits
    config: HubConfig,
    /// Messages handed to at least one sink
    messages_relayed: AtomicU64,
    /// Recipients evicted after a sink failure
    evictions: AtomicU64,
}

impl Hub {
    /// Create a new hub
    #[must_use]
    pub fn new(config: HubConfig) -> Self {
        Self {
            connections: ConnectionSet::new(),
            config,
            messages_relayed: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Create a new hub wrapped in Arc
    #[must_use]
    pub fn new_shared(config: HubConfig) -> Arc<Self> {
        Arc::new(Self::new(config))
    }

    /// Get the hub configuration
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Register a new connection writing to `sink`
    ///
    /// Fails with `HubError::CapacityExhausted` when the connection limit is reached;
    /// nothing is registered in that case.
    pub fn connect(&self, sink: impl MessageSink + 'static) -> HubResult<ConnectionId> {
        let id = ConnectionId::generate();
        self.admit(Connection::new(id, sink))?;
        Ok(id)
    }

    /// Register a new connection backed by a bounded channel
    ///
    /// Returns the receiving end for the transport to drain.
    pub fn connect_channel(&self) -> HubResult<(ConnectionId, mpsc::Receiver<Arc<Message>>)> {
        self.connect_channel_with(|_| None)
    }

    /// Register a channel-backed connection whose first message is `greeting`
    ///
    /// `greeting` receives the new ID. Its payload is queued before the connection
    /// joins the set, so no broadcast can overtake it.
    pub fn connect_channel_with(
        &self,
        greeting: impl FnOnce(ConnectionId) -> Option<Vec<u8>>,
    ) -> HubResult<(ConnectionId, mpsc::Receiver<Arc<Message>>)> {
        let id = ConnectionId::generate();
        let (tx, rx) = mpsc::channel(self.config.outbound_buffer);

        if let Some(payload) = greeting(id) {
            if let Err(e) = tx.deliver(Arc::new(Message::from_server(payload))) {
                tracing::warn!(connection_id = %id, error = %e, "Failed to queue greeting");
            }
        }

        self.admit(Connection::new(id, tx))?;
        Ok((id, rx))
    }

    /// Insert a fresh connection into the set
    fn admit(&self, connection: Arc<Connection>) -> HubResult<()> {
        let id = connection.id();

        if let Err(e) = self.connections.insert(connection, self.config.max_connections) {
            tracing::warn!(
                limit = self.config.max_connections,
                error = %e,
                "Connection rejected"
            );
            return Err(e);
        }

        tracing::info!(
            connection_id = %id,
            connections = self.connections.len(),
            "Client connected"
        );

        Ok(())
    }

    /// Remove a connection
    ///
    /// Idempotent: returns true only for the call that actually removed it.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        match self.connections.remove(&id) {
            Some(connection) => {
                tracing::info!(
                    connection_id = %id,
                    delivered = connection.delivered_count(),
                    connections = self.connections.len(),
                    "Client disconnected"
                );
                true
            }
            None => {
                tracing::trace!(connection_id = %id, "Disconnect of absent connection ignored");
                false
            }
        }
    }

    /// Deliver `payload` to every registered connection
    ///
    /// When `exclude_sender` is set the sender's own connection is skipped. Recipients
    /// are visited in the set's iteration order at call time. Returns the number of
    /// connections the message was enqueued for.
    pub fn send(
        &self,
        sender: Option<ConnectionId>,
        payload: impl Into<Vec<u8>>,
        exclude_sender: bool,
    ) -> usize {
        let message = Arc::new(Message::new(sender, payload));
        self.broadcast(&message, exclude_sender)
    }

    /// Fan an already-built message out to every registered connection
    pub fn broadcast(&self, message: &Arc<Message>, exclude_sender: bool) -> usize {
        let recipients = self.connections.snapshot();

        let sent = recipients
            .iter()
            .filter(|conn| !(exclude_sender && message.is_from(conn.id())))
            .filter(|conn| self.deliver(conn, message))
            .count();

        if sent > 0 {
            self.messages_relayed.fetch_add(1, Ordering::Relaxed);
        }

        tracing::trace!(
            sender = ?message.sender(),
            bytes = message.len(),
            recipients = recipients.len(),
            sent = sent,
            "Message broadcast"
        );

        sent
    }

    /// Deliver `payload` to a single connection
    ///
    /// Returns false if the target is absent or its sink failed (in which case it is
    /// evicted).
    pub fn send_to(
        &self,
        target: ConnectionId,
        sender: Option<ConnectionId>,
        payload: impl Into<Vec<u8>>,
    ) -> bool {
        let Some(connection) = self.connections.get(&target) else {
            tracing::trace!(connection_id = %target, "Send to absent connection ignored");
            return false;
        };

        let message = Arc::new(Message::new(sender, payload));
        let sent = self.deliver(&connection, &message);
        if sent {
            self.messages_relayed.fetch_add(1, Ordering::Relaxed);
        }
        sent
    }

    /// Hand one message to one connection, evicting it on failure
    fn deliver(&self, connection: &Arc<Connection>, message: &Arc<Message>) -> bool {
        if connection.is_closed() && !self.connections.contains(&connection.id()) {
            // Disconnected after the snapshot was taken
            return false;
        }

        match connection.deliver(Arc::clone(message)) {
            Ok(()) => true,
            Err(e) => {
                if self.connections.remove_instance(connection) {
                    self.evictions.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        connection_id = %connection.id(),
                        error = %e,
                        "Delivery failed, dropping connection"
                    );
                } else {
                    // Already removed by a concurrent disconnect or eviction
                    tracing::trace!(
                        connection_id = %connection.id(),
                        error = %e,
                        "Delivery to departed connection skipped"
                    );
                }
                false
            }
        }
    }

    /// Set the display name of a connection
    pub fn set_display_name(&self, id: ConnectionId, name: &str) -> HubResult<()> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > MAX_DISPLAY_NAME_LEN {
            return Err(HubError::InvalidDisplayName(name.to_string()));
        }

        let connection = self
            .connections
            .get(&id)
            .ok_or(HubError::ConnectionNotFound(id))?;
        connection.set_display_name(name);

        tracing::debug!(connection_id = %id, name = %name, "Display name set");

        Ok(())
    }

    /// Get a connection by ID
    pub fn connection(&self, id: ConnectionId) -> Option<Arc<Connection>> {
        self.connections.get(&id)
    }

    /// Check if a connection is registered
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.contains(&id)
    }

    /// Get the IDs of all registered connections
    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.connections.ids()
    }

    /// Get the number of registered connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Number of messages handed to at least one sink
    pub fn messages_relayed(&self) -> u64 {
        self.messages_relayed.load(Ordering::Relaxed)
    }

    /// Number of connections evicted after a delivery failure
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new(HubConfig::default())
    }
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("connections", &self.connections.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
