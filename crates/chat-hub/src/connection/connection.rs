//! Individual hub connection
//!
//! Represents a single registered client and its outbound sink.

use super::{DeliveryError, MessageSink};
use chat_core::{ConnectionId, Message};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// A single hub connection
pub struct Connection {
    /// Unique connection ID
    id: ConnectionId,

    /// Destination for outbound messages
    sink: Box<dyn MessageSink>,

    /// Name used when the client does not send one with a message
    display_name: RwLock<Option<String>>,

    /// Set once the connection has left the set
    closed: AtomicBool,

    /// Messages accepted by the sink
    delivered: AtomicU64,

    /// Connection creation time
    created_at: DateTime<Utc>,
}

impl Connection {
    /// Create a new connection
    pub fn new(id: ConnectionId, sink: impl MessageSink + 'static) -> Arc<Self> {
        Arc::new(Self {
            id,
            sink: Box::new(sink),
            display_name: RwLock::new(None),
            closed: AtomicBool::new(false),
            delivered: AtomicU64::new(0),
            created_at: Utc::now(),
        })
    }

    /// Get the connection ID
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Get the creation timestamp
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Get connection age
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.created_at
    }

    /// Get the display name, if one was set
    pub fn display_name(&self) -> Option<String> {
        self.display_name.read().clone()
    }

    /// Set the display name
    pub fn set_display_name(&self, name: impl Into<String>) {
        *self.display_name.write() = Some(name.into());
    }

    /// Hand a message to the sink
    pub fn deliver(&self, message: Arc<Message>) -> Result<(), DeliveryError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DeliveryError::Closed);
        }

        self.sink.deliver(message)?;
        self.delivered.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Number of messages the sink accepted
    pub fn delivered_count(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Mark the connection closed
    ///
    /// Returns true only for the call that performed the transition.
    pub fn close(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }

    /// Check if the connection was closed or its sink went away
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire) || self.sink.is_closed()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .field("delivered", &self.delivered.load(Ordering::Relaxed))
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}
