//! Message entity - one payload fanned out by the hub

use chrono::{DateTime, Utc};

use crate::value_objects::ConnectionId;

/// An immutable message relayed by the hub
///
/// The hub shares a single `Arc<Message>` between every recipient of a broadcast,
/// so the fields are private and only readable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    sender: Option<ConnectionId>,
    payload: Vec<u8>,
    sent_at: DateTime<Utc>,
}

impl Message {
    /// Create a new message stamped with the current time
    pub fn new(sender: Option<ConnectionId>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            sender,
            payload: payload.into(),
            sent_at: Utc::now(),
        }
    }

    /// Create a message that did not originate from a connection
    pub fn from_server(payload: impl Into<Vec<u8>>) -> Self {
        Self::new(None, payload)
    }

    /// The connection that produced this message, if any
    #[inline]
    pub fn sender(&self) -> Option<ConnectionId> {
        self.sender
    }

    /// Raw payload bytes
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload as UTF-8 text, if it is valid UTF-8
    pub fn payload_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }

    /// When the message was handed to the hub
    #[inline]
    pub fn sent_at(&self) -> DateTime<Utc> {
        self.sent_at
    }

    /// Payload length in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Check if the payload is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Check if the message was sent by the given connection
    pub fn is_from(&self, id: ConnectionId) -> bool {
        self.sender == Some(id)
    }
}
