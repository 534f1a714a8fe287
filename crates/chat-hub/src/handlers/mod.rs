//! Hub lifecycle handlers
//!
//! The transport reports connection lifecycle and inbound frames through the
//! `HubHandler` trait; `ChatHandler` is the chat-room implementation.

mod chat;
mod error;
mod heartbeat;

pub use chat::ChatMessageHandler;
pub use error::{HandlerError, HandlerResult};
pub use heartbeat::HeartbeatHandler;

use crate::broadcast::Hub;
use crate::protocol::{CloseCode, HelloPayload, HubFrame, OpCode};
use chat_common::HubLimits;
use chat_core::ConnectionId;

/// Capabilities the transport invokes for each connection
pub trait HubHandler: Send + Sync {
    /// Frame queued for `id` before it is admitted to the hub
    ///
    /// It reaches the client ahead of any broadcast.
    fn greeting(&self, _id: ConnectionId) -> HandlerResult<Option<Vec<u8>>> {
        Ok(None)
    }

    /// Called once after `id` has been admitted to the hub
    fn on_connect(&self, _hub: &Hub, _id: ConnectionId) -> HandlerResult<()> {
        Ok(())
    }

    /// Called for every frame received from `id`
    ///
    /// Returning `Ok(Some(code))` asks the transport to close the connection with `code`.
    fn on_message(
        &self,
        hub: &Hub,
        id: ConnectionId,
        payload: &[u8],
    ) -> HandlerResult<Option<CloseCode>>;

    /// Called once after `id` has left the hub
    fn on_disconnect(&self, _hub: &Hub, _id: ConnectionId) {}
}

/// Chat room handler
///
/// Greets new connections with their ID and relays `SendMessage` frames to the room.
#[derive(Debug, Clone)]
pub struct ChatHandler {
    /// Longest accepted message, in characters
    max_message_length: usize,
    /// Interval advertised in Hello
    heartbeat_interval_ms: u64,
}

impl ChatHandler {
    /// Create a new chat handler
    #[must_use]
    pub fn new(max_message_length: usize, heartbeat_interval_ms: u64) -> Self {
        Self {
            max_message_length,
            heartbeat_interval_ms,
        }
    }
}

impl Default for ChatHandler {
    fn default() -> Self {
        Self::from(&HubLimits::default())
    }
}

impl From<&HubLimits> for ChatHandler {
    fn from(limits: &HubLimits) -> Self {
        Self::new(limits.max_message_length, limits.heartbeat_interval_ms)
    }
}

impl HubHandler for ChatHandler {
    fn greeting(&self, id: ConnectionId) -> HandlerResult<Option<Vec<u8>>> {
        let hello = HubFrame::hello(&HelloPayload {
            connection_id: id,
            heartbeat_interval: self.heartbeat_interval_ms,
        })?;

        Ok(Some(hello.to_bytes()?))
    }

    fn on_connect(&self, hub: &Hub, id: ConnectionId) -> HandlerResult<()> {
        tracing::debug!(
            connection_id = %id,
            participants = hub.connection_count(),
            "Chat participant joined"
        );
        Ok(())
    }

    fn on_message(
        &self,
        hub: &Hub,
        id: ConnectionId,
        payload: &[u8],
    ) -> HandlerResult<Option<CloseCode>> {
        let frame = HubFrame::from_slice(payload)
            .map_err(|e| HandlerError::InvalidPayload(e.to_string()))?;

        tracing::trace!(connection_id = %id, op = %frame.op, "Received frame");

        // Validate that this is a client-sendable op code
        if !frame.op.is_client_op() {
            tracing::warn!(
                connection_id = %id,
                op = %frame.op,
                "Received server-only op code from client"
            );
            return Ok(Some(CloseCode::UnknownOpcode));
        }

        match frame.op {
            OpCode::Heartbeat => HeartbeatHandler::handle(hub, id),
            OpCode::SendMessage => {
                let payload = frame.as_send_message().ok_or_else(|| {
                    HandlerError::InvalidPayload("Invalid SendMessage payload".to_string())
                })?;

                ChatMessageHandler::send_message(hub, id, payload, self.max_message_length)
            }
            OpCode::SetName => {
                let payload = frame.as_set_name().ok_or_else(|| {
                    HandlerError::InvalidPayload("Invalid SetName payload".to_string())
                })?;

                ChatMessageHandler::set_name(hub, id, &payload)
            }
            // Server-only ops are rejected above
            op => Err(HandlerError::UnexpectedOpcode(op.to_string())),
        }
    }

    fn on_disconnect(&self, hub: &Hub, id: ConnectionId) {
        tracing::debug!(
            connection_id = %id,
            remaining = hub.connection_count(),
            "Chat participant left"
        );
    }
}
