//! Heartbeat handler (op 1)

use super::HandlerResult;
use crate::broadcast::Hub;
use crate::protocol::{CloseCode, HubFrame};
use chat_core::ConnectionId;

/// Handles heartbeat frames
pub struct HeartbeatHandler;

impl HeartbeatHandler {
    /// Acknowledge a heartbeat from `id`
    ///
    /// Receiving the frame already reset the transport's idle timer; the ACK lets the
    /// client detect a dead server.
    pub fn handle(hub: &Hub, id: ConnectionId) -> HandlerResult<Option<CloseCode>> {
        tracing::trace!(connection_id = %id, "Heartbeat received");

        if hub.send_to(id, None, HubFrame::heartbeat_ack().to_bytes()?) {
            Ok(None)
        } else {
            tracing::warn!(connection_id = %id, "Failed to send heartbeat ACK");
            Ok(Some(CloseCode::UnknownError))
        }
    }
}
