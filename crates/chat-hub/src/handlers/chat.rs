//! Chat handlers (op 2 SendMessage, op 3 SetName)

use super::{HandlerError, HandlerResult};
use crate::broadcast::{Hub, MAX_DISPLAY_NAME_LEN};
use crate::protocol::{
    CloseCode, HubFrame, ReceiveMessagePayload, SendMessagePayload, SetNamePayload,
};
use chat_core::{ConnectionId, HubError};
use chrono::Utc;

/// Handles chat frames
pub struct ChatMessageHandler;

impl ChatMessageHandler {
    /// Name shown when neither the frame nor the connection supplies one
    pub const ANONYMOUS: &'static str = "anonymous";

    /// Relay a chat message from `id` to the room
    pub fn send_message(
        hub: &Hub,
        id: ConnectionId,
        payload: SendMessagePayload,
        max_length: usize,
    ) -> HandlerResult<Option<CloseCode>> {
        if payload.message.trim().is_empty() {
            return Err(HandlerError::InvalidPayload("Empty message".to_string()));
        }

        let len = payload.message.chars().count();
        if len > max_length {
            return Err(HandlerError::MessageTooLong {
                len,
                max: max_length,
            });
        }

        let user = Self::resolve_user(hub, id, payload.user.as_deref())?;

        let frame = HubFrame::receive_message(&ReceiveMessagePayload {
            connection_id: id,
            user,
            message: payload.message,
            timestamp: Utc::now(),
        })?;

        let sent = hub.send(Some(id), frame.to_bytes()?, payload.exclude_self);

        tracing::debug!(
            connection_id = %id,
            exclude_self = payload.exclude_self,
            sent = sent,
            "Chat message relayed"
        );

        Ok(None)
    }

    /// Set the display name of `id`
    pub fn set_name(
        hub: &Hub,
        id: ConnectionId,
        payload: &SetNamePayload,
    ) -> HandlerResult<Option<CloseCode>> {
        hub.set_display_name(id, &payload.name)?;
        Ok(None)
    }

    /// Pick the name shown for a message
    fn resolve_user(hub: &Hub, id: ConnectionId, requested: Option<&str>) -> HandlerResult<String> {
        match requested.map(str::trim).filter(|name| !name.is_empty()) {
            Some(name) if name.chars().count() > MAX_DISPLAY_NAME_LEN => {
                Err(HubError::InvalidDisplayName(name.to_string()).into())
            }
            Some(name) => Ok(name.to_string()),
            None => Ok(hub
                .connection(id)
                .and_then(|conn| conn.display_name())
                .unwrap_or_else(|| Self::ANONYMOUS.to_string())),
        }
    }
}
