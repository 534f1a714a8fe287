//! Frame payload definitions

use chat_core::ConnectionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payload for op 10 (Hello)
///
/// Sent by the server immediately after the connection is admitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloPayload {
    /// Identifier the hub assigned to this connection
    pub connection_id: ConnectionId,
    /// Heartbeat interval in milliseconds
    pub heartbeat_interval: u64,
}

/// Payload for op 2 (SendMessage)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessagePayload {
    /// Name to show for this message; falls back to the connection's display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Message text
    pub message: String,

    /// Skip echoing the message back to the sender
    #[serde(default)]
    pub exclude_self: bool,
}

/// Payload for op 3 (SetName)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetNamePayload {
    pub name: String,
}

/// Data of the `RECEIVE_MESSAGE` dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveMessagePayload {
    /// Connection that sent the message
    pub connection_id: ConnectionId,
    /// Display name of the sender
    pub user: String,
    /// Message text
    pub message: String,
    /// When the hub accepted the message
    pub timestamp: DateTime<Utc>,
}
