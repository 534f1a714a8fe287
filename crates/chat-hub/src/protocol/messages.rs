//! Hub frame format
//!
//! Defines the envelope for every frame sent over the WebSocket connection.

use super::{
    CloseCode, HelloPayload, OpCode, ReceiveMessagePayload, SendMessagePayload, SetNamePayload,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// Hub frame envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubFrame {
    /// Operation code
    pub op: OpCode,

    /// Event type (only for op=0 Dispatch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,

    /// Event data payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<Value>,
}

impl HubFrame {
    /// Dispatch event name for relayed chat messages
    pub const RECEIVE_MESSAGE: &'static str = "RECEIVE_MESSAGE";

    // === Server Frames ===

    /// Create a Dispatch frame (op=0)
    #[must_use]
    pub fn dispatch(event_type: impl Into<String>, data: Value) -> Self {
        Self {
            op: OpCode::Dispatch,
            t: Some(event_type.into()),
            d: Some(data),
        }
    }

    /// Create the `RECEIVE_MESSAGE` dispatch for a relayed chat message
    pub fn receive_message(payload: &ReceiveMessagePayload) -> Result<Self, serde_json::Error> {
        Ok(Self::dispatch(
            Self::RECEIVE_MESSAGE,
            serde_json::to_value(payload)?,
        ))
    }

    /// Create a Hello frame (op=10)
    pub fn hello(payload: &HelloPayload) -> Result<Self, serde_json::Error> {
        Ok(Self {
            op: OpCode::Hello,
            t: None,
            d: Some(serde_json::to_value(payload)?),
        })
    }

    /// Create a Heartbeat ACK frame (op=11)
    #[must_use]
    pub fn heartbeat_ack() -> Self {
        Self {
            op: OpCode::HeartbeatAck,
            t: None,
            d: None,
        }
    }

    // === Parsing Client Frames ===

    fn data_as<T: DeserializeOwned>(&self, op: OpCode) -> Option<T> {
        if self.op != op {
            return None;
        }
        self.d.as_ref().and_then(|d| T::deserialize(d).ok())
    }

    /// Try to parse as a SendMessage payload (op=2)
    pub fn as_send_message(&self) -> Option<SendMessagePayload> {
        self.data_as(OpCode::SendMessage)
    }

    /// Try to parse as a SetName payload (op=3)
    pub fn as_set_name(&self) -> Option<SetNamePayload> {
        self.data_as(OpCode::SetName)
    }

    /// Try to parse as a Hello payload (op=10), used by clients
    pub fn as_hello(&self) -> Option<HelloPayload> {
        self.data_as(OpCode::Hello)
    }

    /// Try to parse as a `RECEIVE_MESSAGE` dispatch, used by clients
    pub fn as_receive_message(&self) -> Option<ReceiveMessagePayload> {
        if self.t.as_deref() != Some(Self::RECEIVE_MESSAGE) {
            return None;
        }
        self.data_as(OpCode::Dispatch)
    }

    // === Utilities ===

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to JSON bytes, the form the hub relays
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Deserialize from raw frame bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Build the `(code, reason)` pair of a close frame
    #[must_use]
    pub fn close_frame(code: CloseCode) -> (u16, &'static str) {
        (code.as_u16(), code.description())
    }
}

impl std::fmt::Display for HubFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.t {
            Some(t) => write!(f, "HubFrame(op={}, t={t})", self.op),
            None => write!(f, "HubFrame(op={})", self.op),
        }
    }
}
