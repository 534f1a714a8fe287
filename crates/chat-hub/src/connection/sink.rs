//! Outbound message sinks
//!
//! The hub never writes to a socket directly. Each connection owns a sink that
//! accepts messages without blocking; the transport drains it on its own task.

use chat_core::Message;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Why a sink refused a message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// Outbound buffer is full (slow consumer)
    #[error("outbound buffer full")]
    Full,

    /// Receiving side has gone away
    #[error("sink closed")]
    Closed,

    /// Transport-specific failure
    #[error("transport error: {0}")]
    Transport(String),
}

/// Non-blocking destination for messages bound to one connection
pub trait MessageSink: Send + Sync {
    /// Enqueue a message for delivery; must not wait on the network
    fn deliver(&self, message: Arc<Message>) -> Result<(), DeliveryError>;

    /// Whether the sink can no longer accept messages
    fn is_closed(&self) -> bool;
}

impl MessageSink for mpsc::Sender<Arc<Message>> {
    fn deliver(&self, message: Arc<Message>) -> Result<(), DeliveryError> {
        self.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::Full,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }

    fn is_closed(&self) -> bool {
        mpsc::Sender::is_closed(self)
    }
}
