//! Handler error types

use crate::protocol::CloseCode;
use chat_core::HubError;
use thiserror::Error;

/// Handler error type
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Frame could not be decoded
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Op code not accepted from clients
    #[error("Unexpected op code: {0}")]
    UnexpectedOpcode(String),

    /// Chat message exceeded the configured length
    #[error("Message too long: {len} > {max} characters")]
    MessageTooLong { len: usize, max: usize },

    /// Hub rejected the operation
    #[error("Hub error: {0}")]
    Hub(#[from] HubError),

    /// Outbound frame could not be encoded
    #[error("Encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

impl HandlerError {
    /// Convert to the close code sent to the client
    pub fn to_close_code(&self) -> CloseCode {
        match self {
            Self::InvalidPayload(_) => CloseCode::DecodeError,
            Self::UnexpectedOpcode(_) => CloseCode::UnknownOpcode,
            Self::MessageTooLong { .. } => CloseCode::MessageTooLarge,
            Self::Hub(HubError::CapacityExhausted { .. }) => CloseCode::ServerFull,
            Self::Hub(HubError::InvalidDisplayName(_)) => CloseCode::DecodeError,
            Self::Hub(HubError::ConnectionNotFound(_)) | Self::Encode(_) => CloseCode::UnknownError,
        }
    }
}

/// Handler result type
pub type HandlerResult<T> = Result<T, HandlerError>;
