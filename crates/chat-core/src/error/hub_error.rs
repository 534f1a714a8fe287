//! Hub errors - failures the broadcast hub reports to its callers

use thiserror::Error;

use crate::value_objects::ConnectionId;

/// Errors surfaced by hub operations
///
/// Per-recipient delivery failures are handled inside the hub and never appear here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    #[error("Connection limit reached: {limit} connections")]
    CapacityExhausted { limit: usize },

    #[error("Connection not found: {0}")]
    ConnectionNotFound(ConnectionId),

    #[error("Invalid display name: {0}")]
    InvalidDisplayName(String),
}

impl HubError {
    /// Get an error code string for logs and close reasons
    pub fn code(&self) -> &'static str {
        match self {
            Self::CapacityExhausted { .. } => "CAPACITY_EXHAUSTED",
            Self::ConnectionNotFound(_) => "UNKNOWN_CONNECTION",
            Self::InvalidDisplayName(_) => "INVALID_DISPLAY_NAME",
        }
    }
}

/// Result type alias for hub operations
pub type HubResult<T> = Result<T, HubError>;
