//! # chat-core
//!
//! Domain layer containing the connection identifier, the immutable broadcast message,
//! and the errors the hub can report. This crate has zero dependencies on
//! infrastructure (web framework, runtime, etc.).

pub mod entities;
pub mod error;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::Message;
pub use error::{HubError, HubResult};
pub use value_objects::{ConnectionId, ConnectionIdParseError};
