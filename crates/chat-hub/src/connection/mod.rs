//! Connection management
//!
//! Live connections, their outbound sinks, and the concurrent set that owns them.

mod connection;
mod set;
mod sink;

pub use connection::Connection;
pub use set::ConnectionSet;
pub use sink::{DeliveryError, MessageSink};
