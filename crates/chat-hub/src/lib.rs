//! # chat-hub
//!
//! In-memory connection-and-broadcast hub for real-time chat, plus the WebSocket
//! transport that feeds it connection and frame events.

pub mod broadcast;
pub mod connection;
pub mod handlers;
pub mod protocol;
pub mod server;

pub use broadcast::{Hub, HubConfig};
pub use connection::{Connection, ConnectionSet, DeliveryError, MessageSink};
pub use handlers::{ChatHandler, HandlerError, HandlerResult, HubHandler};
pub use server::{create_app, create_router, run, run_server, serve, HubState};
