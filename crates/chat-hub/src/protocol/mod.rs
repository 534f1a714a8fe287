//! Hub wire protocol
//!
//! Defines the JSON frames exchanged over `/chathub`: op codes, payloads, and close codes.

mod close_codes;
mod messages;
mod opcodes;
mod payloads;

pub use close_codes::CloseCode;
pub use messages::HubFrame;
pub use opcodes::OpCode;
pub use payloads::{HelloPayload, ReceiveMessagePayload, SendMessagePayload, SetNamePayload};
