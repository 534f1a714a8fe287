//! Message broadcasting
//!
//! The hub that owns the connection set and fans messages out to it.

mod hub;

pub use hub::{Hub, HubConfig, MAX_DISPLAY_NAME_LEN};
