//! Integration test utilities for the chat hub
//!
//! This crate provides helpers for running end-to-end tests against
//! the health endpoint and the WebSocket hub.

pub mod helpers;

pub use helpers::*;
