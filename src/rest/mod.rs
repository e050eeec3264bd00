//! REST client for the Revolt API.
//!
//! This is the transport every other component resolves entities through:
//! gateway URL discovery, user/channel fetch and message send. All requests
//! attach the session token (when present) via the `x-session-token` header.

mod client;
pub mod types;

pub use client::Client;
