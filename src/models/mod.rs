//! Entity models for the Revolt API.
//!
//! Wire payloads (the *decode* phase) carry raw entity ID strings exactly as
//! received; hydrated entities (the *hydration* phase) carry shared
//! [`std::sync::Arc`] handles resolved through
//! [`crate::cache::EntityCache`]. Keeping the phases separate keeps network
//! I/O out of parsing.

pub mod channel;
pub mod message;
pub mod user;

pub use channel::{
    Channel, ChannelKind, ChannelPayload, DirectMessage, Group, SavedMessages, TextChannel,
    VoiceChannel,
};
pub use message::Message;
pub use user::{Bot, Presence, Relationship, Status, User};
