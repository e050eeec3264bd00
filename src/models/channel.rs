use std::sync::Arc;

use serde::Deserialize;
use strum_macros::Display;

use crate::Result;
use crate::models::{Message, User};
use crate::rest;

/// The five channel kinds, matching the wire `channel_type` tag values.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ChannelKind {
    SavedMessages,
    DirectMessage,
    Group,
    TextChannel,
    VoiceChannel,
}

/// A channel as received on the wire (decode phase).
///
/// User and server references are raw ID strings; resolve them into a
/// [`Channel`] through [`crate::cache::EntityCache::put_channel`].
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "channel_type")]
pub enum ChannelPayload {
    SavedMessages {
        #[serde(rename = "_id")]
        id: String,
        user: String,
    },
    DirectMessage {
        #[serde(rename = "_id")]
        id: String,
        active: bool,
        recipients: Vec<String>,
        #[serde(default)]
        last_message_id: Option<String>,
    },
    Group {
        #[serde(rename = "_id")]
        id: String,
        name: String,
        recipients: Vec<String>,
        owner: String,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        last_message_id: Option<String>,
        #[serde(default)]
        permissions: Option<i64>,
        #[serde(default)]
        nsfw: Option<bool>,
    },
    TextChannel {
        #[serde(rename = "_id")]
        id: String,
        server: String,
        name: String,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        default_permissions: Option<i64>,
        #[serde(default)]
        nsfw: Option<bool>,
        #[serde(default)]
        last_message_id: Option<String>,
    },
    VoiceChannel {
        #[serde(rename = "_id")]
        id: String,
        server: String,
        name: String,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        default_permissions: Option<i64>,
        #[serde(default)]
        nsfw: Option<bool>,
    },
}

impl ChannelPayload {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::SavedMessages { id, .. }
            | Self::DirectMessage { id, .. }
            | Self::Group { id, .. }
            | Self::TextChannel { id, .. }
            | Self::VoiceChannel { id, .. } => id,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ChannelKind {
        match self {
            Self::SavedMessages { .. } => ChannelKind::SavedMessages,
            Self::DirectMessage { .. } => ChannelKind::DirectMessage,
            Self::Group { .. } => ChannelKind::Group,
            Self::TextChannel { .. } => ChannelKind::TextChannel,
            Self::VoiceChannel { .. } => ChannelKind::VoiceChannel,
        }
    }
}

/// The session user's private note-to-self channel.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct SavedMessages {
    pub id: String,
    pub user: Arc<User>,
}

/// A one-to-one direct message channel.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct DirectMessage {
    pub id: String,
    pub active: bool,
    pub recipients: Vec<Arc<User>>,
    pub last_message_id: Option<String>,
}

/// A private group channel with an owner and a recipient list.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub recipients: Vec<Arc<User>>,
    pub owner: Arc<User>,
    pub description: Option<String>,
    pub last_message_id: Option<String>,
    pub permissions: Option<i64>,
    pub nsfw: Option<bool>,
}

/// A text channel belonging to a server. The server is referenced by ID only.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct TextChannel {
    pub id: String,
    pub server: String,
    pub name: String,
    pub description: Option<String>,
    pub default_permissions: Option<i64>,
    pub nsfw: Option<bool>,
    pub last_message_id: Option<String>,
}

/// A voice channel belonging to a server. The server is referenced by ID only.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct VoiceChannel {
    pub id: String,
    pub server: String,
    pub name: String,
    pub description: Option<String>,
    pub default_permissions: Option<i64>,
    pub nsfw: Option<bool>,
}

/// A fully hydrated channel: user references resolved to shared [`Arc<User>`]
/// handles out of the session cache.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum Channel {
    SavedMessages(SavedMessages),
    DirectMessage(DirectMessage),
    Group(Group),
    TextChannel(TextChannel),
    VoiceChannel(VoiceChannel),
}

impl Channel {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::SavedMessages(c) => &c.id,
            Self::DirectMessage(c) => &c.id,
            Self::Group(c) => &c.id,
            Self::TextChannel(c) => &c.id,
            Self::VoiceChannel(c) => &c.id,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ChannelKind {
        match self {
            Self::SavedMessages(_) => ChannelKind::SavedMessages,
            Self::DirectMessage(_) => ChannelKind::DirectMessage,
            Self::Group(_) => ChannelKind::Group,
            Self::TextChannel(_) => ChannelKind::TextChannel,
            Self::VoiceChannel(_) => ChannelKind::VoiceChannel,
        }
    }

    /// Send a text message to this channel.
    pub async fn send_message(&self, rest: &rest::Client, content: &str) -> Result<Message> {
        rest.send_message(self.id(), content).await
    }
}
