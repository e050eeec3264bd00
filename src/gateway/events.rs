//! The gateway wire catalog: outbound client frames and inbound events.

use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::EnumDiscriminants;

use crate::models::{ChannelPayload, Message, Relationship, User};

/// Frames the client sends over the gateway.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ClientFrame {
    Authenticate { token: String },
    Ping { data: u32 },
}

/// Payload of the `Ready` event. Every field may be absent on the wire.
#[non_exhaustive]
#[derive(Debug, Clone, Default, Deserialize, Builder)]
pub struct ReadyPayload {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub servers: Vec<Value>,
    #[serde(default)]
    pub channels: Vec<ChannelPayload>,
}

/// Composite key identifying a member: the server and the user.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MemberId {
    pub server: String,
    pub user: String,
}

/// An event received over the gateway, tagged by the wire `type` field.
///
/// Constructed from a decoded frame and consumed by the dispatch step; not
/// retained by the session. Partial-update events (`*Update`) keep their
/// `data` as raw JSON since the SDK does not patch entities in place.
///
/// [`EventKind`] is the derived tag-only discriminant used as the dispatch
/// table key.
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, EnumDiscriminants)]
#[strum_discriminants(name(EventKind), derive(Hash))]
#[serde(tag = "type")]
pub enum GatewayEvent {
    /// The `Authenticate` frame was accepted
    Authenticated,
    /// The server rejected a frame
    Error {
        #[serde(default)]
        error: Option<String>,
    },
    /// Reply to a keep-alive `Ping`
    Pong {
        #[serde(default)]
        data: Option<i64>,
    },
    /// Initial state snapshot after authentication
    Ready(ReadyPayload),
    Message(Message),
    MessageUpdate {
        id: String,
        #[serde(default)]
        channel: Option<String>,
        #[serde(default)]
        data: Value,
    },
    MessageDelete {
        id: String,
        channel: String,
    },
    /// A channel was created or became visible; carries the full payload
    ChannelCreate(ChannelPayload),
    ChannelUpdate {
        id: String,
        #[serde(default)]
        data: Value,
        #[serde(default)]
        clear: Option<String>,
    },
    ChannelDelete {
        id: String,
    },
    ChannelGroupJoin {
        id: String,
        user: String,
    },
    ChannelGroupLeave {
        id: String,
        user: String,
    },
    ChannelStartTyping {
        id: String,
        user: String,
    },
    ChannelStopTyping {
        id: String,
        user: String,
    },
    ChannelAck {
        id: String,
        user: String,
        message_id: String,
    },
    ServerUpdate {
        id: String,
        #[serde(default)]
        data: Value,
        #[serde(default)]
        clear: Option<String>,
    },
    ServerDelete {
        id: String,
    },
    ServerMemberUpdate {
        id: MemberId,
        #[serde(default)]
        data: Value,
        #[serde(default)]
        clear: Option<String>,
    },
    ServerMemberJoin {
        id: String,
        user: String,
    },
    ServerMemberLeave {
        id: String,
        user: String,
    },
    ServerRoleUpdate {
        id: String,
        role_id: String,
        #[serde(default)]
        data: Value,
    },
    ServerRoleDelete {
        id: String,
        role_id: String,
    },
    UserUpdate {
        id: String,
        #[serde(default)]
        data: Value,
        #[serde(default)]
        clear: Option<String>,
    },
    UserRelationship {
        id: String,
        #[serde(default)]
        user: Value,
        #[serde(default)]
        status: Option<Relationship>,
    },
    BeginTyping {
        #[serde(default)]
        channel: Option<String>,
    },
    EndTyping {
        #[serde(default)]
        channel: Option<String>,
    },
}

impl GatewayEvent {
    /// The tag-only discriminant of this event, for dispatch lookups.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        EventKind::from(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_serializes_to_exact_wire_shape() {
        let frame = ClientFrame::Ping { data: 0 };
        assert_eq!(
            serde_json::to_value(&frame).expect("serialize failed"),
            serde_json::json!({ "type": "Ping", "data": 0 })
        );
    }

    #[test]
    fn authenticate_serializes_to_exact_wire_shape() {
        let frame = ClientFrame::Authenticate {
            token: "s3cret".to_owned(),
        };
        assert_eq!(
            serde_json::to_value(&frame).expect("serialize failed"),
            serde_json::json!({ "type": "Authenticate", "token": "s3cret" })
        );
    }

    #[test]
    fn bare_ready_decodes() {
        let event: GatewayEvent = serde_json::from_value(serde_json::json!({ "type": "Ready" }))
            .expect("decode failed");

        match event {
            GatewayEvent::Ready(ready) => {
                assert!(ready.users.is_empty());
                assert!(ready.channels.is_empty());
            }
            other => panic!("expected Ready, got {other:?}"),
        }
    }

    #[test]
    fn ready_with_entities_decodes() {
        let json = serde_json::json!({
            "type": "Ready",
            "users": [{ "_id": "01USER000000000000000000A", "username": "insert" }],
            "channels": [{
                "channel_type": "SavedMessages",
                "_id": "01CHANNEL0000000000000000",
                "user": "01USER000000000000000000A"
            }]
        });

        let event: GatewayEvent = serde_json::from_value(json).expect("decode failed");
        match event {
            GatewayEvent::Ready(ready) => {
                assert_eq!(ready.users.len(), 1);
                assert_eq!(ready.channels.len(), 1);
            }
            other => panic!("expected Ready, got {other:?}"),
        }
    }

    #[test]
    fn message_event_decodes() {
        let json = serde_json::json!({
            "type": "Message",
            "_id": "01MESSAGE0000000000000000",
            "channel": "01CHANNEL0000000000000000",
            "author": "01USER000000000000000000A",
            "content": "hello"
        });

        let event: GatewayEvent = serde_json::from_value(json).expect("decode failed");
        match event {
            GatewayEvent::Message(message) => assert_eq!(message.text(), Some("hello")),
            other => panic!("expected Message, got {other:?}"),
        }
    }

    #[test]
    fn channel_create_carries_tagged_payload() {
        let json = serde_json::json!({
            "type": "ChannelCreate",
            "channel_type": "Group",
            "_id": "01CHANNEL0000000000000000",
            "name": "crew",
            "recipients": ["01USER000000000000000000A"],
            "owner": "01USER000000000000000000A"
        });

        let event: GatewayEvent = serde_json::from_value(json).expect("decode failed");
        match event {
            GatewayEvent::ChannelCreate(payload) => {
                assert_eq!(payload.id(), "01CHANNEL0000000000000000");
            }
            other => panic!("expected ChannelCreate, got {other:?}"),
        }
    }

    #[test]
    fn server_member_update_uses_composite_id() {
        let json = serde_json::json!({
            "type": "ServerMemberUpdate",
            "id": { "server": "01SERVER00000000000000000", "user": "01USER000000000000000000A" },
            "data": { "nickname": "insert" }
        });

        let event: GatewayEvent = serde_json::from_value(json).expect("decode failed");
        match event {
            GatewayEvent::ServerMemberUpdate { id, data, .. } => {
                assert_eq!(id.server, "01SERVER00000000000000000");
                assert_eq!(data["nickname"], "insert");
            }
            other => panic!("expected ServerMemberUpdate, got {other:?}"),
        }
    }

    #[test]
    fn unknown_event_tag_is_rejected() {
        serde_json::from_value::<GatewayEvent>(serde_json::json!({ "type": "Telemetry" }))
            .unwrap_err();
    }

    #[test]
    fn kind_matches_variant() {
        let event: GatewayEvent =
            serde_json::from_value(serde_json::json!({ "type": "Authenticated" }))
                .expect("decode failed");
        assert_eq!(event.kind(), EventKind::Authenticated);
    }
}
