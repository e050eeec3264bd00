use bon::Builder;
use serde::Deserialize;

/// Relationship between the session user and another user.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Relationship {
    Blocked,
    BlockedOther,
    Friend,
    Incoming,
    Outgoing,
    /// No relationship exists. The wire value is the literal string `"None"`.
    #[serde(rename = "None")]
    NoRelationship,
    /// The session user themselves
    User,
}

/// Presence shown next to a user.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Presence {
    Busy,
    Idle,
    Invisible,
    Online,
}

/// A user's status: presence plus an optional custom text.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Builder)]
pub struct Status {
    pub presence: Presence,
    #[serde(default)]
    pub text: Option<String>,
}

/// Bot marker carried on bot accounts, referencing the owning user by ID.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Builder)]
pub struct Bot {
    #[builder(into)]
    pub owner: String,
}

/// A Revolt user.
///
/// Identity (`id`) is immutable; everything else is replaced wholesale when a
/// newer payload is cached.
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Builder)]
pub struct User {
    #[serde(rename = "_id")]
    #[builder(into)]
    pub id: String,
    #[builder(into)]
    pub username: String,
    #[serde(default)]
    pub badges: Option<u32>,
    #[serde(default)]
    pub online: Option<bool>,
    #[serde(default)]
    pub relationship: Option<Relationship>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub flags: Option<u32>,
    #[serde(default)]
    pub bot: Option<Bot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_user_decodes() {
        let json = serde_json::json!({
            "_id": "01EXAMPLE0USER00000000000",
            "username": "insert"
        });

        let user: User = serde_json::from_value(json).expect("decode failed");
        assert_eq!(user.id, "01EXAMPLE0USER00000000000");
        assert_eq!(user.username, "insert");
        assert!(user.badges.is_none());
        assert!(user.bot.is_none());
    }

    #[test]
    fn full_user_decodes() {
        let json = serde_json::json!({
            "_id": "01EXAMPLE0USER00000000000",
            "username": "insert",
            "badges": 3,
            "online": true,
            "relationship": "Friend",
            "status": { "presence": "Busy", "text": "afk" },
            "flags": 0,
            "bot": { "owner": "01EXAMPLE0OWNER0000000000" }
        });

        let user: User = serde_json::from_value(json).expect("decode failed");
        assert_eq!(user.relationship, Some(Relationship::Friend));
        assert_eq!(
            user.status,
            Some(Status {
                presence: Presence::Busy,
                text: Some("afk".to_owned()),
            })
        );
        assert_eq!(
            user.bot.map(|b| b.owner),
            Some("01EXAMPLE0OWNER0000000000".to_owned())
        );
    }

    #[test]
    fn none_relationship_uses_wire_literal() {
        let relationship: Relationship =
            serde_json::from_value(serde_json::json!("None")).expect("decode failed");
        assert_eq!(relationship, Relationship::NoRelationship);
    }
}
