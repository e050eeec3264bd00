use bon::Builder;
use serde::Deserialize;
use serde_json::Value;

/// A message in a channel.
///
/// `content` is kept as a raw [`Value`]: regular messages carry a string,
/// system messages an object. Use [`Message::text`] for the common case.
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Builder)]
pub struct Message {
    #[serde(rename = "_id")]
    #[builder(into)]
    pub id: String,
    /// Channel the message was posted to, by ID
    #[builder(into)]
    pub channel: String,
    /// Author of the message, by user ID
    #[builder(into)]
    pub author: String,
    #[serde(default)]
    pub content: Value,
    #[serde(default)]
    pub nonce: Option<String>,
}

impl Message {
    /// The plain-text content, if this is a regular text message.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.content.as_str()
    }
}
