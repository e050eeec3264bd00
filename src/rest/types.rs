use bon::Builder;
use serde::{Deserialize, Serialize};

/// Response of `GET /` on the REST base: node metadata plus the gateway URL.
///
/// Only the fields the SDK uses are modeled; everything else the node
/// advertises is ignored (and logged under the `tracing` feature).
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Builder)]
pub struct NodeInfo {
    /// WebSocket gateway URL to connect to
    #[builder(into)]
    pub ws: String,
    /// Node version string
    #[serde(default)]
    pub revolt: Option<String>,
}

/// Body of `POST /channels/{id}/messages`.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Builder)]
pub struct SendMessageRequest {
    #[builder(into)]
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_info_decodes_with_extra_fields() {
        let json = serde_json::json!({
            "revolt": "0.5.3",
            "features": { "voso": { "enabled": false } },
            "ws": "wss://ws.revolt.chat"
        });

        let info: NodeInfo = serde_json::from_value(json).expect("decode failed");
        assert_eq!(info.ws, "wss://ws.revolt.chat");
        assert_eq!(info.revolt.as_deref(), Some("0.5.3"));
    }

    #[test]
    fn send_message_request_serializes() {
        let request = SendMessageRequest::builder().content("hello").build();
        assert_eq!(
            serde_json::to_value(&request).expect("serialize failed"),
            serde_json::json!({ "content": "hello" })
        );
    }
}
