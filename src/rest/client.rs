use reqwest::{
    Client as ReqwestClient, Method, RequestBuilder,
    header::{HeaderMap, HeaderValue},
};
use secrecy::{ExposeSecret as _, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::types::{NodeInfo, SendMessageRequest};
use crate::Result;
use crate::models::{ChannelPayload, Message, User};

/// Header carrying the session token on authenticated requests.
const SESSION_TOKEN_HEADER: &str = "x-session-token";

/// HTTP client for the Revolt REST API.
///
/// # Example
///
/// ```no_run
/// use revolt_client_sdk::rest::Client;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::new("https://api.revolt.chat")?.with_token("token");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Client {
    host: Url,
    client: ReqwestClient,
    token: Option<SecretString>,
}

impl Client {
    /// Creates a new REST client against the given API base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be
    /// created.
    pub fn new(host: &str) -> Result<Client> {
        let mut headers = HeaderMap::new();

        headers.insert("User-Agent", HeaderValue::from_static("revolt-client-sdk"));
        headers.insert("Accept", HeaderValue::from_static("*/*"));
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = ReqwestClient::builder().default_headers(headers).build()?;

        Ok(Self {
            host: Url::parse(host)?,
            client,
            token: None,
        })
    }

    /// Attach a session token; subsequent requests carry it in the
    /// `x-session-token` header.
    #[must_use]
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(SecretString::from(token.to_owned()));
        self
    }

    /// Returns the base URL of the API.
    #[must_use]
    pub fn host(&self) -> &Url {
        &self.host
    }

    /// Whether a session token is attached.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn authenticated(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.header(SESSION_TOKEN_HEADER, token.expose_secret()),
            None => builder,
        }
    }

    async fn get<Res: DeserializeOwned>(&self, path: &str) -> Result<Res> {
        let builder = self
            .client
            .request(Method::GET, format!("{}{path}", self.host));
        let request = self.authenticated(builder).build()?;
        crate::request(&self.client, request).await
    }

    async fn post<Req: Serialize, Res: DeserializeOwned>(
        &self,
        path: &str,
        body: &Req,
    ) -> Result<Res> {
        let builder = self
            .client
            .request(Method::POST, format!("{}{path}", self.host))
            .json(body);
        let request = self.authenticated(builder).build()?;
        crate::request(&self.client, request).await
    }

    /// Fetch node metadata from `GET /`, including the gateway URL to
    /// connect the WebSocket to.
    pub async fn node_info(&self) -> Result<NodeInfo> {
        self.get("").await
    }

    /// Fetch a user by ID.
    pub async fn user(&self, id: &str) -> Result<User> {
        self.get(&format!("users/{id}")).await
    }

    /// Fetch a channel by ID. The result is the raw wire payload; hydrate it
    /// through [`crate::cache::EntityCache`].
    pub async fn channel(&self, id: &str) -> Result<ChannelPayload> {
        self.get(&format!("channels/{id}")).await
    }

    /// Post a text message to a channel.
    pub async fn send_message(&self, channel_id: &str, content: &str) -> Result<Message> {
        let body = SendMessageRequest {
            content: content.to_owned(),
        };
        self.post(&format!("channels/{channel_id}/messages"), &body)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_host_is_rejected() {
        Client::new("not a url").unwrap_err();
    }

    #[test]
    fn token_marks_client_authenticated() {
        let client = Client::new("https://api.revolt.chat").expect("client should build");
        assert!(!client.is_authenticated());

        let client = client.with_token("token");
        assert!(client.is_authenticated());
    }
}
