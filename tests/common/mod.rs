#![allow(
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    reason = "Do not need additional syntax for setting up tests"
)]
#![allow(
    unused,
    reason = "Helpers are shared across test binaries that each use a subset"
)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::{SinkExt as _, StreamExt as _};
use httpmock::MockServer;
use revolt_client_sdk::cache::EntityCache;
use revolt_client_sdk::gateway::{Config, GatewaySession};
use revolt_client_sdk::rest;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

pub const TOKEN: &str = "s3cret-token";

/// Mock gateway WebSocket server.
pub struct MockGatewayServer {
    addr: SocketAddr,
    /// Broadcast messages to ALL connected clients
    message_tx: broadcast::Sender<String>,
    /// Receives every text frame sent by clients
    frame_rx: mpsc::UnboundedReceiver<String>,
    connections: Arc<AtomicUsize>,
}

impl MockGatewayServer {
    /// Start a mock gateway server on a random port.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (message_tx, _) = broadcast::channel::<String>(100);
        let (frame_tx, frame_rx) = mpsc::unbounded_channel::<String>();
        let connections = Arc::new(AtomicUsize::new(0));

        let broadcast_tx = message_tx.clone();
        let counter = Arc::clone(&connections);

        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };

                let Ok(ws_stream) = tokio_tungstenite::accept_async(stream).await else {
                    continue;
                };
                counter.fetch_add(1, Ordering::SeqCst);

                let (mut write, mut read) = ws_stream.split();
                let frame_tx = frame_tx.clone();
                let mut msg_rx = broadcast_tx.subscribe();

                tokio::spawn(async move {
                    loop {
                        tokio::select! {
                            // Forward frames sent by the client under test
                            msg = read.next() => {
                                match msg {
                                    Some(Ok(Message::Text(text))) => {
                                        drop(frame_tx.send(text.to_string()));
                                    }
                                    Some(Ok(_)) => {}
                                    _ => break,
                                }
                            }
                            // Push frames to the client under test
                            msg = msg_rx.recv() => {
                                match msg {
                                    Ok(text) => {
                                        if write.send(Message::Text(text.into())).await.is_err() {
                                            break;
                                        }
                                    }
                                    Err(_) => break,
                                }
                            }
                        }
                    }
                });
            }
        });

        Self {
            addr,
            message_tx,
            frame_rx,
            connections,
        }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Send a frame to all connected clients.
    pub fn send(&self, message: &str) {
        drop(self.message_tx.send(message.to_owned()));
    }

    /// Receive the next frame a client sent, waiting up to two seconds.
    pub async fn recv_frame(&mut self) -> Option<String> {
        self.recv_frame_within(Duration::from_secs(2)).await
    }

    pub async fn recv_frame_within(&mut self, wait: Duration) -> Option<String> {
        timeout(wait, self.frame_rx.recv()).await.ok().flatten()
    }

    /// How many WebSocket connections have been accepted so far.
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

/// Register the `GET /` gateway discovery route on the REST mock.
pub fn mock_discovery<'a>(http: &'a MockServer, ws_url: &str) -> httpmock::Mock<'a> {
    let ws_url = ws_url.to_owned();
    http.mock(move |when, then| {
        when.method(httpmock::Method::GET).path("/");
        then.status(200).json_body(json!({
            "revolt": "0.5.3",
            "ws": ws_url
        }));
    })
}

/// Build a session (in an `Arc`, so tests can drive and close it from
/// different tasks) against a mock REST server.
pub fn session_against(http: &MockServer, config: Config) -> Arc<GatewaySession> {
    let rest = Arc::new(
        rest::Client::new(&http.base_url())
            .unwrap()
            .with_token(TOKEN),
    );
    let cache = Arc::new(EntityCache::new(Arc::clone(&rest)));
    Arc::new(GatewaySession::new(rest, cache, config))
}

/// Config with a short heartbeat so keep-alive behavior is observable.
pub fn fast_config() -> Config {
    let mut config = Config::default();
    config.heartbeat_interval = Duration::from_millis(50);
    config.handoff_timeout = Duration::from_millis(500);
    config.reconnect.max_attempts = Some(3);
    config.reconnect.initial_backoff = Duration::from_millis(20);
    config.reconnect.max_backoff = Duration::from_millis(100);
    config
}

pub fn user_json(id: &str, username: &str) -> Value {
    json!({ "_id": id, "username": username })
}

pub fn saved_messages_json(id: &str, user: &str) -> Value {
    json!({
        "channel_type": "SavedMessages",
        "_id": id,
        "user": user
    })
}

pub fn direct_message_json(id: &str, recipients: &[&str]) -> Value {
    json!({
        "channel_type": "DirectMessage",
        "_id": id,
        "active": true,
        "recipients": recipients,
        "last_message_id": "01MESSAGE0000000000000000"
    })
}

pub fn group_json(id: &str, recipients: &[&str], owner: &str) -> Value {
    json!({
        "channel_type": "Group",
        "_id": id,
        "name": "late night crew",
        "recipients": recipients,
        "owner": owner,
        "description": "here be dragons"
    })
}

pub fn message_json(id: &str, channel: &str, author: &str, content: &str) -> Value {
    json!({
        "_id": id,
        "channel": channel,
        "author": author,
        "content": content
    })
}
