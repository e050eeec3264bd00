use std::sync::{Arc, PoisonError, RwLock};

use async_stream::try_stream;
use backoff::ExponentialBackoff;
use backoff::backoff::Backoff as _;
use dashmap::DashMap;
use futures::Stream;
use secrecy::{ExposeSecret as _, SecretString};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{Mutex, watch};
use tokio::time::sleep;

use super::config::Config;
use super::error::GatewayError;
use super::events::{ClientFrame, EventKind, GatewayEvent};
use super::heartbeat::HeartbeatTimer;
use super::socket::GatewaySocket;
use crate::Result;
use crate::cache::EntityCache;
use crate::rest;

/// Session connection state.
///
/// Transitions only through [`GatewaySession`] operations:
/// `Disconnected → Connecting → Open → Closing → Disconnected`.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
    Closing,
}

impl ConnectionState {
    /// Check if the session is currently open.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

/// Handler invoked for events of one tag, in receive order, after hydration.
pub type EventHandler = Box<dyn Fn(&GatewayEvent) + Send + Sync + 'static>;

/// Heartbeat ownership follows the lifecycle lock: the timer runs iff the
/// socket is open, and connect/close are serialized through this.
#[derive(Default)]
struct Lifecycle {
    heartbeat: Option<HeartbeatTimer>,
}

/// The gateway session: composes [`GatewaySocket`], the heartbeat timer and
/// the [`EntityCache`] into the connect / authenticate / receive / close
/// lifecycle.
///
/// At most one live socket exists per session; re-entrant
/// [`GatewaySession::connect`] calls are no-ops. The heartbeat runs exactly
/// while the socket is open. All methods take `&self`, so a session wrapped
/// in an [`Arc`] can be driven from one task and closed from another.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use revolt_client_sdk::cache::EntityCache;
/// use revolt_client_sdk::gateway::{Config, GatewaySession};
/// use revolt_client_sdk::rest;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let rest = Arc::new(rest::Client::new("https://api.revolt.chat")?.with_token("token"));
/// let cache = Arc::new(EntityCache::new(Arc::clone(&rest)));
///
/// let session = GatewaySession::new(rest, cache, Config::default());
/// session.connect().await?;
/// session.authenticate("token").await?;
///
/// let event = session.receive().await?;
/// println!("{event:?}");
/// # Ok(())
/// # }
/// ```
pub struct GatewaySession {
    rest: Arc<rest::Client>,
    cache: Arc<EntityCache>,
    config: Config,
    /// Watch channel sender for state changes (enables observation from other tasks)
    state_tx: watch::Sender<ConnectionState>,
    /// Watch channel receiver for checking the current state
    state_rx: watch::Receiver<ConnectionState>,
    socket: RwLock<Option<Arc<GatewaySocket>>>,
    lifecycle: Mutex<Lifecycle>,
    /// Token retained from `authenticate` so `reconnect` can re-send it
    token: RwLock<Option<SecretString>>,
    handlers: DashMap<EventKind, EventHandler>,
}

impl GatewaySession {
    #[must_use]
    pub fn new(rest: Arc<rest::Client>, cache: Arc<EntityCache>, config: Config) -> Self {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);

        Self {
            rest,
            cache,
            config,
            state_tx,
            state_rx,
            socket: RwLock::new(None),
            lifecycle: Mutex::new(Lifecycle::default()),
            token: RwLock::new(None),
            handlers: DashMap::new(),
        }
    }

    /// Get the current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Subscribe to connection state changes.
    #[must_use]
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// The entity cache shared by this session's decode paths.
    #[must_use]
    pub fn cache(&self) -> &Arc<EntityCache> {
        &self.cache
    }

    /// Resolve the gateway URL via `GET /`, open the socket and start the
    /// heartbeat. Valid only from `Disconnected`; calling while a socket is
    /// already live is a no-op and never opens a second one.
    ///
    /// # Errors
    ///
    /// Any failure (URL discovery, WebSocket handshake) leaves the session
    /// at `Disconnected`, never half-open.
    pub async fn connect(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock().await;

        if matches!(
            self.state(),
            ConnectionState::Open | ConnectionState::Connecting
        ) {
            return Ok(());
        }

        _ = self.state_tx.send(ConnectionState::Connecting);

        let connected = async {
            let info = self.rest.node_info().await?;
            let socket = GatewaySocket::connect(&info.ws).await?;
            Ok::<_, crate::error::Error>(Arc::new(socket))
        }
        .await;

        let socket = match connected {
            Ok(socket) => socket,
            Err(e) => {
                _ = self.state_tx.send(ConnectionState::Disconnected);
                return Err(e);
            }
        };

        *self
            .socket
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&socket));
        lifecycle.heartbeat = Some(HeartbeatTimer::start(socket, &self.config));
        _ = self.state_tx.send(ConnectionState::Open);

        Ok(())
    }

    /// Send an `Authenticate` frame. Valid only while `Open`.
    ///
    /// This is fire-and-forget: success or failure arrives later as an
    /// [`GatewayEvent::Authenticated`] or [`GatewayEvent::Error`] event, not
    /// as a return value. The token is retained so
    /// [`GatewaySession::reconnect`] can re-send it.
    pub async fn authenticate(&self, token: &str) -> Result<()> {
        if self.state() != ConnectionState::Open {
            return Err(GatewayError::ClosedSocket.into());
        }

        *self.token.write().unwrap_or_else(PoisonError::into_inner) =
            Some(SecretString::from(token.to_owned()));

        self.send(&ClientFrame::Authenticate {
            token: token.to_owned(),
        })
        .await
    }

    /// Send a JSON frame over the gateway.
    ///
    /// # Errors
    ///
    /// [`GatewayError::ClosedSocket`] unless the session is `Open`.
    pub async fn send<R: Serialize>(&self, payload: &R) -> Result<()> {
        if self.state() != ConnectionState::Open {
            return Err(GatewayError::ClosedSocket.into());
        }
        self.open_socket()?.send(payload).await
    }

    /// Receive the next frame, decode it into a [`GatewayEvent`], hydrate the
    /// entity references it carries through the cache, invoke the registered
    /// handler for its tag, and return it.
    ///
    /// A failed receive does not close the session; the caller decides
    /// whether to [`GatewaySession::close`] or
    /// [`GatewaySession::reconnect`].
    ///
    /// # Errors
    ///
    /// [`GatewayError::ClosedSocket`] when the connection is gone,
    /// [`crate::error::Kind::Decode`] on an unexpected frame shape, and any
    /// REST error surfaced by hydration.
    pub async fn receive(&self) -> Result<GatewayEvent> {
        let socket = self.open_socket()?;
        let frame = socket.receive().await?;
        let event = Self::decode(frame)?;
        self.hydrate(&event).await?;
        self.dispatch(&event);
        Ok(event)
    }

    /// Register the handler for one event tag, replacing any previous one.
    pub fn on<F>(&self, kind: EventKind, handler: F)
    where
        F: Fn(&GatewayEvent) + Send + Sync + 'static,
    {
        self.handlers.insert(kind, Box::new(handler));
    }

    /// Remove the handler for an event tag. Returns whether one was present.
    pub fn off(&self, kind: EventKind) -> bool {
        self.handlers.remove(&kind).is_some()
    }

    /// Close the session: stop the heartbeat, close the socket (waking any
    /// suspended [`GatewaySession::receive`]) and transition to
    /// `Disconnected`. Idempotent. The shared REST client is left untouched;
    /// its connection pool is released when the last handle drops.
    pub async fn close(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock().await;

        if self.state() == ConnectionState::Disconnected {
            return Ok(());
        }

        _ = self.state_tx.send(ConnectionState::Closing);

        if let Some(heartbeat) = lifecycle.heartbeat.take() {
            heartbeat.stop();
        }
        if let Some(socket) = self
            .socket
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            socket.close();
        }

        _ = self.state_tx.send(ConnectionState::Disconnected);
        Ok(())
    }

    /// Tear down whatever is left of the current connection and connect
    /// again, retrying with exponential backoff per
    /// [`Config::reconnect`](super::Config). On success the heartbeat has
    /// been restarted and, if the session ever authenticated, the retained
    /// token has been re-sent.
    pub async fn reconnect(&self) -> Result<()> {
        self.close().await?;

        let mut backoff: ExponentialBackoff = self.config.reconnect.clone().into();
        let mut attempt = 0_u32;

        loop {
            match self.connect().await {
                Ok(()) => break,
                Err(e) => {
                    attempt = attempt.saturating_add(1);
                    if let Some(max) = self.config.reconnect.max_attempts
                        && attempt >= max
                    {
                        return Err(e);
                    }

                    #[cfg(feature = "tracing")]
                    tracing::warn!(%e, attempt, "gateway reconnect attempt failed");
                    #[cfg(not(feature = "tracing"))]
                    let _ = &e;

                    match backoff.next_backoff() {
                        Some(delay) => sleep(delay).await,
                        None => return Err(e),
                    }
                }
            }
        }

        let token = self
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(token) = token {
            self.send(&ClientFrame::Authenticate {
                token: token.expose_secret().to_owned(),
            })
            .await?;
        }

        Ok(())
    }

    /// Adapt the receive loop into a stream of events.
    ///
    /// The stream ends cleanly when the session closes; any other error is
    /// yielded as the final item.
    pub fn events(self: Arc<Self>) -> impl Stream<Item = Result<GatewayEvent>> {
        try_stream! {
            loop {
                match self.receive().await {
                    Ok(event) => yield event,
                    Err(e) if e.is_closed_socket() => break,
                    Err(e) => Err(e)?,
                }
            }
        }
    }

    fn open_socket(&self) -> Result<Arc<GatewaySocket>> {
        self.socket
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| GatewayError::ClosedSocket.into())
    }

    fn decode(frame: Value) -> Result<GatewayEvent> {
        Ok(serde_json::from_value(frame)?)
    }

    /// Resolve entity references embedded in an event through the cache.
    ///
    /// Only events that push or invalidate entities touch the cache; the
    /// rest pass through structurally.
    async fn hydrate(&self, event: &GatewayEvent) -> Result<()> {
        match event {
            GatewayEvent::Ready(ready) => {
                for user in &ready.users {
                    self.cache.insert_user(user.clone());
                }
                for channel in &ready.channels {
                    self.cache.put_channel(channel.clone()).await?;
                }
            }
            GatewayEvent::ChannelCreate(payload) => {
                self.cache.put_channel(payload.clone()).await?;
            }
            GatewayEvent::ChannelGroupJoin { user, .. } => {
                self.cache.user(user).await?;
            }
            GatewayEvent::ChannelUpdate { id, .. } | GatewayEvent::ChannelDelete { id } => {
                self.cache.evict_channel(id);
            }
            _ => {}
        }
        Ok(())
    }

    fn dispatch(&self, event: &GatewayEvent) {
        if let Some(handler) = self.handlers.get(&event.kind()) {
            (handler.value())(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> GatewaySession {
        let rest =
            Arc::new(rest::Client::new("http://127.0.0.1:9").expect("client should build"));
        let cache = Arc::new(EntityCache::new(Arc::clone(&rest)));
        GatewaySession::new(rest, cache, Config::default())
    }

    #[test]
    fn new_session_is_disconnected() {
        assert_eq!(session().state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn close_on_fresh_session_is_noop() {
        let session = session();
        session.close().await.expect("close should be a no-op");
        assert_eq!(session.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn send_while_disconnected_is_closed_socket() {
        let session = session();
        let err = session
            .send(&ClientFrame::Ping { data: 0 })
            .await
            .unwrap_err();
        assert!(err.is_closed_socket());
    }

    #[tokio::test]
    async fn authenticate_while_disconnected_is_closed_socket() {
        let session = session();
        let err = session.authenticate("token").await.unwrap_err();
        assert!(err.is_closed_socket());
    }

    #[test]
    fn handlers_register_and_remove() {
        let session = session();
        session.on(EventKind::Message, |_| {});
        assert!(session.off(EventKind::Message));
        assert!(!session.off(EventKind::Message));
    }
}
