use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt as _, StreamExt as _};
use serde::Serialize;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use super::error::GatewayError;
use crate::Result;
use crate::error::Error;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

/// Capacity of the outbound frame channel. Heartbeat submissions block (up to
/// the hand-off timeout) once this fills up.
const OUTBOUND_CAPACITY: usize = 16;

/// One frame queued for the writer task, with an optional flush acknowledgment.
struct OutboundFrame {
    text: String,
    ack: Option<oneshot::Sender<Result<()>>>,
}

/// The raw duplex JSON frame connection.
///
/// Owns a single tungstenite stream, split into a writer task fed by a
/// bounded channel and a reader half. Every operation fails with
/// [`GatewayError::ClosedSocket`] once the socket is no longer open, and
/// [`GatewaySocket::close`] unblocks a suspended [`GatewaySocket::receive`].
pub struct GatewaySocket {
    outbound_tx: mpsc::Sender<OutboundFrame>,
    reader: Mutex<SplitStream<WsStream>>,
    shutdown_tx: watch::Sender<bool>,
    open: Arc<AtomicBool>,
}

impl GatewaySocket {
    /// Open a WebSocket connection to `endpoint` and spawn the writer task.
    pub async fn connect(endpoint: &str) -> Result<Self> {
        let (stream, _) = connect_async(endpoint).await?;
        let (sink, reader) = stream.split();

        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let open = Arc::new(AtomicBool::new(true));

        tokio::spawn(Self::write_loop(
            sink,
            outbound_rx,
            shutdown_rx,
            Arc::clone(&open),
        ));

        Ok(Self {
            outbound_tx,
            reader: Mutex::new(reader),
            shutdown_tx,
            open,
        })
    }

    /// Drains the outbound channel into the sink until shutdown or a write
    /// failure.
    async fn write_loop(
        mut sink: WsSink,
        mut outbound_rx: mpsc::Receiver<OutboundFrame>,
        mut shutdown_rx: watch::Receiver<bool>,
        open: Arc<AtomicBool>,
    ) {
        loop {
            tokio::select! {
                frame = outbound_rx.recv() => {
                    let Some(frame) = frame else { break };
                    match sink.send(Message::Text(frame.text.into())).await {
                        Ok(()) => {
                            if let Some(ack) = frame.ack {
                                _ = ack.send(Ok(()));
                            }
                        }
                        Err(e) => {
                            open.store(false, Ordering::SeqCst);
                            if let Some(ack) = frame.ack {
                                _ = ack.send(Err(e.into()));
                            }
                            break;
                        }
                    }
                }
                _ = shutdown_rx.changed() => {
                    // Best-effort close handshake; the peer may already be gone.
                    _ = sink.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    }

    /// Whether the connection is currently open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Send a JSON frame, suspending until it has been flushed.
    pub async fn send<R: Serialize>(&self, payload: &R) -> Result<()> {
        if !self.is_open() {
            return Err(GatewayError::ClosedSocket.into());
        }

        let text = serde_json::to_string(payload)?;
        let (ack_tx, ack_rx) = oneshot::channel();
        self.outbound_tx
            .send(OutboundFrame {
                text,
                ack: Some(ack_tx),
            })
            .await
            .map_err(|_| Error::from(GatewayError::ClosedSocket))?;

        ack_rx
            .await
            .map_err(|_| Error::from(GatewayError::ClosedSocket))?
    }

    /// Queue a JSON frame without waiting for the flush, bounding the wait
    /// for the hand-off to be accepted. Used by the heartbeat so a stalled
    /// writer cannot block the timer's own scheduling.
    pub(crate) async fn submit<R: Serialize>(&self, payload: &R, handoff: Duration) -> Result<()> {
        if !self.is_open() {
            return Err(GatewayError::ClosedSocket.into());
        }

        let text = serde_json::to_string(payload)?;
        self.outbound_tx
            .send_timeout(OutboundFrame { text, ack: None }, handoff)
            .await
            .map_err(|e| match e {
                SendTimeoutError::Timeout(_) => Error::from(GatewayError::HandoffTimeout),
                SendTimeoutError::Closed(_) => Error::from(GatewayError::ClosedSocket),
            })
    }

    /// Receive the next JSON frame, suspending until one arrives, the peer
    /// drops the connection, or [`GatewaySocket::close`] is called.
    ///
    /// # Errors
    ///
    /// [`GatewayError::ClosedSocket`] on any form of termination;
    /// [`crate::error::Kind::Decode`] if a text frame is not valid JSON
    /// (surfaced, never dropped, so dispatch cannot silently desynchronize).
    pub async fn receive(&self) -> Result<Value> {
        if !self.is_open() {
            return Err(GatewayError::ClosedSocket.into());
        }

        let mut reader = self.reader.lock().await;
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        if *shutdown_rx.borrow() {
            return Err(GatewayError::ClosedSocket.into());
        }

        loop {
            tokio::select! {
                message = reader.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            return Ok(serde_json::from_str(text.as_str())?);
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            self.open.store(false, Ordering::SeqCst);
                            return Err(GatewayError::ClosedSocket.into());
                        }
                        Some(Ok(_)) => {
                            // Binary and control frames carry no gateway events.
                        }
                        Some(Err(e)) => {
                            self.open.store(false, Ordering::SeqCst);
                            return Err(e.into());
                        }
                    }
                }
                _ = shutdown_rx.changed() => {
                    return Err(GatewayError::ClosedSocket.into());
                }
            }
        }
    }

    /// Close the connection. Idempotent; wakes any suspended
    /// [`GatewaySocket::receive`] call.
    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
        _ = self.shutdown_tx.send(true);
    }
}
