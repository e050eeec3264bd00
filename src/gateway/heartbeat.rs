use std::sync::Arc;

use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use super::config::Config;
use super::events::ClientFrame;
use super::socket::GatewaySocket;

/// Background keep-alive task.
///
/// Submits `{"type":"Ping","data":0}` through the socket's bounded hand-off
/// path once per [`Config::heartbeat_interval`]. The timer only waits for the
/// frame to be accepted by the send path, never for a `Pong` reply, so a slow
/// writer cannot skew its schedule. A hand-off timeout (or a closed socket)
/// terminates the task.
///
/// Starting and stopping is owned by the session's connect/close transitions;
/// the timer never outlives the socket it pings.
pub(crate) struct HeartbeatTimer {
    token: CancellationToken,
}

impl HeartbeatTimer {
    pub(crate) fn start(socket: Arc<GatewaySocket>, config: &Config) -> Self {
        let token = CancellationToken::new();
        let task_token = token.clone();
        let period = config.heartbeat_interval;
        let handoff = config.handoff_timeout;

        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of a tokio interval completes immediately;
            // consume it so pings start one full period after connect.
            ticker.tick().await;

            loop {
                tokio::select! {
                    () = task_token.cancelled() => break,
                    _ = ticker.tick() => {
                        if !socket.is_open() {
                            break;
                        }
                        if let Err(e) = socket.submit(&ClientFrame::Ping { data: 0 }, handoff).await {
                            #[cfg(feature = "tracing")]
                            tracing::error!(%e, "heartbeat hand-off failed, stopping keep-alive");
                            #[cfg(not(feature = "tracing"))]
                            let _ = &e;
                            break;
                        }
                    }
                }
            }
        });

        Self { token }
    }

    /// Stop the timer. Idempotent and safe to call from any context.
    pub(crate) fn stop(&self) {
        self.token.cancel();
    }
}

impl Drop for HeartbeatTimer {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
