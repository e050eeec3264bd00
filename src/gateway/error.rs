#![expect(
    clippy::module_name_repetitions,
    reason = "Error types include the module name to indicate their scope"
)]

use std::error::Error as StdError;
use std::fmt;

/// Gateway error variants.
#[non_exhaustive]
#[derive(Debug)]
pub enum GatewayError {
    /// Error connecting to or communicating over the WebSocket
    Connection(tokio_tungstenite::tungstenite::Error),
    /// Operation attempted while the socket is not open.
    /// Recoverable by reconnecting.
    ClosedSocket,
    /// A heartbeat frame was not accepted by the send path within the
    /// configured hand-off timeout
    HandoffTimeout,
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection(e) => write!(f, "gateway connection error: {e}"),
            Self::ClosedSocket => write!(f, "socket used while not open"),
            Self::HandoffTimeout => {
                write!(f, "heartbeat frame not accepted within hand-off timeout")
            }
        }
    }
}

impl StdError for GatewayError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Connection(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GatewayError> for crate::error::Error {
    fn from(e: GatewayError) -> Self {
        crate::error::Error::with_source(crate::error::Kind::Gateway, e)
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for crate::error::Error {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        crate::error::Error::with_source(crate::error::Kind::Gateway, GatewayError::Connection(e))
    }
}
