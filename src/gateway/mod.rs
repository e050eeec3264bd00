//! Gateway connection management.
//!
//! The gateway is the persistent WebSocket connection carrying real-time
//! events. This module provides:
//!
//! - [`GatewaySession`]: the connect / authenticate / receive / close state
//!   machine, composing the socket, the heartbeat and the entity cache
//! - [`GatewaySocket`]: the raw duplex JSON frame connection
//! - [`GatewayEvent`]: the typed inbound event catalog
//!
//! # Example
//!
//! ```ignore
//! let session = GatewaySession::new(rest, cache, Config::default());
//! session.connect().await?;
//! session.authenticate(token).await?;
//! while let Ok(event) = session.receive().await {
//!     // ...
//! }
//! ```

pub mod config;
pub mod error;
pub mod events;
mod heartbeat;
pub mod session;
mod socket;

pub use config::{Config, ReconnectConfig};
#[expect(
    clippy::module_name_repetitions,
    reason = "GatewayError includes the module name for clarity when used outside this module"
)]
pub use error::GatewayError;
pub use events::{ClientFrame, EventKind, GatewayEvent, ReadyPayload};
pub use session::{ConnectionState, GatewaySession};
pub use socket::GatewaySocket;
