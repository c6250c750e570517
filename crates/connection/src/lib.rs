//! Device connection manager.
//!
//! Owns the single WebSocket to the controller: open/close state machine,
//! read/write/ping pumps, and a deduplicated reconnect after a fixed delay.

pub mod manager;
mod pumps;
pub(crate) mod reconnection;
pub mod types;
pub mod ws_client;

pub use manager::ConnectionManager;
pub use types::{ConnectionEvent, ConnectionState, ReconnectConfig};
pub use ws_client::{WsClient, WsError};
