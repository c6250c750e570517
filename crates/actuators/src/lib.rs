//! Actuator control for the panel: dimmable outputs and switched relays.
//!
//! This crate holds the **business logic** only. Dimmable channels talk to
//! the device through a [`ControlTransport`] (plain HTTP in production), and
//! relay commands leave through a [`RelayPublisher`] that the app implements
//! over the WebSocket connection manager.
//!
//! # Operations
//!
//! - **Dimmers**: enable, disable and set brightness on channels 1 and 2,
//!   one serialized and coalescing worker per channel
//! - **Relays**: add, toggle, and two-step delete on an in-memory registry

pub mod dimmer;
pub mod error;
pub mod relay;
pub mod transport;

// Re-export primary types for convenience.
pub use dimmer::{DEFAULT_BRIGHTNESS, DimmableChannel, DimmerController, DispatchPolicy};
pub use error::{ActuatorError, RelayError};
pub use relay::{
    PublishFailurePolicy, Relay, RelayController, RelayId, RelayPublisher, RelayRegistry,
    ToggleOutcome,
};
pub use transport::{ControlTransport, HttpControlTransport};
