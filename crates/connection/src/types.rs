//! Public types for the device connection manager.

use std::time::Duration;

use devpanel_protocol::constants::RECONNECT_DELAY;

/// Lifecycle state of the device WebSocket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket. A reconnect may be pending.
    #[default]
    Closed,
    /// WebSocket handshake in progress.
    Connecting,
    /// Socket open; `send` is accepted.
    Open,
}

/// Events emitted by the connection manager.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// The connection state changed.
    StateChanged(ConnectionState),
    /// A text frame arrived from the device.
    Frame(String),
    /// A reconnect attempt was scheduled after `delay`.
    ReconnectScheduled { delay: Duration },
}

/// Reconnection policy: a fixed delay, no backoff.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay between a close event and the next open attempt.
    pub delay: Duration,
    /// When false, a closed connection stays closed until `open()`.
    pub enabled: bool,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            delay: RECONNECT_DELAY,
            enabled: true,
        }
    }
}

impl ReconnectConfig {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_is_closed() {
        assert_eq!(ConnectionState::default(), ConnectionState::Closed);
    }

    #[test]
    fn reconnect_config_defaults() {
        let config = ReconnectConfig::default();
        assert_eq!(config.delay, Duration::from_millis(2000));
        assert!(config.enabled);
    }

    #[test]
    fn reconnect_config_with_delay() {
        let config = ReconnectConfig::with_delay(Duration::from_millis(50));
        assert_eq!(config.delay, Duration::from_millis(50));
        assert!(config.enabled);
    }
}
