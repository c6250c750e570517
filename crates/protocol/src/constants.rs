use std::time::Duration;

/// Path of the device's WebSocket endpoint.
pub const WS_PATH: &str = "/ws";

/// Path of the dimmable-output control endpoint.
pub const CONTROL_PATH: &str = "/control";

/// Path of the broker configuration endpoint (GET reads, POST writes).
pub const CONFIG_PATH: &str = "/api/coreiot/config";

/// Path of the device connectivity status endpoint.
pub const STATUS_PATH: &str = "/api/coreiot/status";

/// Secret value meaning "keep the secret already stored on the device".
///
/// The firmware treats both this value and an empty string as "unchanged".
pub const SECRET_SENTINEL: &str = "***";

/// Delay before reopening the WebSocket after a close or failed attempt.
pub const RECONNECT_DELAY: Duration = Duration::from_millis(2000);

/// Delay before re-reading the configuration after a successful save.
///
/// Gives the device time to persist the file and restart its MQTT client.
pub const CONFIG_RELOAD_DELAY: Duration = Duration::from_millis(500);

/// How often the client pings the device.
pub const WS_PING_PERIOD: Duration = Duration::from_secs(20);

/// Read deadline: if nothing arrives within this window the connection is
/// considered dead.
pub const WS_PONG_WAIT: Duration = Duration::from_secs(60);

/// Largest inbound text frame accepted (64 KiB).
///
/// Telemetry frames from the controller are a few dozen bytes.
pub const WS_MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Value of the `page` field in outbound relay commands.
pub const RELAY_PAGE: &str = "device";

/// Highest brightness accepted by the control endpoint.
pub const MAX_BRIGHTNESS: u8 = 100;
