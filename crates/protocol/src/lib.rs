pub mod config;
pub mod constants;
pub mod device;
pub mod endpoint;
pub mod telemetry;

// Re-export primary types for convenience.
pub use config::{BrokerSecret, ConfigWriteRequest, DeviceStatus, RemoteConfig, SaveResponse};
pub use device::{ChannelId, ControlCommand, RelayCommand, SwitchState};
pub use endpoint::{DeviceEndpoint, EndpointError};
pub use telemetry::{FrameError, TelemetryFrame};
