use serde::{Deserialize, Serialize};

use crate::constants::{MAX_BRIGHTNESS, RELAY_PAGE};

/// One of the controller's two fixed dimmable outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelId {
    One,
    Two,
}

impl ChannelId {
    pub const ALL: [ChannelId; 2] = [ChannelId::One, ChannelId::Two];

    /// Number used by the `device` query parameter.
    pub fn number(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }

    /// Zero-based index, for fixed-size per-channel arrays.
    pub fn index(self) -> usize {
        usize::from(self.number() - 1)
    }
}

impl TryFrom<u8> for ChannelId {
    type Error = u8;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            other => Err(other),
        }
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// `ON`/`OFF` as spelled on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwitchState {
    #[serde(rename = "ON")]
    On,
    #[serde(rename = "OFF")]
    Off,
}

impl SwitchState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
        }
    }
}

impl From<bool> for SwitchState {
    fn from(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}

/// A "set channel to X" command sent as `GET /control`.
///
/// Commands are absolute, so dropping or repeating one is harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlCommand {
    pub channel: ChannelId,
    pub state: SwitchState,
    pub brightness: u8,
}

impl ControlCommand {
    pub fn on(channel: ChannelId, brightness: u8) -> Self {
        Self {
            channel,
            state: SwitchState::On,
            brightness: brightness.min(MAX_BRIGHTNESS),
        }
    }

    pub fn off(channel: ChannelId) -> Self {
        Self {
            channel,
            state: SwitchState::Off,
            brightness: 0,
        }
    }
}

/// Relay command published on the WebSocket.
///
/// Wire shape: `{"page":"device","value":{"name":…,"status":"ON","gpio":…}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayCommand {
    pub page: String,
    pub value: RelayCommandValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayCommandValue {
    pub name: String,
    pub status: SwitchState,
    pub gpio: String,
}

impl RelayCommand {
    pub fn new(name: impl Into<String>, gpio: impl Into<String>, energized: bool) -> Self {
        Self {
            page: RELAY_PAGE.to_string(),
            value: RelayCommandValue {
                name: name.into(),
                status: energized.into(),
                gpio: gpio.into(),
            },
        }
    }

    /// Serializes the command to the JSON text sent on the socket.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
