//! Panel message types.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use devpanel_connection::ConnectionEvent;
use devpanel_protocol::{ChannelId, DeviceStatus, RemoteConfig, SaveResponse};
use devpanel_settings::{ConfigField, SettingsError};

/// A user intent, independent of how it was entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    // -- Dimmable outputs --
    LedSwitch { channel: ChannelId, on: bool },
    LedBrightness { channel: ChannelId, value: u8 },

    // -- Relays (1-based positions as listed) --
    RelayAdd { name: String, gpio: String },
    RelayToggle(usize),
    RelayDelete(usize),
    RelayConfirmDelete,
    RelayCancelDelete,
    RelayList,

    // -- Broker configuration --
    ConfigShow,
    ConfigLoad,
    ConfigSave,
    ConfigSet { field: ConfigField, value: String },

    Status,
    Help,
    Quit,
}

/// Everything the panel's `update` handles.
#[derive(Debug)]
pub enum Message {
    Ui(UiEvent),
    /// An event from the connection manager.
    Connection(ConnectionEvent),
    /// The post-save reload timer fired.
    ReloadConfig,

    // -- Device replies, delivered by a `Task::Perform` --
    ConfigLoaded(Result<RemoteConfig, SettingsError>),
    ConfigSaved(Result<SaveResponse, SettingsError>),
    StatusFetched(Result<DeviceStatus, SettingsError>),
}

/// Work that runs off the event loop and reports back as a message.
pub type Job = Pin<Box<dyn Future<Output = Message> + Send>>;

/// Follow-up work requested by `update`, carried out by the event loop.
pub enum Task {
    None,
    /// Deliver [`Message::ReloadConfig`] after the delay.
    ReloadAfter(Duration),
    /// Run the job on its own task and feed its message back to `update`.
    Perform(Job),
    Quit,
}

impl Task {
    pub fn perform(job: impl Future<Output = Message> + Send + 'static) -> Self {
        Task::Perform(Box::pin(job))
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::None => f.write_str("None"),
            Task::ReloadAfter(delay) => f.debug_tuple("ReloadAfter").field(delay).finish(),
            Task::Perform(_) => f.write_str("Perform(..)"),
            Task::Quit => f.write_str("Quit"),
        }
    }
}
