//! Error types for configuration sync.

/// Errors from talking to the device's configuration API.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("device returned status {0}")]
    Status(u16),

    #[error("unexpected reply: {0}")]
    Decode(String),
}
