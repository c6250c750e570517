//! Error types for actuator operations.

use crate::relay::RelayId;

/// Errors from talking to the device.
#[derive(Debug, thiserror::Error)]
pub enum ActuatorError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("device returned status {0}")]
    Status(u16),

    #[error("publish failed: {0}")]
    Publish(String),
}

/// Errors from relay registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("no relay with id {0}")]
    NotFound(RelayId),

    #[error("no delete pending")]
    NoPendingDelete,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
