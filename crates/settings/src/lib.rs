//! Broker configuration sync between the panel and the device.
//!
//! Loads the device's current broker settings into an editable
//! [`ConfigForm`], validates and saves it back, and reports the outcome as
//! localized alerts in an [`AlertQueue`]. The device never reveals the stored
//! broker secret; a blank secret input is sent as the keep-existing sentinel.

pub mod alert;
pub mod error;
pub mod form;
pub mod messages;
pub mod sync;

// Re-export primary types for convenience.
pub use alert::{Alert, AlertKind, AlertQueue};
pub use error::SettingsError;
pub use form::{ConfigField, ConfigForm, ValidationError};
pub use messages::{Locale, Notice};
pub use sync::{ConfigSync, ConfigTransport, HttpConfigTransport, SaveOutcome};
