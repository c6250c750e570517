//! The broker configuration form as the user edits it.

use std::str::FromStr;

use devpanel_protocol::{BrokerSecret, ConfigWriteRequest, RemoteConfig};

/// Why a form cannot be submitted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("port must be an integer in 1..=65535, got {0:?}")]
    InvalidPort(String),

    #[error("missing required field: {0}")]
    MissingRequired(&'static str),
}

/// An editable form field, as named on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    Ssid,
    WifiPassword,
    Server,
    Port,
    ClientId,
    Username,
    Secret,
}

impl FromStr for ConfigField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ssid" => Ok(Self::Ssid),
            "wifi_password" => Ok(Self::WifiPassword),
            "server" => Ok(Self::Server),
            "port" => Ok(Self::Port),
            "client_id" => Ok(Self::ClientId),
            "username" => Ok(Self::Username),
            "secret" => Ok(Self::Secret),
            other => Err(format!("unknown config field: {other}")),
        }
    }
}

/// Raw text inputs of the configuration form.
///
/// The broker secret input is never filled from the device; only its
/// placeholder tells the user a secret is already stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigForm {
    pub ssid: String,
    /// Collected with the network name; the device takes it through its own
    /// provisioning page, so it is not part of the broker request.
    pub wifi_password: String,
    pub server: String,
    pub port: String,
    pub client_id: String,
    pub username: String,
    pub secret: String,
    pub secret_placeholder: Option<String>,
}

impl ConfigForm {
    pub fn set(&mut self, field: ConfigField, value: impl Into<String>) {
        let value = value.into();
        match field {
            ConfigField::Ssid => self.ssid = value,
            ConfigField::WifiPassword => self.wifi_password = value,
            ConfigField::Server => self.server = value,
            ConfigField::Port => self.port = value,
            ConfigField::ClientId => self.client_id = value,
            ConfigField::Username => self.username = value,
            ConfigField::Secret => self.secret = value,
        }
    }

    /// Copies the device's reported values into the form.
    ///
    /// Empty strings and a zero port leave the current input alone.
    pub fn apply_remote(&mut self, remote: &RemoteConfig, stored_secret_hint: &str) {
        fn fill(target: &mut String, value: Option<&String>) {
            if let Some(v) = value.filter(|v| !v.is_empty()) {
                target.clone_from(v);
            }
        }

        fill(&mut self.server, remote.server.as_ref());
        if let Some(port) = remote.port.filter(|p| *p != 0) {
            self.port = port.to_string();
        }
        fill(&mut self.client_id, remote.client_id.as_ref());
        fill(&mut self.username, remote.username.as_ref());

        if remote.password_set {
            self.secret_placeholder = Some(stored_secret_hint.to_string());
        }
    }

    /// Checks the port, then the required fields, and builds the request.
    pub fn validate(&self) -> Result<ConfigWriteRequest, ValidationError> {
        let port = parse_port(&self.port)?;

        let server = required(&self.server, "server")?;
        let client_id = required(&self.client_id, "client_id")?;
        let username = required(&self.username, "username")?;

        Ok(ConfigWriteRequest {
            ssid: self.ssid.trim().to_string(),
            password: BrokerSecret::from_input(&self.secret).wire_value().to_string(),
            server,
            port,
            client_id,
            username,
        })
    }
}

fn parse_port(input: &str) -> Result<u16, ValidationError> {
    let trimmed = input.trim();
    trimmed
        .parse::<u16>()
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| ValidationError::InvalidPort(trimmed.to_string()))
}

fn required(input: &str, name: &'static str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingRequired(name));
    }
    Ok(trimmed.to_string())
}
