//! Device endpoint derivation.
//!
//! The panel is given the device's base HTTP URL (the address the browser
//! page would be served from). Every other endpoint is derived from it: the
//! WebSocket upgrades the scheme (`http` → `ws`, `https` → `wss`) and the
//! HTTP APIs live on fixed paths of the same host.

use url::Url;

use crate::constants::{CONFIG_PATH, CONTROL_PATH, STATUS_PATH, WS_PATH};
use crate::device::ControlCommand;

/// Errors produced while parsing a device base URL.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("invalid device URL: {0}")]
    Parse(#[from] url::ParseError),

    #[error("unsupported scheme `{0}` (expected http or https)")]
    UnsupportedScheme(String),

    #[error("device URL has no host")]
    MissingHost,
}

/// Base address of a device and the endpoints derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEndpoint {
    base: Url,
}

impl DeviceEndpoint {
    /// Parses a base URL such as `http://192.168.4.1:8080`.
    ///
    /// A bare host (`192.168.4.1`) is accepted and treated as `http://`.
    pub fn parse(input: &str) -> Result<Self, EndpointError> {
        let trimmed = input.trim();
        let base = if trimmed.contains("://") {
            Url::parse(trimmed)?
        } else {
            Url::parse(&format!("http://{trimmed}"))?
        };

        match base.scheme() {
            "http" | "https" => {}
            other => return Err(EndpointError::UnsupportedScheme(other.to_string())),
        }
        if base.host_str().is_none_or(str::is_empty) {
            return Err(EndpointError::MissingHost);
        }

        Ok(Self { base })
    }

    /// The base URL as given (normalized).
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Whether the page scheme is secure (`https`).
    pub fn is_secure(&self) -> bool {
        self.base.scheme() == "https"
    }

    /// WebSocket URL on the same host: `ws://host[:port]/ws` or `wss://…`.
    pub fn websocket_url(&self) -> Url {
        let mut url = self.with_path(WS_PATH);
        let scheme = if self.is_secure() { "wss" } else { "ws" };
        // Infallible for http(s) base URLs: ws/wss are special schemes too.
        let _ = url.set_scheme(scheme);
        url
    }

    /// Control URL for one dimmable-output command.
    pub fn control_url(&self, cmd: &ControlCommand) -> Url {
        let mut url = self.with_path(CONTROL_PATH);
        url.query_pairs_mut()
            .append_pair("device", &cmd.channel.number().to_string())
            .append_pair("state", cmd.state.as_str())
            .append_pair("brightness", &cmd.brightness.to_string());
        url
    }

    /// Broker configuration endpoint (GET and POST).
    pub fn config_url(&self) -> Url {
        self.with_path(CONFIG_PATH)
    }

    /// Device connectivity status endpoint.
    pub fn status_url(&self) -> Url {
        self.with_path(STATUS_PATH)
    }

    fn with_path(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path(path);
        url.set_query(None);
        url.set_fragment(None);
        url
    }
}

impl std::fmt::Display for DeviceEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.base)
    }
}
