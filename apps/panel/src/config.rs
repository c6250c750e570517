//! Panel configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/devpanel/panel.toml`
//! - Windows: `%APPDATA%/devpanel/panel.toml`
//!
//! A path given on the command line replaces the default location.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use devpanel_actuators::{DispatchPolicy, PublishFailurePolicy};
use devpanel_connection::ReconnectConfig;
use devpanel_protocol::DeviceEndpoint;
use devpanel_settings::Locale;

/// What to do with a relay whose toggle could not be published.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayFailureMode {
    #[default]
    KeepLocal,
    Revert,
}

impl From<RelayFailureMode> for PublishFailurePolicy {
    fn from(mode: RelayFailureMode) -> Self {
        match mode {
            RelayFailureMode::KeepLocal => PublishFailurePolicy::KeepLocal,
            RelayFailureMode::Revert => PublishFailurePolicy::Revert,
        }
    }
}

/// Panel configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Base URL of the controller's web server.
    #[serde(default = "default_device_url")]
    pub device_url: String,

    /// Delay before reopening a closed WebSocket.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    #[serde(default)]
    pub relay_publish_failure: RelayFailureMode,

    /// Attempts per dimmer command; 1 sends once and forgets.
    #[serde(default = "default_dimmer_max_attempts")]
    pub dimmer_max_attempts: u32,

    #[serde(default = "default_dimmer_retry_delay_ms")]
    pub dimmer_retry_delay_ms: u64,

    /// Give up on an HTTP connection that is not established by then.
    #[serde(default = "default_http_connect_timeout_ms")]
    pub http_connect_timeout_ms: u64,

    /// Whole-request limit for `/control` and `/api/coreiot/*` calls.
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,

    /// Language of alerts and placeholders.
    #[serde(default)]
    pub locale: Locale,

    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_device_url() -> String {
    "http://192.168.4.1".into()
}

fn default_reconnect_delay_ms() -> u64 {
    2000
}

fn default_dimmer_max_attempts() -> u32 {
    1
}

fn default_dimmer_retry_delay_ms() -> u64 {
    250
}

fn default_http_connect_timeout_ms() -> u64 {
    5000
}

fn default_http_timeout_ms() -> u64 {
    10_000
}

fn default_log_filter() -> String {
    "info,devpanel=debug".into()
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            device_url: default_device_url(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            relay_publish_failure: RelayFailureMode::default(),
            dimmer_max_attempts: default_dimmer_max_attempts(),
            dimmer_retry_delay_ms: default_dimmer_retry_delay_ms(),
            http_connect_timeout_ms: default_http_connect_timeout_ms(),
            http_timeout_ms: default_http_timeout_ms(),
            locale: Locale::default(),
            log_filter: default_log_filter(),
        }
    }
}

impl PanelConfig {
    /// Loads configuration from `path`, writing the defaults there if the
    /// file does not exist yet.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let config: PanelConfig = toml::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?;
            Ok(config)
        } else {
            let config = PanelConfig::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Saves the configuration to `path`.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn endpoint(&self) -> anyhow::Result<DeviceEndpoint> {
        DeviceEndpoint::parse(&self.device_url)
            .with_context(|| format!("invalid device_url {:?}", self.device_url))
    }

    /// HTTP client shared by the dimmer and config transports.
    pub fn http_client(&self) -> anyhow::Result<reqwest::Client> {
        reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(self.http_connect_timeout_ms))
            .timeout(Duration::from_millis(self.http_timeout_ms))
            .build()
            .context("building HTTP client")
    }

    pub fn reconnect_config(&self) -> ReconnectConfig {
        ReconnectConfig::with_delay(Duration::from_millis(self.reconnect_delay_ms))
    }

    pub fn dispatch_policy(&self) -> DispatchPolicy {
        DispatchPolicy {
            max_attempts: self.dimmer_max_attempts.max(1),
            retry_delay: Duration::from_millis(self.dimmer_retry_delay_ms),
        }
    }

    pub fn publish_failure_policy(&self) -> PublishFailurePolicy {
        self.relay_publish_failure.into()
    }
}

/// Returns the platform-specific configuration file path.
pub fn default_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let appdata = std::env::var("APPDATA").context("APPDATA is not set")?;
        Ok(PathBuf::from(appdata).join("devpanel").join("panel.toml"))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("devpanel")
            .join("panel.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PanelConfig::default();
        assert_eq!(config.device_url, "http://192.168.4.1");
        assert_eq!(config.reconnect_config().delay, Duration::from_millis(2000));
        assert_eq!(config.dispatch_policy(), DispatchPolicy::default());
        assert_eq!(config.publish_failure_policy(), PublishFailurePolicy::KeepLocal);
        assert_eq!(config.locale, Locale::En);
        assert_eq!(config.http_connect_timeout_ms, 5000);
        assert_eq!(config.http_timeout_ms, 10_000);
    }

    #[tokio::test]
    async fn http_client_gives_up_on_silent_device() {
        // Accepts the connection, never replies.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _held = tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                open.push(stream);
            }
        });
        let config = PanelConfig {
            http_timeout_ms: 200,
            ..Default::default()
        };
        let client = config.http_client().unwrap();

        let err = tokio::time::timeout(
            Duration::from_secs(5),
            client.get(format!("http://{addr}/api/coreiot/status")).send(),
        )
        .await
        .expect("request outlived its timeout")
        .unwrap_err();

        assert!(err.is_timeout());
    }

    #[test]
    fn missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("panel.toml");

        let config = PanelConfig::load_from(&path).unwrap();

        assert_eq!(config, PanelConfig::default());
        assert!(path.exists());
        assert_eq!(PanelConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panel.toml");
        std::fs::write(
            &path,
            "device_url = \"https://panel.local\"\nrelay_publish_failure = \"revert\"\nlocale = \"vi\"\n",
        )
        .unwrap();

        let config = PanelConfig::load_from(&path).unwrap();

        assert_eq!(config.device_url, "https://panel.local");
        assert_eq!(config.publish_failure_policy(), PublishFailurePolicy::Revert);
        assert_eq!(config.locale, Locale::Vi);
        assert_eq!(config.reconnect_delay_ms, 2000);
        assert_eq!(
            config.endpoint().unwrap().websocket_url().as_str(),
            "wss://panel.local/ws"
        );
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panel.toml");
        std::fs::write(&path, "reconnect_delay_ms = \"soon\"").unwrap();

        assert!(PanelConfig::load_from(&path).is_err());
    }

    #[test]
    fn zero_attempts_still_sends_once() {
        let config = PanelConfig {
            dimmer_max_attempts: 0,
            ..Default::default()
        };
        assert_eq!(config.dispatch_policy().max_attempts, 1);
    }

    #[test]
    fn default_path_ends_with_panel_toml() {
        let path = default_path().unwrap();
        assert!(path.ends_with("devpanel/panel.toml") || path.ends_with("devpanel\\panel.toml"));
    }
}
