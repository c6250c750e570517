//! Loading and saving the broker configuration.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use devpanel_protocol::constants::{CONFIG_RELOAD_DELAY, SECRET_SENTINEL};
use devpanel_protocol::{
    ConfigWriteRequest, DeviceEndpoint, DeviceStatus, RemoteConfig, SaveResponse,
};

use crate::alert::AlertQueue;
use crate::error::SettingsError;
use crate::form::{ConfigForm, ValidationError};
use crate::messages::{Locale, Notice};

/// Abstract access to the device's configuration API.
///
/// Production uses [`HttpConfigTransport`]; tests substitute an in-memory
/// device.
pub trait ConfigTransport: Send + Sync {
    fn fetch_config(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<RemoteConfig, SettingsError>> + Send + '_>>;

    fn store_config(
        &self,
        request: ConfigWriteRequest,
    ) -> Pin<Box<dyn Future<Output = Result<SaveResponse, SettingsError>> + Send + '_>>;

    fn fetch_status(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<DeviceStatus, SettingsError>> + Send + '_>>;
}

/// JSON over HTTP against `/api/coreiot/*`.
pub struct HttpConfigTransport {
    http_client: reqwest::Client,
    endpoint: DeviceEndpoint,
}

impl HttpConfigTransport {
    pub fn new(http_client: reqwest::Client, endpoint: DeviceEndpoint) -> Self {
        Self {
            http_client,
            endpoint,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: reqwest::Url,
    ) -> Result<T, SettingsError> {
        let response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| SettingsError::Http(format!("GET {url}: {e}")))?;

        if !response.status().is_success() {
            return Err(SettingsError::Status(response.status().as_u16()));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SettingsError::Decode(format!("GET {url}: {e}")))
    }
}

impl ConfigTransport for HttpConfigTransport {
    fn fetch_config(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<RemoteConfig, SettingsError>> + Send + '_>> {
        Box::pin(self.get_json(self.endpoint.config_url()))
    }

    fn store_config(
        &self,
        request: ConfigWriteRequest,
    ) -> Pin<Box<dyn Future<Output = Result<SaveResponse, SettingsError>> + Send + '_>> {
        Box::pin(async move {
            let url = self.endpoint.config_url();
            let response = self
                .http_client
                .post(url.clone())
                .json(&request)
                .send()
                .await
                .map_err(|e| SettingsError::Http(format!("POST {url}: {e}")))?;

            // Rejections come back as JSON with a message, whatever the status.
            let status = response.status();
            response.json::<SaveResponse>().await.map_err(|e| {
                SettingsError::Decode(format!("POST {url} (status {status}): {e}"))
            })
        })
    }

    fn fetch_status(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<DeviceStatus, SettingsError>> + Send + '_>> {
        Box::pin(self.get_json(self.endpoint.status_url()))
    }
}

/// Result of [`ConfigSync::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Validation failed; nothing was sent.
    Invalid(ValidationError),
    /// The device accepted the configuration. Reload after the delay.
    Saved { reload_after: Duration },
    /// The device answered `success: false`.
    Rejected(Option<String>),
    /// No usable reply from the device.
    Unreachable,
}

/// Config load/save operations bound to one device.
///
/// Cheap to clone; clones share the transport. Each operation is also split
/// into its network half (`fetch`, `submit`) and its form/alert half
/// (`apply`, `prepare`, `finish_save`) so a caller can run the request on
/// another task and fold the reply in later.
#[derive(Clone)]
pub struct ConfigSync {
    transport: Arc<dyn ConfigTransport>,
    locale: Locale,
}

impl ConfigSync {
    pub fn new(transport: Arc<dyn ConfigTransport>, locale: Locale) -> Self {
        Self { transport, locale }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Fetches the device's configuration into `form`.
    ///
    /// On failure the form is left untouched and the error is only logged;
    /// it is returned so callers can tell the two apart.
    pub async fn load(&self, form: &mut ConfigForm) -> Result<(), SettingsError> {
        let remote = self.fetch().await?;
        self.apply(form, &remote);
        Ok(())
    }

    /// Reads the device's configuration. Failures are logged.
    pub async fn fetch(&self) -> Result<RemoteConfig, SettingsError> {
        self.transport.fetch_config().await.inspect_err(|e| {
            warn!(error = %e, "cannot load broker config");
        })
    }

    /// Copies a fetched configuration into `form`.
    pub fn apply(&self, form: &mut ConfigForm, remote: &RemoteConfig) {
        form.apply_remote(remote, &self.locale.text(Notice::SecretStored));
        info!(
            server = remote.server.as_deref().unwrap_or(""),
            password_set = remote.password_set,
            "broker config loaded"
        );
    }

    /// Validates and submits `form`, reporting the outcome in `alerts`.
    pub async fn save(&self, form: &ConfigForm, alerts: &mut AlertQueue) -> SaveOutcome {
        match self.prepare(form, alerts) {
            Ok(request) => {
                let reply = self.submit(request).await;
                self.finish_save(reply, alerts)
            }
            Err(e) => SaveOutcome::Invalid(e),
        }
    }

    /// Validates `form`. A rejected form gets a warning alert and must not be
    /// sent.
    pub fn prepare(
        &self,
        form: &ConfigForm,
        alerts: &mut AlertQueue,
    ) -> Result<ConfigWriteRequest, ValidationError> {
        form.validate().inspect_err(|e| {
            debug!(error = %e, "config form rejected before sending");
            let notice = match e {
                ValidationError::InvalidPort(_) => Notice::InvalidPort,
                ValidationError::MissingRequired(_) => Notice::MissingRequired,
            };
            alerts.warning(self.locale.text(notice));
        })
    }

    /// Posts a validated request to the device.
    pub async fn submit(&self, request: ConfigWriteRequest) -> Result<SaveResponse, SettingsError> {
        info!(
            server = %request.server,
            port = request.port,
            keep_secret = request.password == SECRET_SENTINEL,
            "saving broker config"
        );
        self.transport.store_config(request).await
    }

    /// Turns the device's reply into alerts and an outcome.
    pub fn finish_save(
        &self,
        reply: Result<SaveResponse, SettingsError>,
        alerts: &mut AlertQueue,
    ) -> SaveOutcome {
        match reply {
            Ok(SaveResponse { success: true, .. }) => {
                alerts.success(self.locale.text(Notice::Saved));
                SaveOutcome::Saved {
                    reload_after: CONFIG_RELOAD_DELAY,
                }
            }
            Ok(SaveResponse { message, .. }) => {
                warn!(message = message.as_deref().unwrap_or(""), "device rejected config");
                let shown = message.as_deref().unwrap_or("");
                alerts.error(self.locale.text(Notice::SaveRejected(shown)));
                SaveOutcome::Rejected(message)
            }
            Err(e) => {
                warn!(error = %e, "config save failed");
                alerts.error(self.locale.text(Notice::DeviceUnreachable));
                SaveOutcome::Unreachable
            }
        }
    }

    /// Current connectivity report from the device.
    pub async fn status(&self) -> Result<DeviceStatus, SettingsError> {
        self.transport.fetch_status().await.inspect_err(|e| {
            warn!(error = %e, "cannot fetch device status");
        })
    }
}
