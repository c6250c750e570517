//! Drawing the panel.
//!
//! [`Renderer`] is what `update` talks to; [`ConsoleRenderer`] draws plain
//! text lines to any writer (stdout in the binary, a buffer in tests).

use std::io::Write;
use std::time::Duration;

use tracing::debug;

use devpanel_actuators::{DimmableChannel, Relay};
use devpanel_connection::ConnectionState;
use devpanel_protocol::DeviceStatus;
use devpanel_settings::{Alert, AlertKind, ConfigForm};
use devpanel_telemetry::{Gauge, TelemetryState};

pub trait Renderer {
    fn connection(&mut self, state: ConnectionState);
    fn reconnecting(&mut self, delay: Duration);
    fn gauge(&mut self, gauge: Gauge, telemetry: &TelemetryState);
    fn channel(&mut self, channel: &DimmableChannel);
    fn relays(&mut self, relays: &[Relay], pending_delete: Option<&Relay>);
    fn alert(&mut self, alert: &Alert);
    fn form(&mut self, form: &ConfigForm);
    fn status(&mut self, status: &DeviceStatus, telemetry: &TelemetryState);
    fn note(&mut self, text: &str);
}

const BAR_WIDTH: usize = 20;

pub struct ConsoleRenderer<W: Write> {
    out: W,
}

impl<W: Write> ConsoleRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{text}").and_then(|()| self.out.flush()) {
            debug!("render failed: {e}");
        }
    }
}

fn bar(fraction: f64) -> String {
    let filled = (fraction * BAR_WIDTH as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

fn gauge_line(gauge: Gauge, telemetry: &TelemetryState) -> String {
    let spec = gauge.spec();
    let Some(value) = telemetry.latest(gauge) else {
        return format!("{gauge:<12} --");
    };
    let mut text = format!(
        "{gauge:<12} {value:>6.1} {unit:<2} {bar}",
        unit = spec.unit,
        bar = bar(spec.fraction(value)),
    );
    if let Some((lo, hi)) = telemetry.history(gauge).min_max() {
        text.push_str(&format!("  min {lo:.1} max {hi:.1}"));
    }
    text
}

impl<W: Write> Renderer for ConsoleRenderer<W> {
    fn connection(&mut self, state: ConnectionState) {
        let label = match state {
            ConnectionState::Closed => "disconnected",
            ConnectionState::Connecting => "connecting...",
            ConnectionState::Open => "connected",
        };
        self.line(&format!("* device {label}"));
    }

    fn reconnecting(&mut self, delay: Duration) {
        self.line(&format!("* reconnecting in {} ms", delay.as_millis()));
    }

    fn gauge(&mut self, gauge: Gauge, telemetry: &TelemetryState) {
        self.line(&gauge_line(gauge, telemetry));
    }

    fn channel(&mut self, channel: &DimmableChannel) {
        let state = if channel.is_enabled() { "ON " } else { "OFF" };
        let slider = if channel.slider_enabled() {
            format!("{}%", channel.brightness())
        } else {
            format!("({}%, locked)", channel.brightness())
        };
        self.line(&format!("led {} {state} {slider}", channel.id()));
    }

    fn relays(&mut self, relays: &[Relay], pending_delete: Option<&Relay>) {
        if relays.is_empty() {
            self.line("no relays");
        }
        for (i, relay) in relays.iter().enumerate() {
            let state = if relay.energized { "ON " } else { "OFF" };
            self.line(&format!(
                "{:>2}. {state} {} (GPIO {})",
                i + 1,
                relay.name,
                relay.gpio
            ));
        }
        if let Some(relay) = pending_delete {
            self.line(&format!(
                "delete \"{}\"? relay confirm | relay cancel",
                relay.name
            ));
        }
    }

    fn alert(&mut self, alert: &Alert) {
        let tag = match alert.kind {
            AlertKind::Success => "ok",
            AlertKind::Error => "error",
            AlertKind::Warning => "warning",
            AlertKind::Info => "info",
        };
        self.line(&format!("[{tag}] {}", alert.text));
    }

    fn form(&mut self, form: &ConfigForm) {
        let secret = if !form.secret.is_empty() {
            "********".to_string()
        } else {
            form.secret_placeholder.clone().unwrap_or_default()
        };
        let wifi_password = if form.wifi_password.is_empty() { "" } else { "********" };
        self.line(&format!("ssid           {}", form.ssid));
        self.line(&format!("wifi_password  {wifi_password}"));
        self.line(&format!("server         {}", form.server));
        self.line(&format!("port           {}", form.port));
        self.line(&format!("client_id      {}", form.client_id));
        self.line(&format!("username       {}", form.username));
        self.line(&format!("secret         {secret}"));
    }

    fn status(&mut self, status: &DeviceStatus, telemetry: &TelemetryState) {
        let yes_no = |b: bool| if b { "yes" } else { "no" };
        self.line(&format!(
            "wifi {} ({} {})",
            yes_no(status.wifi_connected),
            status.wifi_ssid,
            status.wifi_ip
        ));
        self.line(&format!(
            "mqtt {} ({}:{} as {}/{})",
            yes_no(status.mqtt_connected),
            status.server,
            status.port,
            status.client_id,
            status.username
        ));
        for gauge in Gauge::ALL {
            self.line(&gauge_line(gauge, telemetry));
        }
        if telemetry.is_stale() {
            self.line("telemetry is stale");
        }
    }

    fn note(&mut self, text: &str) {
        self.line(text);
    }
}

#[cfg(test)]
mod tests {
    use devpanel_protocol::ChannelId;
    use devpanel_telemetry::TelemetrySink;

    use super::*;

    fn rendered(f: impl FnOnce(&mut ConsoleRenderer<Vec<u8>>)) -> String {
        let mut r = ConsoleRenderer::new(Vec::new());
        f(&mut r);
        String::from_utf8(r.into_inner()).unwrap()
    }

    #[test]
    fn bar_fills_proportionally() {
        assert_eq!(bar(0.0), format!("[{}]", ".".repeat(20)));
        assert_eq!(bar(0.5), format!("[{}{}]", "#".repeat(10), ".".repeat(10)));
        assert_eq!(bar(1.0), format!("[{}]", "#".repeat(20)));
    }

    #[test]
    fn gauge_without_reading() {
        let telemetry = TelemetryState::new();
        let out = rendered(|r| r.gauge(Gauge::Humidity, &telemetry));
        assert_eq!(out, "humidity     --\n");
    }

    #[test]
    fn gauge_with_history() {
        let mut telemetry = TelemetryState::new();
        telemetry.refresh(Gauge::Temperature, 20.0);
        telemetry.refresh(Gauge::Temperature, 25.0);

        let out = rendered(|r| r.gauge(Gauge::Temperature, &telemetry));

        assert!(out.starts_with("temperature    25.0 °C"));
        assert!(out.contains("min 20.0 max 25.0"));
    }

    #[test]
    fn locked_slider_is_marked() {
        let out = rendered(|r| r.channel(&DimmableChannel::new(ChannelId::One)));
        assert_eq!(out, "led 1 OFF (50%, locked)\n");
    }

    #[test]
    fn form_masks_secrets() {
        let form = ConfigForm {
            wifi_password: "hunter2".into(),
            secret: "abc".into(),
            ..Default::default()
        };
        let out = rendered(|r| r.form(&form));
        assert!(!out.contains("hunter2"));
        assert!(!out.contains("abc"));
    }

    #[test]
    fn form_shows_stored_secret_hint() {
        let form = ConfigForm {
            secret_placeholder: Some("Secret already stored (leave blank to keep)".into()),
            ..Default::default()
        };
        let out = rendered(|r| r.form(&form));
        assert!(out.contains("secret         Secret already stored"));
    }
}
