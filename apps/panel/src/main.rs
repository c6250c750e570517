//! devpanel entry point.

mod adapter;
mod app;
mod config;
mod console;
mod events;
mod message;
mod render;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use devpanel_actuators::{DimmerController, HttpControlTransport, RelayController};
use devpanel_connection::ConnectionManager;
use devpanel_settings::{ConfigSync, HttpConfigTransport};

use crate::adapter::ConnectionPublisher;
use crate::app::Panel;
use crate::config::PanelConfig;
use crate::render::ConsoleRenderer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = match std::env::args_os().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => config::default_path()?,
    };
    let config = PanelConfig::load_from(&config_path)?;

    // Logs go to stderr; stdout belongs to the panel.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path.display(),
        device = %config.device_url,
        "starting devpanel"
    );

    let endpoint = config.endpoint()?;
    let http_client = config.http_client()?;

    let mgr = Arc::new(ConnectionManager::new(
        endpoint.websocket_url().as_str(),
        config.reconnect_config(),
    ));
    let events = mgr
        .take_events()
        .await
        .context("connection events already taken")?;

    let dimmers = DimmerController::new(
        Arc::new(HttpControlTransport::new(
            http_client.clone(),
            endpoint.clone(),
        )),
        config.dispatch_policy(),
    );
    let relays = RelayController::new(
        Arc::new(ConnectionPublisher::new(mgr.clone())),
        config.publish_failure_policy(),
    );
    let sync = ConfigSync::new(
        Arc::new(HttpConfigTransport::new(http_client, endpoint)),
        config.locale,
    );

    let panel = Panel::new(
        dimmers,
        relays,
        sync,
        ConsoleRenderer::new(std::io::stdout()),
    );
    println!("{}", console::HELP);

    events::run(panel, mgr, events).await
}
