//! Panel state and its update function.

use devpanel_actuators::{DimmerController, RelayController, RelayError, RelayId, ToggleOutcome};
use devpanel_connection::{ConnectionEvent, ConnectionState};
use devpanel_settings::{AlertQueue, ConfigForm, ConfigSync, Locale, Notice, SaveOutcome};
use devpanel_telemetry::{Gauge, MessageRouter, RouteOutcome, TelemetryState};

use crate::console::HELP;
use crate::message::{Message, Task, UiEvent};
use crate::render::Renderer;

/// Everything the panel shows and controls.
pub struct Panel<R: Renderer> {
    router: MessageRouter,
    telemetry: TelemetryState,
    dimmers: DimmerController,
    relays: RelayController,
    sync: ConfigSync,
    form: ConfigForm,
    alerts: AlertQueue,
    connection: ConnectionState,
    renderer: R,
}

impl<R: Renderer> Panel<R> {
    pub fn new(
        dimmers: DimmerController,
        relays: RelayController,
        sync: ConfigSync,
        renderer: R,
    ) -> Self {
        Self {
            router: MessageRouter::new(),
            telemetry: TelemetryState::new(),
            dimmers,
            relays,
            sync,
            form: ConfigForm::default(),
            alerts: AlertQueue::new(),
            connection: ConnectionState::Closed,
            renderer,
        }
    }

    fn locale(&self) -> Locale {
        self.sync.locale()
    }

    /// Shows a line the console could not parse.
    pub fn reject_input(&mut self, reason: &str) {
        self.renderer.note(reason);
    }

    /// Applies one message. Requests to the config API are never awaited
    /// here; they come back as a [`Task::Perform`] whose reply is fed in as
    /// a later message.
    pub async fn update(&mut self, message: Message) -> Task {
        let task = match message {
            Message::Connection(event) => {
                self.on_connection(event);
                Task::None
            }
            Message::Ui(event) => self.on_ui(event).await,
            Message::ReloadConfig => self.load_config(),
            Message::ConfigLoaded(reply) => {
                if let Ok(remote) = reply {
                    self.sync.apply(&mut self.form, &remote);
                    self.renderer.form(&self.form);
                }
                Task::None
            }
            Message::ConfigSaved(reply) => match self.sync.finish_save(reply, &mut self.alerts) {
                SaveOutcome::Saved { reload_after } => Task::ReloadAfter(reload_after),
                _ => Task::None,
            },
            Message::StatusFetched(reply) => {
                match reply {
                    Ok(status) => {
                        self.renderer.connection(self.connection);
                        self.renderer.status(&status, &self.telemetry);
                    }
                    Err(_) => {
                        let text = self.locale().text(Notice::DeviceUnreachable);
                        self.alerts.error(text);
                    }
                }
                Task::None
            }
        };

        for alert in self.alerts.drain() {
            self.renderer.alert(&alert);
        }
        task
    }

    fn on_connection(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::StateChanged(state) => {
                self.connection = state;
                self.renderer.connection(state);
            }
            ConnectionEvent::ReconnectScheduled { delay } => {
                self.renderer.reconnecting(delay);
            }
            ConnectionEvent::Frame(text) => {
                if let RouteOutcome::Telemetry {
                    temperature,
                    humidity,
                } = self.router.route(&mut self.telemetry, &text)
                {
                    if temperature {
                        self.renderer.gauge(Gauge::Temperature, &self.telemetry);
                    }
                    if humidity {
                        self.renderer.gauge(Gauge::Humidity, &self.telemetry);
                    }
                }
            }
        }
    }

    async fn on_ui(&mut self, event: UiEvent) -> Task {
        match event {
            UiEvent::LedSwitch { channel, on } => {
                let state = self.dimmers.set_enabled(channel, on);
                self.renderer.channel(state);
            }
            UiEvent::LedBrightness { channel, value } => {
                if !self.dimmers.set_brightness(channel, value) {
                    self.renderer
                        .note(&format!("led {channel} is off, turn it on first"));
                }
                self.renderer.channel(self.dimmers.channel(channel));
            }

            UiEvent::RelayAdd { name, gpio } => {
                match self.relays.registry_mut().add(&name, &gpio) {
                    Ok(_) => self.render_relays(),
                    Err(e) => {
                        tracing::debug!(error = %e, "relay not added");
                        let text = self.locale().text(Notice::RelayFieldsMissing);
                        self.alerts.warning(text);
                    }
                }
            }
            UiEvent::RelayToggle(position) => {
                if let Some(id) = self.relay_at(position) {
                    match self.relays.toggle(id).await {
                        Ok(ToggleOutcome::Published(_)) => {}
                        Ok(ToggleOutcome::Unsent(_)) => {
                            self.renderer.note("device offline, relay changed locally");
                        }
                        Ok(ToggleOutcome::Reverted(_)) => {
                            self.renderer.note("device offline, relay left unchanged");
                        }
                        Err(e) => tracing::warn!(error = %e, "relay toggle failed"),
                    }
                    self.render_relays();
                }
            }
            UiEvent::RelayDelete(position) => {
                if let Some(id) = self.relay_at(position) {
                    if let Err(e) = self.relays.registry_mut().request_delete(id) {
                        tracing::warn!(error = %e, "delete request failed");
                    }
                    self.render_relays();
                }
            }
            UiEvent::RelayConfirmDelete => match self.relays.registry_mut().confirm_delete() {
                Ok(_) => self.render_relays(),
                Err(RelayError::NoPendingDelete) => self.renderer.note("nothing to delete"),
                Err(e) => tracing::warn!(error = %e, "delete failed"),
            },
            UiEvent::RelayCancelDelete => {
                self.relays.registry_mut().cancel_delete();
                self.render_relays();
            }
            UiEvent::RelayList => self.render_relays(),

            UiEvent::ConfigShow => self.renderer.form(&self.form),
            UiEvent::ConfigLoad => return self.load_config(),
            UiEvent::ConfigSet { field, value } => {
                self.form.set(field, value);
            }
            UiEvent::ConfigSave => {
                if let Ok(request) = self.sync.prepare(&self.form, &mut self.alerts) {
                    let sync = self.sync.clone();
                    return Task::perform(async move {
                        Message::ConfigSaved(sync.submit(request).await)
                    });
                }
            }

            UiEvent::Status => {
                let sync = self.sync.clone();
                return Task::perform(async move { Message::StatusFetched(sync.status().await) });
            }
            UiEvent::Help => self.renderer.note(HELP),
            UiEvent::Quit => return Task::Quit,
        }
        Task::None
    }

    /// Looks up a 1-based list position, alerting when it is out of range.
    fn relay_at(&mut self, position: usize) -> Option<RelayId> {
        let id = position
            .checked_sub(1)
            .and_then(|i| self.relays.registry().id_at(i));
        if id.is_none() {
            let text = self.locale().text(Notice::UnknownRelay(position));
            self.alerts.warning(text);
        }
        id
    }

    fn render_relays(&mut self) {
        let registry = self.relays.registry();
        self.renderer
            .relays(registry.relays(), registry.pending_delete());
    }

    fn load_config(&self) -> Task {
        let sync = self.sync.clone();
        Task::perform(async move { Message::ConfigLoaded(sync.fetch().await) })
    }

    /// Lets the dimmer workers deliver their last commands.
    pub async fn shutdown(self) {
        self.dimmers.shutdown().await;
    }
}
