//! Dimmable output channels.
//!
//! [`DimmableChannel`] is the pure per-channel state (toggle + slider).
//! [`DimmerController`] owns both channels and one worker task per channel.
//! Each worker reads the latest requested command from a `watch` slot, so
//! commands for one channel reach the device in order and intermediate
//! slider values that were superseded before dispatch are skipped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use devpanel_protocol::constants::MAX_BRIGHTNESS;
use devpanel_protocol::{ChannelId, ControlCommand};

use crate::transport::ControlTransport;

/// Brightness the slider starts at before the user touches it.
pub const DEFAULT_BRIGHTNESS: u8 = 50;

/// State of one dimmable output as shown on the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimmableChannel {
    id: ChannelId,
    enabled: bool,
    brightness: u8,
}

impl DimmableChannel {
    pub fn new(id: ChannelId) -> Self {
        Self {
            id,
            enabled: false,
            brightness: DEFAULT_BRIGHTNESS,
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Current slider value. Kept while the channel is off.
    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    /// The slider only accepts input while the channel is on.
    pub fn slider_enabled(&self) -> bool {
        self.enabled
    }

    /// Switches the channel and returns the command to send.
    ///
    /// On sends the current slider value; off always sends brightness 0.
    pub fn set_enabled(&mut self, enabled: bool) -> ControlCommand {
        self.enabled = enabled;
        if enabled {
            ControlCommand::on(self.id, self.brightness)
        } else {
            ControlCommand::off(self.id)
        }
    }

    /// Moves the slider. Returns `None` while the channel is off.
    pub fn set_brightness(&mut self, value: u8) -> Option<ControlCommand> {
        if !self.enabled {
            return None;
        }
        self.brightness = value.min(MAX_BRIGHTNESS);
        Some(ControlCommand::on(self.id, self.brightness))
    }
}

/// How a channel worker delivers one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchPolicy {
    /// Total attempts per command; 1 means fire-and-forget.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub retry_delay: Duration,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            retry_delay: Duration::from_millis(250),
        }
    }
}

struct ChannelWorker {
    slot: watch::Sender<Option<ControlCommand>>,
    handle: JoinHandle<()>,
}

/// Owns both dimmable channels and their dispatch workers.
///
/// Must be created inside a Tokio runtime.
pub struct DimmerController {
    channels: [DimmableChannel; 2],
    workers: [ChannelWorker; 2],
}

impl DimmerController {
    pub fn new(transport: Arc<dyn ControlTransport>, policy: DispatchPolicy) -> Self {
        let channels = ChannelId::ALL.map(DimmableChannel::new);
        let workers = ChannelId::ALL.map(|id| {
            let (slot, rx) = watch::channel(None);
            let handle = tokio::spawn(channel_worker(id, rx, transport.clone(), policy));
            ChannelWorker { slot, handle }
        });
        Self { channels, workers }
    }

    pub fn channel(&self, id: ChannelId) -> &DimmableChannel {
        &self.channels[id.index()]
    }

    pub fn channels(&self) -> &[DimmableChannel] {
        &self.channels
    }

    /// Turns a channel on or off and queues the matching command.
    pub fn set_enabled(&mut self, id: ChannelId, enabled: bool) -> &DimmableChannel {
        let cmd = self.channels[id.index()].set_enabled(enabled);
        self.submit(cmd);
        &self.channels[id.index()]
    }

    /// Moves a channel's slider. Returns whether a command was queued.
    pub fn set_brightness(&mut self, id: ChannelId, value: u8) -> bool {
        match self.channels[id.index()].set_brightness(value) {
            Some(cmd) => {
                self.submit(cmd);
                true
            }
            None => {
                debug!(channel = %id, "brightness ignored, channel is off");
                false
            }
        }
    }

    fn submit(&self, cmd: ControlCommand) {
        let worker = &self.workers[cmd.channel.index()];
        if worker.slot.send(Some(cmd)).is_err() {
            warn!(channel = %cmd.channel, "channel worker is gone, command dropped");
        }
    }

    /// Stops the workers after they deliver the last queued command.
    pub async fn shutdown(self) {
        for worker in self.workers {
            drop(worker.slot);
            if let Err(e) = worker.handle.await {
                warn!("channel worker ended abnormally: {e}");
            }
        }
    }
}

/// Delivers the latest command in `rx`, one at a time, until the controller
/// is dropped.
async fn channel_worker(
    id: ChannelId,
    mut rx: watch::Receiver<Option<ControlCommand>>,
    transport: Arc<dyn ControlTransport>,
    policy: DispatchPolicy,
) {
    while rx.changed().await.is_ok() {
        let Some(cmd) = *rx.borrow_and_update() else {
            continue;
        };
        dispatch(&*transport, cmd, policy, &rx).await;
    }
    debug!(channel = %id, "channel worker stopped");
}

async fn dispatch(
    transport: &dyn ControlTransport,
    cmd: ControlCommand,
    policy: DispatchPolicy,
    rx: &watch::Receiver<Option<ControlCommand>>,
) {
    let attempts = policy.max_attempts.max(1);
    for attempt in 1..=attempts {
        match transport.send_control(cmd).await {
            Ok(()) => {
                info!(
                    channel = %cmd.channel,
                    state = cmd.state.as_str(),
                    brightness = cmd.brightness,
                    "channel updated"
                );
                return;
            }
            Err(e) if attempt < attempts => {
                if rx.has_changed().unwrap_or(false) {
                    debug!(channel = %cmd.channel, "retry skipped, newer command pending");
                    return;
                }
                warn!(
                    channel = %cmd.channel,
                    attempt,
                    error = %e,
                    "control command failed, retrying"
                );
                tokio::time::sleep(policy.retry_delay).await;
            }
            Err(e) => {
                warn!(channel = %cmd.channel, error = %e, "control command failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    use tokio::sync::{Semaphore, mpsc};

    use devpanel_protocol::SwitchState;

    use super::*;
    use crate::error::ActuatorError;

    /// Records each command, reports that it started, then waits for a
    /// permit before answering.
    struct FakeTransport {
        calls: Mutex<Vec<ControlCommand>>,
        permits: Arc<Semaphore>,
        started: mpsc::UnboundedSender<ControlCommand>,
        failures: Mutex<u32>,
    }

    impl FakeTransport {
        fn new(
            permits: usize,
            failures: u32,
        ) -> (Arc<Self>, mpsc::UnboundedReceiver<ControlCommand>) {
            let (started, started_rx) = mpsc::unbounded_channel();
            let transport = Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                permits: Arc::new(Semaphore::new(permits)),
                started,
                failures: Mutex::new(failures),
            });
            (transport, started_rx)
        }

        fn calls(&self) -> Vec<ControlCommand> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ControlTransport for FakeTransport {
        fn send_control(
            &self,
            cmd: ControlCommand,
        ) -> Pin<Box<dyn Future<Output = Result<(), ActuatorError>> + Send + '_>> {
            Box::pin(async move {
                self.calls.lock().unwrap().push(cmd);
                let _ = self.started.send(cmd);
                self.permits.acquire().await.unwrap().forget();

                let mut failures = self.failures.lock().unwrap();
                if *failures > 0 {
                    *failures -= 1;
                    return Err(ActuatorError::Status(503));
                }
                Ok(())
            })
        }
    }

    #[test]
    fn channel_starts_off_with_default_brightness() {
        let ch = DimmableChannel::new(ChannelId::One);
        assert!(!ch.is_enabled());
        assert!(!ch.slider_enabled());
        assert_eq!(ch.brightness(), DEFAULT_BRIGHTNESS);
    }

    #[test]
    fn turning_off_sends_zero_and_disables_slider() {
        let mut ch = DimmableChannel::new(ChannelId::Two);
        ch.set_enabled(true);
        ch.set_brightness(80);

        let cmd = ch.set_enabled(false);

        assert_eq!(cmd.state, SwitchState::Off);
        assert_eq!(cmd.brightness, 0);
        assert!(!ch.slider_enabled());
        assert_eq!(ch.brightness(), 80);
    }

    #[test]
    fn turning_on_sends_slider_value() {
        let mut ch = DimmableChannel::new(ChannelId::One);
        let cmd = ch.set_enabled(true);

        assert_eq!(cmd, ControlCommand::on(ChannelId::One, DEFAULT_BRIGHTNESS));
        assert!(ch.slider_enabled());
    }

    #[test]
    fn slider_ignored_while_off_and_clamped_while_on() {
        let mut ch = DimmableChannel::new(ChannelId::One);
        assert_eq!(ch.set_brightness(10), None);
        assert_eq!(ch.brightness(), DEFAULT_BRIGHTNESS);

        ch.set_enabled(true);
        let cmd = ch.set_brightness(250).unwrap();
        assert_eq!(cmd.brightness, 100);
        assert_eq!(ch.brightness(), 100);
    }

    #[tokio::test]
    async fn controller_delivers_commands_per_channel() {
        let (transport, mut started) = FakeTransport::new(10, 0);
        let mut ctl = DimmerController::new(transport.clone(), DispatchPolicy::default());

        ctl.set_enabled(ChannelId::One, true);
        started.recv().await.unwrap();
        ctl.set_enabled(ChannelId::Two, false);
        started.recv().await.unwrap();

        let calls = transport.calls();
        assert!(calls.contains(&ControlCommand::on(ChannelId::One, DEFAULT_BRIGHTNESS)));
        assert!(calls.contains(&ControlCommand::off(ChannelId::Two)));
        ctl.shutdown().await;
    }

    #[tokio::test]
    async fn overlapping_slider_moves_coalesce_in_order() {
        let (transport, mut started) = FakeTransport::new(0, 0);
        let mut ctl = DimmerController::new(transport.clone(), DispatchPolicy::default());

        ctl.set_enabled(ChannelId::One, true);
        // The worker is now blocked inside the first request.
        started.recv().await.unwrap();

        assert!(ctl.set_brightness(ChannelId::One, 20));
        assert!(ctl.set_brightness(ChannelId::One, 40));
        assert!(ctl.set_brightness(ChannelId::One, 60));

        transport.permits.add_permits(2);
        started.recv().await.unwrap();

        assert_eq!(
            transport.calls(),
            vec![
                ControlCommand::on(ChannelId::One, DEFAULT_BRIGHTNESS),
                ControlCommand::on(ChannelId::One, 60),
            ]
        );
        ctl.shutdown().await;
    }

    #[tokio::test]
    async fn brightness_while_off_sends_nothing() {
        let (transport, _started) = FakeTransport::new(10, 0);
        let mut ctl = DimmerController::new(transport.clone(), DispatchPolicy::default());

        assert!(!ctl.set_brightness(ChannelId::Two, 70));
        ctl.shutdown().await;

        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn default_policy_does_not_retry() {
        let (transport, _started) = FakeTransport::new(10, 1);
        let mut ctl = DimmerController::new(transport.clone(), DispatchPolicy::default());

        ctl.set_enabled(ChannelId::One, false);
        ctl.shutdown().await;

        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_policy_repeats_failed_command() {
        let (transport, _started) = FakeTransport::new(10, 2);
        let policy = DispatchPolicy {
            max_attempts: 3,
            retry_delay: Duration::from_millis(100),
        };
        let mut ctl = DimmerController::new(transport.clone(), policy);

        ctl.set_enabled(ChannelId::Two, true);
        ctl.shutdown().await;

        assert_eq!(
            transport.calls(),
            vec![ControlCommand::on(ChannelId::Two, DEFAULT_BRIGHTNESS); 3]
        );
    }
}
