//! Switched relays: an in-memory registry and its publishing controller.
//!
//! Relays exist only on the panel. Creating or deleting one never talks to
//! the device; toggling publishes a relay command over the WebSocket.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use devpanel_protocol::RelayCommand;

use crate::error::{ActuatorError, RelayError};

/// Opaque unique identifier of a relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelayId(Uuid);

impl RelayId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RelayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A user-defined relay bound to a GPIO pin on the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relay {
    pub id: RelayId,
    pub name: String,
    pub gpio: String,
    pub energized: bool,
}

impl Relay {
    /// The command describing this relay's current state.
    pub fn command(&self) -> RelayCommand {
        RelayCommand::new(&self.name, &self.gpio, self.energized)
    }
}

/// Ordered list of relays plus the single pending-delete slot.
#[derive(Debug, Default, Clone)]
pub struct RelayRegistry {
    relays: Vec<Relay>,
    pending_delete: Option<RelayId>,
}

impl RelayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn relays(&self) -> &[Relay] {
        &self.relays
    }

    pub fn len(&self) -> usize {
        self.relays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relays.is_empty()
    }

    pub fn get(&self, id: RelayId) -> Option<&Relay> {
        self.relays.iter().find(|r| r.id == id)
    }

    /// Id of the relay at `index` in display order.
    pub fn id_at(&self, index: usize) -> Option<RelayId> {
        self.relays.get(index).map(|r| r.id)
    }

    fn get_mut(&mut self, id: RelayId) -> Result<&mut Relay, RelayError> {
        self.relays
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(RelayError::NotFound(id))
    }

    /// Adds a relay, initially de-energized.
    ///
    /// Both fields are trimmed and must be non-empty. Returns the updated
    /// list, newest last.
    pub fn add(&mut self, name: &str, gpio: &str) -> Result<&[Relay], RelayError> {
        let name = name.trim();
        let gpio = gpio.trim();
        if name.is_empty() {
            return Err(RelayError::MissingField("name"));
        }
        if gpio.is_empty() {
            return Err(RelayError::MissingField("gpio"));
        }

        let relay = Relay {
            id: RelayId::new(),
            name: name.to_string(),
            gpio: gpio.to_string(),
            energized: false,
        };
        info!(id = %relay.id, name, gpio, "relay added");
        self.relays.push(relay);
        Ok(&self.relays)
    }

    /// Flips a relay and returns the command announcing its new state.
    pub fn toggle(&mut self, id: RelayId) -> Result<RelayCommand, RelayError> {
        let relay = self.get_mut(id)?;
        relay.energized = !relay.energized;
        Ok(relay.command())
    }

    /// Forces a relay's state without producing a command.
    pub fn set_energized(&mut self, id: RelayId, energized: bool) -> Result<(), RelayError> {
        self.get_mut(id)?.energized = energized;
        Ok(())
    }

    /// Marks a relay for deletion, replacing any earlier pending target.
    pub fn request_delete(&mut self, id: RelayId) -> Result<&Relay, RelayError> {
        let index = self
            .relays
            .iter()
            .position(|r| r.id == id)
            .ok_or(RelayError::NotFound(id))?;
        self.pending_delete = Some(id);
        Ok(&self.relays[index])
    }

    /// The relay awaiting delete confirmation, if any.
    pub fn pending_delete(&self) -> Option<&Relay> {
        self.pending_delete.and_then(|id| self.get(id))
    }

    /// Clears the pending delete. Returns the id that was pending.
    pub fn cancel_delete(&mut self) -> Option<RelayId> {
        self.pending_delete.take()
    }

    /// Removes the pending relay and clears the slot.
    pub fn confirm_delete(&mut self) -> Result<Relay, RelayError> {
        let id = self
            .pending_delete
            .take()
            .ok_or(RelayError::NoPendingDelete)?;
        let index = self
            .relays
            .iter()
            .position(|r| r.id == id)
            .ok_or(RelayError::NotFound(id))?;
        let relay = self.relays.remove(index);
        info!(id = %relay.id, name = %relay.name, "relay deleted");
        Ok(relay)
    }
}

/// Sends serialized relay commands to the device.
///
/// The app implements this on top of the connection manager.
pub trait RelayPublisher: Send + Sync {
    fn publish(
        &self,
        text: String,
    ) -> Pin<Box<dyn Future<Output = Result<(), ActuatorError>> + Send + '_>>;
}

/// What happens to the local state when a toggle cannot be published.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PublishFailurePolicy {
    /// Keep the optimistic flip.
    #[default]
    KeepLocal,
    /// Flip the relay back.
    Revert,
}

/// Result of [`RelayController::toggle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The command reached the connection.
    Published(RelayCommand),
    /// Publishing failed and the local flip was kept.
    Unsent(RelayCommand),
    /// Publishing failed and the relay was flipped back.
    Reverted(RelayCommand),
}

/// Relay registry plus the publisher that carries toggles to the device.
pub struct RelayController {
    registry: RelayRegistry,
    publisher: Arc<dyn RelayPublisher>,
    policy: PublishFailurePolicy,
}

impl RelayController {
    pub fn new(publisher: Arc<dyn RelayPublisher>, policy: PublishFailurePolicy) -> Self {
        Self {
            registry: RelayRegistry::new(),
            publisher,
            policy,
        }
    }

    pub fn registry(&self) -> &RelayRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut RelayRegistry {
        &mut self.registry
    }

    pub fn policy(&self) -> PublishFailurePolicy {
        self.policy
    }

    /// Flips a relay locally, then publishes its new state.
    pub async fn toggle(&mut self, id: RelayId) -> Result<ToggleOutcome, RelayError> {
        let cmd = self.registry.toggle(id)?;
        let text = cmd.to_json()?;

        match self.publisher.publish(text).await {
            Ok(()) => {
                debug!(id = %id, status = cmd.value.status.as_str(), "relay command published");
                Ok(ToggleOutcome::Published(cmd))
            }
            Err(e) => {
                warn!(
                    id = %id,
                    error = %e,
                    policy = ?self.policy,
                    "relay command not published"
                );
                match self.policy {
                    PublishFailurePolicy::KeepLocal => Ok(ToggleOutcome::Unsent(cmd)),
                    PublishFailurePolicy::Revert => {
                        let energized = self.registry.get(id).is_some_and(|r| r.energized);
                        self.registry.set_energized(id, !energized)?;
                        Ok(ToggleOutcome::Reverted(cmd))
                    }
                }
            }
        }
    }
}
