//! Connection manager for the device WebSocket.
//!
//! Owns the one [`ConnectionState`] of the process. `open()` is idempotent,
//! close events schedule a single reconnect after a fixed delay, and `send()`
//! is accepted only while the socket is open.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::{Mutex, RwLock, mpsc};
use tracing::{debug, info, warn};

use crate::reconnection::{self, WsContext, cancel_pending_reconnect};
use crate::types::{ConnectionEvent, ConnectionState, ReconnectConfig};
use crate::ws_client::WsError;

/// Capacity of the channel returned by [`ConnectionManager::take_events`].
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Connection manager for the device's WebSocket.
pub struct ConnectionManager {
    ctx: WsContext,
    events_rx: Mutex<Option<mpsc::Receiver<ConnectionEvent>>>,
}

impl ConnectionManager {
    /// Creates a manager for `url` in state `Closed`. Nothing is opened yet.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(url: impl Into<String>, config: ReconnectConfig) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (lifecycle_tx, lifecycle_rx) = mpsc::unbounded_channel();
        tokio::spawn(reconnection::forward_lifecycle_events(
            lifecycle_rx,
            events_tx.clone(),
        ));

        Self {
            ctx: WsContext {
                url: url.into(),
                state: Arc::new(RwLock::new(ConnectionState::Closed)),
                client: Arc::new(Mutex::new(None)),
                events_tx,
                lifecycle_tx,
                reconnect: Arc::new(std::sync::Mutex::new(None)),
                next_ticket: Arc::new(AtomicU64::new(0)),
                generation: Arc::new(AtomicU64::new(0)),
                shut_down: Arc::new(AtomicBool::new(false)),
                config,
            },
            events_rx: Mutex::new(Some(events_rx)),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub async fn take_events(&self) -> Option<mpsc::Receiver<ConnectionEvent>> {
        self.events_rx.lock().await.take()
    }

    /// The WebSocket URL this manager connects to.
    pub fn url(&self) -> &str {
        &self.ctx.url
    }

    /// Current connection state.
    pub async fn state(&self) -> ConnectionState {
        *self.ctx.state.read().await
    }

    /// Whether a reconnect is scheduled and has not fired yet.
    pub fn has_pending_reconnect(&self) -> bool {
        self.ctx
            .reconnect
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    /// Opens the connection.
    ///
    /// Idempotent: while a connection is in flight or open this returns
    /// `Ok(())` without creating a second socket. A failed attempt schedules
    /// a reconnect and returns the error.
    pub async fn open(&self) -> Result<(), WsError> {
        reconnection::open(self.ctx.clone()).await
    }

    /// Sends a text payload to the device.
    ///
    /// Only accepted while `Open`. Otherwise the payload is dropped with a
    /// warning and [`WsError::NotOpen`] is returned; nothing is queued.
    pub async fn send(&self, payload: &str) -> Result<(), WsError> {
        let state = self.state().await;
        if state != ConnectionState::Open {
            warn!(?state, "websocket not open, dropping payload");
            return Err(WsError::NotOpen);
        }

        let client = self.ctx.client.lock().await;
        let Some(client) = client.as_ref() else {
            warn!("websocket not open, dropping payload");
            return Err(WsError::NotOpen);
        };

        match client.send_text(payload).await {
            Ok(()) => {
                debug!(payload, "sent");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "send failed, payload dropped");
                Err(e)
            }
        }
    }

    /// Closes the connection for good: cancels any pending reconnect and
    /// suppresses future ones.
    pub async fn shutdown(&self) {
        self.ctx.shut_down.store(true, Ordering::Release);
        cancel_pending_reconnect(&self.ctx.reconnect);

        let mut state = self.ctx.state.write().await;
        if let Some(client) = self.ctx.client.lock().await.take() {
            client.close().await;
        }
        if *state != ConnectionState::Closed {
            *state = ConnectionState::Closed;
            reconnection::emit(
                &self.ctx,
                ConnectionEvent::StateChanged(ConnectionState::Closed),
            );
        }
        info!("connection manager shut down");
    }

    #[cfg(test)]
    pub(crate) fn ws_context(&self) -> WsContext {
        self.ctx.clone()
    }
}
