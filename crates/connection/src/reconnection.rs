//! Connection lifecycle: open, close handling, and the reconnect slot.
//!
//! Contains the shared [`WsContext`] and the free functions that move the
//! state machine. The pending reconnect is a single cancellable task held in
//! one slot, so any number of close events before the delay elapses still
//! produce exactly one reopen attempt.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::{Mutex, RwLock, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::types::{ConnectionEvent, ConnectionState, ReconnectConfig};
use crate::ws_client::{DisconnectCallback, FrameCallback, WsClient, WsError};

/// Pending reconnect: ticket number and its cancel token.
pub(crate) type ReconnectSlot = Arc<std::sync::Mutex<Option<(u64, CancellationToken)>>>;

/// Shared state passed to the lifecycle functions and captured by the
/// socket callbacks.
#[derive(Clone)]
pub(crate) struct WsContext {
    pub(crate) url: String,
    pub(crate) state: Arc<RwLock<ConnectionState>>,
    pub(crate) client: Arc<Mutex<Option<WsClient>>>,
    /// Bounded channel handed to the app. Frames are pushed here directly.
    pub(crate) events_tx: mpsc::Sender<ConnectionEvent>,
    /// Lifecycle events, relayed in order into `events_tx` by
    /// [`forward_lifecycle_events`].
    pub(crate) lifecycle_tx: mpsc::UnboundedSender<ConnectionEvent>,
    pub(crate) reconnect: ReconnectSlot,
    pub(crate) next_ticket: Arc<AtomicU64>,
    /// Bumped on every successful connect; close events from older sockets
    /// are ignored.
    pub(crate) generation: Arc<AtomicU64>,
    pub(crate) shut_down: Arc<AtomicBool>,
    pub(crate) config: ReconnectConfig,
}

/// Emits a lifecycle event without blocking.
///
/// Lifecycle events are never dropped: a full event channel delays them
/// until the app drains it. Only frames may be lost under backpressure.
pub(crate) fn emit(ctx: &WsContext, event: ConnectionEvent) {
    if ctx.lifecycle_tx.send(event).is_err() {
        debug!("lifecycle forwarder gone, event discarded");
    }
}

/// Relays lifecycle events into the app's channel, waiting for room instead
/// of dropping. Ends when the manager is gone or the receiver is dropped.
pub(crate) async fn forward_lifecycle_events(
    mut lifecycle_rx: mpsc::UnboundedReceiver<ConnectionEvent>,
    events_tx: mpsc::Sender<ConnectionEvent>,
) {
    while let Some(event) = lifecycle_rx.recv().await {
        if events_tx.capacity() == 0 {
            warn!(?event, "event channel full, lifecycle event waiting for room");
        }
        if events_tx.send(event).await.is_err() {
            trace!("event receiver dropped, lifecycle forwarder stopping");
            break;
        }
    }
}

/// Cancels the pending reconnect, if any. Returns whether one was pending.
pub(crate) fn cancel_pending_reconnect(
    slot: &std::sync::Mutex<Option<(u64, CancellationToken)>>,
) -> bool {
    if let Ok(mut guard) = slot.lock()
        && let Some((_, token)) = guard.take()
    {
        token.cancel();
        return true;
    }
    false
}

/// Opens the connection if it is closed.
///
/// Calling this while connecting or open is a no-op, so concurrent callers
/// never create a second socket. A failed attempt returns to `Closed` and
/// schedules a reconnect, same as a close event.
///
/// Returns a boxed future to break the recursive type cycle with
/// [`schedule_reconnect`], whose timer task calls back into this function.
pub(crate) fn open(ctx: WsContext) -> Pin<Box<dyn Future<Output = Result<(), WsError>> + Send>> {
    Box::pin(async move {
        if ctx.shut_down.load(Ordering::Acquire) {
            return Err(WsError::Closed);
        }

        {
            let mut state = ctx.state.write().await;
            if *state != ConnectionState::Closed {
                debug!(state = ?*state, "open ignored, connection already active");
                return Ok(());
            }
            *state = ConnectionState::Connecting;
        }
        emit(&ctx, ConnectionEvent::StateChanged(ConnectionState::Connecting));

        // A manual open supersedes the timer.
        if cancel_pending_reconnect(&ctx.reconnect) {
            debug!("pending reconnect superseded by open");
        }

        info!(url = %ctx.url, "opening websocket");
        let generation = ctx.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let (on_frame, on_disconnect) = client_callbacks(&ctx, generation);

        let client = match WsClient::connect(&ctx.url, on_frame, on_disconnect).await {
            Ok(client) => client,
            Err(e) => {
                warn!(url = %ctx.url, error = %e, "websocket connect failed");
                close_and_reschedule(&ctx).await;
                return Err(e);
            }
        };

        let mut state = ctx.state.write().await;
        if *state != ConnectionState::Connecting || ctx.shut_down.load(Ordering::Acquire) {
            drop(state);
            client.close().await;
            return Err(WsError::Closed);
        }
        if client.is_disconnected() {
            // The disconnect callback has queued the close handling.
            return Err(WsError::Closed);
        }
        *ctx.client.lock().await = Some(client);
        *state = ConnectionState::Open;
        drop(state);

        emit(&ctx, ConnectionEvent::StateChanged(ConnectionState::Open));
        info!(url = %ctx.url, "websocket connected");
        Ok(())
    })
}

/// Builds the frame and disconnect callbacks for one socket.
fn client_callbacks(ctx: &WsContext, generation: u64) -> (FrameCallback, DisconnectCallback) {
    let events_tx = ctx.events_tx.clone();
    let on_frame: FrameCallback = Arc::new(move |text| {
        match events_tx.try_send(ConnectionEvent::Frame(text)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("event channel full, frame dropped");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                trace!("event receiver dropped, frame discarded");
            }
        }
    });

    let ctx_dc = ctx.clone();
    let on_disconnect: DisconnectCallback = Arc::new(move || {
        tokio::spawn(handle_closed(ctx_dc.clone(), generation));
    });

    (on_frame, on_disconnect)
}

/// Handles a close or error event from the socket of `generation`.
pub(crate) async fn handle_closed(ctx: WsContext, generation: u64) {
    if ctx.generation.load(Ordering::Acquire) != generation {
        trace!(generation, "close event from a stale socket ignored");
        return;
    }
    info!("websocket closed");
    close_and_reschedule(&ctx).await;
}

/// Moves to `Closed`, drops the socket, and schedules a reconnect unless the
/// manager was shut down.
async fn close_and_reschedule(ctx: &WsContext) {
    {
        let mut state = ctx.state.write().await;
        ctx.client.lock().await.take();
        let was = std::mem::replace(&mut *state, ConnectionState::Closed);
        if was != ConnectionState::Closed {
            emit(ctx, ConnectionEvent::StateChanged(ConnectionState::Closed));
        }
    }

    if !ctx.shut_down.load(Ordering::Acquire) {
        schedule_reconnect(ctx);
    }
}

/// Schedules one reopen after the configured delay.
///
/// Returns `false` when a reconnect is already pending (the new request is
/// folded into it), when reconnection is disabled, or after shutdown.
pub(crate) fn schedule_reconnect(ctx: &WsContext) -> bool {
    if !ctx.config.enabled || ctx.shut_down.load(Ordering::Acquire) {
        return false;
    }

    let ticket = ctx.next_ticket.fetch_add(1, Ordering::Relaxed);
    let token = CancellationToken::new();
    {
        let Ok(mut slot) = ctx.reconnect.lock() else {
            return false;
        };
        if slot.is_some() {
            debug!("reconnect already pending");
            return false;
        }
        *slot = Some((ticket, token.clone()));
    }

    let delay = ctx.config.delay;
    info!(delay_ms = delay.as_millis() as u64, "reconnect scheduled");
    emit(ctx, ConnectionEvent::ReconnectScheduled { delay });

    let ctx = ctx.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {
                debug!(ticket, "reconnect cancelled");
                return;
            }
            _ = tokio::time::sleep(delay) => {}
        }

        // Release the slot if it is still ours, then reopen.
        if let Ok(mut slot) = ctx.reconnect.lock() {
            if slot.as_ref().is_some_and(|(t, _)| *t == ticket) {
                *slot = None;
            } else {
                return;
            }
        }

        debug!(ticket, "reconnect timer fired");
        if let Err(e) = open(ctx).await {
            debug!(error = %e, "reconnect attempt failed");
        }
    });

    true
}
