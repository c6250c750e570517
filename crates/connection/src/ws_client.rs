//! WebSocket client for the device's `/ws` endpoint.
//!
//! A thin socket wrapper: inbound text frames go to a frame callback, a
//! disconnect callback fires exactly once when the read side ends, and
//! outbound text is queued to the write pump.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use devpanel_protocol::constants::WS_MAX_MESSAGE_SIZE;

/// Errors from the WebSocket client.
#[derive(Debug, thiserror::Error)]
pub enum WsError {
    #[error("WebSocket error: {0}")]
    Ws(#[from] tungstenite::Error),

    #[error("connection not open")]
    NotOpen,

    #[error("connection closed")]
    Closed,
}

/// Callback for inbound text frames.
pub type FrameCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Callback fired once when the connection ends for any reason.
pub type DisconnectCallback = Arc<dyn Fn() + Send + Sync>;

/// WebSocket client connected to the device.
///
/// Callbacks are installed before the pumps start so no frame can arrive
/// unobserved.
pub struct WsClient {
    write_tx: mpsc::Sender<tungstenite::Message>,
    /// Set by the read pump just before the disconnect callback runs.
    disconnected: Arc<AtomicBool>,
    _read_handle: tokio::task::JoinHandle<()>,
    _write_handle: tokio::task::JoinHandle<()>,
    _ping_handle: tokio::task::JoinHandle<()>,
    cancel: CancellationToken,
}

impl WsClient {
    /// Opens the WebSocket and starts the read, write and ping pumps.
    pub async fn connect(
        url: &str,
        on_frame: FrameCallback,
        on_disconnect: DisconnectCallback,
    ) -> Result<Self, WsError> {
        let mut ws_config = tungstenite::protocol::WebSocketConfig::default();
        ws_config.max_message_size = Some(WS_MAX_MESSAGE_SIZE);
        ws_config.max_frame_size = Some(WS_MAX_MESSAGE_SIZE);
        let (ws_stream, _) =
            tokio_tungstenite::connect_async_with_config(url, Some(ws_config), false).await?;
        let (write, read) = ws_stream.split();

        let (write_tx, write_rx) = mpsc::channel::<tungstenite::Message>(64);
        let disconnected = Arc::new(AtomicBool::new(false));
        let cancel = CancellationToken::new();

        let write_handle = {
            let cancel = cancel.clone();
            tokio::spawn(crate::pumps::write::write_pump(write, write_rx, cancel))
        };

        let read_handle = {
            let disconnected = disconnected.clone();
            let write_tx = write_tx.clone();
            let cancel = cancel.clone();
            tokio::spawn(crate::pumps::read::read_pump(
                read,
                on_frame,
                on_disconnect,
                disconnected,
                write_tx,
                cancel,
            ))
        };

        let ping_handle = {
            let write_tx = write_tx.clone();
            let cancel = cancel.clone();
            tokio::spawn(crate::pumps::ping::ping_pump(write_tx, cancel))
        };

        Ok(Self {
            write_tx,
            disconnected,
            _read_handle: read_handle,
            _write_handle: write_handle,
            _ping_handle: ping_handle,
            cancel,
        })
    }

    /// Queues a text frame for the write pump.
    pub async fn send_text(&self, text: &str) -> Result<(), WsError> {
        if self.is_disconnected() {
            return Err(WsError::Closed);
        }
        trace!(len = text.len(), "queueing text frame");
        self.write_tx
            .send(tungstenite::Message::Text(text.to_owned().into()))
            .await
            .map_err(|_| WsError::Closed)
    }

    /// Whether the read side has already ended.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::Acquire)
    }

    /// Gracefully closes the connection.
    pub async fn close(&self) {
        self.cancel.cancel();
        let _ = self.write_tx.send(tungstenite::Message::Close(None)).await;
    }
}

impl Drop for WsClient {
    fn drop(&mut self) {
        self.cancel.cancel();
        self._read_handle.abort();
        self._write_handle.abort();
        self._ping_handle.abort();
    }
}
