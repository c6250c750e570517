//! WebSocket write pump: the only task that touches the socket sink.

use futures_util::SinkExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{error, trace};

/// Drains the outbound queue into the socket, in order.
pub(crate) async fn write_pump<S>(
    mut write: S,
    mut write_rx: mpsc::Receiver<tungstenite::Message>,
    cancel: CancellationToken,
) where
    S: SinkExt<tungstenite::Message, Error = tungstenite::Error> + Unpin,
{
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            msg = write_rx.recv() => {
                let Some(msg) = msg else { break };
                let closing = matches!(msg, tungstenite::Message::Close(_));
                if let tungstenite::Message::Text(text) = &msg {
                    trace!(frame = %text.as_str(), "sending frame");
                }
                if let Err(e) = write.send(msg).await {
                    error!("WebSocket write error: {e}");
                    return;
                }
                if closing {
                    return;
                }
            }
        }
    }

    let _ = write.send(tungstenite::Message::Close(None)).await;
}
