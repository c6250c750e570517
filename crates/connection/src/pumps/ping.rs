//! WebSocket ping pump: periodic keepalive.

use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;

use devpanel_protocol::constants::WS_PING_PERIOD;

/// Pings the device every [`WS_PING_PERIOD`] until cancelled or the write
/// queue is gone. The pongs feed the read pump's deadline.
pub(crate) async fn ping_pump(
    write_tx: mpsc::Sender<tungstenite::Message>,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(WS_PING_PERIOD);
    interval.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                if write_tx.send(tungstenite::Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }
        }
    }
}
