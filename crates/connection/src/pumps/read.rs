//! WebSocket read pump: forwards inbound text frames.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use devpanel_protocol::constants::{WS_MAX_MESSAGE_SIZE, WS_PONG_WAIT};

use crate::ws_client::{DisconnectCallback, FrameCallback};

/// Reads frames from the WebSocket until it ends, then reports the
/// disconnect exactly once.
///
/// Any inbound message resets the read deadline; if nothing arrives within
/// [`WS_PONG_WAIT`] the connection is treated as dead.
pub(crate) async fn read_pump<S>(
    mut read: S,
    on_frame: FrameCallback,
    on_disconnect: DisconnectCallback,
    disconnected: Arc<AtomicBool>,
    write_tx: mpsc::Sender<tungstenite::Message>,
    cancel: CancellationToken,
) where
    S: StreamExt<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
{
    let deadline = tokio::time::sleep(WS_PONG_WAIT);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            () = &mut deadline => {
                warn!("no traffic from device within read deadline, closing");
                break;
            }

            msg = read.next() => {
                match msg {
                    Some(Ok(msg)) => {
                        deadline.as_mut().reset(tokio::time::Instant::now() + WS_PONG_WAIT);

                        match msg {
                            tungstenite::Message::Text(text) => {
                                handle_text_frame(text.as_str(), &on_frame);
                            }
                            tungstenite::Message::Ping(data) => {
                                trace!("received ping, sending pong");
                                let _ = write_tx.send(tungstenite::Message::Pong(data)).await;
                            }
                            tungstenite::Message::Pong(_) => {
                                trace!("received pong");
                            }
                            tungstenite::Message::Close(frame) => {
                                debug!(?frame, "received close frame");
                                break;
                            }
                            _ => {} // Binary: the device never sends any.
                        }
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket read error: {e}");
                        break;
                    }
                    None => {
                        debug!("WebSocket stream ended");
                        break;
                    }
                }
            }
        }
    }

    disconnected.store(true, Ordering::Release);
    on_disconnect();
}

/// Forwards one text frame, dropping oversized ones.
fn handle_text_frame(text: &str, on_frame: &FrameCallback) {
    if text.len() > WS_MAX_MESSAGE_SIZE {
        warn!("frame too large ({} bytes), dropping", text.len());
        return;
    }
    debug!(frame = %text, "received frame");
    on_frame(text.to_owned());
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    use futures_util::stream;

    use super::*;

    fn recording_callback() -> (FrameCallback, Arc<Mutex<Vec<String>>>) {
        let frames = Arc::new(Mutex::new(Vec::new()));
        let sink = frames.clone();
        let cb: FrameCallback = Arc::new(move |text| sink.lock().unwrap().push(text));
        (cb, frames)
    }

    #[test]
    fn oversized_frame_is_dropped() {
        let (cb, frames) = recording_callback();
        let big = "x".repeat(WS_MAX_MESSAGE_SIZE + 1);
        handle_text_frame(&big, &cb);
        handle_text_frame(r#"{"temp":21}"#, &cb);
        assert_eq!(*frames.lock().unwrap(), vec![r#"{"temp":21}"#.to_string()]);
    }

    #[tokio::test]
    async fn read_pump_forwards_text_and_reports_disconnect_once() {
        let (on_frame, frames) = recording_callback();
        let disconnects = Arc::new(AtomicUsize::new(0));
        let counter = disconnects.clone();
        let on_disconnect: DisconnectCallback = Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let disconnected = Arc::new(AtomicBool::new(false));
        let (write_tx, _write_rx) = mpsc::channel(4);

        let input = stream::iter(vec![
            Ok(tungstenite::Message::Text(r#"{"humi":55}"#.into())),
            Ok(tungstenite::Message::Binary(vec![1, 2, 3].into())),
            Ok(tungstenite::Message::Text("not json".into())),
        ]);

        read_pump(
            input,
            on_frame,
            on_disconnect,
            disconnected.clone(),
            write_tx,
            CancellationToken::new(),
        )
        .await;

        assert_eq!(
            *frames.lock().unwrap(),
            vec![r#"{"humi":55}"#.to_string(), "not json".to_string()]
        );
        assert_eq!(disconnects.load(Ordering::SeqCst), 1);
        assert!(disconnected.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn read_pump_answers_ping_with_pong() {
        let (on_frame, _frames) = recording_callback();
        let on_disconnect: DisconnectCallback = Arc::new(|| {});
        let (write_tx, mut write_rx) = mpsc::channel(4);

        let input = stream::iter(vec![Ok(tungstenite::Message::Ping(vec![7].into()))]);
        read_pump(
            input,
            on_frame,
            on_disconnect,
            Arc::new(AtomicBool::new(false)),
            write_tx,
            CancellationToken::new(),
        )
        .await;

        match write_rx.recv().await {
            Some(tungstenite::Message::Pong(data)) => assert_eq!(&data[..], &[7u8]),
            other => panic!("expected pong, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn read_pump_stops_at_close_frame() {
        let (on_frame, frames) = recording_callback();
        let on_disconnect: DisconnectCallback = Arc::new(|| {});
        let (write_tx, _write_rx) = mpsc::channel(4);

        let input = stream::iter(vec![
            Ok(tungstenite::Message::Close(None)),
            Ok(tungstenite::Message::Text(r#"{"temp":1}"#.into())),
        ]);
        read_pump(
            input,
            on_frame,
            on_disconnect,
            Arc::new(AtomicBool::new(false)),
            write_tx,
            CancellationToken::new(),
        )
        .await;

        assert!(frames.lock().unwrap().is_empty());
    }
}
