//! The panel's event loop.
//!
//! Multiplexes connection events, console input, finished device jobs, the
//! post-save reload timer and Ctrl-C into [`Message`]s for [`Panel::update`].

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{info, trace, warn};

use devpanel_connection::{ConnectionEvent, ConnectionManager};

use crate::app::Panel;
use crate::console;
use crate::message::{Message, Task, UiEvent};
use crate::render::Renderer;

/// Runs until `quit`, end of input or Ctrl-C, then closes the socket and
/// lets pending dimmer commands drain.
pub async fn run<R: Renderer>(
    mut panel: Panel<R>,
    mgr: Arc<ConnectionManager>,
    mut events: mpsc::Receiver<ConnectionEvent>,
) -> anyhow::Result<()> {
    let opener = mgr.clone();
    tokio::spawn(async move {
        // A failed first attempt has already scheduled a reconnect.
        if let Err(e) = opener.open().await {
            warn!(error = %e, "initial connect failed");
        }
    });

    // Replies from `Task::Perform` jobs. The first load goes through here
    // too, so the loop is live before the device answers.
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Message>();
    let _ = done_tx.send(Message::Ui(UiEvent::ConfigLoad));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let reload = tokio::time::sleep(std::time::Duration::ZERO);
    tokio::pin!(reload);
    let mut reload_armed = false;

    loop {
        let message = tokio::select! {
            event = events.recv() => match event {
                Some(event) => Message::Connection(event),
                None => {
                    warn!("connection event stream ended");
                    break;
                }
            },
            line = lines.next_line() => match line {
                Ok(Some(line)) => match console::parse(&line) {
                    Ok(Some(event)) => Message::Ui(event),
                    Ok(None) => continue,
                    Err(reason) => {
                        panel.reject_input(&reason);
                        continue;
                    }
                },
                Ok(None) => {
                    info!("end of input");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "cannot read console input");
                    break;
                }
            },
            Some(message) = done_rx.recv() => message,
            () = &mut reload, if reload_armed => {
                reload_armed = false;
                Message::ReloadConfig
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!(error = %e, "cannot listen for Ctrl-C");
                }
                break;
            }
        };

        match panel.update(message).await {
            Task::None => {}
            Task::ReloadAfter(delay) => {
                reload.as_mut().reset(Instant::now() + delay);
                reload_armed = true;
            }
            Task::Perform(job) => {
                let done = done_tx.clone();
                tokio::spawn(async move {
                    if done.send(job.await).is_err() {
                        trace!("event loop gone, device reply discarded");
                    }
                });
            }
            Task::Quit => break,
        }
    }

    info!("shutting down");
    mgr.shutdown().await;
    panel.shutdown().await;
    Ok(())
}
