//! Outbound transport for dimmable channel commands.

use std::future::Future;
use std::pin::Pin;

use tracing::debug;

use devpanel_protocol::{ControlCommand, DeviceEndpoint};

use crate::error::ActuatorError;

/// Abstract sender of `/control` commands.
///
/// Production uses [`HttpControlTransport`]; tests substitute a recorder.
pub trait ControlTransport: Send + Sync {
    fn send_control(
        &self,
        cmd: ControlCommand,
    ) -> Pin<Box<dyn Future<Output = Result<(), ActuatorError>> + Send + '_>>;
}

/// Sends each command as `GET /control?device=…&state=…&brightness=…`.
pub struct HttpControlTransport {
    http_client: reqwest::Client,
    endpoint: DeviceEndpoint,
}

impl HttpControlTransport {
    pub fn new(http_client: reqwest::Client, endpoint: DeviceEndpoint) -> Self {
        Self {
            http_client,
            endpoint,
        }
    }
}

impl ControlTransport for HttpControlTransport {
    fn send_control(
        &self,
        cmd: ControlCommand,
    ) -> Pin<Box<dyn Future<Output = Result<(), ActuatorError>> + Send + '_>> {
        Box::pin(async move {
            let url = self.endpoint.control_url(&cmd);
            let response = self
                .http_client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| ActuatorError::Http(format!("GET {url}: {e}")))?;

            let status = response.status();
            if !status.is_success() {
                return Err(ActuatorError::Status(status.as_u16()));
            }

            // The device answers with a short acknowledgment; it is only logged.
            let body = response.text().await.unwrap_or_default();
            debug!(
                channel = %cmd.channel,
                state = cmd.state.as_str(),
                brightness = cmd.brightness,
                reply = %body.trim(),
                "control command delivered"
            );
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    use devpanel_protocol::ChannelId;

    use super::*;

    /// Accepts one HTTP request, answers with `status_line`, and reports the
    /// request line it saw.
    async fn one_shot_device(
        status_line: &'static str,
    ) -> (DeviceEndpoint, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            let request = String::from_utf8_lossy(&buf);
            let line = request.lines().next().unwrap_or_default().to_string();
            let _ = tx.send(line);

            let response =
                format!("{status_line}\r\nContent-Length: 2\r\nConnection: close\r\n\r\nOK");
            stream.write_all(response.as_bytes()).await.unwrap();
        });

        let endpoint = DeviceEndpoint::parse(&format!("http://{addr}")).unwrap();
        (endpoint, rx)
    }

    #[tokio::test]
    async fn sends_get_control_with_query() {
        let (endpoint, request) = one_shot_device("HTTP/1.1 200 OK").await;
        let transport = HttpControlTransport::new(reqwest::Client::new(), endpoint);

        transport
            .send_control(ControlCommand::on(ChannelId::Two, 35))
            .await
            .unwrap();

        assert_eq!(
            request.await.unwrap(),
            "GET /control?device=2&state=ON&brightness=35 HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let (endpoint, _request) = one_shot_device("HTTP/1.1 500 Internal Server Error").await;
        let transport = HttpControlTransport::new(reqwest::Client::new(), endpoint);

        let result = transport.send_control(ControlCommand::off(ChannelId::One)).await;
        assert!(matches!(result, Err(ActuatorError::Status(500))));
    }

    #[tokio::test]
    async fn unreachable_device_is_an_http_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let endpoint = DeviceEndpoint::parse(&format!("http://{addr}")).unwrap();
        let transport = HttpControlTransport::new(reqwest::Client::new(), endpoint);

        let result = transport.send_control(ControlCommand::off(ChannelId::One)).await;
        assert!(matches!(result, Err(ActuatorError::Http(_))));
    }
}
