//! Adapter bridging `ConnectionManager` to the `RelayPublisher` trait
//! required by `devpanel-actuators`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use devpanel_actuators::{ActuatorError, RelayPublisher};
use devpanel_connection::ConnectionManager;

/// Implements `RelayPublisher` by sending over the device WebSocket.
pub struct ConnectionPublisher {
    mgr: Arc<ConnectionManager>,
}

impl ConnectionPublisher {
    pub fn new(mgr: Arc<ConnectionManager>) -> Self {
        Self { mgr }
    }
}

impl RelayPublisher for ConnectionPublisher {
    fn publish(
        &self,
        text: String,
    ) -> Pin<Box<dyn Future<Output = Result<(), ActuatorError>> + Send + '_>> {
        let mgr = self.mgr.clone();
        Box::pin(async move {
            mgr.send(&text)
                .await
                .map_err(|e| ActuatorError::Publish(e.to_string()))
        })
    }
}
