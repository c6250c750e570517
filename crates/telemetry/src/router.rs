//! Routes inbound device frames to the gauges.
//!
//! Every text frame from the WebSocket passes through [`MessageRouter::route`].
//! Malformed frames are logged and dropped; they never affect the connection.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use devpanel_protocol::TelemetryFrame;

use crate::sink::{Gauge, TelemetrySink};

/// What the router did with one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// At least one gauge was refreshed.
    Telemetry { temperature: bool, humidity: bool },
    /// A JSON object with no sensor reading, e.g. a control acknowledgment.
    Unrecognized(Map<String, Value>),
    /// Not JSON, or JSON that is not an object.
    Malformed,
}

/// Stateless dispatcher from raw frames to a [`TelemetrySink`].
#[derive(Debug, Default, Clone, Copy)]
pub struct MessageRouter;

impl MessageRouter {
    pub fn new() -> Self {
        Self
    }

    /// Decodes `text` and refreshes each gauge whose field is present and
    /// numeric. The two fields are handled independently.
    pub fn route<S: TelemetrySink + ?Sized>(&self, sink: &mut S, text: &str) -> RouteOutcome {
        let frame = match TelemetryFrame::decode(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "dropping malformed frame");
                return RouteOutcome::Malformed;
            }
        };

        if !frame.has_readings() {
            debug!(fields = ?frame.extra.keys().collect::<Vec<_>>(), "unrecognized frame");
            return RouteOutcome::Unrecognized(frame.extra);
        }

        if let Some(temp) = frame.temp {
            sink.refresh(Gauge::Temperature, temp);
        }
        if let Some(humi) = frame.humi {
            sink.refresh(Gauge::Humidity, humi);
        }

        RouteOutcome::Telemetry {
            temperature: frame.temp.is_some(),
            humidity: frame.humi.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        calls: Vec<(Gauge, f64)>,
    }

    impl TelemetrySink for RecordingSink {
        fn refresh(&mut self, gauge: Gauge, value: f64) {
            self.calls.push((gauge, value));
        }
    }

    fn route(text: &str) -> (RouteOutcome, Vec<(Gauge, f64)>) {
        let mut sink = RecordingSink::default();
        let outcome = MessageRouter::new().route(&mut sink, text);
        (outcome, sink.calls)
    }

    #[test]
    fn both_readings_refresh_both_gauges() {
        let (outcome, calls) = route(r#"{"temp": 27.4, "humi": 63}"#);

        assert_eq!(
            outcome,
            RouteOutcome::Telemetry {
                temperature: true,
                humidity: true
            }
        );
        assert_eq!(
            calls,
            vec![(Gauge::Temperature, 27.4), (Gauge::Humidity, 63.0)]
        );
    }

    #[test]
    fn humidity_only_refreshes_humidity_once() {
        let (outcome, calls) = route(r#"{"humi": 48.5}"#);

        assert_eq!(
            outcome,
            RouteOutcome::Telemetry {
                temperature: false,
                humidity: true
            }
        );
        assert_eq!(calls, vec![(Gauge::Humidity, 48.5)]);
    }

    #[test]
    fn non_numeric_field_is_skipped() {
        let (_, calls) = route(r#"{"temp": "n/a", "humi": 50}"#);
        assert_eq!(calls, vec![(Gauge::Humidity, 50.0)]);
    }

    #[test]
    fn malformed_frames_touch_nothing() {
        for text in ["", "ok", "{\"temp\":", "42", "[{\"temp\": 1}]"] {
            let (outcome, calls) = route(text);
            assert_eq!(outcome, RouteOutcome::Malformed, "frame {text:?}");
            assert!(calls.is_empty());
        }
    }

    #[test]
    fn object_without_readings_is_unrecognized() {
        let (outcome, calls) = route(r#"{"page": "device", "status": "ok"}"#);

        assert!(calls.is_empty());
        match outcome {
            RouteOutcome::Unrecognized(fields) => {
                assert_eq!(fields.get("status"), Some(&Value::from("ok")));
            }
            other => panic!("expected unrecognized, got {other:?}"),
        }
    }
}
