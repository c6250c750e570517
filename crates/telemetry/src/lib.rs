//! Sensor telemetry: routing device frames to the temperature and humidity
//! gauges, and keeping their latest values and recent history.

pub mod history;
pub mod router;
pub mod sink;
pub mod state;

pub use history::ReadingHistory;
pub use router::{MessageRouter, RouteOutcome};
pub use sink::{Gauge, GaugeSpec, TelemetrySink};
pub use state::TelemetryState;
