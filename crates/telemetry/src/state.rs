use std::time::{Duration, Instant};

use crate::history::ReadingHistory;
use crate::sink::{Gauge, TelemetrySink};

/// Default history capacity: 300 samples.
pub const DEFAULT_CAPACITY: usize = 300;

/// Readings older than this are considered stale (device stopped pushing).
pub const STALE_THRESHOLD: Duration = Duration::from_secs(10);

/// Latest value and history for one gauge.
#[derive(Debug, Clone)]
struct GaugeState {
    latest: Option<f64>,
    history: ReadingHistory,
}

impl GaugeState {
    fn new(capacity: usize) -> Self {
        Self {
            latest: None,
            history: ReadingHistory::new(capacity),
        }
    }
}

/// Sensor telemetry shown on the panel.
///
/// Values are overwritten on every valid frame and never persisted. The
/// front-end reads from this struct after each routed frame. All methods are
/// synchronous.
#[derive(Debug, Clone)]
pub struct TelemetryState {
    temperature: GaugeState,
    humidity: GaugeState,
    last_received: Option<Instant>,
    frames: u64,
}

impl TelemetryState {
    /// State with the default history capacity (300 samples).
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// State with a custom per-gauge history capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            temperature: GaugeState::new(capacity),
            humidity: GaugeState::new(capacity),
            last_received: None,
            frames: 0,
        }
    }

    fn gauge(&self, gauge: Gauge) -> &GaugeState {
        match gauge {
            Gauge::Temperature => &self.temperature,
            Gauge::Humidity => &self.humidity,
        }
    }

    fn gauge_mut(&mut self, gauge: Gauge) -> &mut GaugeState {
        match gauge {
            Gauge::Temperature => &mut self.temperature,
            Gauge::Humidity => &mut self.humidity,
        }
    }

    /// Most recent reading for `gauge`, if any arrived.
    pub fn latest(&self, gauge: Gauge) -> Option<f64> {
        self.gauge(gauge).latest
    }

    pub fn history(&self, gauge: Gauge) -> &ReadingHistory {
        &self.gauge(gauge).history
    }

    /// Number of gauge refreshes applied so far.
    pub fn refresh_count(&self) -> u64 {
        self.frames
    }

    /// Whether readings are stale (nothing received recently).
    ///
    /// A state that never received anything is not stale, only empty.
    pub fn is_stale(&self) -> bool {
        self.is_stale_at(Instant::now())
    }

    fn is_stale_at(&self, now: Instant) -> bool {
        self.last_received
            .is_some_and(|t| now.saturating_duration_since(t) > STALE_THRESHOLD)
    }

    /// Drops all readings, e.g. when pointing the panel at another device.
    pub fn clear(&mut self) {
        for gauge in Gauge::ALL {
            let state = self.gauge_mut(gauge);
            state.latest = None;
            state.history.clear();
        }
        self.last_received = None;
        self.frames = 0;
    }
}

impl Default for TelemetryState {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetrySink for TelemetryState {
    fn refresh(&mut self, gauge: Gauge, value: f64) {
        let state = self.gauge_mut(gauge);
        state.latest = Some(value);
        state.history.record(value);
        self.last_received = Some(Instant::now());
        self.frames += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::MessageRouter;

    #[test]
    fn starts_empty() {
        let state = TelemetryState::new();

        assert_eq!(state.latest(Gauge::Temperature), None);
        assert_eq!(state.latest(Gauge::Humidity), None);
        assert_eq!(state.history(Gauge::Humidity).capacity(), DEFAULT_CAPACITY);
        assert!(!state.is_stale());
    }

    #[test]
    fn refresh_overwrites_latest_and_appends_history() {
        let mut state = TelemetryState::with_capacity(10);

        state.refresh(Gauge::Temperature, 24.0);
        state.refresh(Gauge::Temperature, 24.5);

        assert_eq!(state.latest(Gauge::Temperature), Some(24.5));
        assert_eq!(state.history(Gauge::Temperature).len(), 2);
        assert!(state.history(Gauge::Humidity).is_empty());
        assert_eq!(state.refresh_count(), 2);
    }

    #[test]
    fn routed_frames_feed_the_state() {
        let router = MessageRouter::new();
        let mut state = TelemetryState::with_capacity(10);

        router.route(&mut state, r#"{"temp": 30.1, "humi": 70}"#);
        router.route(&mut state, r#"{"humi": 71.5}"#);
        router.route(&mut state, "garbage");

        assert_eq!(state.latest(Gauge::Temperature), Some(30.1));
        assert_eq!(state.latest(Gauge::Humidity), Some(71.5));
        assert_eq!(state.history(Gauge::Temperature).len(), 1);
        assert_eq!(state.history(Gauge::Humidity).len(), 2);
    }

    #[test]
    fn stale_after_threshold() {
        let mut state = TelemetryState::new();
        state.refresh(Gauge::Humidity, 55.0);
        let received = state.last_received.unwrap();

        assert!(!state.is_stale_at(received + Duration::from_secs(9)));
        assert!(state.is_stale_at(received + STALE_THRESHOLD + Duration::from_millis(1)));
    }

    #[test]
    fn clear_resets_everything() {
        let mut state = TelemetryState::with_capacity(4);
        state.refresh(Gauge::Temperature, 18.0);
        state.refresh(Gauge::Humidity, 90.0);

        state.clear();

        assert_eq!(state.latest(Gauge::Temperature), None);
        assert!(state.history(Gauge::Humidity).is_empty());
        assert_eq!(state.refresh_count(), 0);
        assert!(!state.is_stale());
    }
}
