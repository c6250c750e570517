//! The gauges the panel draws and the trait that receives their updates.

use std::fmt;

/// One of the two sensor gauges on the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gauge {
    Temperature,
    Humidity,
}

impl Gauge {
    pub const ALL: [Gauge; 2] = [Gauge::Temperature, Gauge::Humidity];

    /// Display range and unit for this gauge.
    pub fn spec(self) -> GaugeSpec {
        match self {
            Gauge::Temperature => GaugeSpec {
                min: -10.0,
                max: 50.0,
                unit: "°C",
            },
            Gauge::Humidity => GaugeSpec {
                min: 0.0,
                max: 100.0,
                unit: "%",
            },
        }
    }

    /// Wire field that feeds this gauge.
    pub fn field(self) -> &'static str {
        match self {
            Gauge::Temperature => "temp",
            Gauge::Humidity => "humi",
        }
    }
}

impl fmt::Display for Gauge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gauge::Temperature => f.write_str("temperature"),
            Gauge::Humidity => f.write_str("humidity"),
        }
    }
}

/// Fixed display range of a gauge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaugeSpec {
    pub min: f64,
    pub max: f64,
    pub unit: &'static str,
}

impl GaugeSpec {
    /// Position of `value` within the range, clamped to `0.0..=1.0`.
    ///
    /// Out-of-range readings pin the needle to the nearest end.
    pub fn fraction(&self, value: f64) -> f64 {
        if value.is_nan() {
            return 0.0;
        }
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

/// Receives gauge refreshes from the [`MessageRouter`](crate::MessageRouter).
pub trait TelemetrySink {
    fn refresh(&mut self, gauge: Gauge, value: f64);
}

impl<T: TelemetrySink + ?Sized> TelemetrySink for &mut T {
    fn refresh(&mut self, gauge: Gauge, value: f64) {
        (**self).refresh(gauge, value);
    }
}
