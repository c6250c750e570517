use std::collections::VecDeque;

/// Bounded history of one gauge's readings, oldest first.
///
/// Once `capacity` readings are held, each new one evicts the oldest.
#[derive(Debug, Clone)]
pub struct ReadingHistory {
    readings: VecDeque<f64>,
    capacity: usize,
}

impl ReadingHistory {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "history capacity must be > 0");
        Self {
            readings: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, value: f64) {
        if self.readings.len() == self.capacity {
            self.readings.pop_front();
        }
        self.readings.push_back(value);
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.readings.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.readings.clear();
    }

    /// Lowest and highest reading held, ignoring NaN.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.iter()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}
