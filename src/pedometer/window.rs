use std::time::Duration;

/// Fixed-capacity buffer of magnitude samples, analyzed once it is full.
///
/// The backing storage is allocated once and overwritten window after window;
/// `reset` only rewinds the write position.
pub struct SampleWindow {
    samples: Vec<f64>,
    filled: usize,
    started_at: Duration,
}

impl SampleWindow {
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity.is_power_of_two());
        Self {
            samples: vec![0.0; capacity],
            filled: 0,
            started_at: Duration::ZERO,
        }
    }

    /// Append a sample. Returns `true` when this sample completed the window.
    /// A full window refuses further samples until it is reset.
    pub fn push(&mut self, value: f64) -> bool {
        if self.is_full() {
            return false;
        }
        self.samples[self.filled] = value;
        self.filled += 1;
        self.is_full()
    }

    pub fn is_full(&self) -> bool {
        self.filled == self.samples.len()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.filled
    }

    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Samples accepted so far, oldest first.
    pub fn samples(&self) -> &[f64] {
        &self.samples[..self.filled]
    }

    pub fn started_at(&self) -> Duration {
        self.started_at
    }

    /// Time spent filling the window so far, measured against `now`.
    pub fn elapsed(&self, now: Duration) -> Duration {
        now.saturating_sub(self.started_at)
    }

    /// Begin a new window starting at `now`.
    pub fn reset(&mut self, now: Duration) {
        self.filled = 0;
        self.started_at = now;
    }
}
