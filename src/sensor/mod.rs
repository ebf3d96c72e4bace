pub mod replay;
pub mod synthetic;

use anyhow::Result;
use std::time::Duration;

/// One accelerometer reading.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    /// Per-axis acceleration, shown on the status display only. `None` when
    /// the source only reports a magnitude.
    pub axes: Option<[f64; 3]>,
    /// Acceleration magnitude fed to both estimators.
    pub magnitude: f64,
    /// Monotonic time since the source started.
    pub timestamp: Duration,
}

impl Sample {
    pub fn from_axes(axes: [f64; 3], timestamp: Duration) -> Self {
        let magnitude = axes.iter().map(|a| a * a).sum::<f64>().sqrt();
        Self {
            axes: Some(axes),
            magnitude,
            timestamp,
        }
    }

    /// A reading that only carries a pre-computed magnitude.
    pub fn from_magnitude(magnitude: f64, timestamp: Duration) -> Self {
        Self {
            axes: None,
            magnitude,
            timestamp,
        }
    }
}

/// Produces one sample per tick. `Ok(None)` ends the stream.
pub trait SampleSource {
    fn next_sample(&mut self) -> Result<Option<Sample>>;
}
