use anyhow::Result;
use std::f64::consts::PI;
use std::time::{Duration, Instant};

use super::{Sample, SampleSource};
use crate::config::SourceConfig;

pub const GRAVITY: f64 = 9.81;

/// Deterministic walking signal: gravity plus one half-wave pulse per step.
///
/// Optionally paced against the wall clock so the pipeline sees samples at
/// the configured rate instead of as fast as it can pull them.
pub struct SyntheticSource {
    sample_rate: f64,
    cadence: f64,
    amplitude: f64,
    idle_every: f64,
    idle_for: f64,
    limit: Option<u64>,
    emitted: u64,
    pace: Option<Instant>,
}

impl SyntheticSource {
    pub fn new(cfg: &SourceConfig) -> Self {
        let limit = if cfg.duration > 0.0 {
            Some((cfg.duration * cfg.sample_rate).round() as u64)
        } else {
            None
        };
        Self {
            sample_rate: cfg.sample_rate,
            cadence: cfg.cadence,
            amplitude: cfg.amplitude,
            idle_every: cfg.idle_every,
            idle_for: cfg.idle_for,
            limit,
            emitted: 0,
            pace: None,
        }
    }

    /// Sleep until each sample's timestamp has been reached.
    pub fn realtime(mut self) -> Self {
        self.pace = Some(Instant::now());
        self
    }

    fn is_idle(&self, t: f64) -> bool {
        self.idle_every > 0.0
            && self.idle_for > 0.0
            && t % self.idle_every >= self.idle_every - self.idle_for
    }

    fn magnitude_at(&self, t: f64) -> f64 {
        if self.is_idle(t) {
            return GRAVITY;
        }
        let swing = (2.0 * PI * self.cadence * t).sin().max(0.0);
        GRAVITY + self.amplitude * swing
    }
}

impl SampleSource for SyntheticSource {
    fn next_sample(&mut self) -> Result<Option<Sample>> {
        if self.limit.is_some_and(|limit| self.emitted >= limit) {
            return Ok(None);
        }

        let t = self.emitted as f64 / self.sample_rate;
        let timestamp = Duration::from_secs_f64(t);
        self.emitted += 1;

        if let Some(start) = self.pace {
            let due = start + timestamp;
            let now = Instant::now();
            if due > now {
                std::thread::sleep(due - now);
            }
        }

        let magnitude = self.magnitude_at(t);
        // Small lateral sway so the per-axis rows are not constant.
        let sway = 0.3 * (PI * self.cadence * t).sin();
        let vertical = (magnitude * magnitude - sway * sway).max(0.0).sqrt();
        Ok(Some(Sample {
            axes: Some([sway, 0.0, vertical]),
            magnitude,
            timestamp,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(cadence: f64, duration: f64) -> SourceConfig {
        SourceConfig {
            sample_rate: 64.0,
            cadence,
            amplitude: 4.0,
            duration,
            ..Default::default()
        }
    }

    #[test]
    fn stops_after_duration() {
        let mut source = SyntheticSource::new(&config(2.0, 2.0));
        let mut count = 0;
        let mut last = Duration::ZERO;
        while let Some(sample) = source.next_sample().unwrap() {
            assert!(sample.timestamp >= last);
            last = sample.timestamp;
            count += 1;
        }
        assert_eq!(count, 128);
        assert_eq!(last, Duration::from_secs_f64(127.0 / 64.0));
    }

    #[test]
    fn pulses_once_per_step() {
        let mut source = SyntheticSource::new(&config(2.0, 1.0));
        let mut peaks = Vec::new();
        while let Some(sample) = source.next_sample().unwrap() {
            peaks.push(sample.magnitude);
        }
        let max = peaks.iter().copied().fold(f64::MIN, f64::max);
        let min = peaks.iter().copied().fold(f64::MAX, f64::min);
        assert!((max - (GRAVITY + 4.0)).abs() < 1e-9);
        assert!((min - GRAVITY).abs() < 1e-9);
    }

    #[test]
    fn axes_agree_with_magnitude() {
        let mut source = SyntheticSource::new(&config(1.7, 1.0));
        while let Some(sample) = source.next_sample().unwrap() {
            let axes = sample.axes.unwrap();
            let norm = axes.iter().map(|a| a * a).sum::<f64>().sqrt();
            assert!((norm - sample.magnitude).abs() < 1e-9);
        }
    }

    #[test]
    fn idle_stretches_hold_gravity() {
        let cfg = SourceConfig {
            idle_every: 2.0,
            idle_for: 1.0,
            ..config(2.0, 4.0)
        };
        let source = SyntheticSource::new(&cfg);
        assert!(!source.is_idle(0.5));
        assert!(source.is_idle(1.5));
        assert!(!source.is_idle(2.5));
        assert_eq!(source.magnitude_at(1.125), GRAVITY);
    }

    #[test]
    fn zero_duration_never_ends() {
        let mut source = SyntheticSource::new(&config(2.0, 0.0));
        for _ in 0..10_000 {
            assert!(source.next_sample().unwrap().is_some());
        }
    }
}
