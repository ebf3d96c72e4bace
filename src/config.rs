use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    #[serde(default)]
    pub passband: PassbandConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub source: SourceConfig,
}

#[derive(Debug, Deserialize)]
pub struct WindowConfig {
    /// Samples per analysis window; must be a power of two.
    #[serde(default = "default_window_size")]
    pub size: usize,
}

#[derive(Debug, Deserialize)]
pub struct ThresholdConfig {
    /// Time-domain trigger level on the acceleration magnitude.
    #[serde(default = "default_acceleration")]
    pub acceleration: f64,
    /// Minimum spectral peak magnitude for a frequency-domain estimate.
    #[serde(default = "default_movement")]
    pub movement: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PassbandConfig {
    #[serde(default = "default_low_factor")]
    pub low_factor: f64,
    #[serde(default = "default_high_factor")]
    pub high_factor: f64,
    #[serde(default = "default_min_low_bin")]
    pub min_low_bin: usize,
}

#[derive(Debug, Deserialize)]
pub struct ReconcileConfig {
    /// Relative difference under which both estimators are considered to agree.
    #[serde(default = "default_agreement")]
    pub agreement: f64,
}

#[derive(Debug, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_refresh_ticks")]
    pub refresh_ticks: u64,
}

#[derive(Debug, Deserialize)]
pub struct SourceConfig {
    /// Multiplier applied to replayed readings (raw counts to m/s²).
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f64,
    #[serde(default = "default_cadence")]
    pub cadence: f64,
    #[serde(default = "default_amplitude")]
    pub amplitude: f64,
    /// Synthetic run length in seconds; 0 runs until interrupted.
    #[serde(default = "default_duration")]
    pub duration: f64,
    #[serde(default)]
    pub idle_every: f64,
    #[serde(default)]
    pub idle_for: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            size: default_window_size(),
        }
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            acceleration: default_acceleration(),
            movement: default_movement(),
        }
    }
}

impl Default for PassbandConfig {
    fn default() -> Self {
        Self {
            low_factor: default_low_factor(),
            high_factor: default_high_factor(),
            min_low_bin: default_min_low_bin(),
        }
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            agreement: default_agreement(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            refresh_ticks: default_refresh_ticks(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            sample_rate: default_sample_rate(),
            cadence: default_cadence(),
            amplitude: default_amplitude(),
            duration: default_duration(),
            idle_every: 0.0,
            idle_for: 0.0,
        }
    }
}

fn default_window_size() -> usize { 256 }
fn default_acceleration() -> f64 { 11.0 }
fn default_movement() -> f64 { 50.0 }
fn default_low_factor() -> f64 { 0.5 }
fn default_high_factor() -> f64 { 10.0 }
fn default_min_low_bin() -> usize { 2 }
fn default_agreement() -> f64 { 0.1 }
fn default_refresh_ticks() -> u64 { 25 }
fn default_scale() -> f64 { 1.0 }
fn default_sample_rate() -> f64 { 50.0 }
fn default_cadence() -> f64 { 1.8 }
fn default_amplitude() -> f64 { 4.0 }
fn default_duration() -> f64 { 60.0 }

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("window size {0} must be a power of two of at least 8")]
    WindowSize(usize),
    #[error("{name} must be a finite, non-negative number (got {value})")]
    Threshold { name: &'static str, value: f64 },
    #[error("passband {0}")]
    Passband(&'static str),
    #[error("agreement tolerance must lie in (0, 1] (got {0})")]
    Agreement(f64),
    #[error("display refresh interval must be at least one tick")]
    Refresh,
    #[error("source {name} must be a finite, positive number (got {value})")]
    Source { name: &'static str, value: f64 },
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let n = self.window.size;
        if n < 8 || !n.is_power_of_two() {
            return Err(ConfigError::WindowSize(n));
        }

        for (name, value) in [
            ("acceleration threshold", self.thresholds.acceleration),
            ("movement threshold", self.thresholds.movement),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Threshold { name, value });
            }
        }

        let band = &self.passband;
        if !(band.low_factor.is_finite() && band.low_factor >= 0.0) {
            return Err(ConfigError::Passband("low factor must be finite and non-negative"));
        }
        if !(band.high_factor.is_finite() && band.high_factor > band.low_factor) {
            return Err(ConfigError::Passband("high factor must exceed the low factor"));
        }
        if band.min_low_bin < 2 || band.min_low_bin >= n / 2 {
            return Err(ConfigError::Passband("minimum low bin must lie in [2, N/2)"));
        }

        let agreement = self.reconcile.agreement;
        if !(agreement > 0.0 && agreement <= 1.0) {
            return Err(ConfigError::Agreement(agreement));
        }

        if self.display.refresh_ticks == 0 {
            return Err(ConfigError::Refresh);
        }

        let src = &self.source;
        for (name, value) in [
            ("scale", src.scale),
            ("sample rate", src.sample_rate),
            ("cadence", src.cadence),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Source { name, value });
            }
        }
        for (name, value) in [
            ("amplitude", src.amplitude),
            ("duration", src.duration),
            ("idle interval", src.idle_every),
            ("idle length", src.idle_for),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Source { name, value });
            }
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse config: {}", path.display()))
}
