use rustfft::num_complex::Complex;
use serde::Serialize;

use super::fft::{magnitudes, FftError, FourierTransform, IterativeFft};
use crate::config::PassbandConfig;

/// Range of bins `[low, high)` searched for the dominant peak.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PassBand {
    pub low: usize,
    pub high: usize,
}

impl PassBand {
    /// Derive the passband for a window of `window_len` samples that took
    /// `meas_time` seconds to fill. Returns `None` when the band is empty.
    pub fn from_meas_time(meas_time: f64, window_len: usize, cfg: &PassbandConfig) -> Option<Self> {
        let nyquist = window_len / 2;
        let low = (cfg.low_factor * meas_time).max(cfg.min_low_bin as f64) as usize;
        let high = (cfg.high_factor * meas_time).min(nyquist as f64) as usize;

        if low >= high {
            return None;
        }
        Some(Self { low, high })
    }
}

/// Frequency-domain result for one completed window.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpectralEstimate {
    /// Peak bin index, i.e. cycles per window; 0 when no periodic motion was found.
    pub ds1: usize,
    /// Characteristic frequency in Hz (`ds1 / meas_time`).
    pub frequency: f64,
    /// Largest magnitude inside the passband.
    pub peak_magnitude: f64,
    pub peak_bin: Option<usize>,
    pub band: Option<PassBand>,
}

pub struct SpectralAnalyzer {
    engine: IterativeFft,
    passband: PassbandConfig,
    move_threshold: f64,
    scratch: Vec<Complex<f64>>,
    spectrum: Vec<f64>,
}

impl SpectralAnalyzer {
    pub fn new(window_len: usize, passband: PassbandConfig, move_threshold: f64) -> Self {
        Self {
            engine: IterativeFft,
            passband,
            move_threshold,
            scratch: Vec::with_capacity(window_len),
            spectrum: Vec::with_capacity(window_len),
        }
    }

    pub fn analyze(&mut self, samples: &[f64], meas_time: f64) -> Result<SpectralEstimate, FftError> {
        self.scratch.clear();
        self.scratch.extend(samples.iter().map(|&s| Complex::new(s, 0.0)));
        self.engine.forward(&mut self.scratch)?;
        magnitudes(&self.scratch, &mut self.spectrum);

        let Some(band) = PassBand::from_meas_time(meas_time, samples.len(), &self.passband) else {
            log::debug!(
                "Empty passband for meas_time={:.3}s, window={}",
                meas_time,
                samples.len()
            );
            return Ok(SpectralEstimate::default());
        };

        let (peak_bin, peak_magnitude) = find_peak(&self.spectrum, band);

        let mut estimate = SpectralEstimate {
            peak_magnitude,
            peak_bin: Some(peak_bin),
            band: Some(band),
            ..Default::default()
        };
        if peak_magnitude > self.move_threshold && meas_time > 0.0 {
            estimate.ds1 = peak_bin;
            estimate.frequency = peak_bin as f64 / meas_time;
        }
        Ok(estimate)
    }
}

/// First maximum within the band wins on ties.
fn find_peak(spectrum: &[f64], band: PassBand) -> (usize, f64) {
    spectrum[band.low..band.high]
        .iter()
        .enumerate()
        .fold((band.low, f64::NEG_INFINITY), |(best_bin, best), (i, &mag)| {
            if mag > best {
                (band.low + i, mag)
            } else {
                (best_bin, best)
            }
        })
}
