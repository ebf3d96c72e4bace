use anyhow::Result;
use std::time::Duration;

use super::reconcile::{Reconciliation, StepState};
use super::threshold::ThresholdCounter;
use super::window::SampleWindow;
use crate::config::{Config, ConfigError};
use crate::display::{
    StatusSink, ROW_ACC_X, ROW_ACC_Y, ROW_ACC_Z, ROW_ESTIMATES, ROW_PEAK, ROW_STEPS,
};
use crate::dsp::spectrum::{SpectralAnalyzer, SpectralEstimate};
use crate::sensor::{Sample, SampleSource};

/// Everything decided when a window completed.
#[derive(Clone, Debug)]
pub struct WindowOutcome {
    /// 1-based window number.
    pub index: u64,
    /// Seconds it took to fill the window.
    pub meas_time: f64,
    pub estimate: SpectralEstimate,
    pub ds2: usize,
    pub reconciliation: Reconciliation,
    /// Cumulative steps after this window.
    pub steps: u64,
}

#[derive(Clone, Copy, Debug)]
pub struct RunSummary {
    pub ticks: u64,
    pub windows: u64,
    pub steps: u64,
    pub elapsed: Duration,
}

/// The step counting pipeline. Owns the window, both estimators and the
/// cumulative state; driven one sample at a time.
pub struct Pedometer {
    window: SampleWindow,
    crossings: ThresholdCounter,
    analyzer: SpectralAnalyzer,
    state: StepState,
    agreement: f64,
    refresh_ticks: u64,
    ticks: u64,
    last_sample: Option<Sample>,
}

impl Pedometer {
    pub fn new(cfg: &Config) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let n = cfg.window.size;
        Ok(Self {
            window: SampleWindow::new(n),
            crossings: ThresholdCounter::new(cfg.thresholds.acceleration),
            analyzer: SpectralAnalyzer::new(n, cfg.passband.clone(), cfg.thresholds.movement),
            state: StepState::default(),
            agreement: cfg.reconcile.agreement,
            refresh_ticks: cfg.display.refresh_ticks,
            ticks: 0,
            last_sample: None,
        })
    }

    pub fn steps(&self) -> u64 {
        self.state.steps()
    }

    /// Feed one sample. Returns the outcome when it completed a window.
    ///
    /// A window's `meas_time` runs from the last sample of the previous window
    /// to the sample that fills it, so it spans N sample intervals. The first
    /// window has no predecessor and is timed from its own first sample, so it
    /// spans N - 1 intervals and reads slightly short.
    pub fn tick(&mut self, sample: &Sample) -> Option<WindowOutcome> {
        if self.last_sample.is_none() {
            // The first window is timed from the first reading.
            self.window.reset(sample.timestamp);
        }
        self.ticks += 1;
        self.last_sample = Some(*sample);

        let full = self.window.push(sample.magnitude);
        self.crossings.update(sample.magnitude);
        if !full {
            return None;
        }
        Some(self.complete_window(sample.timestamp))
    }

    fn complete_window(&mut self, now: Duration) -> WindowOutcome {
        let started = self.window.started_at();
        let meas_time = self.window.elapsed(now).as_secs_f64();
        let estimate = match self.analyzer.analyze(self.window.samples(), meas_time) {
            Ok(estimate) => estimate,
            Err(err) => {
                log::warn!("Spectral analysis skipped: {}", err);
                SpectralEstimate::default()
            }
        };

        let ds2 = self.crossings.take();
        let reconciliation = self.state.reconcile(estimate, ds2, self.agreement);
        self.window.reset(now);

        let outcome = WindowOutcome {
            index: self.state.windows(),
            meas_time,
            estimate,
            ds2,
            reconciliation,
            steps: self.state.steps(),
        };
        log::debug!(
            "Window {} at {:.2}s: {:.2}s, ds=({}, {}), f={:.2}Hz, maxv={:.1}, {:?} +{} -> {} steps",
            outcome.index,
            started.as_secs_f64(),
            meas_time,
            estimate.ds1,
            ds2,
            estimate.frequency,
            estimate.peak_magnitude,
            reconciliation.verdict,
            reconciliation.added,
            outcome.steps
        );
        outcome
    }

    /// Draw the status rows: last reading, estimates, peak and step count.
    ///
    /// The estimates row pairs `ds1` of the last completed window with the
    /// crossings counted so far in the window being filled, not the `ds2`
    /// that was reconciled. Right after a window completes it reads
    /// `(ds1, 0)`. Axis rows read `n/a` for magnitude-only sources.
    pub fn render<D: StatusSink + ?Sized>(&self, sink: &mut D) -> Result<()> {
        let axes = self.last_sample.and_then(|s| s.axes);
        let last = self.state.last_estimate();

        sink.clear();
        sink.draw_line(ROW_ACC_X, &axis_line('x', axes.map(|a| a[0])));
        sink.draw_line(ROW_ACC_Y, &axis_line('y', axes.map(|a| a[1])));
        sink.draw_line(ROW_ACC_Z, &axis_line('z', axes.map(|a| a[2])));
        sink.draw_line(
            ROW_ESTIMATES,
            &format!("ds = ({}, {})", last.ds1, self.crossings.pending()),
        );
        sink.draw_line(ROW_PEAK, &format!("maxv = {:.1}", last.peak_magnitude));
        sink.draw_line(ROW_STEPS, &format!("steps = {}", self.state.steps()));
        sink.present()
    }

    /// Pull samples until the source ends, refreshing the display every
    /// `refresh_ticks` ticks and after every window.
    pub fn run<S, D, F>(
        &mut self,
        source: &mut S,
        display: &mut D,
        mut on_window: F,
    ) -> Result<RunSummary>
    where
        S: SampleSource + ?Sized,
        D: StatusSink + ?Sized,
        F: FnMut(&WindowOutcome) -> Result<()>,
    {
        let mut first = None;
        while let Some(sample) = source.next_sample()? {
            first.get_or_insert(sample.timestamp);

            let outcome = self.tick(&sample);
            if let Some(ref outcome) = outcome {
                on_window(outcome)?;
            }
            if outcome.is_some() || self.ticks % self.refresh_ticks == 0 {
                self.render(display)?;
            }
        }

        let elapsed = match (first, self.last_sample) {
            (Some(start), Some(last)) => last.timestamp.saturating_sub(start),
            _ => Duration::ZERO,
        };
        Ok(RunSummary {
            ticks: self.ticks,
            windows: self.state.windows(),
            steps: self.state.steps(),
            elapsed,
        })
    }
}

fn axis_line(axis: char, value: Option<f64>) -> String {
    match value {
        Some(v) => format!("Acc. {} = {:.2}", axis, v),
        None => format!("Acc. {} = n/a", axis),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;
    use crate::pedometer::reconcile::Verdict;
    use crate::sensor::synthetic::SyntheticSource;

    #[derive(Default)]
    struct Recorder {
        rows: Vec<(u32, String)>,
        frames: usize,
    }

    impl StatusSink for Recorder {
        fn clear(&mut self) {
            self.rows.clear();
        }

        fn draw_line(&mut self, row: u32, text: &str) {
            self.rows.push((row, text.to_string()));
        }

        fn present(&mut self) -> Result<()> {
            self.frames += 1;
            Ok(())
        }
    }

    fn sample(i: u64, magnitude: f64) -> Sample {
        Sample::from_magnitude(magnitude, Duration::from_millis(20 * i))
    }

    fn walker(cadence: f64, amplitude: f64, seconds: f64) -> SyntheticSource {
        SyntheticSource::new(&SourceConfig {
            sample_rate: 64.0,
            cadence,
            amplitude,
            duration: seconds,
            ..Default::default()
        })
    }

    #[test]
    fn analysis_fires_once_per_full_window() {
        let mut pedometer = Pedometer::new(&Config::default()).unwrap();
        let mut completed = Vec::new();
        for i in 0..(3 * 256 - 1) {
            if pedometer.tick(&sample(i, 9.81)).is_some() {
                completed.push(i + 1);
            }
        }
        assert_eq!(completed, vec![256, 512]);
    }

    #[test]
    fn counts_steady_walk() {
        let mut pedometer = Pedometer::new(&Config::default()).unwrap();
        let mut outcomes = Vec::new();
        let summary = pedometer
            .run(&mut walker(2.0, 4.0, 16.0), &mut Recorder::default(), |o| {
                outcomes.push(o.clone());
                Ok(())
            })
            .unwrap();

        assert_eq!(summary.ticks, 1024);
        assert_eq!(summary.windows, 4);
        assert_eq!(summary.steps, 32);
        for outcome in &outcomes {
            assert_eq!(outcome.estimate.ds1, 8);
            assert_eq!(outcome.ds2, 8);
            assert_eq!(outcome.reconciliation.verdict, Verdict::Periodic);
            assert!((outcome.estimate.frequency - 2.0).abs() < 0.05);
        }
        assert_eq!(outcomes.last().unwrap().meas_time, 4.0);
    }

    #[test]
    fn standing_still_counts_nothing() {
        let mut pedometer = Pedometer::new(&Config::default()).unwrap();
        let summary = pedometer
            .run(&mut walker(2.0, 0.0, 16.0), &mut Recorder::default(), |o| {
                assert_eq!(o.estimate.ds1, 0);
                assert_eq!(o.ds2, 0);
                Ok(())
            })
            .unwrap();
        assert_eq!(summary.windows, 4);
        assert_eq!(summary.steps, 0);
    }

    #[test]
    fn ten_crossings_reach_the_reconciler() {
        let mut pedometer = Pedometer::new(&Config::default()).unwrap();
        let mut outcome = None;
        for i in 0..256 {
            let m = if i < 20 && i % 2 == 1 { 11.0 } else { 10.0 };
            outcome = pedometer.tick(&sample(i, m));
        }
        let outcome = outcome.unwrap();
        assert_eq!(outcome.ds2, 10);
        assert_eq!(pedometer.crossings.pending(), 0);
        assert_eq!(pedometer.steps(), outcome.reconciliation.added as u64);
    }

    #[test]
    fn steps_never_decrease_over_noisy_input() {
        let mut pedometer = Pedometer::new(&Config::default()).unwrap();
        let mut previous = 0;
        for i in 0..4096u64 {
            // Deterministic pseudo-noise spanning the threshold.
            let m = 8.0 + ((i * 7919) % 61) as f64 / 10.0;
            pedometer.tick(&sample(i, m));
            assert!(pedometer.steps() >= previous);
            previous = pedometer.steps();
        }
    }

    #[test]
    fn renders_status_rows() {
        let mut pedometer = Pedometer::new(&Config::default()).unwrap();
        let mut recorder = Recorder::default();
        pedometer.run(&mut walker(2.0, 4.0, 4.0), &mut recorder, |_| Ok(())).unwrap();

        // 256 ticks: every 25th tick plus the completed window.
        assert_eq!(recorder.frames, 10 + 1);
        let rows: Vec<u32> = recorder.rows.iter().map(|(r, _)| *r).collect();
        assert_eq!(rows, vec![0, 10, 20, 30, 40, 50]);
        assert_eq!(recorder.rows[3].1, "ds = (8, 0)");
        assert_eq!(recorder.rows[5].1, "steps = 8");
        assert!(recorder.rows[0].1.starts_with("Acc. x = "));
    }

    #[test]
    fn magnitude_only_input_renders_no_axes() {
        let mut pedometer = Pedometer::new(&Config::default()).unwrap();
        let mut recorder = Recorder::default();
        pedometer.tick(&sample(0, 10.2));
        pedometer.render(&mut recorder).unwrap();
        assert_eq!(recorder.rows[0].1, "Acc. x = n/a");
        assert_eq!(recorder.rows[2].1, "Acc. z = n/a");

        pedometer.tick(&Sample::from_axes([0.5, -1.25, 9.8], Duration::from_millis(20)));
        pedometer.render(&mut recorder).unwrap();
        assert_eq!(recorder.rows[0].1, "Acc. x = 0.50");
        assert_eq!(recorder.rows[1].1, "Acc. y = -1.25");
        assert_eq!(recorder.rows[2].1, "Acc. z = 9.80");
    }

    #[test]
    fn first_window_is_one_interval_short() {
        let mut pedometer = Pedometer::new(&Config::default()).unwrap();
        let meas_times: Vec<f64> = (0..512)
            .filter_map(|i| pedometer.tick(&sample(i, 9.81)))
            .map(|o| o.meas_time)
            .collect();
        assert_eq!(meas_times.len(), 2);
        // 50 Hz: 255 intervals, then 256.
        assert!((meas_times[0] - 5.10).abs() < 1e-9);
        assert!((meas_times[1] - 5.12).abs() < 1e-9);
    }

    #[test]
    fn rejects_invalid_config() {
        let mut cfg = Config::default();
        cfg.window.size = 100;
        assert!(matches!(Pedometer::new(&cfg), Err(ConfigError::WindowSize(100))));
    }
}
