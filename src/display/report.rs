use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;

use crate::dsp::spectrum::PassBand;
use crate::pedometer::pipeline::WindowOutcome;
use crate::pedometer::reconcile::Verdict;

/// One line of the per-window JSON report.
#[derive(Debug, Serialize)]
pub struct WindowReport {
    pub index: u64,
    pub meas_time: f64,
    pub ds1: usize,
    pub ds2: usize,
    pub frequency: f64,
    pub peak_magnitude: f64,
    pub band: Option<PassBand>,
    pub added: usize,
    pub verdict: Verdict,
    pub steps: u64,
}

impl From<&WindowOutcome> for WindowReport {
    fn from(outcome: &WindowOutcome) -> Self {
        Self {
            index: outcome.index,
            meas_time: outcome.meas_time,
            ds1: outcome.estimate.ds1,
            ds2: outcome.ds2,
            frequency: outcome.estimate.frequency,
            peak_magnitude: outcome.estimate.peak_magnitude,
            band: outcome.estimate.band,
            added: outcome.reconciliation.added,
            verdict: outcome.reconciliation.verdict,
            steps: outcome.steps,
        }
    }
}

/// Writes newline-delimited JSON window reports.
pub struct ReportWriter<W: Write> {
    out: W,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn write(&mut self, outcome: &WindowOutcome) -> Result<()> {
        let report = WindowReport::from(outcome);
        serde_json::to_writer(&mut self.out, &report).context("Failed to encode window report")?;
        self.out
            .write_all(b"\n")
            .and_then(|_| self.out.flush())
            .context("Failed to write window report")
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}
