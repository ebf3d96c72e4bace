use serde::Serialize;

use crate::dsp::spectrum::SpectralEstimate;

/// Which branch of the reconciliation policy a window took.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Both estimators agree; the spectral count is trusted.
    Periodic,
    /// No spectral estimate, or fewer threshold crossings than spectral
    /// cycles; the crossing count is used.
    Aperiodic,
    /// The estimators disagree with `ds2 >= ds1`; nothing is counted.
    Ambiguous,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reconciliation {
    pub added: usize,
    pub verdict: Verdict,
}

/// Combine the spectral estimate `ds1` and crossing count `ds2` for one window.
///
/// `ds1 == 0` means no periodic motion was found, so the window is judged
/// aperiodic without computing a relative spread.
pub fn decide(ds1: usize, ds2: usize, agreement: f64) -> Reconciliation {
    if ds1 != 0 {
        let spread = ds1.abs_diff(ds2) as f64 / ds1 as f64;
        if spread < agreement {
            return Reconciliation {
                added: ds1,
                verdict: Verdict::Periodic,
            };
        }
    }
    if ds1 == 0 || ds2 < ds1 {
        Reconciliation {
            added: ds2,
            verdict: Verdict::Aperiodic,
        }
    } else {
        Reconciliation {
            added: 0,
            verdict: Verdict::Ambiguous,
        }
    }
}

/// Pedometer state carried across windows.
#[derive(Debug, Default)]
pub struct StepState {
    steps: u64,
    windows: u64,
    last: SpectralEstimate,
}

impl StepState {
    /// Apply one window's estimates. The step count only ever grows.
    pub fn reconcile(
        &mut self,
        estimate: SpectralEstimate,
        ds2: usize,
        agreement: f64,
    ) -> Reconciliation {
        let outcome = decide(estimate.ds1, ds2, agreement);
        self.steps = self.steps.saturating_add(outcome.added as u64);
        self.windows += 1;
        self.last = estimate;
        outcome
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn windows(&self) -> u64 {
        self.windows
    }

    /// Estimate from the most recent window, kept for display.
    pub fn last_estimate(&self) -> &SpectralEstimate {
        &self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimate(ds1: usize) -> SpectralEstimate {
        SpectralEstimate {
            ds1,
            frequency: ds1 as f64 / 5.0,
            peak_magnitude: 120.0,
            ..Default::default()
        }
    }

    #[test]
    fn agreeing_estimators_trust_spectrum() {
        assert_eq!(
            decide(20, 19, 0.1),
            Reconciliation { added: 20, verdict: Verdict::Periodic }
        );
        assert_eq!(decide(20, 21, 0.1).added, 20);
        assert_eq!(decide(10, 10, 0.1).added, 10);
    }

    #[test]
    fn agreement_bound_is_exclusive() {
        // |20 - 18| / 20 = 0.1 is not below 0.1
        assert_eq!(
            decide(20, 18, 0.1),
            Reconciliation { added: 18, verdict: Verdict::Aperiodic }
        );
    }

    #[test]
    fn no_spectral_estimate_falls_back_to_crossings() {
        assert_eq!(
            decide(0, 5, 0.1),
            Reconciliation { added: 5, verdict: Verdict::Aperiodic }
        );
        assert_eq!(
            decide(0, 0, 0.1),
            Reconciliation { added: 0, verdict: Verdict::Aperiodic }
        );
    }

    #[test]
    fn fewer_crossings_use_crossings() {
        assert_eq!(
            decide(20, 5, 0.1),
            Reconciliation { added: 5, verdict: Verdict::Aperiodic }
        );
    }

    #[test]
    fn more_crossings_add_nothing() {
        assert_eq!(
            decide(20, 25, 0.1),
            Reconciliation { added: 0, verdict: Verdict::Ambiguous }
        );
    }

    #[test]
    fn state_accumulates_and_keeps_last_estimate() {
        let mut state = StepState::default();
        state.reconcile(estimate(20), 19, 0.1);
        state.reconcile(estimate(20), 25, 0.1);
        state.reconcile(estimate(9), 3, 0.1);
        assert_eq!(state.steps(), 23);
        assert_eq!(state.windows(), 3);
        assert_eq!(state.last_estimate().ds1, 9);
    }

    #[test]
    fn steps_never_decrease() {
        let mut state = StepState::default();
        let mut previous = 0;
        for ds1 in 0..40 {
            for ds2 in 0..40 {
                state.reconcile(estimate(ds1), ds2, 0.1);
                assert!(state.steps() >= previous);
                previous = state.steps();
            }
        }
    }
}
