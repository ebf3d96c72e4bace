/// Rising-edge counter over the acceleration magnitude.
///
/// One count per crossing from below the threshold to at-or-above it. The
/// trigger state survives window boundaries; only the count is consumed.
#[derive(Debug)]
pub struct ThresholdCounter {
    threshold: f64,
    triggered: bool,
    count: usize,
}

impl ThresholdCounter {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            triggered: false,
            count: 0,
        }
    }

    /// Feed one sample. Returns `true` when it registered a new crossing.
    pub fn update(&mut self, magnitude: f64) -> bool {
        if !self.triggered && magnitude >= self.threshold {
            self.count += 1;
            self.triggered = true;
            return true;
        }
        if self.triggered && magnitude < self.threshold {
            self.triggered = false;
        }
        false
    }

    /// Crossings counted since the last `take`.
    pub fn pending(&self) -> usize {
        self.count
    }

    #[cfg(test)]
    pub fn is_triggered(&self) -> bool {
        self.triggered
    }

    /// Hand over the window's count and start a new one.
    pub fn take(&mut self) -> usize {
        std::mem::take(&mut self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_rising_edges_only() {
        let mut counter = ThresholdCounter::new(11.0);
        let stream = [9.0, 12.0, 13.0, 14.0, 10.0, 11.0, 11.0, 10.9, 12.0];
        let edges: Vec<bool> = stream.iter().map(|&m| counter.update(m)).collect();
        assert_eq!(
            edges,
            vec![false, true, false, false, false, true, false, false, true]
        );
        assert_eq!(counter.pending(), 3);
    }

    #[test]
    fn sustained_level_counts_once() {
        let mut counter = ThresholdCounter::new(11.0);
        for _ in 0..100 {
            counter.update(15.0);
        }
        assert_eq!(counter.pending(), 1);
        assert!(counter.is_triggered());
    }

    #[test]
    fn ten_oscillations_in_a_window() {
        let mut counter = ThresholdCounter::new(11.0);
        // 256 samples, ten of them dipping to the threshold after a low sample.
        for i in 0..256 {
            let m = if i < 20 && i % 2 == 1 { 11.0 } else { 10.0 };
            counter.update(m);
        }
        assert_eq!(counter.take(), 10);
        assert_eq!(counter.pending(), 0);
    }

    #[test]
    fn trigger_survives_take() {
        let mut counter = ThresholdCounter::new(11.0);
        counter.update(12.0);
        assert_eq!(counter.take(), 1);
        assert!(counter.is_triggered());
        // Still above: no new edge in the next window.
        assert!(!counter.update(12.5));
        assert_eq!(counter.pending(), 0);
        counter.update(9.0);
        assert!(counter.update(12.0));
    }
}
