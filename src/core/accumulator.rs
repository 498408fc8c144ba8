//! Applies extractor output to the session's metric set.
//!
//! Activity counters are bumped by fixed steps and never decrease; derived
//! statistics are replaced outright. Every update is clamped to `[0, 100]`.

use crate::core::metrics::{Metric, MetricSet};

/// Owner of the current [`MetricSet`].
#[derive(Debug, Clone, Default)]
pub struct MetricAccumulator {
    metrics: MetricSet,
}

impl MetricAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increase a monotonic counter by `step`, saturating at 100.
    ///
    /// Negative steps are ignored. Returns `true` if the value changed.
    pub fn bump(&mut self, metric: Metric, step: f64) -> bool {
        debug_assert!(metric.is_monotonic(), "{metric} is not a counter");
        if step.is_nan() || step <= 0.0 {
            return false;
        }
        let before = self.metrics.get(metric);
        self.metrics.set(metric, before + step);
        self.metrics.get(metric) != before
    }

    /// Overwrite a recomputed metric. Returns `true` if the value changed.
    pub fn replace(&mut self, metric: Metric, value: f64) -> bool {
        debug_assert!(!metric.is_monotonic(), "{metric} only accepts bumps");
        let before = self.metrics.get(metric);
        self.metrics.set(metric, value);
        self.metrics.get(metric) != before
    }

    pub fn metrics(&self) -> &MetricSet {
        &self.metrics
    }

    pub fn snapshot(&self) -> MetricSet {
        self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bump_saturates() {
        let mut acc = MetricAccumulator::new();
        for _ in 0..40 {
            acc.bump(Metric::KeystrokeActivity, 3.0);
        }
        assert_eq!(acc.metrics().keystroke_activity, 100.0);
        assert!(!acc.bump(Metric::KeystrokeActivity, 3.0));
    }

    #[test]
    fn test_bump_never_decreases() {
        let mut acc = MetricAccumulator::new();
        acc.bump(Metric::ScrollActivity, 2.0);
        assert!(!acc.bump(Metric::ScrollActivity, -10.0));
        assert!(!acc.bump(Metric::ScrollActivity, f64::NAN));
        assert_eq!(acc.metrics().scroll_activity, 2.0);
    }

    #[test]
    fn test_replace_can_lower_derived_metric() {
        let mut acc = MetricAccumulator::new();
        assert!(acc.replace(Metric::PointerSpeedVariance, 80.0));
        assert!(acc.replace(Metric::PointerSpeedVariance, 12.5));
        assert_eq!(acc.metrics().pointer_speed_variance, 12.5);
    }
}
