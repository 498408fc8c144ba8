//! Weighted aggregation of the metric set into a single trust score.

use crate::core::metrics::{Metric, MetricSet};
use serde::{Deserialize, Serialize};

/// Weighted sum of a [`MetricSet`], in `[0, 100]`.
///
/// Carries no state of its own; it is recomputed from scratch whenever the
/// metric set changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrustScore(f64);

impl TrustScore {
    pub fn compute(metrics: &MetricSet) -> Self {
        let score: f64 = metrics.iter().map(|(m, v)| m.weight() * v).sum();
        Self(score.clamp(0.0, 100.0))
    }

    /// Unrounded score, used for threshold comparisons.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Score rounded to the nearest integer, for display.
    pub fn rounded(&self) -> u8 {
        self.0.round() as u8
    }

    /// Contribution of each metric to the score.
    pub fn breakdown(metrics: &MetricSet) -> Vec<(Metric, f64)> {
        metrics.iter().map(|(m, v)| (m, m.weight() * v)).collect()
    }
}

impl std::fmt::Display for TrustScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.rounded())
    }
}
