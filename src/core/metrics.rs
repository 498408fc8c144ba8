//! The eight named sub-scores that make up a trust assessment.

use serde::{Deserialize, Serialize};

/// Lower bound of every metric.
pub const METRIC_MIN: f64 = 0.0;
/// Upper bound of every metric.
pub const METRIC_MAX: f64 = 100.0;

/// One of the fixed metrics tracked per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    PointerActivity,
    PointerSpeedVariance,
    ClickPatternRegularity,
    KeystrokeActivity,
    SessionDuration,
    ScrollActivity,
    TouchActivity,
    DeviceMotion,
}

impl Metric {
    pub const ALL: [Metric; 8] = [
        Metric::PointerActivity,
        Metric::PointerSpeedVariance,
        Metric::ClickPatternRegularity,
        Metric::KeystrokeActivity,
        Metric::SessionDuration,
        Metric::ScrollActivity,
        Metric::TouchActivity,
        Metric::DeviceMotion,
    ];

    /// Stable display name.
    pub fn name(&self) -> &'static str {
        match self {
            Metric::PointerActivity => "pointerActivity",
            Metric::PointerSpeedVariance => "pointerSpeedVariance",
            Metric::ClickPatternRegularity => "clickPatternRegularity",
            Metric::KeystrokeActivity => "keystrokeActivity",
            Metric::SessionDuration => "sessionDuration",
            Metric::ScrollActivity => "scrollActivity",
            Metric::TouchActivity => "touchActivity",
            Metric::DeviceMotion => "deviceMotion",
        }
    }

    /// Weight of this metric in the trust score. Weights sum to 1.0.
    pub fn weight(&self) -> f64 {
        match self {
            Metric::PointerActivity => 0.20,
            Metric::PointerSpeedVariance => 0.15,
            Metric::ClickPatternRegularity => 0.15,
            Metric::KeystrokeActivity => 0.15,
            Metric::SessionDuration => 0.10,
            Metric::ScrollActivity => 0.10,
            Metric::TouchActivity => 0.10,
            // No capture path feeds device motion; it stays 0 and its weight
            // is deliberately left in place.
            Metric::DeviceMotion => 0.05,
        }
    }

    /// Activity counters only ever grow within a session.
    pub fn is_monotonic(&self) -> bool {
        matches!(
            self,
            Metric::PointerActivity
                | Metric::KeystrokeActivity
                | Metric::ScrollActivity
                | Metric::TouchActivity
        )
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Current value of every metric, each in `[0, 100]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSet {
    pub pointer_activity: f64,
    pub pointer_speed_variance: f64,
    pub click_pattern_regularity: f64,
    pub keystroke_activity: f64,
    pub session_duration: f64,
    pub scroll_activity: f64,
    pub touch_activity: f64,
    pub device_motion: f64,
}

impl MetricSet {
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::PointerActivity => self.pointer_activity,
            Metric::PointerSpeedVariance => self.pointer_speed_variance,
            Metric::ClickPatternRegularity => self.click_pattern_regularity,
            Metric::KeystrokeActivity => self.keystroke_activity,
            Metric::SessionDuration => self.session_duration,
            Metric::ScrollActivity => self.scroll_activity,
            Metric::TouchActivity => self.touch_activity,
            Metric::DeviceMotion => self.device_motion,
        }
    }

    fn slot(&mut self, metric: Metric) -> &mut f64 {
        match metric {
            Metric::PointerActivity => &mut self.pointer_activity,
            Metric::PointerSpeedVariance => &mut self.pointer_speed_variance,
            Metric::ClickPatternRegularity => &mut self.click_pattern_regularity,
            Metric::KeystrokeActivity => &mut self.keystroke_activity,
            Metric::SessionDuration => &mut self.session_duration,
            Metric::ScrollActivity => &mut self.scroll_activity,
            Metric::TouchActivity => &mut self.touch_activity,
            Metric::DeviceMotion => &mut self.device_motion,
        }
    }

    /// Store a value, clamped to `[0, 100]`. Non-finite input stores 0.
    pub(crate) fn set(&mut self, metric: Metric, value: f64) {
        *self.slot(metric) = clamp_metric(value);
    }

    /// Iterate `(metric, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        Metric::ALL.iter().map(move |&m| (m, self.get(m)))
    }
}

/// Clamp a raw metric value into range.
pub fn clamp_metric(value: f64) -> f64 {
    if value.is_nan() {
        return METRIC_MIN;
    }
    value.clamp(METRIC_MIN, METRIC_MAX)
}
