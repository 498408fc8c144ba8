//! Metric extraction from buffered samples.
//!
//! Every extractor is a pure function of a buffer snapshot. Extractors that
//! need a minimum number of samples return `None` below it, which means
//! "leave the metric unchanged". Sparse or degenerate input never errors.

use crate::collector::types::Sample;
use chrono::{DateTime, Duration, Utc};
use statrs::statistics::Statistics;

/// Pointer samples considered by the speed extractor.
pub const POINTER_SPEED_WINDOW: usize = 10;
/// Minimum pointer samples before speed (and pointer activity) update.
pub const MIN_POINTER_SAMPLES: usize = 2;
/// Minimum click timestamps before the interval variance is computed.
pub const MIN_CLICK_SAMPLES: usize = 3;

/// Pointer activity step per qualifying move.
pub const POINTER_ACTIVITY_STEP: f64 = 0.5;
/// Keystroke activity step per key-down.
pub const KEYSTROKE_STEP: f64 = 3.0;
/// Scroll activity step per scroll.
pub const SCROLL_STEP: f64 = 2.0;
/// Touch activity step per touch-start.
pub const TOUCH_STEP: f64 = 5.0;

/// Mean pointer speed (px/ms) is scaled by this into the metric range.
const POINTER_SPEED_SCALE: f64 = 10.0;
/// Click interval variance (ms²) is divided by this.
const CLICK_VARIANCE_DIVISOR: f64 = 100.0;
/// Elapsed seconds are scaled by this; saturates after 20 seconds.
const SESSION_DURATION_SCALE: f64 = 5.0;
/// Intervals shorter than this (including zero and negative) are raised to it.
const MIN_INTERVAL_MS: f64 = 1.0;

/// Average recent pointer speed, scaled to `[0, 100]`.
///
/// Uses the last [`POINTER_SPEED_WINDOW`] samples. This measures how fast the
/// pointer has been moving, not how smoothly.
pub fn pointer_speed_score(samples: &[Sample]) -> Option<f64> {
    if samples.len() < MIN_POINTER_SAMPLES {
        return None;
    }
    let recent = &samples[samples.len().saturating_sub(POINTER_SPEED_WINDOW)..];

    let speeds: Vec<f64> = recent
        .windows(2)
        .map(|pair| {
            let dx = pair[1].x.unwrap_or(0.0) - pair[0].x.unwrap_or(0.0);
            let dy = pair[1].y.unwrap_or(0.0) - pair[0].y.unwrap_or(0.0);
            let dt = interval_ms(pair[0].time, pair[1].time).max(MIN_INTERVAL_MS);
            (dx * dx + dy * dy).sqrt() / dt
        })
        .collect();

    let mean_speed = speeds.iter().sum::<f64>() / speeds.len() as f64;
    Some(clamp_score(mean_speed * POINTER_SPEED_SCALE))
}

/// Population variance of consecutive inter-click intervals, scaled to `[0, 100]`.
///
/// Scripted clicking tends toward near-constant intervals, so a low value
/// reads as less human-like.
pub fn click_variance_score(clicks: &[DateTime<Utc>]) -> Option<f64> {
    if clicks.len() < MIN_CLICK_SAMPLES {
        return None;
    }

    let intervals: Vec<f64> = clicks
        .windows(2)
        .map(|pair| interval_ms(pair[0], pair[1]))
        .collect();

    let variance = intervals.iter().population_variance();
    Some(clamp_score(variance / CLICK_VARIANCE_DIVISOR))
}

/// Time on page, scaled to `[0, 100]`.
pub fn session_duration_score(elapsed: Duration) -> f64 {
    clamp_score(duration_secs(elapsed) * SESSION_DURATION_SCALE)
}

/// Signed interval between two timestamps in fractional milliseconds.
pub fn interval_ms(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta = to - from;
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1000.0,
        None => delta.num_milliseconds() as f64,
    }
}

/// Duration as fractional seconds.
pub fn duration_secs(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 1000.0
}

fn clamp_score(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else if value == f64::INFINITY {
        100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pointer(start: DateTime<Utc>, offset_ms: i64, x: f64, y: f64) -> Sample {
        Sample {
            x: Some(x),
            y: Some(y),
            scroll_y: None,
            time: start + Duration::milliseconds(offset_ms),
        }
    }

    #[test]
    fn test_pointer_speed_requires_two_samples() {
        let start = Utc::now();
        assert_eq!(pointer_speed_score(&[]), None);
        assert_eq!(pointer_speed_score(&[pointer(start, 0, 0.0, 0.0)]), None);
    }

    #[test]
    fn test_pointer_speed_basic() {
        let start = Utc::now();
        // 3-4-5 triangle over 10 ms = 0.5 px/ms, scaled x10
        let samples = vec![pointer(start, 0, 0.0, 0.0), pointer(start, 10, 3.0, 4.0)];
        let score = pointer_speed_score(&samples).unwrap();
        assert!((score - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_pointer_speed_identical_timestamps() {
        let start = Utc::now();
        let samples = vec![pointer(start, 0, 0.0, 0.0), pointer(start, 0, 3.0, 4.0)];
        let score = pointer_speed_score(&samples).unwrap();
        assert!(score.is_finite());
        // 5 px over the 1 ms floor = 5 px/ms -> 50
        assert!((score - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_pointer_speed_negative_interval_is_floored() {
        let start = Utc::now();
        let samples = vec![pointer(start, 10, 0.0, 0.0), pointer(start, 0, 1.0, 0.0)];
        let score = pointer_speed_score(&samples).unwrap();
        assert!((score - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_pointer_speed_uses_last_ten_samples() {
        let start = Utc::now();
        // A fast jump early on, then 10 stationary samples
        let mut samples = vec![pointer(start, 0, 0.0, 0.0), pointer(start, 1, 1000.0, 0.0)];
        for i in 0..10 {
            samples.push(pointer(start, 10 + i * 10, 1000.0, 0.0));
        }
        assert_eq!(pointer_speed_score(&samples), Some(0.0));
    }

    #[test]
    fn test_pointer_speed_saturates() {
        let start = Utc::now();
        let samples = vec![pointer(start, 0, 0.0, 0.0), pointer(start, 1, 500.0, 0.0)];
        assert_eq!(pointer_speed_score(&samples), Some(100.0));
    }

    #[test]
    fn test_click_variance_requires_three_clicks() {
        let start = Utc::now();
        let clicks = vec![start, start + Duration::milliseconds(300)];
        assert_eq!(click_variance_score(&clicks), None);
    }

    #[test]
    fn test_click_variance_uniform_is_zero() {
        let start = Utc::now();
        let clicks: Vec<_> = (0..5)
            .map(|i| start + Duration::milliseconds(i * 250))
            .collect();
        let score = click_variance_score(&clicks).unwrap();
        assert!(score.abs() < 1e-9);
    }

    #[test]
    fn test_click_variance_population() {
        let start = Utc::now();
        // Intervals 100 and 300 ms: mean 200, population variance 10_000 -> 100
        let clicks = vec![
            start,
            start + Duration::milliseconds(100),
            start + Duration::milliseconds(400),
        ];
        let score = click_variance_score(&clicks).unwrap();
        assert!((score - 100.0).abs() < 1e-6);

        // Intervals 100 and 140 ms: variance 400 -> 4
        let clicks = vec![
            start,
            start + Duration::milliseconds(100),
            start + Duration::milliseconds(240),
        ];
        let score = click_variance_score(&clicks).unwrap();
        assert!((score - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_session_duration_score() {
        assert_eq!(session_duration_score(Duration::zero()), 0.0);
        assert!((session_duration_score(Duration::milliseconds(2500)) - 12.5).abs() < 1e-9);
        assert_eq!(session_duration_score(Duration::seconds(20)), 100.0);
        assert_eq!(session_duration_score(Duration::seconds(90)), 100.0);
        assert_eq!(session_duration_score(Duration::seconds(-3)), 0.0);
    }
}
