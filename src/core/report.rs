//! Exportable snapshot of a session's assessment.
//!
//! Reports are what the presentation and form layers consume: the metric set
//! for display, the rounded trust score and the gate status.

use crate::core::capture::CaptureCounts;
use crate::core::metrics::MetricSet;
use crate::core::session::Session;
use crate::core::verdict::{GateStatus, Transition, VerdictPolicy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The current report format version.
pub const REPORT_VERSION: &str = "1.0";

/// The name of this producer.
pub const PRODUCER_NAME: &str = "synheart-presence";

/// Producer metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Producer {
    /// Name of the producing software
    pub name: String,
    /// Version of the producing software
    pub version: String,
}

impl Default for Producer {
    fn default() -> Self {
        Self {
            name: PRODUCER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Point-in-time assessment of one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub report_version: String,
    pub producer: Producer,
    pub session_id: Uuid,
    /// When the session started (RFC3339)
    pub started_at: DateTime<Utc>,
    /// Time the report describes (RFC3339)
    pub observed_at: DateTime<Utc>,
    pub elapsed_secs: f64,
    pub metrics: MetricSet,
    /// Trust score rounded for display
    pub trust_score: u8,
    /// Unrounded trust score
    pub trust_score_raw: f64,
    pub status: GateStatus,
    /// ANALYZING, HUMAN or BOT
    pub state: String,
    pub policy: VerdictPolicy,
    pub transitions: Vec<Transition>,
    pub samples: CaptureCounts,
}

impl SessionReport {
    pub fn from_session(session: &Session, observed_at: DateTime<Utc>) -> Self {
        let score = session.trust_score();
        Self {
            report_version: REPORT_VERSION.to_string(),
            producer: Producer::default(),
            session_id: session.id(),
            started_at: session.started_at(),
            observed_at,
            elapsed_secs: session.elapsed_at(observed_at).num_milliseconds() as f64 / 1000.0,
            metrics: session.metrics(),
            trust_score: score.rounded(),
            trust_score_raw: score.value(),
            status: session.status(),
            state: session.state().to_string(),
            policy: session.policy(),
            transitions: session.history().to_vec(),
            samples: session.capture().counts(),
        }
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// One-line human-readable status.
    pub fn status_line(&self) -> String {
        format!(
            "[{:>6.1}s] {:<9} score {:>3} | pointer {:>5.1} speed {:>5.1} clicks {:>5.1} keys {:>5.1} time {:>5.1} scroll {:>5.1} touch {:>5.1}",
            self.elapsed_secs,
            self.state,
            self.trust_score,
            self.metrics.pointer_activity,
            self.metrics.pointer_speed_variance,
            self.metrics.click_pattern_regularity,
            self.metrics.keystroke_activity,
            self.metrics.session_duration,
            self.metrics.scroll_activity,
            self.metrics.touch_activity,
        )
    }
}
