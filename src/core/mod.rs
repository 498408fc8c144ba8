//! Core functionality for the Synheart Presence detector.
//!
//! This module contains the telemetry pipeline, leaves first:
//! - Bounded per-signal capture buffers
//! - Pure metric extractors
//! - The metric accumulator and trust score
//! - The analyzing/verdict state machine
//! - The session context tying them together, plus replay and reporting

pub mod accumulator;
pub mod buffer;
pub mod capture;
pub mod extractors;
pub mod metrics;
pub mod replay;
pub mod report;
pub mod score;
pub mod session;
pub mod verdict;

// Re-export commonly used types
pub use buffer::RollingBuffer;
pub use capture::{CaptureCounts, EventCapture};
pub use metrics::{Metric, MetricSet};
pub use replay::{offset_from, replay, replay_session, ReplayOptions};
pub use report::{SessionReport, PRODUCER_NAME, REPORT_VERSION};
pub use score::TrustScore;
pub use session::{GateError, Session};
pub use verdict::{DecisionState, GateStatus, Transition, Verdict, VerdictMachine, VerdictPolicy};
