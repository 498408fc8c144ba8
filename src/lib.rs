//! Synheart Presence - passive human-presence detection.
//!
//! This library classifies a live session as human- or automation-driven by
//! observing ambient interaction signals (pointer movement, clicks, key
//! presses, scroll and touch) without presenting an interactive challenge.
//!
//! It is a fixed-window, fixed-weight heuristic. It is not a cryptographic
//! proof of humanity and does not resist replay of recorded human traces.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        Synheart Presence                         │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌───────────┐   ┌────────────┐   ┌───────────┐  │
//! │  │ Collector │──▶│  Capture  │──▶│ Extractors │──▶│Accumulator│  │
//! │  │ (NDJSON)  │   │ (buffers) │   │   (pure)   │   │ (metrics) │  │
//! │  └───────────┘   └───────────┘   └────────────┘   └─────┬─────┘  │
//! │        │                                                │        │
//! │        ▼                                                ▼        │
//! │  ┌────────────┐                ┌──────────┐     ┌─────────────┐  │
//! │  │Transparency│                │ Verdict  │◀────│ Trust Score │  │
//! │  │    Log     │                │ (gate)   │     │ (weighted)  │  │
//! │  └────────────┘                └──────────┘     └─────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, Utc};
//! use synheart_presence::{InputEvent, Session};
//!
//! let start = Utc::now();
//! let mut session = Session::new(start);
//!
//! session.ingest(&InputEvent::key_down(start + Duration::milliseconds(300)));
//! session.tick(start + Duration::seconds(1));
//!
//! assert!(session.status().analyzing);
//! assert!(session.submit(|| "sent").is_err());
//! ```

pub mod collector;
pub mod config;
pub mod core;
pub mod monitor;
pub mod transparency;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use collector::{Collector, CollectorConfig, CollectorError, InputEvent, Signal, SignalKind};
pub use config::{Config, SourceConfig};
pub use crate::core::{
    replay, DecisionState, GateError, GateStatus, Metric, MetricSet, ReplayOptions, Session,
    SessionReport, TrustScore, Verdict, VerdictPolicy,
};
pub use monitor::{Monitor, PollOutcome};
pub use transparency::{SharedTransparencyLog, TransparencyLog, TransparencyStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Privacy declaration that can be displayed to users.
pub const PRIVACY_DECLARATION: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║            SYNHEART PRESENCE - PRIVACY DECLARATION               ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This page checks for a human visitor by watching how you        ║
║  interact with it, instead of asking you to solve a puzzle.      ║
║                                                                  ║
║  ✓ WHAT WE OBSERVE:                                              ║
║    • Pointer position and speed over the last few moves          ║
║    • When clicks, key presses, scrolls and touches happen        ║
║    • How long the page has been open                             ║
║                                                                  ║
║  ✗ WHAT WE NEVER CAPTURE:                                        ║
║    • Which keys you press (no passwords, messages, etc.)         ║
║    • What you type into the form                                 ║
║    • Any screen content                                          ║
║                                                                  ║
║  Raw signals stay in memory for the current page only. At        ║
║  most an aggregate score report is kept once the session ends.   ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privacy_declaration_contents() {
        assert!(PRIVACY_DECLARATION.contains("PRIVACY"));
        assert!(PRIVACY_DECLARATION.contains("NEVER CAPTURE"));
        assert!(PRIVACY_DECLARATION.contains("keys you press"));
    }
}
