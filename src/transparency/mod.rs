//! Transparency module for the Synheart Presence detector.
//!
//! This module provides tools for tracking and exposing what the detector
//! observes, supporting user trust and audit.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log, create_shared_log_with_persistence, SharedTransparencyLog, TransparencyLog,
    TransparencyStats,
};
