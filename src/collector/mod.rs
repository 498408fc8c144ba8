//! Event collection module for the Synheart Presence detector.
//!
//! The host (a browser capture script, a recorded trace, a test) delivers
//! ambient input events; this module decodes and forwards them.

pub mod stream;
pub mod types;

// Re-export commonly used types
pub use stream::{CollectorConfig, CollectorError, StreamCollector};
pub use types::{EventParseError, InputEvent, Sample, Signal, SignalKind};

/// Platform-agnostic collector type alias
pub type Collector = StreamCollector;
