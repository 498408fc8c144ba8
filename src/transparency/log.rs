//! Privacy-preserving transparency log.
//!
//! Tracks what was observed during collection (counts only) so users and
//! operators can audit the detector without it retaining any input content.

use crate::collector::types::SignalKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Transparency statistics for the current process.
#[derive(Debug)]
pub struct TransparencyLog {
    pointer_events: AtomicU64,
    click_events: AtomicU64,
    key_events: AtomicU64,
    scroll_events: AtomicU64,
    touch_events: AtomicU64,
    /// Duration ticks applied
    ticks: AtomicU64,
    /// Input lines that could not be decoded
    rejected_events: AtomicU64,
    /// Session reports written to disk
    reports_exported: AtomicU64,
    session_start: DateTime<Utc>,
    persist_path: Option<PathBuf>,
}

impl TransparencyLog {
    /// Create a new transparency log.
    pub fn new() -> Self {
        Self {
            pointer_events: AtomicU64::new(0),
            click_events: AtomicU64::new(0),
            key_events: AtomicU64::new(0),
            scroll_events: AtomicU64::new(0),
            touch_events: AtomicU64::new(0),
            ticks: AtomicU64::new(0),
            rejected_events: AtomicU64::new(0),
            reports_exported: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a transparency log with persistence.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        // Try to load existing stats
        if let Err(e) = log.load() {
            tracing::warn!("Could not load previous transparency stats: {}", e);
        }

        log
    }

    fn counter(&self, kind: SignalKind) -> &AtomicU64 {
        match kind {
            SignalKind::Pointer => &self.pointer_events,
            SignalKind::Click => &self.click_events,
            SignalKind::Key => &self.key_events,
            SignalKind::Scroll => &self.scroll_events,
            SignalKind::Touch => &self.touch_events,
        }
    }

    /// Record an ingested event.
    pub fn record_event(&self, kind: SignalKind) {
        self.counter(kind).fetch_add(1, Ordering::Relaxed);
    }

    /// Record multiple ingested events of one kind.
    pub fn record_events(&self, kind: SignalKind, count: u64) {
        self.counter(kind).fetch_add(count, Ordering::Relaxed);
    }

    /// Record an applied duration tick.
    pub fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Record undecodable input.
    pub fn record_rejected(&self, count: u64) {
        self.rejected_events.fetch_add(count, Ordering::Relaxed);
    }

    /// Record an exported report.
    pub fn record_report_exported(&self) {
        self.reports_exported.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> TransparencyStats {
        TransparencyStats {
            pointer_events: self.pointer_events.load(Ordering::Relaxed),
            click_events: self.click_events.load(Ordering::Relaxed),
            key_events: self.key_events.load(Ordering::Relaxed),
            scroll_events: self.scroll_events.load(Ordering::Relaxed),
            touch_events: self.touch_events.load(Ordering::Relaxed),
            ticks: self.ticks.load(Ordering::Relaxed),
            rejected_events: self.rejected_events.load(Ordering::Relaxed),
            reports_exported: self.reports_exported.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Pointer moves processed: {}\n\
             - Clicks processed: {}\n\
             - Key presses processed: {}\n\
             - Scroll events processed: {}\n\
             - Touches processed: {}\n\
             - Duration ticks: {}\n\
             - Rejected input lines: {}\n\
             - Reports exported: {}\n\
             - Session duration: {} seconds\n\
             \n\
             Privacy Guarantee:\n\
             - No key content captured\n\
             - No form content captured\n\
             - Only timing and pointer geometry used, and only in memory",
            stats.pointer_events,
            stats.click_events,
            stats.key_events,
            stats.scroll_events,
            stats.touch_events,
            stats.ticks,
            stats.rejected_events,
            stats.reports_exported,
            stats.session_duration_secs
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            // Ensure parent directory exists
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                pointer_events: stats.pointer_events,
                click_events: stats.click_events,
                key_events: stats.key_events,
                scroll_events: stats.scroll_events,
                touch_events: stats.touch_events,
                ticks: stats.ticks,
                rejected_events: stats.rejected_events,
                reports_exported: stats.reports_exported,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;

            std::fs::write(path, json)?;
        }
        Ok(())
    }

    /// Load stats from disk.
    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.pointer_events
                    .store(persisted.pointer_events, Ordering::Relaxed);
                self.click_events
                    .store(persisted.click_events, Ordering::Relaxed);
                self.key_events.store(persisted.key_events, Ordering::Relaxed);
                self.scroll_events
                    .store(persisted.scroll_events, Ordering::Relaxed);
                self.touch_events
                    .store(persisted.touch_events, Ordering::Relaxed);
                self.ticks.store(persisted.ticks, Ordering::Relaxed);
                self.rejected_events
                    .store(persisted.rejected_events, Ordering::Relaxed);
                self.reports_exported
                    .store(persisted.reports_exported, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Reset all counters.
    pub fn reset(&self) {
        for kind in SignalKind::ALL {
            self.counter(kind).store(0, Ordering::Relaxed);
        }
        self.ticks.store(0, Ordering::Relaxed);
        self.rejected_events.store(0, Ordering::Relaxed);
        self.reports_exported.store(0, Ordering::Relaxed);
    }
}

impl Default for TransparencyLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of transparency statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransparencyStats {
    pub pointer_events: u64,
    pub click_events: u64,
    pub key_events: u64,
    pub scroll_events: u64,
    pub touch_events: u64,
    pub ticks: u64,
    pub rejected_events: u64,
    pub reports_exported: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

impl TransparencyStats {
    pub fn total_events(&self) -> u64 {
        self.pointer_events
            + self.click_events
            + self.key_events
            + self.scroll_events
            + self.touch_events
    }
}

/// Stats format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    pointer_events: u64,
    click_events: u64,
    key_events: u64,
    scroll_events: u64,
    touch_events: u64,
    ticks: u64,
    rejected_events: u64,
    reports_exported: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared transparency log.
pub type SharedTransparencyLog = Arc<TransparencyLog>;

/// Create a new shared transparency log.
pub fn create_shared_log() -> SharedTransparencyLog {
    Arc::new(TransparencyLog::new())
}

/// Create a new shared transparency log with persistence.
pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedTransparencyLog {
    Arc::new(TransparencyLog::with_persistence(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transparency_log_counting() {
        let log = TransparencyLog::new();

        log.record_event(SignalKind::Key);
        log.record_event(SignalKind::Key);
        log.record_event(SignalKind::Pointer);
        log.record_tick();

        let stats = log.stats();
        assert_eq!(stats.key_events, 2);
        assert_eq!(stats.pointer_events, 1);
        assert_eq!(stats.ticks, 1);
        assert_eq!(stats.total_events(), 3);
    }

    #[test]
    fn test_transparency_log_reset() {
        let log = TransparencyLog::new();

        log.record_events(SignalKind::Scroll, 100);
        log.record_events(SignalKind::Touch, 50);
        log.record_rejected(4);
        log.reset();

        let stats = log.stats();
        assert_eq!(stats.total_events(), 0);
        assert_eq!(stats.rejected_events, 0);
    }

    #[test]
    fn test_persistence_roundtrip() {
        let path = std::env::temp_dir()
            .join(format!("presence-transparency-{}", uuid::Uuid::new_v4()))
            .join("transparency.json");

        let log = TransparencyLog::with_persistence(path.clone());
        log.record_events(SignalKind::Click, 7);
        log.record_report_exported();
        log.save().unwrap();

        let reloaded = TransparencyLog::with_persistence(path.clone());
        let stats = reloaded.stats();
        assert_eq!(stats.click_events, 7);
        assert_eq!(stats.reports_exported, 1);

        if let Some(parent) = path.parent() {
            let _ = std::fs::remove_dir_all(parent);
        }
    }

    #[test]
    fn test_summary_format() {
        let log = TransparencyLog::new();
        let summary = log.summary();

        assert!(summary.contains("Pointer moves"));
        assert!(summary.contains("Key presses"));
        assert!(summary.contains("Privacy Guarantee"));
        assert!(summary.contains("No key content captured"));
    }
}
