//! Event capture into per-signal rolling buffers.
//!
//! Capture trusts the host input subsystem: no authenticity checks are made
//! and recording never fails or blocks.

use crate::collector::types::{InputEvent, Sample, Signal, SignalKind};
use crate::core::buffer::RollingBuffer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pointer-move history length.
pub const POINTER_CAPACITY: usize = 50;
/// Click history length.
pub const CLICK_CAPACITY: usize = 20;
/// Key-down history length.
pub const KEY_CAPACITY: usize = 30;
/// Scroll history length.
pub const SCROLL_CAPACITY: usize = 20;

/// Bounded buffers of recent samples for every captured signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventCapture {
    pointer: RollingBuffer<Sample>,
    clicks: RollingBuffer<DateTime<Utc>>,
    keys: RollingBuffer<DateTime<Utc>>,
    scrolls: RollingBuffer<Sample>,
    /// Touches are counted, not buffered
    touches: u64,
}

/// Per-kind sample counts, for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureCounts {
    pub pointer: usize,
    pub click: usize,
    pub key: usize,
    pub scroll: usize,
    pub touch: u64,
}

impl EventCapture {
    pub fn new() -> Self {
        Self {
            pointer: RollingBuffer::new(POINTER_CAPACITY),
            clicks: RollingBuffer::new(CLICK_CAPACITY),
            keys: RollingBuffer::new(KEY_CAPACITY),
            scrolls: RollingBuffer::new(SCROLL_CAPACITY),
            touches: 0,
        }
    }

    /// Record an event into its signal's buffer, evicting the oldest entry
    /// when the buffer is full. Returns the kind that was captured.
    pub fn record(&mut self, event: &InputEvent) -> SignalKind {
        match event.signal {
            Signal::PointerMove { .. } => {
                self.pointer.push(Sample::from_event(event));
            }
            Signal::Click { .. } => {
                self.clicks.push(event.time);
            }
            Signal::KeyDown => {
                self.keys.push(event.time);
            }
            Signal::Scroll { .. } => {
                self.scrolls.push(Sample::from_event(event));
            }
            Signal::TouchStart { .. } => {
                self.touches = self.touches.saturating_add(1);
            }
        }
        event.kind()
    }

    pub fn pointer(&self) -> &RollingBuffer<Sample> {
        &self.pointer
    }

    pub fn clicks(&self) -> &RollingBuffer<DateTime<Utc>> {
        &self.clicks
    }

    pub fn keys(&self) -> &RollingBuffer<DateTime<Utc>> {
        &self.keys
    }

    pub fn scrolls(&self) -> &RollingBuffer<Sample> {
        &self.scrolls
    }

    pub fn touch_count(&self) -> u64 {
        self.touches
    }

    pub fn counts(&self) -> CaptureCounts {
        CaptureCounts {
            pointer: self.pointer.len(),
            click: self.clicks.len(),
            key: self.keys.len(),
            scroll: self.scrolls.len(),
            touch: self.touches,
        }
    }
}

impl Default for EventCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_click_buffer_evicts_oldest() {
        let mut capture = EventCapture::new();
        let start = Utc::now();

        for i in 0..=CLICK_CAPACITY as i64 {
            capture.record(&InputEvent::click(start + Duration::milliseconds(i * 100)));
        }

        assert_eq!(capture.clicks().len(), CLICK_CAPACITY);
        assert!(capture.clicks().iter().all(|&t| t != start));
        assert_eq!(
            capture.clicks().front(),
            Some(&(start + Duration::milliseconds(100)))
        );
    }

    #[test]
    fn test_pointer_buffer_capacity() {
        let mut capture = EventCapture::new();
        let start = Utc::now();

        for i in 0..=POINTER_CAPACITY as i64 {
            capture.record(&InputEvent::pointer_move(
                start + Duration::milliseconds(i),
                i as f64,
                0.0,
            ));
        }

        assert_eq!(capture.pointer().len(), POINTER_CAPACITY);
        assert_eq!(capture.pointer().front().and_then(|s| s.x), Some(1.0));
    }

    #[test]
    fn test_key_buffer_evicts_oldest() {
        let mut capture = EventCapture::new();
        let start = Utc::now();

        for i in 0..=KEY_CAPACITY as i64 {
            capture.record(&InputEvent::key_down(start + Duration::milliseconds(i * 80)));
        }

        assert_eq!(capture.keys().len(), KEY_CAPACITY);
        assert!(capture.keys().iter().all(|&t| t != start));
        assert_eq!(
            capture.keys().front(),
            Some(&(start + Duration::milliseconds(80)))
        );
        assert_eq!(capture.counts().key, KEY_CAPACITY);
    }

    #[test]
    fn test_scroll_buffer_evicts_oldest() {
        let mut capture = EventCapture::new();
        let start = Utc::now();

        for i in 0..=SCROLL_CAPACITY as i64 {
            capture.record(&InputEvent::scroll(
                start + Duration::milliseconds(i * 50),
                i as f64 * 100.0,
            ));
        }

        assert_eq!(capture.scrolls().len(), SCROLL_CAPACITY);
        assert!(capture.scrolls().iter().all(|s| s.scroll_y != Some(0.0)));
        assert_eq!(
            capture.scrolls().front().and_then(|s| s.scroll_y),
            Some(100.0)
        );
        assert_eq!(
            capture.scrolls().back().and_then(|s| s.scroll_y),
            Some(SCROLL_CAPACITY as f64 * 100.0)
        );
    }

    #[test]
    fn test_touches_are_counted_without_cap() {
        let mut capture = EventCapture::new();
        let now = Utc::now();
        for _ in 0..100 {
            assert_eq!(capture.record(&InputEvent::touch_start(now)), SignalKind::Touch);
        }
        assert_eq!(capture.touch_count(), 100);
        assert_eq!(capture.counts().touch, 100);
    }
}
