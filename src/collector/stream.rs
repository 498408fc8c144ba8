//! Line-delimited JSON event collection.
//!
//! Browser-side capture scripts (or recorded traces) emit one JSON event per
//! line. The collector reads them on a background thread and forwards parsed
//! events over a bounded channel, so the consumer never blocks on the source.

use crate::collector::types::{InputEvent, SignalKind};
use crate::config::SourceConfig;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::io::{BufRead, BufReader, Read};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Capacity of the event channel between the reader thread and the consumer.
pub const CHANNEL_CAPACITY: usize = 10_000;

/// Configuration for which event kinds are forwarded.
#[derive(Debug, Clone, Default)]
pub struct CollectorConfig {
    pub sources: SourceConfig,
}

impl CollectorConfig {
    fn accepts(&self, kind: SignalKind) -> bool {
        self.sources.is_enabled(kind)
    }
}

/// Errors that can occur during event collection.
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("Collector is already running")]
    AlreadyRunning,
    #[error("Collector input was already consumed")]
    SourceConsumed,
    #[error("Failed to spawn reader thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Collects input events from a line-delimited JSON source.
pub struct StreamCollector {
    config: CollectorConfig,
    source: Option<Box<dyn Read + Send>>,
    sender: Sender<InputEvent>,
    receiver: Receiver<InputEvent>,
    running: Arc<AtomicBool>,
    rejected: Arc<AtomicU64>,
    thread_handle: Option<JoinHandle<()>>,
}

impl StreamCollector {
    /// Create a collector over the given source.
    pub fn new<R: Read + Send + 'static>(config: CollectorConfig, source: R) -> Self {
        let (sender, receiver) = bounded(CHANNEL_CAPACITY);

        Self {
            config,
            source: Some(Box::new(source)),
            sender,
            receiver,
            running: Arc::new(AtomicBool::new(false)),
            rejected: Arc::new(AtomicU64::new(0)),
            thread_handle: None,
        }
    }

    /// Create a collector reading from standard input.
    pub fn stdin(config: CollectorConfig) -> Self {
        Self::new(config, std::io::stdin())
    }

    /// Start reading events in a background thread.
    ///
    /// A source can only be read once; restarting a stopped collector fails
    /// with [`CollectorError::SourceConsumed`].
    pub fn start(&mut self) -> Result<(), CollectorError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(CollectorError::AlreadyRunning);
        }
        let source = self.source.take().ok_or(CollectorError::SourceConsumed)?;

        self.running.store(true, Ordering::SeqCst);

        let sender = self.sender.clone();
        let running = self.running.clone();
        let rejected = self.rejected.clone();
        let config = self.config.clone();

        let handle = thread::Builder::new()
            .name("presence-collector".to_string())
            .spawn(move || {
                read_events(source, &sender, &running, &rejected, &config);
                running.store(false, Ordering::SeqCst);
            })?;

        self.thread_handle = Some(handle);
        Ok(())
    }

    /// Stop forwarding events.
    ///
    /// A reader blocked on its source cannot be interrupted; its thread is
    /// detached and exits on the next line or at end of input.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            if handle.is_finished() {
                let _ = handle.join();
            }
        }
    }

    /// Check if the collector is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Number of lines that could not be decoded.
    pub fn rejected_count(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    /// Get the receiver for input events.
    pub fn receiver(&self) -> &Receiver<InputEvent> {
        &self.receiver
    }

    /// Try to receive an event without blocking.
    pub fn try_recv(&self) -> Option<InputEvent> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for StreamCollector {
    fn drop(&mut self) {
        self.stop();
    }
}

fn read_events(
    source: Box<dyn Read + Send>,
    sender: &Sender<InputEvent>,
    running: &AtomicBool,
    rejected: &AtomicU64,
    config: &CollectorConfig,
) {
    let reader = BufReader::new(source);

    for line in reader.lines() {
        if !running.load(Ordering::SeqCst) {
            break;
        }

        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("Event source read failed: {}", e);
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match InputEvent::from_json_line(line) {
            Ok(event) if config.accepts(event.kind()) => {
                // Don't block if the channel is full - just drop the event
                let _ = sender.try_send(event);
            }
            Ok(_) => {}
            Err(e) => {
                rejected.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("{}", e);
            }
        }
    }

    tracing::debug!("Event source exhausted");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::Duration;

    const TRACE: &str = r#"{"kind":"pointer_move","x":1,"y":2,"time":"2024-01-22T10:00:00Z"}
{"kind":"key_down","time":"2024-01-22T10:00:01Z"}

not json
{"kind":"scroll","scroll_y":120,"time":"2024-01-22T10:00:02Z"}
"#;

    fn drain(collector: &StreamCollector) -> Vec<InputEvent> {
        let mut events = Vec::new();
        while let Ok(event) = collector.receiver().recv_timeout(Duration::from_millis(500)) {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_reads_all_valid_lines() {
        let mut collector = StreamCollector::new(CollectorConfig::default(), Cursor::new(TRACE));
        collector.start().unwrap();

        let events = drain(&collector);
        let kinds: Vec<SignalKind> = events.iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![SignalKind::Pointer, SignalKind::Key, SignalKind::Scroll]
        );
        assert_eq!(collector.rejected_count(), 1);
    }

    #[test]
    fn test_disabled_sources_are_filtered() {
        let config = CollectorConfig {
            sources: SourceConfig::from_csv("pointer"),
        };
        let mut collector = StreamCollector::new(config, Cursor::new(TRACE));
        collector.start().unwrap();

        let events = drain(&collector);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), SignalKind::Pointer);
    }

    #[test]
    fn test_source_can_only_be_started_once() {
        let mut collector = StreamCollector::new(CollectorConfig::default(), Cursor::new(""));
        collector.start().unwrap();
        let _ = drain(&collector);
        collector.stop();

        assert!(matches!(
            collector.start(),
            Err(CollectorError::SourceConsumed)
        ));
    }
}
