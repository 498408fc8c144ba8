//! Live session driver.
//!
//! A [`Monitor`] owns a session and the collector feeding it, so capture and
//! the periodic duration tick are acquired and released together. Dropping
//! the monitor stops the collector; nothing can act on a finished session.

use crate::collector::{Collector, CollectorError, SignalKind};
use crate::config::Config;
use crate::core::{Session, SessionReport, VerdictPolicy};
use crate::transparency::SharedTransparencyLog;
use chrono::Utc;
use crossbeam_channel::RecvTimeoutError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// What a single [`Monitor::poll`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// An event of this kind was ingested
    Event(SignalKind),
    /// The duration tick fired
    Tick,
    /// Nothing arrived before the timeout
    Idle,
    /// The source is exhausted and every event has been consumed
    Exhausted,
}

pub struct Monitor {
    session: Session,
    collector: Collector,
    log: SharedTransparencyLog,
    tick_interval: Duration,
    last_tick: Instant,
    rejected_seen: u64,
}

impl Monitor {
    /// Start a fresh session now, fed by `collector`.
    pub fn new(collector: Collector, config: &Config, log: SharedTransparencyLog) -> Self {
        let session = Session::with_policy(Utc::now(), config.verdict_policy);
        Self::with_session(session, collector, config.tick_interval, log)
    }

    pub fn with_session(
        session: Session,
        collector: Collector,
        tick_interval: Duration,
        log: SharedTransparencyLog,
    ) -> Self {
        Self {
            session,
            collector,
            log,
            tick_interval: tick_interval.max(Duration::from_millis(1)),
            last_tick: Instant::now(),
            rejected_seen: 0,
        }
    }

    /// Start capturing.
    pub fn start(&mut self) -> Result<(), CollectorError> {
        self.last_tick = Instant::now();
        self.collector.start()
    }

    /// Process at most one event, or fire the tick if it is due.
    pub fn poll(&mut self, timeout: Duration) -> PollOutcome {
        let since_tick = self.last_tick.elapsed();
        if since_tick >= self.tick_interval {
            self.session.tick(Utc::now());
            self.log.record_tick();
            self.last_tick = Instant::now();
            return PollOutcome::Tick;
        }

        let wait = timeout.min(self.tick_interval - since_tick);
        let received = self.collector.receiver().recv_timeout(wait);
        self.sync_rejected();

        match received {
            Ok(event) => {
                let kind = event.kind();
                self.log.record_event(kind);
                self.session.ingest(&event);
                PollOutcome::Event(kind)
            }
            Err(RecvTimeoutError::Timeout) => {
                if !self.collector.is_running() && self.collector.receiver().is_empty() {
                    PollOutcome::Exhausted
                } else {
                    PollOutcome::Idle
                }
            }
            // The collector keeps a sender alive, so this only happens if it
            // was torn down underneath us.
            Err(RecvTimeoutError::Disconnected) => PollOutcome::Exhausted,
        }
    }

    /// Poll until `running` is cleared or the source is exhausted.
    ///
    /// `on_tick` is called after every duration tick.
    pub fn run<F>(&mut self, running: &AtomicBool, mut on_tick: F)
    where
        F: FnMut(&Session),
    {
        while running.load(Ordering::SeqCst) {
            match self.poll(Duration::from_millis(100)) {
                PollOutcome::Tick => on_tick(&self.session),
                PollOutcome::Exhausted => break,
                PollOutcome::Event(_) | PollOutcome::Idle => {}
            }
        }
    }

    fn sync_rejected(&mut self) {
        let rejected = self.collector.rejected_count();
        if rejected > self.rejected_seen {
            self.log.record_rejected(rejected - self.rejected_seen);
            self.rejected_seen = rejected;
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn policy(&self) -> VerdictPolicy {
        self.session.policy()
    }

    /// Stop capture and report the session as of now.
    pub fn finish(mut self) -> SessionReport {
        self.collector.stop();
        self.sync_rejected();
        let now = Utc::now();
        tracing::info!(
            session = %self.session.id(),
            state = %self.session.state(),
            score = self.session.trust_score().rounded(),
            "Session ended"
        );
        self.session.report(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::CollectorConfig;
    use crate::transparency::create_shared_log;
    use std::io::Cursor;

    fn monitor_over(input: &'static str, tick_interval: Duration) -> Monitor {
        let collector = Collector::new(CollectorConfig::default(), Cursor::new(input));
        let session = Session::new(Utc::now());
        Monitor::with_session(session, collector, tick_interval, create_shared_log())
    }

    #[test]
    fn test_run_until_exhausted() {
        let input = "{\"kind\":\"key_down\"}\n{\"kind\":\"key_down\"}\nbogus\n{\"kind\":\"touch_start\"}\n";
        let log = create_shared_log();
        let collector = Collector::new(CollectorConfig::default(), Cursor::new(input));
        let mut monitor = Monitor::with_session(
            Session::new(Utc::now()),
            collector,
            Duration::from_secs(60),
            log.clone(),
        );
        monitor.start().unwrap();

        let running = AtomicBool::new(true);
        monitor.run(&running, |_| {});

        let metrics = monitor.session().metrics();
        assert_eq!(metrics.keystroke_activity, 6.0);
        assert_eq!(metrics.touch_activity, 5.0);

        let report = monitor.finish();
        assert!(report.status.analyzing);

        let stats = log.stats();
        assert_eq!(stats.key_events, 2);
        assert_eq!(stats.touch_events, 1);
        assert_eq!(stats.rejected_events, 1);
    }

    #[test]
    fn test_tick_fires_when_due() {
        let mut monitor = monitor_over("", Duration::from_millis(1));
        monitor.start().unwrap();
        std::thread::sleep(Duration::from_millis(5));

        assert_eq!(monitor.poll(Duration::from_millis(10)), PollOutcome::Tick);
        assert!(monitor.session().metrics().session_duration > 0.0);
    }

    #[test]
    fn test_stopped_running_flag_returns_immediately() {
        let mut monitor = monitor_over("", Duration::from_secs(1));
        let running = AtomicBool::new(false);
        let mut ticks = 0;
        monitor.run(&running, |_| ticks += 1);
        assert_eq!(ticks, 0);
    }
}
