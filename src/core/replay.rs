//! Deterministic replay of a recorded event trace.
//!
//! Live sessions receive a duration tick once per second from a wall-clock
//! timer. Replay synthesizes those ticks from the trace's own timestamps,
//! interleaving them with events in time order.

use crate::collector::types::InputEvent;
use crate::core::metrics::METRIC_MAX;
use crate::core::report::SessionReport;
use crate::core::session::Session;
use crate::core::verdict::VerdictPolicy;
use chrono::{DateTime, Duration, Utc};

/// Options controlling a replay.
#[derive(Debug, Clone)]
pub struct ReplayOptions {
    /// Session start; defaults to the first event's timestamp
    pub started_at: Option<DateTime<Utc>>,
    /// Keep ticking until this time; defaults to the last event's timestamp
    pub until: Option<DateTime<Utc>>,
    /// Period of the synthetic duration tick
    pub tick_interval: Duration,
    pub policy: VerdictPolicy,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            started_at: None,
            until: None,
            tick_interval: Duration::seconds(1),
            policy: VerdictPolicy::default(),
        }
    }
}

/// Replay `events` through a fresh session and report the final state.
///
/// Events are processed in the order given. A tick scheduled at or before an
/// event's timestamp fires before that event.
pub fn replay(events: &[InputEvent], options: &ReplayOptions) -> SessionReport {
    let session = replay_session(events, options);
    let observed_at = session.last_seen();
    session.report(observed_at)
}

/// Like [`replay`], but hands back the session itself.
pub fn replay_session(events: &[InputEvent], options: &ReplayOptions) -> Session {
    let started_at = options
        .started_at
        .or_else(|| events.first().map(|e| e.time))
        .unwrap_or_else(Utc::now);
    let until = options
        .until
        .or_else(|| events.iter().map(|e| e.time).max())
        .unwrap_or(started_at);

    let mut session = Session::with_policy(started_at, options.policy);
    let mut ticker = Ticker::new(started_at, options.tick_interval);

    for event in events {
        ticker.run_until(&mut session, event.time);
        session.ingest(event);
    }
    ticker.run_until(&mut session, until);

    tracing::info!(
        session = %session.id(),
        events = events.len(),
        state = %session.state(),
        score = session.trust_score().rounded(),
        "Replay finished"
    );
    session
}

/// `start` plus a non-negative number of seconds, or `None` if the result is
/// not representable.
pub fn offset_from(start: DateTime<Utc>, secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    let millis = secs * 1000.0;
    if millis >= i64::MAX as f64 {
        return None;
    }
    Duration::try_milliseconds(millis as i64).and_then(|d| start.checked_add_signed(d))
}

/// Synthetic duration ticks on a fixed grid from the session start.
struct Ticker {
    /// `None` once the grid runs past the representable range
    next: Option<DateTime<Utc>>,
    interval: Duration,
    interval_ms: i64,
}

impl Ticker {
    fn new(started_at: DateTime<Utc>, interval: Duration) -> Self {
        let interval = if interval >= Duration::milliseconds(1) {
            interval
        } else {
            Duration::seconds(1)
        };
        Self {
            next: started_at.checked_add_signed(interval),
            interval,
            interval_ms: interval.num_milliseconds(),
        }
    }

    /// Fire every tick due at or before `limit`.
    ///
    /// Once session duration is saturated further ticks change no metric and
    /// no state, so only the last due tick is applied.
    fn run_until(&mut self, session: &mut Session, limit: DateTime<Utc>) {
        while let Some(due) = self.next.filter(|t| *t <= limit) {
            let at = if session.metrics().session_duration >= METRIC_MAX {
                self.last_due(due, limit)
            } else {
                due
            };
            session.tick(at);
            self.next = at.checked_add_signed(self.interval);
        }
    }

    fn last_due(&self, from: DateTime<Utc>, limit: DateTime<Utc>) -> DateTime<Utc> {
        let steps = (limit - from).num_milliseconds() / self.interval_ms;
        Duration::try_milliseconds(steps * self.interval_ms)
            .and_then(|d| from.checked_add_signed(d))
            .unwrap_or(from)
    }
}
