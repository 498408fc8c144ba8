//! Session context: the whole capture-to-verdict pipeline for one page visit.
//!
//! A [`Session`] is an explicit value owned by the caller. Events are pushed
//! in with [`Session::ingest`], time is advanced with [`Session::tick`], and
//! the result is read back through [`Session::status`] and friends. Nothing
//! here reads the wall clock, so a session is fully deterministic given its
//! inputs.

use crate::collector::types::{InputEvent, SignalKind};
use crate::core::accumulator::MetricAccumulator;
use crate::core::capture::EventCapture;
use crate::core::extractors::{
    click_variance_score, pointer_speed_score, session_duration_score, KEYSTROKE_STEP,
    MIN_POINTER_SAMPLES, POINTER_ACTIVITY_STEP, POINTER_SPEED_WINDOW, SCROLL_STEP, TOUCH_STEP,
};
use crate::core::metrics::{Metric, MetricSet};
use crate::core::report::SessionReport;
use crate::core::score::TrustScore;
use crate::core::verdict::{DecisionState, GateStatus, Transition, Verdict, VerdictMachine, VerdictPolicy};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Why a gated action was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("session is still being analyzed")]
    StillAnalyzing,
    #[error("interaction looks automated (trust score {score}); additional verification required")]
    SuspectedAutomation { score: u8 },
}

impl GateError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            GateError::StillAnalyzing => "STILL_ANALYZING",
            GateError::SuspectedAutomation { .. } => "SUSPECTED_AUTOMATION",
        }
    }
}

/// All mutable state of one observed session.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    started_at: DateTime<Utc>,
    last_seen: DateTime<Utc>,
    capture: EventCapture,
    accumulator: MetricAccumulator,
    score: TrustScore,
    machine: VerdictMachine,
    history: Vec<Transition>,
}

impl Session {
    /// Start a session at the given time with the default verdict policy.
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self::with_policy(started_at, VerdictPolicy::default())
    }

    pub fn with_policy(started_at: DateTime<Utc>, policy: VerdictPolicy) -> Self {
        let id = Uuid::new_v4();
        tracing::info!(session = %id, ?policy, "Session started");

        Self {
            id,
            started_at,
            last_seen: started_at,
            capture: EventCapture::new(),
            accumulator: MetricAccumulator::new(),
            score: TrustScore::default(),
            machine: VerdictMachine::new(policy),
            history: Vec::new(),
        }
    }

    /// Feed one input event through capture, extraction and accumulation.
    ///
    /// When the event produced a metric update, the trust score is recomputed
    /// and the verdict re-evaluated at the event's timestamp. Returns the
    /// updated metric set.
    pub fn ingest(&mut self, event: &InputEvent) -> MetricSet {
        let kind = self.capture.record(event);
        self.observe(event.time);

        let updated = match kind {
            SignalKind::Pointer => self.update_pointer(),
            SignalKind::Click => self.update_clicks(),
            SignalKind::Key => {
                self.accumulator.bump(Metric::KeystrokeActivity, KEYSTROKE_STEP);
                true
            }
            SignalKind::Scroll => {
                self.accumulator.bump(Metric::ScrollActivity, SCROLL_STEP);
                true
            }
            SignalKind::Touch => {
                self.accumulator.bump(Metric::TouchActivity, TOUCH_STEP);
                true
            }
        };

        if updated {
            self.rescore(event.time);
        }
        self.accumulator.snapshot()
    }

    /// Periodic update: recompute session duration at `now` and re-evaluate.
    pub fn tick(&mut self, now: DateTime<Utc>) -> MetricSet {
        self.observe(now);
        let duration = session_duration_score(self.elapsed_at(now));
        self.accumulator.replace(Metric::SessionDuration, duration);
        self.rescore(now);
        self.accumulator.snapshot()
    }

    fn update_pointer(&mut self) -> bool {
        let pointer = self.capture.pointer();
        if pointer.len() < MIN_POINTER_SAMPLES {
            return false;
        }
        let window: Vec<_> = pointer.recent(POINTER_SPEED_WINDOW).copied().collect();
        self.accumulator
            .bump(Metric::PointerActivity, POINTER_ACTIVITY_STEP);
        if let Some(speed) = pointer_speed_score(&window) {
            self.accumulator.replace(Metric::PointerSpeedVariance, speed);
        }
        true
    }

    fn update_clicks(&mut self) -> bool {
        let clicks: Vec<_> = self.capture.clicks().iter().copied().collect();
        match click_variance_score(&clicks) {
            Some(variance) => {
                self.accumulator
                    .replace(Metric::ClickPatternRegularity, variance);
                true
            }
            None => false,
        }
    }

    fn rescore(&mut self, at: DateTime<Utc>) {
        self.score = TrustScore::compute(self.accumulator.metrics());
        let elapsed = self.elapsed_at(at);

        if let Some(transition) = self.machine.evaluate(elapsed, self.score.value()) {
            tracing::debug!(
                session = %self.id,
                from = %transition.from,
                to = %transition.to,
                score = transition.score,
                elapsed_secs = transition.elapsed_secs,
                "Decision state changed"
            );
            self.history.push(transition);
        }
    }

    fn observe(&mut self, at: DateTime<Utc>) {
        if at > self.last_seen {
            self.last_seen = at;
        }
    }

    /// Run `action` only if the session is resolved as human.
    pub fn submit<T, F>(&self, action: F) -> Result<T, GateError>
    where
        F: FnOnce() -> T,
    {
        match self.state() {
            DecisionState::Analyzing => Err(GateError::StillAnalyzing),
            DecisionState::Resolved(Verdict::Bot) => Err(GateError::SuspectedAutomation {
                score: self.score.rounded(),
            }),
            DecisionState::Resolved(Verdict::Human) => Ok(action()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Latest time this session has observed through events or ticks.
    pub fn last_seen(&self) -> DateTime<Utc> {
        self.last_seen
    }

    pub fn elapsed_at(&self, now: DateTime<Utc>) -> Duration {
        now - self.started_at
    }

    pub fn metrics(&self) -> MetricSet {
        self.accumulator.snapshot()
    }

    pub fn trust_score(&self) -> TrustScore {
        self.score
    }

    pub fn state(&self) -> DecisionState {
        self.machine.state()
    }

    pub fn status(&self) -> GateStatus {
        self.machine.state().into()
    }

    pub fn policy(&self) -> VerdictPolicy {
        self.machine.policy()
    }

    pub fn capture(&self) -> &EventCapture {
        &self.capture
    }

    /// Every decision state change so far, oldest first.
    pub fn history(&self) -> &[Transition] {
        &self.history
    }

    /// Snapshot the session for export, as observed at `now`.
    pub fn report(&self, now: DateTime<Utc>) -> SessionReport {
        SessionReport::from_session(self, now)
    }
}
