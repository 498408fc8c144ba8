//! Time-boxed human/bot decision.
//!
//! The machine stays in `Analyzing` until the observation window has elapsed,
//! then resolves on the score threshold. Under the default policy it keeps
//! re-resolving on every score update, so a verdict issued after the window
//! closes is not final.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// No verdict is issued until this much session time has elapsed.
pub const OBSERVATION_WINDOW_SECS: i64 = 5;

/// Scores strictly above this resolve to [`Verdict::Human`].
pub const HUMAN_THRESHOLD: f64 = 50.0;

/// A resolved classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Human,
    Bot,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Human => write!(f, "HUMAN"),
            Verdict::Bot => write!(f, "BOT"),
        }
    }
}

/// State of the decision procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionState {
    Analyzing,
    Resolved(Verdict),
}

impl DecisionState {
    pub fn is_analyzing(&self) -> bool {
        matches!(self, DecisionState::Analyzing)
    }

    pub fn verdict(&self) -> Option<Verdict> {
        match self {
            DecisionState::Analyzing => None,
            DecisionState::Resolved(v) => Some(*v),
        }
    }
}

impl std::fmt::Display for DecisionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecisionState::Analyzing => write!(f, "ANALYZING"),
            DecisionState::Resolved(v) => write!(f, "{v}"),
        }
    }
}

/// What downstream consumers gate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateStatus {
    pub analyzing: bool,
    pub verdict: Option<Verdict>,
}

impl GateStatus {
    /// The gated action may run only for a resolved human verdict.
    pub fn is_cleared(&self) -> bool {
        !self.analyzing && self.verdict == Some(Verdict::Human)
    }
}

impl From<DecisionState> for GateStatus {
    fn from(state: DecisionState) -> Self {
        Self {
            analyzing: state.is_analyzing(),
            verdict: state.verdict(),
        }
    }
}

/// How resolved verdicts react to later score updates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictPolicy {
    /// Re-resolve on every update after the window; the verdict may change.
    #[default]
    Reevaluate,
    /// Keep the first resolution for the rest of the session.
    Latch,
}

/// A change of decision state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub from: DecisionState,
    pub to: DecisionState,
    /// Session time at which the change happened, in seconds
    pub elapsed_secs: f64,
    /// Unrounded score that drove the change
    pub score: f64,
}

/// The analyzing/verdict state machine.
#[derive(Debug, Clone)]
pub struct VerdictMachine {
    state: DecisionState,
    policy: VerdictPolicy,
    window: Duration,
}

impl VerdictMachine {
    pub fn new(policy: VerdictPolicy) -> Self {
        Self {
            state: DecisionState::Analyzing,
            policy,
            window: Duration::seconds(OBSERVATION_WINDOW_SECS),
        }
    }

    pub fn state(&self) -> DecisionState {
        self.state
    }

    pub fn policy(&self) -> VerdictPolicy {
        self.policy
    }

    /// Evaluate the rule for the current session time and score.
    ///
    /// Returns the transition if the state changed.
    pub fn evaluate(&mut self, elapsed: Duration, score: f64) -> Option<Transition> {
        let next = self.next_state(elapsed, score);
        if next == self.state {
            return None;
        }

        let transition = Transition {
            from: self.state,
            to: next,
            elapsed_secs: elapsed.num_milliseconds() as f64 / 1000.0,
            score,
        };
        self.state = next;
        Some(transition)
    }

    fn next_state(&self, elapsed: Duration, score: f64) -> DecisionState {
        if let (VerdictPolicy::Latch, DecisionState::Resolved(_)) = (self.policy, self.state) {
            return self.state;
        }
        // Once resolved, an out-of-order in-window timestamp leaves the state as is
        if elapsed <= self.window {
            return self.state;
        }
        if score > HUMAN_THRESHOLD {
            DecisionState::Resolved(Verdict::Human)
        } else {
            DecisionState::Resolved(Verdict::Bot)
        }
    }
}

impl Default for VerdictMachine {
    fn default() -> Self {
        Self::new(VerdictPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyzing_within_window() {
        let mut machine = VerdictMachine::default();
        assert_eq!(machine.evaluate(Duration::seconds(1), 99.0), None);
        assert_eq!(machine.evaluate(Duration::seconds(5), 99.0), None);
        assert_eq!(machine.state(), DecisionState::Analyzing);
    }

    #[test]
    fn test_resolves_after_window() {
        let mut human = VerdictMachine::default();
        let t = human.evaluate(Duration::milliseconds(5001), 55.0).unwrap();
        assert_eq!(t.from, DecisionState::Analyzing);
        assert_eq!(t.to, DecisionState::Resolved(Verdict::Human));

        let mut bot = VerdictMachine::default();
        bot.evaluate(Duration::seconds(6), 45.0);
        assert_eq!(bot.state(), DecisionState::Resolved(Verdict::Bot));
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut machine = VerdictMachine::default();
        machine.evaluate(Duration::seconds(6), 50.0);
        assert_eq!(machine.state().verdict(), Some(Verdict::Bot));
    }

    #[test]
    fn test_reevaluate_can_flip() {
        let mut machine = VerdictMachine::new(VerdictPolicy::Reevaluate);
        machine.evaluate(Duration::seconds(6), 40.0);
        let t = machine.evaluate(Duration::seconds(7), 60.0).unwrap();
        assert_eq!(t.from, DecisionState::Resolved(Verdict::Bot));
        assert_eq!(t.to, DecisionState::Resolved(Verdict::Human));
        assert!((t.elapsed_secs - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_latch_keeps_first_resolution() {
        let mut machine = VerdictMachine::new(VerdictPolicy::Latch);
        machine.evaluate(Duration::seconds(6), 40.0);
        assert_eq!(machine.evaluate(Duration::seconds(7), 60.0), None);
        assert_eq!(machine.state().verdict(), Some(Verdict::Bot));
    }

    #[test]
    fn test_gate_status() {
        assert!(!GateStatus::from(DecisionState::Analyzing).is_cleared());
        assert!(!GateStatus::from(DecisionState::Resolved(Verdict::Bot)).is_cleared());

        let human = GateStatus::from(DecisionState::Resolved(Verdict::Human));
        assert!(human.is_cleared());
        assert!(!human.analyzing);
    }

    #[test]
    fn test_display_labels() {
        assert_eq!(DecisionState::Analyzing.to_string(), "ANALYZING");
        assert_eq!(DecisionState::Resolved(Verdict::Human).to_string(), "HUMAN");
        assert_eq!(
            serde_json::to_string(&Verdict::Bot).unwrap(),
            "\"BOT\""
        );
    }
}
