//! Goal transition tables
//!
//! Each goal is one fixed transition table over the engine's states and
//! events, expressed as a total function: every (state, event) pair not
//! explicitly mapped resolves to `Fault` by the match default arm, so
//! unanticipated events always surface as a fault instead of silently doing
//! nothing. Pairs a state deliberately ignores map to `Unchanged`.
//!
//! Auto edges (pass-through states with no dwell time) are a separate
//! lookup: the engine follows them in a chain after every entered state.

use super::fsm::{FsmEvent, FsmState};

/// High-level navigation objective, selecting one transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Goal {
    /// Hold at the current location indefinitely
    HoldPosition,
    /// Pause, fly home at a safe altitude, pause, land and disarm
    LandHome,
}

impl Goal {
    /// Return variant name as a static string (usable with defmt on embedded)
    pub fn as_str(&self) -> &'static str {
        match self {
            Goal::HoldPosition => "HoldPosition",
            Goal::LandHome => "LandHome",
        }
    }
}

/// Result of one transition lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transition {
    /// Move to the given state and run its entry action
    To(FsmState),
    /// Event is deliberately ignored in this state
    Unchanged,
}

/// Total transition function for `goal`; unlisted pairs fault.
pub(crate) fn next_state(goal: Goal, state: FsmState, event: FsmEvent) -> Transition {
    use FsmEvent::*;
    use FsmState::*;
    use Transition::*;

    match goal {
        // INIT --AUTO--> HOLDING; HOLDING ignores both target events and
        // holds until an external goal change.
        Goal::HoldPosition => match (state, event) {
            (Init, Auto) => To(Holding),
            (Holding, HitTarget) | (Holding, LeftTarget) => Unchanged,
            _ => To(Fault),
        },
        // INIT --AUTO--> PRE_RTH_HOLD (10 s) --TIMEOUT--> FLYING_PATH
        // --HIT_TARGET--> POST_RTH_HOLD (10 s) --TIMEOUT--> LANDING
        // --HIT_TARGET--> DISARM.
        Goal::LandHome => match (state, event) {
            (Init, Auto) => To(PreRthHold),
            (PreRthHold, Timeout) => To(FlyingPath),
            (PreRthHold, HitTarget) | (PreRthHold, LeftTarget) => Unchanged,
            (FlyingPath, HitTarget) => To(PostRthHold),
            (PostRthHold, Timeout) => To(Landing),
            (PostRthHold, HitTarget) | (PostRthHold, LeftTarget) => Unchanged,
            (Landing, HitTarget) => To(Disarm),
            _ => To(Fault),
        },
    }
}

/// Auto edge out of `state`, if the goal defines one.
pub(crate) fn auto_edge(goal: Goal, state: FsmState) -> Option<FsmState> {
    match (goal, state) {
        (Goal::HoldPosition, FsmState::Init) => Some(FsmState::Holding),
        (Goal::LandHome, FsmState::Init) => Some(FsmState::PreRthHold),
        _ => None,
    }
}
