//! VTOL follower guidance layer
//!
//! A supervisory finite-state machine sequences multi-step navigation
//! behaviors (hold position, return-and-land-at-home) by selecting a
//! navigation mode and feeding setpoints to the lower control layer, which
//! is injected through the [`FollowerControl`] trait.
//!
//! The FSM fails closed: any (state, event) pair not listed in the active
//! goal's transition table resolves to [`FsmState::Fault`], except pairs the
//! table explicitly marks as ignored.

pub mod fsm;
pub mod goals;
pub mod nav;
pub mod traits;
pub mod types;

pub use fsm::{FsmEvent, FsmState, GuidanceFsm};
pub use goals::Goal;
pub use nav::NavMode;
pub use traits::FollowerControl;
pub use types::{FollowerConfig, PathMode, PathStatus, PathTarget, VehicleState};
