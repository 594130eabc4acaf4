//! quadnav_core - Pure no_std guidance and estimation core for a small VTOL
//!
//! This crate contains the platform-agnostic algorithms of the autopilot's
//! navigation layer. Everything here can be tested on the host without any
//! feature flags or RTOS dependencies.
//!
//! # Design Principles
//!
//! - **Zero cfg**: No `#[cfg(feature = ...)]` directives allowed
//! - **Pure no_std**: No std library dependencies
//! - **Trait seams**: The lower control layer is injected via the
//!   [`follower::FollowerControl`] trait; the sensor drivers and scheduler
//!   live outside this crate and call into it each period
//!
//! # Modules
//!
//! - [`ins`]: Extended-state inertial navigation filter (predict/correct,
//!   self-calibrating thrust/bias/drag states)
//! - [`follower`]: Guidance FSM engine, goal transition tables, and the
//!   navigation-mode dispatch that feeds the lower control layer
//! - [`parameters`]: Parameter store plus the INS and follower tuning
//!   parameter definitions

#![no_std]

pub mod follower;
pub mod ins;
pub mod parameters;

pub use follower::{
    FollowerConfig, FollowerControl, FsmEvent, FsmState, Goal, GuidanceFsm, NavMode, PathMode,
    PathStatus, PathTarget, VehicleState,
};
pub use ins::{InsArena, InsConfig, InsError, InsFilter, InsHandle};
pub use parameters::{ParamFlags, ParamValue, ParameterError, ParameterStore};
