//! quadnav_sitl - Software-in-the-loop harness for the quadnav core
//!
//! Closes the loop around the no_std guidance and estimation core with a
//! built-in point-mass quadrotor truth model and a simple cascaded control
//! strategy. No external simulator is required; everything runs in-process
//! and deterministically under a fixed seed, which makes it suitable for CI.

pub mod bridge;
pub mod error;
pub mod follower;
pub mod vehicle;

pub use bridge::SitlBridge;
pub use error::SitlError;
pub use follower::{FollowerGains, SitlFollower};
pub use vehicle::{AttitudeCommand, SensorSample, TruthConfig, TruthVehicle};
