//! Follower state and target types
//!
//! Pure data shared between the FSM, its entry actions and the mode
//! dispatch. All positions are NED relative to home, down-positive, matching
//! the INS convention.

use nalgebra::{Quaternion, Vector3};

/// Published vehicle-state snapshot
///
/// Produced once per period by the estimation side immediately before the
/// FSM tick; entry actions read it when latching new targets.
#[derive(Debug, Clone, Copy)]
pub struct VehicleState {
    /// Position relative to home (m, NED)
    pub position_ned: Vector3<f32>,
    /// Velocity (m/s, NED)
    pub velocity_ned: Vector3<f32>,
    /// Attitude quaternion (scalar-first)
    pub attitude: Quaternion<f32>,
}

impl Default for VehicleState {
    fn default() -> Self {
        Self {
            position_ned: Vector3::zeros(),
            velocity_ned: Vector3::zeros(),
            attitude: Quaternion::identity(),
        }
    }
}

/// Path interpretation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathMode {
    /// Fly the start-to-end vector, correcting cross-track error
    #[default]
    Vector,
    /// Fly directly at the end point, ignoring the start leg
    Endpoint,
}

/// Straight-line path descriptor
///
/// Written once by the FSM's entry action on state entry, read every tick by
/// the path control strategy until overwritten.
#[derive(Debug, Clone, Copy)]
pub struct PathTarget {
    /// Path start (m, NED)
    pub start: Vector3<f32>,
    /// Path end (m, NED)
    pub end: Vector3<f32>,
    /// Speed at the start of the path (m/s)
    pub start_velocity: f32,
    /// Speed at the end of the path (m/s)
    pub end_velocity: f32,
    /// Path interpretation mode
    pub mode: PathMode,
}

impl Default for PathTarget {
    fn default() -> Self {
        Self {
            start: Vector3::zeros(),
            end: Vector3::zeros(),
            start_velocity: 0.0,
            end_velocity: 0.0,
            mode: PathMode::Vector,
        }
    }
}

/// Progress report from the path control strategy
#[derive(Debug, Clone, Copy, Default)]
pub struct PathStatus {
    /// 0-1 measure of distance travelled along the path; `>= 1.0` means the
    /// end point was reached
    pub fractional_progress: f32,
    /// Cross-track error (m)
    pub error: f32,
}

/// Follower tuning configuration
#[derive(Debug, Clone, Copy)]
pub struct FollowerConfig {
    /// Minimum altitude above home for return-to-home legs (m, up-positive)
    pub rth_min_altitude: f32,
    /// Return-to-home cruise speed (m/s)
    pub rth_velocity: f32,
    /// Landing descent speed (m/s)
    pub landing_velocity: f32,
    /// Guidance tick period (s)
    pub period: f32,
}

impl Default for FollowerConfig {
    fn default() -> Self {
        Self {
            rth_min_altitude: 15.0,
            rth_velocity: 2.5,
            landing_velocity: 1.5,
            period: 0.05,
        }
    }
}
