//! Lower control layer seam
//!
//! The FSM drives physical flight through the [`FollowerControl`] trait and
//! knows nothing about the attitude/velocity controllers behind it. The
//! firmware provides the real implementation; tests and SITL provide mocks.

use nalgebra::Vector3;

use super::types::{PathStatus, PathTarget};

/// External control strategies invoked by the navigation-mode dispatch
///
/// Every method is called at the guidance rate with the tick period `dt`.
/// Implementations report failure through `Err(&'static str)`; the FSM
/// surfaces it as a failed tick and retries nothing (the next tick calls
/// again).
pub trait FollowerControl {
    /// Hold at a fixed NED position.
    fn control_endpoint(&mut self, dt: f32, target: &Vector3<f32>) -> Result<(), &'static str>;

    /// Follow a straight-line path, reporting fractional progress.
    fn control_path(&mut self, dt: f32, path: &PathTarget) -> Result<PathStatus, &'static str>;

    /// Descend onto `target` at `descent_rate` (m/s). The returned flag is
    /// advisory; landing completion is signaled by the caller injecting
    /// `HitTarget`, not by this return value.
    fn control_land(
        &mut self,
        dt: f32,
        target: &Vector3<f32>,
        descent_rate: f32,
    ) -> Result<bool, &'static str>;

    /// Run the inner attitude loop for this tick. Called after each
    /// successful position-level strategy.
    fn control_attitude(&mut self, dt: f32) -> Result<(), &'static str>;

    /// No active goal: zero outer-loop integrators and track the current
    /// throttle open-loop so re-engagement does not jump.
    fn control_idle(&mut self, dt: f32) -> Result<(), &'static str>;
}
