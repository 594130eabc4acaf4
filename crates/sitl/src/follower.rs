//! Velocity-over-position control strategies for the SITL harness.
//!
//! Implements the `FollowerControl` seam with a simple cascaded loop:
//! position error maps to a desired velocity, velocity error maps to an
//! attitude/throttle command for the truth model. Good enough to close the
//! loop around the guidance FSM; not a flight-quality controller.

use nalgebra::Vector3;
use quadnav_core::follower::{FollowerControl, PathStatus, PathTarget, VehicleState};

use crate::vehicle::AttitudeCommand;

/// Tuning for the cascaded position/velocity loops.
#[derive(Debug, Clone)]
pub struct FollowerGains {
    /// Position error to desired velocity, 1/s.
    pub kp_position: f32,
    /// Velocity error to commanded lean angle, rad per m/s.
    pub kp_velocity: f32,
    /// Vertical velocity error to throttle, per m/s.
    pub kp_throttle: f32,
    /// Vertical velocity integral gain, per m.
    pub ki_throttle: f32,
    /// Horizontal speed limit in m/s.
    pub max_speed: f32,
    /// Vertical speed limit in m/s.
    pub max_climb: f32,
    /// Lean angle limit in radians.
    pub max_lean: f32,
    /// Throttle that balances gravity on the truth model.
    pub hover_throttle: f32,
    /// Distance from the path end treated as arrival, in meters.
    pub completion_radius: f32,
}

impl Default for FollowerGains {
    fn default() -> Self {
        Self {
            kp_position: 0.4,
            kp_velocity: 0.12,
            kp_throttle: 0.1,
            ki_throttle: 0.05,
            max_speed: 5.0,
            max_climb: 2.0,
            max_lean: 0.4,
            hover_throttle: 0.5,
            completion_radius: 1.5,
        }
    }
}

/// Control strategy implementation driven by the guidance FSM.
///
/// Holds the latest vehicle-state snapshot and produces one
/// [`AttitudeCommand`] per tick for the truth model.
pub struct SitlFollower {
    gains: FollowerGains,
    vehicle: VehicleState,
    velocity_desired: Vector3<f32>,
    throttle_integral: f32,
    command: AttitudeCommand,
}

impl SitlFollower {
    pub fn new(gains: FollowerGains) -> Self {
        Self {
            gains,
            vehicle: VehicleState::default(),
            velocity_desired: Vector3::zeros(),
            throttle_integral: 0.0,
            command: AttitudeCommand::default(),
        }
    }

    /// Install the estimator snapshot for this tick's control decisions.
    pub fn set_vehicle_state(&mut self, vehicle: &VehicleState) {
        self.vehicle = *vehicle;
    }

    /// Command produced by the last `control_attitude` call.
    pub fn command(&self) -> AttitudeCommand {
        self.command
    }

    /// Proportional position loop with horizontal and vertical speed caps.
    fn position_to_velocity(&self, target: &Vector3<f32>) -> Vector3<f32> {
        let error = target - self.vehicle.position_ned;
        let mut desired = error * self.gains.kp_position;

        let horizontal = (desired.x * desired.x + desired.y * desired.y).sqrt();
        if horizontal > self.gains.max_speed {
            let scale = self.gains.max_speed / horizontal;
            desired.x *= scale;
            desired.y *= scale;
        }
        desired.z = desired.z.clamp(-self.gains.max_climb, self.gains.max_climb);
        desired
    }
}

impl FollowerControl for SitlFollower {
    fn control_endpoint(&mut self, _dt: f32, target: &Vector3<f32>) -> Result<(), &'static str> {
        self.velocity_desired = self.position_to_velocity(target);
        Ok(())
    }

    fn control_path(&mut self, _dt: f32, path: &PathTarget) -> Result<PathStatus, &'static str> {
        let span = path.end - path.start;
        let length_sq = span.norm_squared();
        let to_end = path.end - self.vehicle.position_ned;
        let distance = to_end.norm();

        if distance <= self.gains.completion_radius || length_sq < 1e-6 {
            // Degenerate or finished path: settle onto the end point.
            self.velocity_desired = self.position_to_velocity(&path.end);
            return Ok(PathStatus {
                fractional_progress: 1.0,
                error: 0.0,
            });
        }

        // Along-track projection for progress, cross-track for error.
        let along = (self.vehicle.position_ned - path.start).dot(&span) / length_sq;
        let closest = path.start + span * along.clamp(0.0, 1.0);
        let cross = self.vehicle.position_ned - closest;

        // Head for the end point at the commanded speed, pulled back onto
        // the track by the cross-track error.
        let speed = path.end_velocity.min(self.gains.max_speed).max(0.1);
        let mut desired = to_end * (speed / distance) - cross * self.gains.kp_position;
        desired.z = desired.z.clamp(-self.gains.max_climb, self.gains.max_climb);
        self.velocity_desired = desired;

        Ok(PathStatus {
            // Arrival is detected by the completion radius above; cap the
            // projection so overshoot cannot skip it.
            fractional_progress: along.clamp(0.0, 0.999),
            error: cross.norm(),
        })
    }

    fn control_land(
        &mut self,
        _dt: f32,
        target: &Vector3<f32>,
        descent_rate: f32,
    ) -> Result<bool, &'static str> {
        let horizontal_target = Vector3::new(target.x, target.y, self.vehicle.position_ned.z);
        let mut desired = self.position_to_velocity(&horizontal_target);
        desired.z = descent_rate;
        self.velocity_desired = desired;
        // Touchdown detection belongs to the caller; this strategy only
        // commands the descent.
        Ok(false)
    }

    fn control_attitude(&mut self, dt: f32) -> Result<(), &'static str> {
        let error = self.velocity_desired - self.vehicle.velocity_ned;

        // Lean into the horizontal velocity error: forward acceleration
        // needs nose-down (negative) pitch, rightward needs positive roll.
        let pitch = (-self.gains.kp_velocity * error.x).clamp(-self.gains.max_lean, self.gains.max_lean);
        let roll = (self.gains.kp_velocity * error.y).clamp(-self.gains.max_lean, self.gains.max_lean);

        // Down-positive: a positive error means descend, so less throttle.
        self.throttle_integral =
            (self.throttle_integral - error.z * self.gains.ki_throttle * dt).clamp(-0.2, 0.2);
        let throttle = (self.gains.hover_throttle - self.gains.kp_throttle * error.z
            + self.throttle_integral)
            .clamp(0.0, 1.0);

        self.command = AttitudeCommand {
            roll,
            pitch,
            yaw: 0.0,
            throttle,
        };
        Ok(())
    }

    fn control_idle(&mut self, _dt: f32) -> Result<(), &'static str> {
        // Zero the outer loop but track the last throttle open-loop so
        // re-engagement does not jump.
        self.velocity_desired = Vector3::zeros();
        self.throttle_integral = 0.0;
        self.command = AttitudeCommand {
            throttle: self.command.throttle,
            ..AttitudeCommand::default()
        };
        Ok(())
    }
}
