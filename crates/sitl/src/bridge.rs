//! Closed-loop SITL bridge.
//!
//! Wires the pieces together the way the flight firmware would: the truth
//! model produces sensor frames, the estimator fuses them, the guidance FSM
//! ticks against the estimated state and drives the control strategy, whose
//! command feeds back into the truth model on the next step.
//!
//! Horizontal position and velocity are taken from the truth model directly,
//! standing in for a GPS-class position source; the vertical channel and
//! attitude come from the estimator.

use nalgebra::Vector3;
use quadnav_core::follower::{FsmEvent, FsmState, Goal, NavMode, VehicleState};
use quadnav_core::parameters::{follower as follower_params, ins as ins_params};
use quadnav_core::{GuidanceFsm, InsArena, InsFilter, InsHandle, ParameterStore};

use crate::error::SitlError;
use crate::follower::{FollowerGains, SitlFollower};
use crate::vehicle::{TruthConfig, TruthVehicle};

/// Barometer update divisor relative to the inertial rate.
const BARO_DECIMATION: u64 = 4;

/// Magnetometer update divisor relative to the inertial rate.
const MAG_DECIMATION: u64 = 10;

/// One vehicle's worth of closed-loop simulation.
pub struct SitlBridge {
    parameters: ParameterStore,
    arena: InsArena<4>,
    handle: InsHandle,
    truth: TruthVehicle,
    follower: SitlFollower,
    fsm: GuidanceFsm,
    period: f32,
    tick: u64,
}

impl SitlBridge {
    /// Create a bridge with the vehicle at rest at `start_ned` (m, NED
    /// relative to home) and all parameters at their registered defaults.
    pub fn new(seed: u64, start_ned: Vector3<f32>) -> Result<Self, SitlError> {
        let mut parameters = ParameterStore::new();
        ins_params::register_defaults(&mut parameters)?;
        follower_params::register_defaults(&mut parameters)?;

        let ins_config = ins_params::load_config(&parameters);
        let follower_config = follower_params::load_config(&parameters);
        let period = follower_config.period;

        let mut arena = InsArena::new();
        let handle = arena.alloc(ins_config)?;

        let truth = TruthVehicle::new(
            start_ned,
            TruthConfig {
                seed: Some(seed),
                ..TruthConfig::default()
            },
        );

        Ok(Self {
            parameters,
            arena,
            handle,
            truth,
            follower: SitlFollower::new(FollowerGains::default()),
            fsm: GuidanceFsm::new(follower_config),
            period,
            tick: 0,
        })
    }

    /// Activate a guidance goal against the current estimated state and arm
    /// the estimator's calibration states.
    pub fn activate(&mut self, goal: Goal) -> Result<(), SitlError> {
        self.arena.get_mut(self.handle)?.set_armed(true);
        let snapshot = self.snapshot()?;
        self.fsm.activate(goal, &snapshot);
        Ok(())
    }

    /// Run one guidance period end to end.
    pub fn step(&mut self) -> Result<(), SitlError> {
        // Apply last tick's command to the plant and read the sensors.
        let command = self.follower.command();
        self.truth.step(&command, self.period);
        let sample = self.truth.sample();

        {
            let ins = self.arena.get_mut(self.handle)?;
            ins.predict(
                command.roll,
                command.pitch,
                command.yaw,
                command.throttle,
                self.period,
            )?;
            ins.correct_accel_gyro(sample.accel, sample.gyro)?;
            if self.tick % BARO_DECIMATION == 0 {
                ins.correct_baro(sample.baro_altitude)?;
            }
            if self.tick % MAG_DECIMATION == 0 {
                ins.correct_mag(sample.mag)?;
            }
        }

        let snapshot = self.snapshot()?;
        self.follower.set_vehicle_state(&snapshot);
        self.fsm.tick(&snapshot, &mut self.follower)?;

        // The landing strategy commands the descent; touchdown is detected
        // here from the truth model and reported as a target hit.
        if self.fsm.nav_mode() == NavMode::Land && self.truth.on_ground() {
            self.fsm.inject(FsmEvent::HitTarget, &snapshot);
        }

        self.tick = self.tick.wrapping_add(1);
        Ok(())
    }

    /// Vehicle-state snapshot as the guidance layer sees it.
    fn snapshot(&self) -> Result<VehicleState, SitlError> {
        let ins = self.arena.get(self.handle)?;
        let truth_position = self.truth.position();
        let truth_velocity = self.truth.velocity();
        Ok(VehicleState {
            position_ned: Vector3::new(truth_position.x, truth_position.y, ins.altitude()),
            velocity_ned: Vector3::new(truth_velocity.x, truth_velocity.y, ins.velocity().z),
            attitude: ins.attitude(),
        })
    }

    /// Guidance FSM, for state inspection.
    pub fn fsm(&self) -> &GuidanceFsm {
        &self.fsm
    }

    /// Estimator instance.
    pub fn estimator(&self) -> Result<&InsFilter, SitlError> {
        Ok(self.arena.get(self.handle)?)
    }

    /// Truth model, for comparing estimates against reality.
    pub fn truth(&self) -> &TruthVehicle {
        &self.truth
    }

    /// Parameter store backing the estimator and follower configuration.
    pub fn parameters(&mut self) -> &mut ParameterStore {
        &mut self.parameters
    }

    /// Simulated time in seconds.
    pub fn sim_time(&self) -> f32 {
        self.tick as f32 * self.period
    }

    /// Current FSM state.
    pub fn state(&self) -> FsmState {
        self.fsm.state()
    }

    /// True once the FSM has requested disarm after landing.
    pub fn disarm_requested(&self) -> bool {
        self.fsm.disarm_requested()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_steps_without_goal() {
        let mut bridge = SitlBridge::new(1, Vector3::new(0.0, 0.0, -10.0)).unwrap();
        for _ in 0..20 {
            bridge.step().unwrap();
        }
        assert!(bridge.fsm().goal().is_none());
        assert!((bridge.sim_time() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_activate_hold_reaches_holding() {
        let mut bridge = SitlBridge::new(2, Vector3::new(0.0, 0.0, -20.0)).unwrap();
        bridge.activate(Goal::HoldPosition).unwrap();
        assert_eq!(bridge.state(), FsmState::Holding);
        for _ in 0..40 {
            bridge.step().unwrap();
        }
        assert_eq!(bridge.state(), FsmState::Holding);
        assert!(!bridge.fsm().is_faulted());
    }

    #[test]
    fn test_estimator_tracks_baro_altitude() {
        let mut bridge = SitlBridge::new(3, Vector3::new(0.0, 0.0, -10.0)).unwrap();
        bridge.activate(Goal::HoldPosition).unwrap();
        for _ in 0..200 {
            bridge.step().unwrap();
        }
        let estimated_down = bridge.estimator().unwrap().altitude();
        let true_down = bridge.truth().position().z;
        assert!(
            (estimated_down - true_down).abs() < 2.0,
            "estimated down {} vs true {}",
            estimated_down,
            true_down
        );
    }
}
