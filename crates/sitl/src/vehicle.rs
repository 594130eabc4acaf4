//! Point-mass quadrotor truth model.
//!
//! Built-in physics with no external simulator dependency, suitable for CI
//! testing and rapid iteration. The attitude loop is modeled as a first-order
//! lag toward the commanded roll/pitch, which is a reasonable stand-in for a
//! well-tuned rate controller at guidance timescales. Sensors are synthesized
//! from the true state with configurable Gaussian noise and deterministic
//! seeding.

use nalgebra::{UnitQuaternion, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Standard gravity in m/s^2.
const GRAVITY: f32 = 9.81;

/// Attitude and throttle command applied to the plant for one step.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttitudeCommand {
    /// Commanded roll angle in radians.
    pub roll: f32,
    /// Commanded pitch angle in radians.
    pub pitch: f32,
    /// Commanded yaw rate, normalized (-1.0 to 1.0).
    pub yaw: f32,
    /// Throttle fraction (0.0 to 1.0), hover around 0.5.
    pub throttle: f32,
}

/// One synthesized sensor frame.
#[derive(Debug, Clone, Copy)]
pub struct SensorSample {
    /// Body-frame specific force in m/s^2 (z near -g in hover).
    pub accel: [f32; 3],
    /// Body rates in rad/s.
    pub gyro: [f32; 3],
    /// Barometric altitude above home in meters (up-positive).
    pub baro_altitude: f32,
    /// Body-frame magnetic field, unit north field rotated into the body.
    pub mag: [f32; 3],
}

/// Configuration for the truth model.
#[derive(Debug, Clone)]
pub struct TruthConfig {
    /// Attitude loop time constant in seconds.
    pub tau_attitude: f32,
    /// Yaw rate per unit of yaw command in rad/s.
    pub yaw_rate_gain: f32,
    /// Specific force per unit throttle in m/s^2 (hover at ~0.5 throttle).
    pub thrust_gain: f32,
    /// Linear drag coefficient in 1/s.
    pub drag: f32,
    /// Accelerometer noise standard deviation in m/s^2.
    pub accel_noise: f32,
    /// Gyroscope noise standard deviation in rad/s.
    pub gyro_noise: f32,
    /// Barometer noise standard deviation in meters.
    pub baro_noise: f32,
    /// Magnetometer noise standard deviation per axis.
    pub mag_noise: f32,
    /// RNG seed for deterministic runs. None = random.
    pub seed: Option<u64>,
}

impl Default for TruthConfig {
    fn default() -> Self {
        Self {
            tau_attitude: 0.15,
            yaw_rate_gain: 2.0,
            thrust_gain: 2.0 * GRAVITY,
            drag: 0.1,
            accel_noise: 0.05,
            gyro_noise: 0.002,
            baro_noise: 0.3,
            mag_noise: 0.01,
            seed: None,
        }
    }
}

/// Quadrotor truth state with built-in sensor synthesis.
pub struct TruthVehicle {
    config: TruthConfig,
    position: Vector3<f32>,
    velocity: Vector3<f32>,
    roll: f32,
    pitch: f32,
    yaw: f32,
    rates: Vector3<f32>,
    thrust: f32,
    rng: StdRng,
}

impl TruthVehicle {
    /// Create a vehicle at rest at `position` (m, NED relative to home).
    pub fn new(position: Vector3<f32>, config: TruthConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            position,
            velocity: Vector3::zeros(),
            roll: 0.0,
            pitch: 0.0,
            yaw: 0.0,
            rates: Vector3::zeros(),
            thrust: 0.0,
            rng,
        }
    }

    /// Integrate the plant for one step of `dt` seconds.
    pub fn step(&mut self, command: &AttitudeCommand, dt: f32) {
        // Attitude loop: first-order lag toward the commanded angles.
        let roll_rate = (command.roll - self.roll) / self.config.tau_attitude;
        let pitch_rate = (command.pitch - self.pitch) / self.config.tau_attitude;
        let yaw_rate = command.yaw.clamp(-1.0, 1.0) * self.config.yaw_rate_gain;
        self.rates = Vector3::new(roll_rate, pitch_rate, yaw_rate);

        self.roll += roll_rate * dt;
        self.pitch += pitch_rate * dt;
        self.yaw += yaw_rate * dt;

        self.thrust = self.config.thrust_gain * command.throttle.clamp(0.0, 1.0);

        // Translational dynamics: thrust along body -z, gravity, linear drag.
        let body_z = self.attitude() * Vector3::new(0.0, 0.0, 1.0);
        let accel = body_z * (-self.thrust) + Vector3::new(0.0, 0.0, GRAVITY)
            - self.velocity * self.config.drag;

        self.velocity += accel * dt;
        self.position += self.velocity * dt;

        // Ground plane at the home altitude; no bouncing.
        if self.position.z > 0.0 {
            self.position.z = 0.0;
            if self.velocity.z > 0.0 {
                self.velocity.z = 0.0;
            }
        }
    }

    /// Synthesize one noisy sensor frame from the current true state.
    pub fn sample(&mut self) -> SensorSample {
        let rotation = self.attitude();

        // Specific force in the body frame: thrust plus drag, gravity
        // removed (an accelerometer cannot sense free fall).
        let drag_body = rotation.inverse() * (self.velocity * self.config.drag);
        let accel = [
            -drag_body.x + self.gaussian(self.config.accel_noise),
            -drag_body.y + self.gaussian(self.config.accel_noise),
            -self.thrust - drag_body.z + self.gaussian(self.config.accel_noise),
        ];

        let gyro = [
            self.rates.x + self.gaussian(self.config.gyro_noise),
            self.rates.y + self.gaussian(self.config.gyro_noise),
            self.rates.z + self.gaussian(self.config.gyro_noise),
        ];

        let baro_altitude = -self.position.z + self.gaussian(self.config.baro_noise);

        // Unit north field rotated into the body frame.
        let mag_body = rotation.inverse() * Vector3::new(1.0, 0.0, 0.0);
        let mag = [
            mag_body.x + self.gaussian(self.config.mag_noise),
            mag_body.y + self.gaussian(self.config.mag_noise),
            mag_body.z + self.gaussian(self.config.mag_noise),
        ];

        SensorSample {
            accel,
            gyro,
            baro_altitude,
            mag,
        }
    }

    /// True position in meters (NED relative to home).
    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    /// True velocity in m/s (NED).
    pub fn velocity(&self) -> Vector3<f32> {
        self.velocity
    }

    /// True attitude as a body-to-NED rotation.
    pub fn attitude(&self) -> UnitQuaternion<f32> {
        UnitQuaternion::from_euler_angles(self.roll, self.pitch, self.yaw)
    }

    /// True Euler angles (roll, pitch, yaw) in radians.
    pub fn euler(&self) -> (f32, f32, f32) {
        (self.roll, self.pitch, self.yaw)
    }

    /// True body rates in rad/s.
    pub fn rates(&self) -> Vector3<f32> {
        self.rates
    }

    /// Whether the vehicle is resting on the ground plane.
    pub fn on_ground(&self) -> bool {
        self.position.z > -0.05 && self.velocity.z.abs() < 0.2
    }

    /// Generate Gaussian noise using the Box-Muller transform.
    fn gaussian(&mut self, stddev: f32) -> f32 {
        if stddev == 0.0 {
            return 0.0;
        }
        let u1: f32 = self.rng.gen::<f32>().max(f32::EPSILON);
        let u2: f32 = self.rng.gen();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos();
        z * stddev
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config() -> TruthConfig {
        TruthConfig {
            accel_noise: 0.0,
            gyro_noise: 0.0,
            baro_noise: 0.0,
            mag_noise: 0.0,
            seed: Some(7),
            ..TruthConfig::default()
        }
    }

    #[test]
    fn test_hover_throttle_holds_altitude() {
        let mut vehicle = TruthVehicle::new(Vector3::new(0.0, 0.0, -10.0), quiet_config());
        let hover = AttitudeCommand {
            throttle: 0.5,
            ..AttitudeCommand::default()
        };
        for _ in 0..200 {
            vehicle.step(&hover, 0.05);
        }
        assert!(
            (vehicle.position().z + 10.0).abs() < 0.1,
            "hover throttle must hold altitude, drifted to {}",
            vehicle.position().z
        );
    }

    #[test]
    fn test_zero_throttle_falls_to_ground() {
        let mut vehicle = TruthVehicle::new(Vector3::new(0.0, 0.0, -5.0), quiet_config());
        let idle = AttitudeCommand::default();
        for _ in 0..400 {
            vehicle.step(&idle, 0.05);
        }
        assert!(vehicle.on_ground());
        assert!(vehicle.position().z.abs() < 1e-6, "ground plane must clamp");
    }

    #[test]
    fn test_pitch_down_accelerates_north() {
        let mut vehicle = TruthVehicle::new(Vector3::new(0.0, 0.0, -20.0), quiet_config());
        let cmd = AttitudeCommand {
            pitch: -0.2,
            throttle: 0.52,
            ..AttitudeCommand::default()
        };
        for _ in 0..100 {
            vehicle.step(&cmd, 0.05);
        }
        assert!(
            vehicle.velocity().x > 0.5,
            "nose-down pitch must accelerate north, got {}",
            vehicle.velocity().x
        );
    }

    #[test]
    fn test_sensor_sample_hover_signature() {
        let mut vehicle = TruthVehicle::new(Vector3::new(0.0, 0.0, -10.0), quiet_config());
        let hover = AttitudeCommand {
            throttle: 0.5,
            ..AttitudeCommand::default()
        };
        for _ in 0..100 {
            vehicle.step(&hover, 0.05);
        }
        let sample = vehicle.sample();
        // Level hover: accel z reads -g, gyro quiet, baro at true altitude.
        assert!((sample.accel[2] + GRAVITY).abs() < 0.2);
        assert!(sample.gyro[0].abs() < 0.01);
        assert!((sample.baro_altitude - 10.0).abs() < 0.2);
        // Zero yaw: the north field reads on the body x axis.
        assert!((sample.mag[0] - 1.0).abs() < 0.05);
        assert!(sample.mag[1].abs() < 0.05);
    }

    #[test]
    fn test_deterministic_with_same_seed() {
        let mut a = TruthVehicle::new(Vector3::zeros(), TruthConfig {
            seed: Some(42),
            ..TruthConfig::default()
        });
        let mut b = TruthVehicle::new(Vector3::zeros(), TruthConfig {
            seed: Some(42),
            ..TruthConfig::default()
        });
        let cmd = AttitudeCommand {
            throttle: 0.5,
            ..AttitudeCommand::default()
        };
        for _ in 0..10 {
            a.step(&cmd, 0.05);
            b.step(&cmd, 0.05);
        }
        let sa = a.sample();
        let sb = b.sample();
        assert_eq!(sa.accel, sb.accel);
        assert_eq!(sa.gyro, sb.gyro);
    }
}
