//! Extended Kalman filter over the full multirotor state
//!
//! The dynamics model is control-affine: the commanded roll/pitch/yaw and
//! throttle are tracked by a generalized torque/thrust state with a
//! first-order lag of time constant `tau`; the torque states drive the body
//! rates through per-axis gains, and the thrust channel produces vertical
//! specific force scaled by the learned thrust scale factor. Drag opposes
//! velocity through the learned drag coefficient.
//!
//! Corrections are applied as sequential scalar Kalman updates (the sensor
//! noise matrix is diagonal), so same-tick corrections linearize around the
//! post-previous-update state and updates of disjoint channels commute.
//!
//! # Conventions
//!
//! Navigation frame is NED with the position state positive-down;
//! `correct_baro` takes barometric altitude above the origin (up-positive)
//! and observes the negated position state. All math is single precision,
//! angles in radians.

use libm::{asinf, atan2f, cosf, sinf, sqrtf};
use nalgebra::{Matrix3, Quaternion, SMatrix, SVector, Vector3};

use super::config::{
    InsConfig, GRAVITY, INIT_COVARIANCE, NUM_STATES, PROCESS_ATT, PROCESS_GYRO_BIAS, PROCESS_MU,
    PROCESS_OUT_BIAS_XY, PROCESS_OUT_BIAS_Z, PROCESS_POS, PROCESS_RATE_RP, PROCESS_RATE_Y,
    PROCESS_THRUST, PROCESS_TORQUE, PROCESS_VEL_XY, PROCESS_VEL_Z, SENSOR_ACCEL, SENSOR_BARO,
    SENSOR_GYRO, SENSOR_MAG, STATE_BIAS, STATE_MU, STATE_OUT_BIAS, STATE_P, STATE_Q, STATE_T,
    STATE_THRUST, STATE_V, STATE_W,
};
use super::error::InsError;

type StateVector = SVector<f32, NUM_STATES>;
type CovMatrix = SMatrix<f32, NUM_STATES, NUM_STATES>;

/// Extended-state INS filter for one vehicle
///
/// Allocated once, reset to the canonical prior with [`InsFilter::init`],
/// then predicted and corrected for the vehicle's operational lifetime.
/// Designed for single-threaded cooperative use: one periodic task owns the
/// instance and serializes all predict/correct calls.
#[derive(Debug)]
pub struct InsFilter {
    x: StateVector,
    p: CovMatrix,
    config: InsConfig,
    armed: bool,
}

impl InsFilter {
    /// Create a filter at the canonical prior with the given tuning.
    pub fn new(config: InsConfig) -> Self {
        let mut filter = Self {
            x: StateVector::zeros(),
            p: CovMatrix::zeros(),
            config,
            armed: false,
        };
        filter.init();
        filter
    }

    /// Reset state and covariance to the canonical prior. Idempotent.
    ///
    /// Prior: identity quaternion, zero velocity/rate/torque/biases,
    /// thrust scale and drag coefficient from the configured defaults.
    pub fn init(&mut self) {
        self.x = StateVector::zeros();
        self.x[STATE_Q] = 1.0;
        self.x[STATE_THRUST] = self.config.init_thrust;
        self.x[STATE_MU] = self.config.init_mu;

        self.p = CovMatrix::zeros();
        let c = &INIT_COVARIANCE;
        self.p[(STATE_P, STATE_P)] = c.position;
        for i in 0..3 {
            self.p[(STATE_V + i, STATE_V + i)] = c.velocity;
            self.p[(STATE_W + i, STATE_W + i)] = c.rate;
            self.p[(STATE_BIAS + i, STATE_BIAS + i)] = c.gyro_bias;
            self.p[(STATE_OUT_BIAS + i, STATE_OUT_BIAS + i)] = c.out_bias;
        }
        for i in 0..4 {
            self.p[(STATE_Q + i, STATE_Q + i)] = c.attitude;
            self.p[(STATE_T + i, STATE_T + i)] = c.torque;
        }
        self.p[(STATE_THRUST, STATE_THRUST)] = c.thrust;
        self.p[(STATE_MU, STATE_MU)] = c.mu;
    }

    // ------------------------------------------------------------------
    // Prediction
    // ------------------------------------------------------------------

    /// Advance the state by `dt` seconds from the commanded attitude and
    /// throttle, and propagate the covariance with the configured process
    /// noise.
    ///
    /// Fails only on a non-positive/non-finite `dt` or non-finite commands;
    /// the state is left untouched on failure and the caller should skip
    /// consuming outputs for this tick.
    pub fn predict(
        &mut self,
        roll_cmd: f32,
        pitch_cmd: f32,
        yaw_cmd: f32,
        throttle_cmd: f32,
        dt: f32,
    ) -> Result<(), InsError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(InsError::InvalidTimeStep);
        }
        if ![roll_cmd, pitch_cmd, yaw_cmd, throttle_cmd]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(InsError::InvalidInput);
        }

        let cmd = [roll_cmd, pitch_cmd, yaw_cmd, throttle_cmd];
        let gains = self.config.gains;
        let tau = self.config.tau;

        let q = self.quat_components();
        let c = dcm(&q);
        let v = self.velocity();
        let w = self.rate();
        let t3 = self.x[STATE_T + 3];
        let beta_t = self.x[STATE_THRUST];
        let mu = self.x[STATE_MU];

        // Body-frame specific force from the thrust channel.
        let fz = -(gains[3] * beta_t * t3);
        let body_z = Vector3::new(c[(0, 2)], c[(1, 2)], c[(2, 2)]);

        // State derivative.
        let mut xdot = StateVector::zeros();
        xdot[STATE_P] = v.z;
        let a_nav = body_z * fz + Vector3::new(0.0, 0.0, GRAVITY) - v * mu;
        for i in 0..3 {
            xdot[STATE_V + i] = a_nav[i];
        }
        // qdot = 1/2 * Omega(w) * q
        xdot[STATE_Q] = 0.5 * (-q[1] * w.x - q[2] * w.y - q[3] * w.z);
        xdot[STATE_Q + 1] = 0.5 * (q[0] * w.x - q[3] * w.y + q[2] * w.z);
        xdot[STATE_Q + 2] = 0.5 * (q[3] * w.x + q[0] * w.y - q[1] * w.z);
        xdot[STATE_Q + 3] = 0.5 * (-q[2] * w.x + q[1] * w.y + q[0] * w.z);
        for i in 0..3 {
            xdot[STATE_W + i] = gains[i] * self.x[STATE_T + i];
        }
        for i in 0..4 {
            xdot[STATE_T + i] = (cmd[i] - self.x[STATE_T + i]) / tau;
        }
        // Bias, thrust scale and drag states are random walks.

        // Discrete transition Jacobian Fd = I + F*dt.
        let mut fd = CovMatrix::identity();
        fd[(STATE_P, STATE_V + 2)] += dt;
        for i in 0..3 {
            fd[(STATE_V + i, STATE_V + i)] += -mu * dt;
            fd[(STATE_V + i, STATE_MU)] += -v[i] * dt;
            fd[(STATE_V + i, STATE_T + 3)] += body_z[i] * (-gains[3] * beta_t) * dt;
            fd[(STATE_V + i, STATE_THRUST)] += body_z[i] * (-gains[3] * t3) * dt;
        }
        // d(C(q) e3 * fz)/dq, homogeneous DCM form.
        let dq0 = Vector3::new(2.0 * q[2], -2.0 * q[1], 2.0 * q[0]);
        let dq1 = Vector3::new(2.0 * q[3], -2.0 * q[0], -2.0 * q[1]);
        let dq2 = Vector3::new(2.0 * q[0], 2.0 * q[3], -2.0 * q[2]);
        let dq3 = Vector3::new(2.0 * q[1], 2.0 * q[2], 2.0 * q[3]);
        for i in 0..3 {
            fd[(STATE_V + i, STATE_Q)] += dq0[i] * fz * dt;
            fd[(STATE_V + i, STATE_Q + 1)] += dq1[i] * fz * dt;
            fd[(STATE_V + i, STATE_Q + 2)] += dq2[i] * fz * dt;
            fd[(STATE_V + i, STATE_Q + 3)] += dq3[i] * fz * dt;
        }
        // dqdot/dq = 1/2 Omega(w)
        let half_dt = 0.5 * dt;
        fd[(STATE_Q, STATE_Q + 1)] += -w.x * half_dt;
        fd[(STATE_Q, STATE_Q + 2)] += -w.y * half_dt;
        fd[(STATE_Q, STATE_Q + 3)] += -w.z * half_dt;
        fd[(STATE_Q + 1, STATE_Q)] += w.x * half_dt;
        fd[(STATE_Q + 1, STATE_Q + 2)] += w.z * half_dt;
        fd[(STATE_Q + 1, STATE_Q + 3)] += -w.y * half_dt;
        fd[(STATE_Q + 2, STATE_Q)] += w.y * half_dt;
        fd[(STATE_Q + 2, STATE_Q + 1)] += -w.z * half_dt;
        fd[(STATE_Q + 2, STATE_Q + 3)] += w.x * half_dt;
        fd[(STATE_Q + 3, STATE_Q)] += w.z * half_dt;
        fd[(STATE_Q + 3, STATE_Q + 1)] += w.y * half_dt;
        fd[(STATE_Q + 3, STATE_Q + 2)] += -w.x * half_dt;
        // dqdot/dw
        fd[(STATE_Q, STATE_W)] += -q[1] * half_dt;
        fd[(STATE_Q, STATE_W + 1)] += -q[2] * half_dt;
        fd[(STATE_Q, STATE_W + 2)] += -q[3] * half_dt;
        fd[(STATE_Q + 1, STATE_W)] += q[0] * half_dt;
        fd[(STATE_Q + 1, STATE_W + 1)] += -q[3] * half_dt;
        fd[(STATE_Q + 1, STATE_W + 2)] += q[2] * half_dt;
        fd[(STATE_Q + 2, STATE_W)] += q[3] * half_dt;
        fd[(STATE_Q + 2, STATE_W + 1)] += q[0] * half_dt;
        fd[(STATE_Q + 2, STATE_W + 2)] += -q[1] * half_dt;
        fd[(STATE_Q + 3, STATE_W)] += -q[2] * half_dt;
        fd[(STATE_Q + 3, STATE_W + 1)] += q[1] * half_dt;
        fd[(STATE_Q + 3, STATE_W + 2)] += q[0] * half_dt;
        // Rate follows torque; torque lags the command.
        for i in 0..3 {
            fd[(STATE_W + i, STATE_T + i)] += gains[i] * dt;
        }
        for i in 0..4 {
            fd[(STATE_T + i, STATE_T + i)] += -dt / tau;
        }

        self.x += xdot * dt;
        self.normalize_quaternion();

        let q_diag = self.process_noise_diag();
        self.p = fd * self.p * fd.transpose();
        for i in 0..NUM_STATES {
            self.p[(i, i)] += q_diag[i] * dt;
        }
        self.symmetrize();

        Ok(())
    }

    /// Per-state process noise, expanded from the 15 configured channels.
    /// Thrust-scale and drag learning are gated off while disarmed.
    fn process_noise_diag(&self) -> [f32; NUM_STATES] {
        let q = &self.config.process_noise;
        let mut diag = [0.0f32; NUM_STATES];
        diag[STATE_P] = q[PROCESS_POS];
        diag[STATE_V] = q[PROCESS_VEL_XY];
        diag[STATE_V + 1] = q[PROCESS_VEL_XY];
        diag[STATE_V + 2] = q[PROCESS_VEL_Z];
        for i in 0..4 {
            diag[STATE_Q + i] = q[PROCESS_ATT];
            diag[STATE_T + i] = q[PROCESS_TORQUE + i];
        }
        diag[STATE_W] = q[PROCESS_RATE_RP];
        diag[STATE_W + 1] = q[PROCESS_RATE_RP];
        diag[STATE_W + 2] = q[PROCESS_RATE_Y];
        for i in 0..3 {
            diag[STATE_BIAS + i] = q[PROCESS_GYRO_BIAS];
        }
        diag[STATE_OUT_BIAS] = q[PROCESS_OUT_BIAS_XY];
        diag[STATE_OUT_BIAS + 1] = q[PROCESS_OUT_BIAS_XY];
        diag[STATE_OUT_BIAS + 2] = q[PROCESS_OUT_BIAS_Z];
        if self.armed {
            diag[STATE_THRUST] = q[PROCESS_THRUST];
            diag[STATE_MU] = q[PROCESS_MU];
        }
        diag
    }

    // ------------------------------------------------------------------
    // Corrections
    // ------------------------------------------------------------------

    /// Fused accelerometer/gyroscope measurement update (same tick).
    ///
    /// Gyro rows observe rate plus gyro bias; accel rows observe the model
    /// output: thrust specific force, velocity drag rotated into the body
    /// frame, and the output bias.
    pub fn correct_accel_gyro(&mut self, accel: [f32; 3], gyro: [f32; 3]) -> Result<(), InsError> {
        if !accel.iter().chain(gyro.iter()).all(|v| v.is_finite()) {
            return Err(InsError::InvalidInput);
        }

        for i in 0..3 {
            let predicted = self.x[STATE_W + i] + self.x[STATE_BIAS + i];
            let mut h = StateVector::zeros();
            h[STATE_W + i] = 1.0;
            h[STATE_BIAS + i] = 1.0;
            self.scalar_update(
                &h,
                gyro[i] - predicted,
                self.config.sensor_noise[SENSOR_GYRO + i],
            );
        }

        for i in 0..3 {
            let q = self.quat_components();
            let c = dcm(&q);
            let v = self.velocity();
            let t3 = self.x[STATE_T + 3];
            let beta_t = self.x[STATE_THRUST];
            let mu = self.x[STATE_MU];
            let g3 = self.config.gains[3];

            // Drag rotated into the body frame.
            let v_body = c.transpose() * v;
            let mut predicted = -mu * v_body[i] + self.x[STATE_OUT_BIAS + i];
            if i == 2 {
                predicted += -(g3 * beta_t * t3);
            }

            let mut h = StateVector::zeros();
            h[STATE_OUT_BIAS + i] = 1.0;
            h[STATE_MU] = -v_body[i];
            for j in 0..3 {
                // (C^T v) row i depends on the i-th column of C.
                h[STATE_V + j] = -mu * c[(j, i)];
            }
            if i == 2 {
                h[STATE_T + 3] = -(g3 * beta_t);
                h[STATE_THRUST] = -(g3 * t3);
            }
            // Attitude sensitivity of the drag term is negligible at
            // multirotor speeds and is not linearized.
            self.scalar_update(
                &h,
                accel[i] - predicted,
                self.config.sensor_noise[SENSOR_ACCEL + i],
            );
        }

        self.normalize_quaternion();
        Ok(())
    }

    /// Barometric altitude update; `baro` is meters above the origin
    /// (up-positive) and observes the negated down-position state.
    pub fn correct_baro(&mut self, baro: f32) -> Result<(), InsError> {
        if !baro.is_finite() {
            return Err(InsError::InvalidInput);
        }
        let mut h = StateVector::zeros();
        h[STATE_P] = -1.0;
        let predicted = -self.x[STATE_P];
        self.scalar_update(&h, baro - predicted, self.config.sensor_noise[SENSOR_BARO]);
        // Position-attitude cross covariance makes this update touch the
        // quaternion states too.
        self.normalize_quaternion();
        Ok(())
    }

    /// Magnetometer update: tilt-compensated heading observed through its
    /// sine and cosine components. Rejects zero-norm fields.
    pub fn correct_mag(&mut self, mag: [f32; 3]) -> Result<(), InsError> {
        if !mag.iter().all(|v| v.is_finite()) {
            return Err(InsError::InvalidInput);
        }
        let norm = sqrtf(mag[0] * mag[0] + mag[1] * mag[1] + mag[2] * mag[2]);
        if norm < 1e-6 {
            return Err(InsError::InvalidInput);
        }

        // Level the field with the current roll/pitch estimate, then take
        // the NED magnetic heading (declination handled upstream).
        let (roll, pitch) = self.roll_pitch();
        let (sr, cr) = (sinf(roll), cosf(roll));
        let (sp, cp) = (sinf(pitch), cosf(pitch));
        let mx = mag[0] * cp + mag[1] * sr * sp + mag[2] * cr * sp;
        let my = mag[1] * cr - mag[2] * sr;
        let yaw_measured = atan2f(-my, mx);

        for (channel, measured) in [
            (SENSOR_MAG, sinf(yaw_measured)),
            (SENSOR_MAG + 1, cosf(yaw_measured)),
        ] {
            let q = self.quat_components();
            let n = 2.0 * (q[1] * q[2] + q[0] * q[3]);
            let d = q[0] * q[0] + q[1] * q[1] - q[2] * q[2] - q[3] * q[3];
            let yaw = atan2f(n, d);
            let denom = n * n + d * d;
            if denom < 1e-9 {
                continue;
            }
            // dyaw/dq = (d*dn - n*dd) / (n^2 + d^2)
            let dn = [2.0 * q[3], 2.0 * q[2], 2.0 * q[1], 2.0 * q[0]];
            let dd = [2.0 * q[0], 2.0 * q[1], -2.0 * q[2], -2.0 * q[3]];
            let scale = if channel == SENSOR_MAG {
                cosf(yaw)
            } else {
                -sinf(yaw)
            };
            let predicted = if channel == SENSOR_MAG {
                sinf(yaw)
            } else {
                cosf(yaw)
            };
            let mut h = StateVector::zeros();
            for j in 0..4 {
                h[STATE_Q + j] = scale * (d * dn[j] - n * dd[j]) / denom;
            }
            self.scalar_update(&h, measured - predicted, self.config.sensor_noise[channel]);
        }

        self.normalize_quaternion();
        Ok(())
    }

    /// One scalar Kalman update: `h` is the measurement Jacobian row,
    /// `innovation` the measurement residual, `r` the channel variance.
    fn scalar_update(&mut self, h: &StateVector, innovation: f32, r: f32) {
        let ph = self.p * h;
        let s = h.dot(&ph) + r;
        if s <= 1e-12 {
            return;
        }
        let mut k = ph / s;
        if !self.armed {
            // Freeze thrust-scale and drag learning while disarmed.
            k[STATE_THRUST] = 0.0;
            k[STATE_MU] = 0.0;
        }
        self.x += k * innovation;
        self.p -= k * ph.transpose();
        self.symmetrize();
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Replace the measurement noise variances (channel layout in
    /// [`super::config`]). Takes effect on the next correction.
    pub fn set_sensor_noise(
        &mut self,
        noises: [f32; super::config::NUM_SENSOR_NOISES],
    ) -> Result<(), InsError> {
        if !noises.iter().all(|n| n.is_finite() && *n > 0.0) {
            return Err(InsError::InvalidInput);
        }
        self.config.sensor_noise = noises;
        Ok(())
    }

    /// Replace the process noise densities (channel layout in
    /// [`super::config`]). Takes effect on the next predict.
    pub fn set_process_noise(
        &mut self,
        noises: [f32; super::config::NUM_PROCESS_NOISES],
    ) -> Result<(), InsError> {
        if !noises.iter().all(|n| n.is_finite() && *n >= 0.0) {
            return Err(InsError::InvalidInput);
        }
        self.config.process_noise = noises;
        Ok(())
    }

    /// Replace the control-effectiveness gains.
    pub fn set_gains(&mut self, gains: [f32; 4]) -> Result<(), InsError> {
        if !gains.iter().all(|g| g.is_finite()) {
            return Err(InsError::InvalidInput);
        }
        self.config.gains = gains;
        Ok(())
    }

    /// Replace the command-tracking time constant.
    pub fn set_tau(&mut self, tau: f32) -> Result<(), InsError> {
        if !tau.is_finite() || tau <= 0.0 {
            return Err(InsError::InvalidInput);
        }
        self.config.tau = tau;
        Ok(())
    }

    /// Gate learning of the thrust-scale and drag states. While disarmed
    /// these states are frozen to avoid drift when stationary.
    pub fn set_armed(&mut self, armed: bool) {
        self.armed = armed;
    }

    /// Seed the thrust scale factor directly, bypassing the filter update.
    pub fn set_init_thrust(&mut self, thrust: f32) -> Result<(), InsError> {
        if !thrust.is_finite() {
            return Err(InsError::InvalidInput);
        }
        self.x[STATE_THRUST] = thrust;
        Ok(())
    }

    /// Seed the gyro bias directly, bypassing the filter update.
    pub fn set_init_bias(&mut self, bias: [f32; 3]) -> Result<(), InsError> {
        if !bias.iter().all(|b| b.is_finite()) {
            return Err(InsError::InvalidInput);
        }
        for i in 0..3 {
            self.x[STATE_BIAS + i] = bias[i];
        }
        Ok(())
    }

    /// Seed the drag coefficient directly, bypassing the filter update.
    pub fn set_init_mu(&mut self, mu: f32) -> Result<(), InsError> {
        if !mu.is_finite() {
            return Err(InsError::InvalidInput);
        }
        self.x[STATE_MU] = mu;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Getters
    // ------------------------------------------------------------------

    /// Down position in meters (NED, positive below the origin).
    pub fn altitude(&self) -> f32 {
        self.x[STATE_P]
    }

    /// NED velocity (m/s).
    pub fn velocity(&self) -> Vector3<f32> {
        Vector3::new(self.x[STATE_V], self.x[STATE_V + 1], self.x[STATE_V + 2])
    }

    /// Attitude quaternion, scalar-first.
    pub fn attitude(&self) -> Quaternion<f32> {
        Quaternion::new(
            self.x[STATE_Q],
            self.x[STATE_Q + 1],
            self.x[STATE_Q + 2],
            self.x[STATE_Q + 3],
        )
    }

    /// Bias-corrected body rate (rad/s).
    pub fn rate(&self) -> Vector3<f32> {
        Vector3::new(self.x[STATE_W], self.x[STATE_W + 1], self.x[STATE_W + 2])
    }

    /// Generalized torque/thrust state (internal dynamics model state).
    pub fn torque(&self) -> [f32; 4] {
        [
            self.x[STATE_T],
            self.x[STATE_T + 1],
            self.x[STATE_T + 2],
            self.x[STATE_T + 3],
        ]
    }

    /// Gyro bias estimate (rad/s).
    pub fn bias(&self) -> Vector3<f32> {
        Vector3::new(
            self.x[STATE_BIAS],
            self.x[STATE_BIAS + 1],
            self.x[STATE_BIAS + 2],
        )
    }

    /// Thrust scale factor estimate.
    pub fn thrust(&self) -> f32 {
        self.x[STATE_THRUST]
    }

    /// Accelerometer/model output bias estimate (m/s^2).
    pub fn output_bias(&self) -> Vector3<f32> {
        Vector3::new(
            self.x[STATE_OUT_BIAS],
            self.x[STATE_OUT_BIAS + 1],
            self.x[STATE_OUT_BIAS + 2],
        )
    }

    /// Drag coefficient estimate (1/s).
    pub fn mu(&self) -> f32 {
        self.x[STATE_MU]
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn quat_components(&self) -> [f32; 4] {
        [
            self.x[STATE_Q],
            self.x[STATE_Q + 1],
            self.x[STATE_Q + 2],
            self.x[STATE_Q + 3],
        ]
    }

    fn roll_pitch(&self) -> (f32, f32) {
        let q = self.quat_components();
        let roll = atan2f(
            2.0 * (q[0] * q[1] + q[2] * q[3]),
            q[0] * q[0] - q[1] * q[1] - q[2] * q[2] + q[3] * q[3],
        );
        let sin_pitch = (2.0 * (q[0] * q[2] - q[3] * q[1])).clamp(-1.0, 1.0);
        (roll, asinf(sin_pitch))
    }

    /// Restore the unit-norm invariant after a predict or correct step.
    fn normalize_quaternion(&mut self) {
        let q = self.quat_components();
        let norm = sqrtf(q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]);
        if norm > 1e-6 {
            for i in 0..4 {
                self.x[STATE_Q + i] /= norm;
            }
        } else {
            self.x[STATE_Q] = 1.0;
            self.x[STATE_Q + 1] = 0.0;
            self.x[STATE_Q + 2] = 0.0;
            self.x[STATE_Q + 3] = 0.0;
        }
    }

    fn symmetrize(&mut self) {
        self.p = (self.p + self.p.transpose()) * 0.5;
    }
}

/// Body-to-nav direction cosine matrix from a scalar-first quaternion,
/// homogeneous form (valid for unit quaternions).
fn dcm(q: &[f32; 4]) -> Matrix3<f32> {
    let (q0, q1, q2, q3) = (q[0], q[1], q[2], q[3]);
    Matrix3::new(
        q0 * q0 + q1 * q1 - q2 * q2 - q3 * q3,
        2.0 * (q1 * q2 - q0 * q3),
        2.0 * (q1 * q3 + q0 * q2),
        2.0 * (q1 * q2 + q0 * q3),
        q0 * q0 - q1 * q1 + q2 * q2 - q3 * q3,
        2.0 * (q2 * q3 - q0 * q1),
        2.0 * (q1 * q3 - q0 * q2),
        2.0 * (q2 * q3 + q0 * q1),
        q0 * q0 - q1 * q1 - q2 * q2 + q3 * q3,
    )
}

#[cfg(test)]
mod tests {
    use super::super::config::{InsConfig, NUM_PROCESS_NOISES, NUM_SENSOR_NOISES};
    use super::*;

    fn quat_norm(filter: &InsFilter) -> f32 {
        let q = filter.attitude();
        sqrtf(q.w * q.w + q.i * q.i + q.j * q.j + q.k * q.k)
    }

    #[test]
    fn test_init_returns_canonical_prior() {
        let filter = InsFilter::new(InsConfig::default());
        let q = filter.attitude();
        assert!((q.w - 1.0).abs() < 1e-6, "identity quaternion expected");
        assert!(q.i.abs() < 1e-6 && q.j.abs() < 1e-6 && q.k.abs() < 1e-6);
        assert!(filter.altitude().abs() < 1e-6);
        assert!(filter.velocity().norm() < 1e-6);
        assert!(filter.bias().norm() < 1e-6);
        assert!(filter.output_bias().norm() < 1e-6);
        assert!((filter.thrust() - 1.0).abs() < 1e-6);
        assert!((filter.mu() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_init_is_idempotent() {
        let mut filter = InsFilter::new(InsConfig::default());
        filter.predict(0.1, -0.1, 0.2, 0.6, 0.02).unwrap();
        filter.init();
        filter.init();
        assert!(filter.altitude().abs() < 1e-6);
        assert!((filter.thrust() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_predict_preserves_quaternion_norm() {
        let mut filter = InsFilter::new(InsConfig::default());
        for _ in 0..500 {
            filter.predict(0.3, -0.2, 0.5, 0.7, 0.02).unwrap();
            let norm = quat_norm(&filter);
            assert!(
                (norm - 1.0).abs() < 1e-4,
                "quaternion norm drifted to {}",
                norm
            );
        }
    }

    #[test]
    fn test_corrections_preserve_quaternion_norm() {
        let mut filter = InsFilter::new(InsConfig::default());
        for _ in 0..100 {
            filter.predict(0.0, 0.0, 0.0, 0.5, 0.02).unwrap();
            filter
                .correct_accel_gyro([0.1, -0.1, -9.8], [0.01, 0.0, -0.01])
                .unwrap();
            filter.correct_mag([0.4, 0.1, 0.3]).unwrap();
            let norm = quat_norm(&filter);
            assert!((norm - 1.0).abs() < 1e-4, "norm {}", norm);
        }
    }

    #[test]
    fn test_baro_preserves_quaternion_norm_with_cross_covariance() {
        let mut filter = InsFilter::new(InsConfig::default());
        // Long maneuvering run so the covariance develops cross terms
        // between the position and attitude states.
        for _ in 0..200 {
            filter.predict(0.3, -0.2, 0.1, 0.6, 0.02).unwrap();
            filter
                .correct_accel_gyro([0.5, -0.3, -9.0], [0.1, -0.05, 0.02])
                .unwrap();
        }
        filter.correct_baro(80.0).unwrap();
        let norm = quat_norm(&filter);
        assert!(
            (norm - 1.0).abs() < 1e-4,
            "quaternion norm after baro update: {}",
            norm
        );
    }

    #[test]
    fn test_predict_rejects_invalid_dt() {
        let mut filter = InsFilter::new(InsConfig::default());
        assert_eq!(
            filter.predict(0.0, 0.0, 0.0, 0.5, 0.0),
            Err(InsError::InvalidTimeStep)
        );
        assert_eq!(
            filter.predict(0.0, 0.0, 0.0, 0.5, -0.01),
            Err(InsError::InvalidTimeStep)
        );
        assert_eq!(
            filter.predict(0.0, 0.0, 0.0, 0.5, f32::NAN),
            Err(InsError::InvalidTimeStep)
        );
        // State untouched after the failures.
        assert!(filter.altitude().abs() < 1e-6);
        assert!((filter.thrust() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_predict_rejects_non_finite_commands() {
        let mut filter = InsFilter::new(InsConfig::default());
        assert_eq!(
            filter.predict(f32::INFINITY, 0.0, 0.0, 0.5, 0.02),
            Err(InsError::InvalidInput)
        );
        assert_eq!(
            filter.predict(0.0, 0.0, f32::NAN, 0.5, 0.02),
            Err(InsError::InvalidInput)
        );
    }

    #[test]
    fn test_corrections_reject_non_finite_inputs() {
        let mut filter = InsFilter::new(InsConfig::default());
        assert_eq!(
            filter.correct_accel_gyro([f32::NAN, 0.0, 0.0], [0.0; 3]),
            Err(InsError::InvalidInput)
        );
        assert_eq!(filter.correct_baro(f32::NAN), Err(InsError::InvalidInput));
        assert_eq!(
            filter.correct_mag([0.0, 0.0, 0.0]),
            Err(InsError::InvalidInput),
            "zero-norm field must be rejected"
        );
    }

    #[test]
    fn test_baro_pulls_altitude_toward_measurement() {
        let mut filter = InsFilter::new(InsConfig::default());
        // 10 m above the origin => down position should go negative.
        for _ in 0..20 {
            filter.correct_baro(10.0).unwrap();
        }
        assert!(
            filter.altitude() < -8.0,
            "down position should approach -10, got {}",
            filter.altitude()
        );
    }

    #[test]
    fn test_baro_mag_order_independence() {
        // From the diagonal prior the baro and mag updates touch disjoint
        // state subspaces, so their order within a tick cannot matter.
        let baro = 3.2;
        let mag = [0.35, 0.12, 0.31];

        let mut a = InsFilter::new(InsConfig::default());
        a.correct_baro(baro).unwrap();
        a.correct_mag(mag).unwrap();

        let mut b = InsFilter::new(InsConfig::default());
        b.correct_mag(mag).unwrap();
        b.correct_baro(baro).unwrap();

        for i in 0..NUM_STATES {
            assert!(
                (a.x[i] - b.x[i]).abs() < 1e-6,
                "state {} differs: {} vs {}",
                i,
                a.x[i],
                b.x[i]
            );
        }
    }

    #[test]
    fn test_mag_steers_heading_estimate() {
        let mut filter = InsFilter::new(InsConfig::default());
        // Field pointing along body +y: vehicle is yawed -90 deg from
        // magnetic north, so the heading estimate must move negative.
        for _ in 0..50 {
            filter.correct_mag([0.0, 0.4, 0.3]).unwrap();
        }
        let q = filter.attitude();
        let yaw = atan2f(
            2.0 * (q.i * q.j + q.w * q.k),
            q.w * q.w + q.i * q.i - q.j * q.j - q.k * q.k,
        );
        assert!(yaw < -0.5, "heading should move toward -pi/2, got {}", yaw);
    }

    #[test]
    fn test_disarmed_freezes_thrust_and_drag() {
        let mut filter = InsFilter::new(InsConfig::default());
        filter.set_armed(false);
        for _ in 0..100 {
            filter.predict(0.0, 0.0, 0.0, 0.5, 0.02).unwrap();
            filter
                .correct_accel_gyro([0.0, 0.0, -12.0], [0.0; 3])
                .unwrap();
        }
        assert!(
            (filter.thrust() - 1.0).abs() < 1e-6,
            "thrust scale drifted while disarmed: {}",
            filter.thrust()
        );
        assert!(
            (filter.mu() - 0.1).abs() < 1e-6,
            "drag coefficient drifted while disarmed: {}",
            filter.mu()
        );
    }

    #[test]
    fn test_armed_allows_thrust_learning() {
        let mut filter = InsFilter::new(InsConfig::default());
        filter.set_armed(true);
        // Accel reports more lift than the nominal model predicts at half
        // throttle, so the thrust scale must move away from its prior.
        for _ in 0..100 {
            filter.predict(0.0, 0.0, 0.0, 0.5, 0.02).unwrap();
            filter
                .correct_accel_gyro([0.0, 0.0, -12.0], [0.0; 3])
                .unwrap();
        }
        assert!(
            (filter.thrust() - 1.0).abs() > 1e-3,
            "thrust scale should adapt when armed, stayed {}",
            filter.thrust()
        );
    }

    #[test]
    fn test_init_seeds_bypass_filter() {
        let mut filter = InsFilter::new(InsConfig::default());
        filter.set_init_thrust(1.3).unwrap();
        filter.set_init_bias([0.01, -0.02, 0.005]).unwrap();
        filter.set_init_mu(0.25).unwrap();
        assert!((filter.thrust() - 1.3).abs() < 1e-6);
        assert!((filter.bias().x - 0.01).abs() < 1e-6);
        assert!((filter.bias().y + 0.02).abs() < 1e-6);
        assert!((filter.mu() - 0.25).abs() < 1e-6);
        // Seeds must not survive a re-init.
        filter.init();
        assert!((filter.thrust() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_setters_validate_inputs() {
        let mut filter = InsFilter::new(InsConfig::default());
        assert_eq!(filter.set_tau(0.0), Err(InsError::InvalidInput));
        assert_eq!(filter.set_tau(f32::NAN), Err(InsError::InvalidInput));
        let mut bad = [1.0f32; NUM_SENSOR_NOISES];
        bad[0] = -1.0;
        assert_eq!(filter.set_sensor_noise(bad), Err(InsError::InvalidInput));
        assert!(filter.set_process_noise([0.0; NUM_PROCESS_NOISES]).is_ok());
    }

    #[test]
    fn test_throttle_step_raises_thrust_state() {
        let mut filter = InsFilter::new(InsConfig::default());
        for _ in 0..100 {
            filter.predict(0.0, 0.0, 0.0, 0.8, 0.02).unwrap();
        }
        let t = filter.torque();
        assert!(
            (t[3] - 0.8).abs() < 0.05,
            "thrust channel should track the command lag, got {}",
            t[3]
        );
    }

    #[test]
    fn test_roll_command_induces_roll_rate() {
        let mut filter = InsFilter::new(InsConfig::default());
        for _ in 0..25 {
            filter.predict(0.2, 0.0, 0.0, 0.5, 0.02).unwrap();
        }
        assert!(
            filter.rate().x > 0.1,
            "positive roll command should produce positive roll rate, got {}",
            filter.rate().x
        );
        assert!(filter.rate().y.abs() < filter.rate().x);
    }
}
