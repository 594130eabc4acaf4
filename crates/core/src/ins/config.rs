//! INS state layout and tuning configuration
//!
//! Pure data: state-vector indices, the documented channel mapping for the
//! sensor-noise and process-noise vectors, and the [`InsConfig`] struct with
//! flight-tested defaults. No behavior lives here.
//!
//! # State vector layout (23 states, all f32)
//!
//! | index | state                                          |
//! |-------|------------------------------------------------|
//! | 0     | position down (m, positive down)               |
//! | 1-3   | velocity NED (m/s)                             |
//! | 4-7   | attitude quaternion (scalar-first w,x,y,z)     |
//! | 8-10  | body rate (rad/s, bias-corrected)              |
//! | 11-14 | generalized torque/thrust state (lagged cmd)   |
//! | 15-17 | gyro bias (rad/s)                              |
//! | 18    | thrust scale factor (dimensionless, ~1.0)      |
//! | 19-21 | output (model/accelerometer) bias (m/s^2)      |
//! | 22    | drag coefficient (1/s)                         |

/// Total number of estimator states
pub const NUM_STATES: usize = 23;

/// Number of sensor-noise channels (see [`InsConfig::sensor_noise`])
pub const NUM_SENSOR_NOISES: usize = 9;

/// Number of process-noise channels (see [`InsConfig::process_noise`])
pub const NUM_PROCESS_NOISES: usize = 15;

// State vector indices.
pub const STATE_P: usize = 0;
pub const STATE_V: usize = 1;
pub const STATE_Q: usize = 4;
pub const STATE_W: usize = 8;
pub const STATE_T: usize = 11;
pub const STATE_BIAS: usize = 15;
pub const STATE_THRUST: usize = 18;
pub const STATE_OUT_BIAS: usize = 19;
pub const STATE_MU: usize = 22;

// Sensor-noise channel indices.
pub const SENSOR_ACCEL: usize = 0; // 0..3: accel x,y,z (m/s^2)^2
pub const SENSOR_GYRO: usize = 3; // 3..6: gyro x,y,z (rad/s)^2
pub const SENSOR_BARO: usize = 6; // baro altitude m^2
pub const SENSOR_MAG: usize = 7; // 7..9: heading sin/cos components

// Process-noise channel indices.
pub const PROCESS_POS: usize = 0;
pub const PROCESS_VEL_XY: usize = 1;
pub const PROCESS_VEL_Z: usize = 2;
pub const PROCESS_ATT: usize = 3;
pub const PROCESS_RATE_RP: usize = 4;
pub const PROCESS_RATE_Y: usize = 5;
pub const PROCESS_TORQUE: usize = 6; // 6..10: torque channels 0..3
pub const PROCESS_GYRO_BIAS: usize = 10;
pub const PROCESS_THRUST: usize = 11;
pub const PROCESS_OUT_BIAS_XY: usize = 12;
pub const PROCESS_OUT_BIAS_Z: usize = 13;
pub const PROCESS_MU: usize = 14;

/// Standard gravity (m/s^2), NED down-positive
pub const GRAVITY: f32 = 9.81;

const DEFAULT_SENSOR_NOISE: [f32; NUM_SENSOR_NOISES] = [
    1.0, 1.0, 1.0, // accel x,y,z
    1e-4, 1e-4, 1e-4, // gyro x,y,z
    0.5,  // baro
    0.05, 0.05, // mag heading sin/cos
];

const DEFAULT_PROCESS_NOISE: [f32; NUM_PROCESS_NOISES] = [
    1e-4, // position
    1e-2, 1e-2, // velocity horizontal / down
    1e-5, // attitude
    1.0, 1.0, // rate roll-pitch / yaw
    1.0, 1.0, 1.0, 1.0, // torque channels
    1e-7, // gyro bias
    1e-4, // thrust scale
    1e-6, 1e-6, // output bias horizontal / down
    1e-6, // drag coefficient
];

/// Torque-to-rate gains for roll/pitch/yaw plus the nominal
/// throttle-to-specific-force gain (hover at ~50% stick).
const DEFAULT_GAINS: [f32; 4] = [40.0, 40.0, 20.0, 2.0 * GRAVITY];

const DEFAULT_TAU: f32 = 0.05;
const DEFAULT_INIT_THRUST: f32 = 1.0;
const DEFAULT_INIT_MU: f32 = 0.1;

/// Initial covariance diagonal, grouped per state category.
pub(crate) const INIT_COVARIANCE: InitCovariance = InitCovariance {
    position: 1.0,
    velocity: 1.0,
    attitude: 0.1,
    rate: 0.1,
    torque: 0.25,
    gyro_bias: 1e-4,
    thrust: 0.25,
    out_bias: 0.04,
    mu: 0.01,
};

pub(crate) struct InitCovariance {
    pub position: f32,
    pub velocity: f32,
    pub attitude: f32,
    pub rate: f32,
    pub torque: f32,
    pub gyro_bias: f32,
    pub thrust: f32,
    pub out_bias: f32,
    pub mu: f32,
}

/// INS tuning configuration
///
/// Replaced wholesale by the setters on [`super::InsFilter`]; values take
/// effect on the next predict/correct call and never touch filter state.
#[derive(Debug, Clone, Copy)]
pub struct InsConfig {
    /// Measurement noise variances, one per correction channel:
    /// accel x/y/z, gyro x/y/z, baro, mag heading sin/cos
    pub sensor_noise: [f32; NUM_SENSOR_NOISES],
    /// Process noise densities, one per state-derivative channel:
    /// position, velocity xy, velocity z, attitude, rate roll/pitch,
    /// rate yaw, torque 0-3, gyro bias, thrust scale, output bias xy,
    /// output bias z, drag coefficient
    pub process_noise: [f32; NUM_PROCESS_NOISES],
    /// Control-effectiveness gains: torque-to-rate roll/pitch/yaw plus the
    /// nominal throttle-to-specific-force gain
    pub gains: [f32; 4],
    /// Time constant (s) of the first-order lag tracking commanded attitude
    pub tau: f32,
    /// Thrust scale prior applied by `init`
    pub init_thrust: f32,
    /// Drag coefficient prior applied by `init`
    pub init_mu: f32,
}

impl Default for InsConfig {
    fn default() -> Self {
        Self {
            sensor_noise: DEFAULT_SENSOR_NOISE,
            process_noise: DEFAULT_PROCESS_NOISE,
            gains: DEFAULT_GAINS,
            tau: DEFAULT_TAU,
            init_thrust: DEFAULT_INIT_THRUST,
            init_mu: DEFAULT_INIT_MU,
        }
    }
}
