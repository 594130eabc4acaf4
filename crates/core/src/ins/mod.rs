//! Extended-state INS filter for a small multirotor
//!
//! Fuses inertial, barometric and magnetic measurements with a
//! control-input-driven dynamics model. Beyond the directly observed
//! quantities (altitude, velocity, attitude, body rate) the state vector
//! carries slowly-varying calibration states: gyro bias, a thrust scale
//! factor, an accelerometer/model output bias and a drag coefficient.
//!
//! The filter itself is an owned value ([`InsFilter`]); [`InsArena`] adds a
//! generation-checked handle layer for callers that address instances by
//! opaque id rather than by reference.

pub mod arena;
pub mod config;
pub mod error;
pub mod filter;

pub use arena::{InsArena, InsHandle};
pub use config::{InsConfig, NUM_PROCESS_NOISES, NUM_SENSOR_NOISES, NUM_STATES};
pub use error::InsError;
pub use filter::InsFilter;
