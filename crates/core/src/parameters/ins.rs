//! INS Parameter Definitions
//!
//! Maps the estimator tuning values (`InsConfig`) onto named parameters so
//! a ground link or the SITL harness can retune the filter at runtime.
//!
//! # Parameters
//!
//! - `INS_R_*` - Measurement noise variances, one per correction channel
//! - `INS_Q_*` - Process noise densities, one per state-derivative channel
//! - `INS_GAIN_R/P/Y/T` - Control-effectiveness gains
//! - `INS_TAU` - Actuator lag time constant in seconds
//! - `INS_INIT_THRUST` / `INS_INIT_MU` - Calibration priors applied on init

use super::error::ParameterError;
use super::storage::{ParamFlags, ParamValue, ParameterStore};
use crate::ins::{InsConfig, NUM_PROCESS_NOISES, NUM_SENSOR_NOISES};

/// Sensor-noise parameter names, ordered as the correction channels.
const SENSOR_NOISE_NAMES: [&str; NUM_SENSOR_NOISES] = [
    "INS_R_ACC_X",
    "INS_R_ACC_Y",
    "INS_R_ACC_Z",
    "INS_R_GYR_X",
    "INS_R_GYR_Y",
    "INS_R_GYR_Z",
    "INS_R_BARO",
    "INS_R_HEAD_S",
    "INS_R_HEAD_C",
];

/// Process-noise parameter names, ordered as the derivative channels.
const PROCESS_NOISE_NAMES: [&str; NUM_PROCESS_NOISES] = [
    "INS_Q_POS",
    "INS_Q_VEL_XY",
    "INS_Q_VEL_Z",
    "INS_Q_ATT",
    "INS_Q_RATE_RP",
    "INS_Q_RATE_Y",
    "INS_Q_TORQ_R",
    "INS_Q_TORQ_P",
    "INS_Q_TORQ_Y",
    "INS_Q_TORQ_T",
    "INS_Q_GBIAS",
    "INS_Q_THRUST",
    "INS_Q_OBIAS_XY",
    "INS_Q_OBIAS_Z",
    "INS_Q_MU",
];

const GAIN_NAMES: [&str; 4] = ["INS_GAIN_R", "INS_GAIN_P", "INS_GAIN_Y", "INS_GAIN_T"];

/// Minimum admissible measurement variance
const MIN_SENSOR_NOISE: f32 = 1e-9;

/// Admissible actuator lag range in seconds
const MIN_TAU: f32 = 1e-3;
const MAX_TAU: f32 = 1.0;

/// Register all INS parameters with their flight-tested defaults
///
/// Idempotent; existing (possibly retuned) values are left untouched.
pub fn register_defaults(store: &mut ParameterStore) -> Result<(), ParameterError> {
    let defaults = InsConfig::default();

    for (name, value) in SENSOR_NOISE_NAMES.iter().zip(defaults.sensor_noise) {
        store.register(name, ParamValue::Float(value), ParamFlags::empty())?;
    }
    for (name, value) in PROCESS_NOISE_NAMES.iter().zip(defaults.process_noise) {
        store.register(name, ParamValue::Float(value), ParamFlags::empty())?;
    }
    for (name, value) in GAIN_NAMES.iter().zip(defaults.gains) {
        store.register(name, ParamValue::Float(value), ParamFlags::empty())?;
    }
    store.register("INS_TAU", ParamValue::Float(defaults.tau), ParamFlags::empty())?;
    store.register(
        "INS_INIT_THRUST",
        ParamValue::Float(defaults.init_thrust),
        ParamFlags::empty(),
    )?;
    store.register(
        "INS_INIT_MU",
        ParamValue::Float(defaults.init_mu),
        ParamFlags::empty(),
    )?;
    Ok(())
}

/// Build an [`InsConfig`] from the store, clamping out-of-range values
///
/// Missing parameters fall back to the defaults, so this is safe to call
/// before `register_defaults`.
pub fn load_config(store: &ParameterStore) -> InsConfig {
    let mut config = InsConfig::default();

    for (i, name) in SENSOR_NOISE_NAMES.iter().enumerate() {
        config.sensor_noise[i] = store
            .get_f32(name, config.sensor_noise[i])
            .max(MIN_SENSOR_NOISE);
    }
    for (i, name) in PROCESS_NOISE_NAMES.iter().enumerate() {
        config.process_noise[i] = store.get_f32(name, config.process_noise[i]).max(0.0);
    }
    for (i, name) in GAIN_NAMES.iter().enumerate() {
        config.gains[i] = store.get_f32(name, config.gains[i]);
    }
    config.tau = store.get_f32("INS_TAU", config.tau).clamp(MIN_TAU, MAX_TAU);
    config.init_thrust = store
        .get_f32("INS_INIT_THRUST", config.init_thrust)
        .clamp(0.1, 10.0);
    config.init_mu = store.get_f32("INS_INIT_MU", config.init_mu).clamp(0.0, 10.0);
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_then_load_matches_defaults() {
        let mut store = ParameterStore::new();
        register_defaults(&mut store).unwrap();

        let config = load_config(&store);
        let defaults = InsConfig::default();
        assert_eq!(config.sensor_noise, defaults.sensor_noise);
        assert_eq!(config.process_noise, defaults.process_noise);
        assert_eq!(config.gains, defaults.gains);
        assert!((config.tau - defaults.tau).abs() < 1e-9);
    }

    #[test]
    fn test_load_applies_overrides() {
        let mut store = ParameterStore::new();
        register_defaults(&mut store).unwrap();
        store.set("INS_R_BARO", ParamValue::Float(2.0)).unwrap();
        store.set("INS_GAIN_Y", ParamValue::Float(30.0)).unwrap();

        let config = load_config(&store);
        assert!((config.sensor_noise[6] - 2.0).abs() < 1e-6);
        assert!((config.gains[2] - 30.0).abs() < 1e-6);
    }

    #[test]
    fn test_load_clamps_out_of_range() {
        let mut store = ParameterStore::new();
        register_defaults(&mut store).unwrap();
        store.set("INS_R_ACC_X", ParamValue::Float(0.0)).unwrap();
        store.set("INS_TAU", ParamValue::Float(50.0)).unwrap();
        store.set("INS_Q_MU", ParamValue::Float(-1.0)).unwrap();

        let config = load_config(&store);
        assert!(
            config.sensor_noise[0] >= MIN_SENSOR_NOISE,
            "zero variance must be clamped away"
        );
        assert!((config.tau - MAX_TAU).abs() < 1e-6);
        assert!(config.process_noise[14] >= 0.0);
    }

    #[test]
    fn test_load_without_registration_uses_defaults() {
        let store = ParameterStore::new();
        let config = load_config(&store);
        let defaults = InsConfig::default();
        assert_eq!(config.sensor_noise, defaults.sensor_noise);
    }

    #[test]
    fn test_names_fit_store_limit() {
        for name in SENSOR_NOISE_NAMES
            .iter()
            .chain(PROCESS_NOISE_NAMES.iter())
            .chain(GAIN_NAMES.iter())
        {
            assert!(
                name.len() <= super::super::storage::PARAM_NAME_LEN,
                "parameter name too long: {}",
                name
            );
        }
    }
}
