//! Follower Parameter Definitions
//!
//! Defines guidance FSM tuning parameters.
//!
//! # Parameters
//!
//! - `FLW_RTH_ALT` - Minimum return-to-home altitude above home in meters
//! - `FLW_RTH_SPD` - Cruise speed of the return path in m/s
//! - `FLW_LAND_SPD` - Commanded descent rate while landing in m/s
//! - `FLW_PERIOD` - Guidance tick period in seconds

use super::error::ParameterError;
use super::storage::{ParamFlags, ParamValue, ParameterStore};
use crate::follower::FollowerConfig;

/// Admissible RTH altitude range in meters
const MIN_RTH_ALT: f32 = 2.0;
const MAX_RTH_ALT: f32 = 100.0;

/// Admissible speed range in m/s (RTH cruise and landing descent)
const MIN_SPEED: f32 = 0.1;
const MAX_SPEED: f32 = 20.0;

/// Admissible tick period range in seconds
const MIN_PERIOD: f32 = 0.005;
const MAX_PERIOD: f32 = 0.5;

/// Register follower parameters with default values
///
/// Idempotent; existing values are left untouched.
pub fn register_defaults(store: &mut ParameterStore) -> Result<(), ParameterError> {
    let defaults = FollowerConfig::default();
    store.register(
        "FLW_RTH_ALT",
        ParamValue::Float(defaults.rth_min_altitude),
        ParamFlags::empty(),
    )?;
    store.register(
        "FLW_RTH_SPD",
        ParamValue::Float(defaults.rth_velocity),
        ParamFlags::empty(),
    )?;
    store.register(
        "FLW_LAND_SPD",
        ParamValue::Float(defaults.landing_velocity),
        ParamFlags::empty(),
    )?;
    store.register(
        "FLW_PERIOD",
        ParamValue::Float(defaults.period),
        ParamFlags::empty(),
    )?;
    Ok(())
}

/// Build a [`FollowerConfig`] from the store, clamping out-of-range values
pub fn load_config(store: &ParameterStore) -> FollowerConfig {
    let defaults = FollowerConfig::default();
    FollowerConfig {
        rth_min_altitude: store
            .get_f32("FLW_RTH_ALT", defaults.rth_min_altitude)
            .clamp(MIN_RTH_ALT, MAX_RTH_ALT),
        rth_velocity: store
            .get_f32("FLW_RTH_SPD", defaults.rth_velocity)
            .clamp(MIN_SPEED, MAX_SPEED),
        landing_velocity: store
            .get_f32("FLW_LAND_SPD", defaults.landing_velocity)
            .clamp(MIN_SPEED, MAX_SPEED),
        period: store
            .get_f32("FLW_PERIOD", defaults.period)
            .clamp(MIN_PERIOD, MAX_PERIOD),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_then_load_matches_defaults() {
        let mut store = ParameterStore::new();
        register_defaults(&mut store).unwrap();

        let config = load_config(&store);
        assert!((config.rth_min_altitude - 15.0).abs() < 1e-6);
        assert!((config.rth_velocity - 2.5).abs() < 1e-6);
        assert!((config.landing_velocity - 1.5).abs() < 1e-6);
        assert!((config.period - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_load_applies_overrides() {
        let mut store = ParameterStore::new();
        register_defaults(&mut store).unwrap();
        store.set("FLW_RTH_ALT", ParamValue::Float(25.0)).unwrap();
        store.set("FLW_LAND_SPD", ParamValue::Float(0.8)).unwrap();

        let config = load_config(&store);
        assert!((config.rth_min_altitude - 25.0).abs() < 1e-6);
        assert!((config.landing_velocity - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_load_clamps_out_of_range() {
        let mut store = ParameterStore::new();
        register_defaults(&mut store).unwrap();
        store.set("FLW_RTH_ALT", ParamValue::Float(500.0)).unwrap();
        store.set("FLW_RTH_SPD", ParamValue::Float(0.0)).unwrap();
        store.set("FLW_PERIOD", ParamValue::Float(-1.0)).unwrap();

        let config = load_config(&store);
        assert!((config.rth_min_altitude - MAX_RTH_ALT).abs() < 1e-6);
        assert!((config.rth_velocity - MIN_SPEED).abs() < 1e-6);
        assert!((config.period - MIN_PERIOD).abs() < 1e-6);
    }
}
