//! Parameter management types and utilities
//!
//! Provides the key-value parameter store plus the named-parameter
//! definitions for the estimator (`INS_*`) and the guidance FSM (`FLW_*`).
//! Persistence and ground-link exposure are the embedding application's
//! concern.

pub mod error;
pub mod follower;
pub mod ins;
pub mod storage;

pub use error::ParameterError;
pub use storage::{ParamFlags, ParamMetadata, ParamValue, ParameterStore};
pub use storage::{MAX_PARAMS, PARAM_NAME_LEN};
