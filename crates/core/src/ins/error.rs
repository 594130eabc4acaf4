//! INS error types

/// Errors from INS allocation, prediction and correction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsError {
    /// Arena has no free slot left
    Exhausted,
    /// Handle refers to a released or never-allocated instance
    StaleHandle,
    /// A non-finite or out-of-range value was passed in
    InvalidInput,
    /// Prediction time step was non-positive or non-finite
    InvalidTimeStep,
}

impl core::fmt::Display for InsError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            InsError::Exhausted => write!(f, "estimator arena exhausted"),
            InsError::StaleHandle => write!(f, "stale estimator handle"),
            InsError::InvalidInput => write!(f, "non-finite estimator input"),
            InsError::InvalidTimeStep => write!(f, "invalid prediction time step"),
        }
    }
}

impl InsError {
    /// Return variant name as a static string (usable with defmt on embedded)
    pub fn as_str(&self) -> &'static str {
        match self {
            InsError::Exhausted => "Exhausted",
            InsError::StaleHandle => "StaleHandle",
            InsError::InvalidInput => "InvalidInput",
            InsError::InvalidTimeStep => "InvalidTimeStep",
        }
    }
}
