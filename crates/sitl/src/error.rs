use quadnav_core::{InsError, ParameterError};

/// Errors that can occur while running the SITL harness.
#[derive(Debug, thiserror::Error)]
pub enum SitlError {
    #[error("estimator error: {0}")]
    Estimator(InsError),

    #[error("control error: {0}")]
    Control(&'static str),

    #[error("parameter error: {0}")]
    Parameter(ParameterError),

    #[error("timeout waiting for {0}")]
    Timeout(&'static str),
}

impl From<InsError> for SitlError {
    fn from(err: InsError) -> Self {
        SitlError::Estimator(err)
    }
}

impl From<&'static str> for SitlError {
    fn from(err: &'static str) -> Self {
        SitlError::Control(err)
    }
}

impl From<ParameterError> for SitlError {
    fn from(err: ParameterError) -> Self {
        SitlError::Parameter(err)
    }
}
