//! Error taxonomy for peak identification.
//!
//! Every failure is caused by the caller's data; nothing here is transient,
//! so there is no retry machinery.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PeakError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PeakError {
    /// Too few usable samples to fit a step function.
    #[error("insufficient data: {found} usable samples, at least {required} required")]
    InsufficientData { found: usize, required: usize },

    /// The significance ratio would divide by a non-positive standard error.
    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    /// Shape or domain violation detected before fitting.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub(crate) fn invalid<S: Into<String>>(msg: S) -> PeakError {
    PeakError::InvalidInput(msg.into())
}

pub(crate) fn degenerate<S: Into<String>>(msg: S) -> PeakError {
    PeakError::DegenerateInput(msg.into())
}
