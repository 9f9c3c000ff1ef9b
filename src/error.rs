//! Error kinds reported by the inference core
//!
//! Invalid input and degenerate input are kept apart so callers can treat a
//! zero-variance z-test as "no measurable difference" instead of "bad input".

use thiserror::Error;

/// Errors for statistical inference operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    /// Input violates a documented domain constraint
    #[error("Invalid argument `{name}`: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    /// Input is valid but the statistic is undefined for it
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    /// The distribution backend refused to build a distribution
    #[error("Numeric backend failure: {0}")]
    Numeric(String),
}

impl StatsError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        StatsError::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }

    /// True for [`StatsError::InvalidArgument`]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, StatsError::InvalidArgument { .. })
    }

    /// True for [`StatsError::DegenerateInput`]
    pub fn is_degenerate(&self) -> bool {
        matches!(self, StatsError::DegenerateInput(_))
    }
}

pub type Result<T> = std::result::Result<T, StatsError>;
