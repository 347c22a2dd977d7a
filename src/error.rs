//! Error type for automation scheduling

use thiserror::Error;

/// Failures reported by scheduling calls and parameter construction.
///
/// All of these are contract violations by the caller. They are raised
/// before the timeline or the sink is touched, so state is unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    #[error("{what} must be finite, got {value}")]
    NonFinite { what: &'static str, value: f64 },
    #[error("{what} must not be negative, got {value}")]
    Negative { what: &'static str, value: f64 },
    #[error("time constant must be a finite number greater than 0, got {0}")]
    InvalidTimeConstant(f64),
    #[error("automation parameter requires a sink")]
    MissingSink,
    #[error("value curve requires at least one value")]
    EmptyCurve,
    #[error("timeline capacity must be at least 1")]
    InvalidCapacity,
}

/// Reject non-finite and negative inputs.
pub(crate) fn ensure_non_negative(what: &'static str, value: f64) -> Result<f64> {
    if ensure_finite(what, value)? < 0.0 {
        return Err(ParamError::Negative { what, value });
    }
    Ok(value)
}

pub type Result<T> = std::result::Result<T, ParamError>;

/// Reject NaN and infinities for a named input.
pub(crate) fn ensure_finite(what: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ParamError::NonFinite { what, value })
    }
}
