//! Automation event data structures
//!
//! One variant per scheduling command. Times are absolute seconds on the
//! parameter's own timeline and values are raw sink-domain numbers.

use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, ensure_non_negative, ParamError, Result};

/// Single scheduled automation command
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AutomationEvent {
    /// Jump to `value` at `time`
    SetValue { time: f64, value: f64 },
    /// Linear ramp from the previous event's value, arriving at `value` at `time`
    LinearRamp { time: f64, value: f64 },
    /// Geometric ramp from the previous event's value, arriving at `value` at `time`
    ExponentialRamp { time: f64, value: f64 },
    /// Asymptotic decay toward `value` starting at `time`
    TargetApproach {
        time: f64,
        value: f64,
        time_constant: f64,
    },
    /// Cancellation point; everything scheduled at or after `time` is dropped
    Cancel { time: f64 },
}

impl AutomationEvent {
    #[must_use]
    #[inline]
    pub fn time(&self) -> f64 {
        match *self {
            Self::SetValue { time, .. }
            | Self::LinearRamp { time, .. }
            | Self::ExponentialRamp { time, .. }
            | Self::TargetApproach { time, .. }
            | Self::Cancel { time } => time,
        }
    }

    /// Scheduled value, `None` for cancellation markers.
    #[must_use]
    #[inline]
    pub fn value(&self) -> Option<f64> {
        match *self {
            Self::SetValue { value, .. }
            | Self::LinearRamp { value, .. }
            | Self::ExponentialRamp { value, .. }
            | Self::TargetApproach { value, .. } => Some(value),
            Self::Cancel { .. } => None,
        }
    }

    #[must_use]
    #[inline]
    pub fn is_ramp(&self) -> bool {
        matches!(self, Self::LinearRamp { .. } | Self::ExponentialRamp { .. })
    }

    #[must_use]
    #[inline]
    pub fn is_target_approach(&self) -> bool {
        matches!(self, Self::TargetApproach { .. })
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetValue { .. } => "setValueAtTime",
            Self::LinearRamp { .. } => "linearRampToValueAtTime",
            Self::ExponentialRamp { .. } => "exponentialRampToValueAtTime",
            Self::TargetApproach { .. } => "setTargetAtTime",
            Self::Cancel { .. } => "cancelScheduledValues",
        }
    }

    /// Check the event's numeric fields before it is recorded.
    pub fn validate(&self) -> Result<()> {
        ensure_non_negative("time", self.time())?;
        if let Some(value) = self.value() {
            ensure_finite("value", value)?;
        }
        if let Self::TargetApproach { time_constant, .. } = *self {
            if !(time_constant.is_finite() && time_constant > 0.0) {
                return Err(ParamError::InvalidTimeConstant(time_constant));
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for AutomationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TargetApproach {
                time,
                value,
                time_constant,
            } => write!(f, "{}({value}, {time}, {time_constant})", self.name()),
            Self::Cancel { time } => write!(f, "{}({time})", self.name()),
            Self::SetValue { time, value }
            | Self::LinearRamp { time, value }
            | Self::ExponentialRamp { time, value } => {
                write!(f, "{}({value}, {time})", self.name())
            }
        }
    }
}
