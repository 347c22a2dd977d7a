//! Curve math for automation segments
//!
//! Pure functions over `(time, value)` anchors. Nothing here looks at the
//! timeline; the parameter picks the anchors and the law.

use serde::{Deserialize, Serialize};

/// Smallest magnitude an exponential curve is allowed to pass through
pub const MIN_OUTPUT: f64 = 1e-7;

/// Shape of a ramp between two anchors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RampShape {
    #[default]
    Linear,
    Exponential,
}

impl RampShape {
    /// Value at `t` on the ramp from `(t0, v0)` to `(t1, v1)`
    #[must_use]
    #[inline]
    pub fn interpolate(&self, t0: f64, v0: f64, t1: f64, v1: f64, t: f64) -> f64 {
        match self {
            RampShape::Linear => linear_interpolate(t0, v0, t1, v1, t),
            RampShape::Exponential => exponential_interpolate(t0, v0, t1, v1, t),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            RampShape::Linear => "Linear",
            RampShape::Exponential => "Exponential",
        }
    }
}

impl std::fmt::Display for RampShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// `v1 + (v0 - v1) * e^(-(t - t0) / time_constant)`
#[must_use]
#[inline]
pub fn exponential_approach(t0: f64, v0: f64, v1: f64, time_constant: f64, t: f64) -> f64 {
    v1 + (v0 - v1) * (-(t - t0) / time_constant).exp()
}

/// `v0 + (v1 - v0) * (t - t0) / (t1 - t0)`
#[must_use]
#[inline]
pub fn linear_interpolate(t0: f64, v0: f64, t1: f64, v1: f64, t: f64) -> f64 {
    let span = t1 - t0;
    if span <= 0.0 {
        return v1;
    }
    v0 + (v1 - v0) * ((t - t0) / span)
}

/// `v0 * (v1 / v0) ^ ((t - t0) / (t1 - t0))`
///
/// A geometric curve cannot leave zero or cross it. For a zero start or
/// endpoints of opposite sign the start value holds until `t1`.
#[must_use]
#[inline]
pub fn exponential_interpolate(t0: f64, v0: f64, t1: f64, v1: f64, t: f64) -> f64 {
    let span = t1 - t0;
    if span <= 0.0 || t >= t1 {
        return v1;
    }
    if v0 == 0.0 || v0 * v1 < 0.0 {
        return v0;
    }
    v0 * (v1 / v0).powf((t - t0) / span)
}
