//! Semantic units
//!
//! A parameter is declared in one of these units. Values cross into the
//! sink's raw numeric domain through [`Unit::to_raw`] and come back out
//! through [`Unit::from_raw`].
//!
//! | Unit | Raw domain | Bounds |
//! |------|------------|--------|
//! | Number | identity | sink's |
//! | Decibels | linear gain | -inf ..= sink max |
//! | Gain | identity | sink's |
//! | Frequency, Hertz, Time, Bpm, Positive, Samples | identity | 0 ..= sink max |
//! | NormalRange | clamped to 0..=1 | 0 ..= 1 |
//! | AudioRange | clamped to -1..=1 | -1 ..= 1 |
//! | Cents, Degrees, Radians | identity | sink's |

use serde::{Deserialize, Serialize};

use crate::curve::RampShape;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Unit {
    #[default]
    Number,
    Decibels,
    Gain,
    Frequency,
    Hertz,
    Time,
    Bpm,
    Positive,
    Samples,
    NormalRange,
    AudioRange,
    Cents,
    Degrees,
    Radians,
}

impl Unit {
    /// Convert a semantic value into the sink's raw domain
    #[must_use]
    #[inline]
    pub fn to_raw(&self, value: f64) -> f64 {
        match self {
            Self::Decibels => db_to_gain(value),
            Self::NormalRange => value.clamp(0.0, 1.0),
            Self::AudioRange => value.clamp(-1.0, 1.0),
            _ => value,
        }
    }

    /// Convert a raw sink value back into this unit
    #[must_use]
    #[inline]
    pub fn from_raw(&self, value: f64) -> f64 {
        match self {
            Self::Decibels => gain_to_db(value),
            _ => value,
        }
    }

    /// Lower bound implied by the unit, `None` to defer to the sink
    #[must_use]
    pub fn min_value(&self) -> Option<f64> {
        match self {
            Self::Frequency
            | Self::Hertz
            | Self::Time
            | Self::Bpm
            | Self::Positive
            | Self::Samples
            | Self::NormalRange => Some(0.0),
            Self::AudioRange => Some(-1.0),
            Self::Decibels => Some(f64::NEG_INFINITY),
            _ => None,
        }
    }

    /// Upper bound implied by the unit, `None` to defer to the sink
    #[must_use]
    pub fn max_value(&self) -> Option<f64> {
        match self {
            Self::NormalRange | Self::AudioRange => Some(1.0),
            _ => None,
        }
    }

    /// Units heard logarithmically ramp exponentially
    #[must_use]
    pub fn ramp_shape(&self) -> RampShape {
        match self {
            Self::Decibels | Self::Frequency | Self::Hertz | Self::Bpm => RampShape::Exponential,
            _ => RampShape::Linear,
        }
    }

    #[must_use]
    pub fn all() -> &'static [Unit] {
        &[
            Self::Number,
            Self::Decibels,
            Self::Gain,
            Self::Frequency,
            Self::Hertz,
            Self::Time,
            Self::Bpm,
            Self::Positive,
            Self::Samples,
            Self::NormalRange,
            Self::AudioRange,
            Self::Cents,
            Self::Degrees,
            Self::Radians,
        ]
    }

    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Decibels => "decibels",
            Self::Gain => "gain",
            Self::Frequency => "frequency",
            Self::Hertz => "hertz",
            Self::Time => "time",
            Self::Bpm => "bpm",
            Self::Positive => "positive",
            Self::Samples => "samples",
            Self::NormalRange => "normalRange",
            Self::AudioRange => "audioRange",
            Self::Cents => "cents",
            Self::Degrees => "degrees",
            Self::Radians => "radians",
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Decibels to linear gain
#[must_use]
#[inline]
pub fn db_to_gain(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Linear gain to decibels; zero gain is `-inf`
#[must_use]
#[inline]
pub fn gain_to_db(gain: f64) -> f64 {
    20.0 * gain.log10()
}
