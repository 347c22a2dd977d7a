//! Construction options for an automation parameter

use serde::{Deserialize, Serialize};

use crate::timeline::DEFAULT_CAPACITY;
use crate::units::Unit;

/// Configuration for [`AutomationParam`](crate::AutomationParam)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamOptions {
    /// Semantic unit of every value passed in or out
    pub units: Unit,
    /// Whether values are converted between `units` and the sink domain
    pub convert: bool,
    /// Starting value in `units`; scheduled at t=0 when it differs from the sink default
    pub value: Option<f64>,
    /// Lower bound override
    pub min_value: Option<f64>,
    /// Upper bound override
    pub max_value: Option<f64>,
    /// Maximum number of events kept in the timeline
    pub capacity: usize,
}

impl ParamOptions {
    pub fn new(units: Unit) -> Self {
        Self {
            units,
            ..Self::default()
        }
    }

    pub fn with_units(mut self, units: Unit) -> Self {
        self.units = units;
        self
    }

    pub fn with_convert(mut self, convert: bool) -> Self {
        self.convert = convert;
        self
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min_value = Some(min);
        self.max_value = Some(max);
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

impl Default for ParamOptions {
    fn default() -> Self {
        Self {
            units: Unit::Number,
            convert: true,
            value: None,
            min_value: None,
            max_value: None,
            capacity: DEFAULT_CAPACITY,
        }
    }
}
