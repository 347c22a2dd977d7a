//! Parameter sinks
//!
//! A sink is the primitive that actually produces the automated value,
//! e.g. a native audio-parameter. [`AutomationParam`](crate::AutomationParam)
//! forwards every command it records to its sink, using raw values and
//! absolute seconds.

use serde::{Deserialize, Serialize};

use crate::event::AutomationEvent;

/// Settable value primitive driven by automation commands
pub trait ParamSink {
    fn set_value_at_time(&mut self, value: f64, time: f64);
    fn linear_ramp_to_value_at_time(&mut self, value: f64, time: f64);
    fn exponential_ramp_to_value_at_time(&mut self, value: f64, time: f64);
    fn set_target_at_time(&mut self, value: f64, time: f64, time_constant: f64);
    fn cancel_scheduled_values(&mut self, time: f64);

    fn default_value(&self) -> f64;
    fn min_value(&self) -> f64;
    fn max_value(&self) -> f64;

    /// Send the sink primitive that matches `event`.
    fn schedule(&mut self, event: &AutomationEvent) {
        match *event {
            AutomationEvent::SetValue { time, value } => self.set_value_at_time(value, time),
            AutomationEvent::LinearRamp { time, value } => {
                self.linear_ramp_to_value_at_time(value, time)
            }
            AutomationEvent::ExponentialRamp { time, value } => {
                self.exponential_ramp_to_value_at_time(value, time)
            }
            AutomationEvent::TargetApproach {
                time,
                value,
                time_constant,
            } => self.set_target_at_time(value, time, time_constant),
            AutomationEvent::Cancel { time } => self.cancel_scheduled_values(time),
        }
    }
}

/// In-memory sink that keeps a log of every command it receives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingSink {
    pub default_value: f64,
    pub min_value: f64,
    pub max_value: f64,
    /// Commands in the order they arrived
    pub commands: Vec<AutomationEvent>,
}

impl RecordingSink {
    /// Unbounded sink with the given default value
    pub fn new(default_value: f64) -> Self {
        Self {
            default_value,
            min_value: f64::MIN,
            max_value: f64::MAX,
            commands: Vec::new(),
        }
    }

    /// Set the declared range
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min_value = min;
        self.max_value = max;
        self
    }

    /// Commands received so far
    #[must_use]
    pub fn commands(&self) -> &[AutomationEvent] {
        &self.commands
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl ParamSink for RecordingSink {
    fn set_value_at_time(&mut self, value: f64, time: f64) {
        self.commands.push(AutomationEvent::SetValue { time, value });
    }

    fn linear_ramp_to_value_at_time(&mut self, value: f64, time: f64) {
        self.commands.push(AutomationEvent::LinearRamp { time, value });
    }

    fn exponential_ramp_to_value_at_time(&mut self, value: f64, time: f64) {
        self.commands
            .push(AutomationEvent::ExponentialRamp { time, value });
    }

    fn set_target_at_time(&mut self, value: f64, time: f64, time_constant: f64) {
        self.commands.push(AutomationEvent::TargetApproach {
            time,
            value,
            time_constant,
        });
    }

    fn cancel_scheduled_values(&mut self, time: f64) {
        self.commands.push(AutomationEvent::Cancel { time });
    }

    fn default_value(&self) -> f64 {
        self.default_value
    }

    fn min_value(&self) -> f64 {
        self.min_value
    }

    fn max_value(&self) -> f64 {
        self.max_value
    }
}
