//! Automation parameter
//!
//! [`AutomationParam`] keeps a symbolic record of every command it sends to
//! its sink, so it can answer "what is the value at time t" for any t, past
//! or future, without asking the sink.
//!
//! Every scheduling call converts its inputs to seconds and raw sink units,
//! validates them, records the event in the [`Timeline`], and then forwards
//! the same command to the sink. A failed validation leaves both untouched.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::curve::{exponential_approach, RampShape, MIN_OUTPUT};
use crate::error::{ensure_finite, ensure_non_negative, ParamError, Result};
use crate::event::AutomationEvent;
use crate::options::ParamOptions;
use crate::sink::ParamSink;
use crate::time::{Clock, ManualClock, Time};
use crate::timeline::Timeline;
use crate::units::Unit;

/// Clock shared between parameters
pub type SharedClock = Arc<dyn Clock + Send + Sync>;

/// Ramp length used by [`AutomationParam::ramp_to`] callers that have no preference
pub const DEFAULT_RAMP_TIME: f64 = 0.1;

/// Linear steps used by [`AutomationParam::apply`] to replay a running target approach
const APPLY_APPROACH_STEPS: usize = 10;

/// Look-ahead for a target approach with no following event
const APPLY_APPROACH_HORIZON: f64 = 2.0;

/// Scheduled automation for one control value
pub struct AutomationParam<S: ParamSink> {
    sink: Arc<Mutex<S>>,
    clock: SharedClock,
    events: Timeline,
    units: Unit,
    convert: bool,
    overridden: bool,
    /// Raw value in effect before the first event
    initial_value: f64,
    min_value: Option<f64>,
    max_value: Option<f64>,
}

impl<S: ParamSink> AutomationParam<S> {
    /// Create a parameter driving `sink`, seeded from the sink's default value
    pub fn new(sink: Arc<Mutex<S>>, clock: SharedClock, options: ParamOptions) -> Result<Self> {
        let events = Timeline::new(options.capacity)?;
        let initial_value = ensure_finite("sink default value", sink.lock().default_value())?;

        let mut param = Self {
            sink,
            clock,
            events,
            units: options.units,
            convert: options.convert,
            overridden: false,
            initial_value,
            min_value: options.min_value,
            max_value: options.max_value,
        };

        if let Some(value) = options.value {
            if value != param.from_raw(initial_value) {
                param.set_value_at_time(value, 0.0)?;
            }
        }

        Ok(param)
    }

    /// Start building a parameter
    pub fn builder() -> ParamBuilder<S> {
        ParamBuilder::new()
    }

    // ==================== Configuration ====================

    /// Unit used for values passed in and out
    #[must_use]
    pub fn units(&self) -> Unit {
        self.units
    }

    /// Whether values are converted between `units` and raw sink values
    #[must_use]
    pub fn convert(&self) -> bool {
        self.convert
    }

    /// Enable or disable unit conversion
    pub fn set_convert(&mut self, convert: bool) {
        self.convert = convert;
    }

    /// Whether conversion is bypassed
    #[must_use]
    pub fn overridden(&self) -> bool {
        self.overridden
    }

    /// While overridden, values pass to and from the sink unconverted
    pub fn set_overridden(&mut self, overridden: bool) {
        self.overridden = overridden;
    }

    /// Shared sink receiving every command
    #[must_use]
    pub fn sink(&self) -> &Arc<Mutex<S>> {
        &self.sink
    }

    /// Recorded schedule
    #[must_use]
    pub fn events(&self) -> &Timeline {
        &self.events
    }

    /// Current time on the parameter's clock
    #[must_use]
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Value in effect before any event, in `units`
    #[must_use]
    pub fn initial_value(&self) -> f64 {
        self.from_raw(self.initial_value)
    }

    /// Sink default value, in `units`
    #[must_use]
    pub fn default_value(&self) -> f64 {
        self.from_raw(self.sink.lock().default_value())
    }

    /// Lowest value, in `units`
    #[must_use]
    pub fn min_value(&self) -> f64 {
        self.min_value
            .or_else(|| self.units.min_value())
            .unwrap_or_else(|| self.sink.lock().min_value())
    }

    /// Highest value, in `units`
    #[must_use]
    pub fn max_value(&self) -> f64 {
        self.max_value
            .or_else(|| self.units.max_value())
            .unwrap_or_else(|| self.sink.lock().max_value())
    }

    // ==================== Scheduling ====================

    /// Jump to `value` at `time`
    pub fn set_value_at_time(&mut self, value: f64, time: impl Into<Time>) -> Result<&mut Self> {
        let time = self.seconds(time);
        let value = self.to_raw(value);
        self.record(AutomationEvent::SetValue { time, value })?;
        Ok(self)
    }

    /// Linear ramp from the previous event, arriving at `value` at `end_time`
    pub fn linear_ramp_to_value_at_time(
        &mut self,
        value: f64,
        end_time: impl Into<Time>,
    ) -> Result<&mut Self> {
        let time = self.seconds(end_time);
        let value = self.to_raw(value);
        self.record(AutomationEvent::LinearRamp { time, value })?;
        Ok(self)
    }

    /// Geometric ramp; the raw target is floored at [`MIN_OUTPUT`].
    pub fn exponential_ramp_to_value_at_time(
        &mut self,
        value: f64,
        end_time: impl Into<Time>,
    ) -> Result<&mut Self> {
        let time = self.seconds(end_time);
        let value = ensure_finite("value", self.to_raw(value))?.max(MIN_OUTPUT);
        self.record(AutomationEvent::ExponentialRamp { time, value })?;
        Ok(self)
    }

    /// Approach `value` from `start_time` on, never quite reaching it.
    pub fn set_target_at_time(
        &mut self,
        value: f64,
        start_time: impl Into<Time>,
        time_constant: f64,
    ) -> Result<&mut Self> {
        let time = self.seconds(start_time);
        let value = self.to_raw(value);
        self.record(AutomationEvent::TargetApproach {
            time,
            value,
            time_constant,
        })?;
        Ok(self)
    }

    /// Play `values` back as a chain of linear ramps spread evenly over `duration`.
    ///
    /// Each value is multiplied by `scaling` and then converted, so unit
    /// clamps apply to the scaled value. All values are validated before
    /// anything is scheduled.
    pub fn set_value_curve_at_time(
        &mut self,
        values: &[f64],
        start_time: impl Into<Time>,
        duration: f64,
        scaling: f64,
    ) -> Result<&mut Self> {
        if values.is_empty() {
            return Err(ParamError::EmptyCurve);
        }
        let start = ensure_non_negative("time", self.seconds(start_time))?;
        let duration = ensure_non_negative("duration", duration)?;
        ensure_finite("scaling", scaling)?;

        let raw = values
            .iter()
            .map(|&value| ensure_finite("value", self.to_raw(value * scaling)))
            .collect::<Result<Vec<_>>>()?;

        let segment = match raw.len() {
            1 => 0.0,
            len => duration / (len - 1) as f64,
        };

        self.record(AutomationEvent::SetValue {
            time: start,
            value: raw[0],
        })?;
        for (index, &value) in raw.iter().enumerate().skip(1) {
            self.record(AutomationEvent::LinearRamp {
                time: start + index as f64 * segment,
                value,
            })?;
        }
        Ok(self)
    }

    /// Drop every event at or after `time`.
    pub fn cancel_scheduled_values(&mut self, time: impl Into<Time>) -> Result<&mut Self> {
        let time = ensure_finite("time", self.seconds(time))?;
        self.cancel_raw(time);
        Ok(self)
    }

    /// Freeze the curve at `time`: whatever value the schedule produces there
    /// is held, and nothing scheduled later survives.
    ///
    /// A ramp running across `time` is cut short so it arrives at the held
    /// value exactly at `time`. A ramp that ends exactly at `time` is kept.
    pub fn cancel_and_hold_at_time(&mut self, time: impl Into<Time>) -> Result<&mut Self> {
        let time = ensure_non_negative("time", self.seconds(time))?;
        let held = self.raw_value_at(time);

        let exact: Vec<AutomationEvent> = self.events.events_at(time).copied().collect();
        if !exact.is_empty() {
            self.cancel_raw(time);
            for ramp in exact.into_iter().filter(AutomationEvent::is_ramp) {
                self.record(ramp)?;
            }
        } else if let Some(after) = self.events.get_after(time).copied() {
            self.cancel_raw(after.time());
            match after {
                AutomationEvent::LinearRamp { .. } => {
                    self.record(AutomationEvent::LinearRamp { time, value: held })?;
                }
                AutomationEvent::ExponentialRamp { .. } => {
                    self.record(AutomationEvent::ExponentialRamp {
                        time,
                        value: held.max(MIN_OUTPUT),
                    })?;
                }
                _ => {}
            }
        }

        self.record(AutomationEvent::SetValue { time, value: held })?;
        Ok(self)
    }

    /// Hold the current curve at `time` so a new ramp can start from it.
    ///
    /// Exponential ramps cannot leave zero, so a held zero is replaced by
    /// [`MIN_OUTPUT`] when `shape` is exponential.
    pub fn set_ramp_point(&mut self, time: impl Into<Time>, shape: RampShape) -> Result<&mut Self> {
        let time = ensure_non_negative("time", self.seconds(time))?;
        let held = self.raw_value_at(time);
        self.cancel_and_hold_at_time(time)?;
        if held == 0.0 && shape == RampShape::Exponential {
            self.record(AutomationEvent::SetValue {
                time,
                value: MIN_OUTPUT,
            })?;
        }
        Ok(self)
    }

    // ==================== Convenience Ramps ====================

    /// Ramp linearly from the value at `start_time` to `value` over `ramp_time` seconds
    pub fn linear_ramp_to(
        &mut self,
        value: f64,
        ramp_time: f64,
        start_time: impl Into<Time>,
    ) -> Result<&mut Self> {
        self.shaped_ramp_to(RampShape::Linear, value, ramp_time, start_time.into())
    }

    /// Ramp geometrically from the value at `start_time` to `value` over `ramp_time` seconds
    pub fn exponential_ramp_to(
        &mut self,
        value: f64,
        ramp_time: f64,
        start_time: impl Into<Time>,
    ) -> Result<&mut Self> {
        self.shaped_ramp_to(RampShape::Exponential, value, ramp_time, start_time.into())
    }

    /// Approach `value` exponentially from `start_time`, arriving after `ramp_time`
    pub fn target_ramp_to(
        &mut self,
        value: f64,
        ramp_time: f64,
        start_time: impl Into<Time>,
    ) -> Result<&mut Self> {
        let start = ensure_non_negative("time", self.seconds(start_time))?;
        self.check_approach(value, ramp_time)?;
        self.set_ramp_point(start, RampShape::Linear)?;
        self.exponential_approach_value_at_time(value, start, ramp_time)
    }

    /// Exponential approach that is guaranteed to land on `value` at
    /// `time + ramp_time`.
    ///
    /// The approach runs for 90% of the ramp, then a linear ramp finishes it.
    pub fn exponential_approach_value_at_time(
        &mut self,
        value: f64,
        time: impl Into<Time>,
        ramp_time: f64,
    ) -> Result<&mut Self> {
        let time = ensure_non_negative("time", self.seconds(time))?;
        self.check_approach(value, ramp_time)?;
        let time_constant = (ramp_time + 1.0).ln() / 200.0_f64.ln();
        self.set_target_at_time(value, time, time_constant)?;
        self.cancel_and_hold_at_time(time + ramp_time * 0.9)?;
        self.linear_ramp_to_value_at_time(value, time + ramp_time)
    }

    /// Ramp with the shape that suits the parameter's units
    pub fn ramp_to(
        &mut self,
        value: f64,
        ramp_time: f64,
        start_time: impl Into<Time>,
    ) -> Result<&mut Self> {
        self.shaped_ramp_to(self.units.ramp_shape(), value, ramp_time, start_time.into())
    }

    fn shaped_ramp_to(
        &mut self,
        shape: RampShape,
        value: f64,
        ramp_time: f64,
        start_time: Time,
    ) -> Result<&mut Self> {
        let start = ensure_non_negative("time", self.seconds(start_time))?;
        ensure_non_negative("ramp time", ramp_time)?;
        ensure_finite("value", self.to_raw(value))?;
        self.set_ramp_point(start, shape)?;
        match shape {
            RampShape::Linear => self.linear_ramp_to_value_at_time(value, start + ramp_time),
            RampShape::Exponential => {
                self.exponential_ramp_to_value_at_time(value, start + ramp_time)
            }
        }
    }

    fn check_approach(&self, value: f64, ramp_time: f64) -> Result<()> {
        ensure_finite("value", self.to_raw(value))?;
        if !(ramp_time.is_finite() && ramp_time > 0.0) {
            return Err(ParamError::InvalidTimeConstant(ramp_time));
        }
        Ok(())
    }

    // ==================== Value Queries ====================

    /// Value of the scheduled curve at `time`, in `units`
    #[must_use]
    pub fn get_value_at_time(&self, time: impl Into<Time>) -> f64 {
        self.from_raw(self.raw_value_at(self.seconds(time)))
    }

    /// Current value
    #[must_use]
    pub fn value(&self) -> f64 {
        self.get_value_at_time(Time::Now)
    }

    /// Replace everything from now on with `value`.
    ///
    /// The value also becomes the initial value, so it is what the curve
    /// falls back to before the first event or after a full cancel.
    pub fn set_value(&mut self, value: f64) -> Result<&mut Self> {
        let now = self.now();
        self.initial_value = ensure_finite("value", self.to_raw(value))?;
        self.cancel_scheduled_values(now)?;
        self.set_value_at_time(value, now)
    }

    /// Reconstruct the raw curve value at `time` from the surrounding events.
    fn raw_value_at(&self, time: f64) -> f64 {
        let time = time.max(0.0);
        let Some(before) = self.events.get(time).copied() else {
            return self.initial_value;
        };
        let after = self.events.get_after(time).copied();

        match (before, after) {
            (
                AutomationEvent::TargetApproach {
                    time: start,
                    value: target,
                    time_constant,
                },
                None | Some(AutomationEvent::SetValue { .. }),
            ) => {
                let from = self.value_before(start);
                exponential_approach(start, from, target, time_constant, time)
            }
            (_, None) => self.held_value(&before),
            (
                _,
                Some(
                    next @ (AutomationEvent::LinearRamp { .. }
                    | AutomationEvent::ExponentialRamp { .. }),
                ),
            ) => {
                let shape = match next {
                    AutomationEvent::ExponentialRamp { .. } => RampShape::Exponential,
                    _ => RampShape::Linear,
                };
                let end_value = self.held_value(&next);
                let start_value = self.ramp_start(&before);
                shape.interpolate(before.time(), start_value, next.time(), end_value, time)
            }
            (
                _,
                Some(
                    AutomationEvent::SetValue { .. }
                    | AutomationEvent::TargetApproach { .. }
                    | AutomationEvent::Cancel { .. },
                ),
            ) => self.held_value(&before),
        }
    }

    /// Most recent scheduled value strictly before `time`
    fn value_before(&self, time: f64) -> f64 {
        let mut cursor = time;
        while let Some(event) = self.events.get_before(cursor) {
            match event.value() {
                Some(value) => return value,
                None => cursor = event.time(),
            }
        }
        self.initial_value
    }

    fn held_value(&self, event: &AutomationEvent) -> f64 {
        event
            .value()
            .unwrap_or_else(|| self.value_before(event.time()))
    }

    /// A ramp leaving a target approach starts where the approach started.
    fn ramp_start(&self, before: &AutomationEvent) -> f64 {
        if before.is_target_approach() {
            self.value_before(before.time())
        } else {
            self.held_value(before)
        }
    }

    // ==================== Replay & Rendering ====================

    /// Replay the schedule from now on onto another sink.
    ///
    /// A target approach already running at "now" is approximated with ten
    /// linear steps up to the next event, or two seconds ahead if there is
    /// none. Later events are forwarded as they were recorded.
    pub fn apply<T>(&self, target: &mut T)
    where
        T: ParamSink + ?Sized,
    {
        let now = self.now();
        target.set_value_at_time(self.raw_value_at(now), now);

        if let Some(AutomationEvent::TargetApproach { time: start, .. }) =
            self.events.get(now).copied()
        {
            let end = self
                .events
                .get_after(start)
                .map_or(now + APPLY_APPROACH_HORIZON, AutomationEvent::time);
            let step = (end - now) / APPLY_APPROACH_STEPS as f64;
            for index in 0..APPLY_APPROACH_STEPS {
                let time = now + step * index as f64;
                target.linear_ramp_to_value_at_time(self.raw_value_at(time), time);
            }
        }

        self.events
            .for_each_after(now, |event| target.schedule(event));
        tracing::debug!(now, "applied automation schedule to sink");
    }

    /// Sample the curve at `sample_rate` for `duration` seconds from `start`
    pub fn to_buffer(&self, sample_rate: f64, start: f64, duration: f64) -> Vec<f64> {
        self.iter_samples(sample_rate, start, duration).collect()
    }

    /// Iterator over curve samples at `sample_rate`
    pub fn iter_samples(&self, sample_rate: f64, start: f64, duration: f64) -> SampleIterator<'_, S> {
        let finite = sample_rate.is_finite() && duration.is_finite();
        let total_samples = if finite && sample_rate > 0.0 && duration > 0.0 {
            (duration * sample_rate) as usize
        } else {
            0
        };
        SampleIterator {
            param: self,
            sample_rate,
            start,
            current_sample: 0,
            total_samples,
        }
    }

    /// Release the schedule. The sink is left as it is.
    pub fn dispose(mut self) {
        tracing::debug!(units = %self.units, events = self.events.len(), "disposing automation parameter");
        self.events.clear();
    }

    // ==================== Internals ====================

    fn seconds(&self, time: impl Into<Time>) -> f64 {
        time.into().to_seconds(&*self.clock)
    }

    fn converts(&self) -> bool {
        self.convert && !self.overridden
    }

    fn to_raw(&self, value: f64) -> f64 {
        if self.converts() {
            self.units.to_raw(value)
        } else {
            value
        }
    }

    fn from_raw(&self, value: f64) -> f64 {
        if self.converts() {
            self.units.from_raw(value)
        } else {
            value
        }
    }

    /// Validate, store, then forward to the sink.
    fn record(&mut self, event: AutomationEvent) -> Result<()> {
        event.validate()?;
        if let Some(raw) = event.value() {
            let value = self.from_raw(raw);
            let (min, max) = (self.min_value(), self.max_value());
            if value < min || value > max {
                tracing::warn!(units = %self.units, value, min, max, "automation value out of range");
            }
        }
        tracing::debug!(units = %self.units, %event, "scheduled automation event");
        self.events.add(event);
        self.sink.lock().schedule(&event);
        Ok(())
    }

    fn cancel_raw(&mut self, time: f64) {
        tracing::debug!(units = %self.units, time, "cancelled scheduled values");
        self.events.cancel(time);
        self.sink.lock().cancel_scheduled_values(time);
    }
}

impl<S: ParamSink> std::fmt::Debug for AutomationParam<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutomationParam")
            .field("units", &self.units)
            .field("convert", &self.convert)
            .field("overridden", &self.overridden)
            .field("initial_value", &self.initial_value)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

// ==================== Builder ====================

/// Step-by-step construction of an [`AutomationParam`]
pub struct ParamBuilder<S> {
    sink: Option<Arc<Mutex<S>>>,
    clock: Option<SharedClock>,
    options: ParamOptions,
}

impl<S: ParamSink> ParamBuilder<S> {
    /// Empty builder with default options
    pub fn new() -> Self {
        Self {
            sink: None,
            clock: None,
            options: ParamOptions::default(),
        }
    }

    /// Sink to drive; required
    pub fn sink(mut self, sink: Arc<Mutex<S>>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Clock that resolves [`Time::Now`]
    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn options(mut self, options: ParamOptions) -> Self {
        self.options = options;
        self
    }

    pub fn units(mut self, units: Unit) -> Self {
        self.options.units = units;
        self
    }

    /// Without a clock, "now" stays at zero.
    pub fn build(self) -> Result<AutomationParam<S>> {
        let sink = self.sink.ok_or(ParamError::MissingSink)?;
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(ManualClock::default()));
        AutomationParam::new(sink, clock, self.options)
    }
}

impl<S: ParamSink> Default for ParamBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

// ==================== Sample Iterator ====================

/// Iterator over sampled curve values
pub struct SampleIterator<'a, S: ParamSink> {
    param: &'a AutomationParam<S>,
    sample_rate: f64,
    start: f64,
    current_sample: usize,
    total_samples: usize,
}

impl<'a, S: ParamSink> Iterator for SampleIterator<'a, S> {
    type Item = f64;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_sample >= self.total_samples {
            return None;
        }

        let time = self.start + self.current_sample as f64 / self.sample_rate;
        self.current_sample += 1;

        Some(self.param.get_value_at_time(time))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total_samples - self.current_sample;
        (remaining, Some(remaining))
    }
}

impl<'a, S: ParamSink> ExactSizeIterator for SampleIterator<'a, S> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RecordingSink;

    const EPS: f64 = 1e-9;

    struct Fixture {
        param: AutomationParam<RecordingSink>,
        sink: Arc<Mutex<RecordingSink>>,
        clock: Arc<ManualClock>,
    }

    fn fixture(options: ParamOptions, default: f64) -> Fixture {
        let sink = Arc::new(Mutex::new(RecordingSink::new(default)));
        let clock = Arc::new(ManualClock::new(0.0));
        let param = AutomationParam::new(sink.clone(), clock.clone(), options).unwrap();
        Fixture { param, sink, clock }
    }

    fn number_param() -> Fixture {
        fixture(ParamOptions::default(), 0.0)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn test_builder_requires_sink() {
        let result = AutomationParam::<RecordingSink>::builder().build();
        assert!(matches!(result, Err(ParamError::MissingSink)));
    }

    #[test]
    fn test_builder_rejects_non_finite_default() {
        let sink = Arc::new(Mutex::new(RecordingSink::new(f64::NAN)));
        let result = AutomationParam::builder().sink(sink).build();
        assert!(matches!(result, Err(ParamError::NonFinite { .. })));
    }

    #[test]
    fn test_builder_rejects_zero_capacity() {
        let sink = Arc::new(Mutex::new(RecordingSink::default()));
        let result = AutomationParam::builder()
            .sink(sink)
            .options(ParamOptions::default().with_capacity(0))
            .build();
        assert!(matches!(result, Err(ParamError::InvalidCapacity)));
    }

    #[test]
    fn test_initial_value_before_events() {
        let mut f = fixture(ParamOptions::default(), 0.25);
        assert_eq!(f.param.get_value_at_time(0.0), 0.25);
        f.param.set_value_at_time(1.0, 2.0).unwrap();
        assert_eq!(f.param.get_value_at_time(1.0), 0.25);
        assert_eq!(f.param.get_value_at_time(1.999), 0.25);
        assert_eq!(f.param.get_value_at_time(2.0), 1.0);
    }

    #[test]
    fn test_options_value_schedules_at_zero() {
        let f = fixture(ParamOptions::default().with_value(0.75), 0.0);
        assert_eq!(f.param.events().len(), 1);
        assert_eq!(f.param.get_value_at_time(0.0), 0.75);

        let untouched = fixture(ParamOptions::default().with_value(0.5), 0.5);
        assert!(untouched.param.events().is_empty());
    }

    #[test]
    fn test_set_value_holds_until_next_event() {
        let mut f = number_param();
        f.param
            .set_value_at_time(0.5, 1.0)
            .unwrap()
            .set_value_at_time(0.8, 3.0)
            .unwrap();
        assert_eq!(f.param.get_value_at_time(1.0), 0.5);
        assert_eq!(f.param.get_value_at_time(2.9), 0.5);
        assert_eq!(f.param.get_value_at_time(3.0), 0.8);
        assert_eq!(f.param.get_value_at_time(100.0), 0.8);
    }

    #[test]
    fn test_linear_ramp() {
        let mut f = number_param();
        f.param
            .set_value_at_time(0.0, 0.0)
            .unwrap()
            .linear_ramp_to_value_at_time(1.0, 1.0)
            .unwrap();
        assert!(close(f.param.get_value_at_time(0.5), 0.5));
        assert!(close(f.param.get_value_at_time(1.0), 1.0));
        assert!(close(f.param.get_value_at_time(2.0), 1.0));
    }

    #[test]
    fn test_exponential_ramp() {
        let mut f = number_param();
        f.param
            .set_value_at_time(1.0, 0.0)
            .unwrap()
            .exponential_ramp_to_value_at_time(4.0, 2.0)
            .unwrap();
        assert!(close(f.param.get_value_at_time(0.0), 1.0));
        assert!(close(f.param.get_value_at_time(1.0), 2.0));
        assert!(close(f.param.get_value_at_time(2.0), 4.0));
    }

    #[test]
    fn test_exponential_ramp_floors_zero() {
        let mut f = number_param();
        f.param.exponential_ramp_to_value_at_time(0.0, 1.0).unwrap();
        let stored = f.param.events().get(1.0).copied().unwrap();
        assert_eq!(stored.value(), Some(MIN_OUTPUT));
    }

    #[test]
    fn test_set_target_at_time() {
        let mut f = number_param();
        f.param.set_target_at_time(1.0, 0.0, 0.1).unwrap();
        let expected = 1.0 - (-1.0_f64).exp();
        assert!(close(f.param.get_value_at_time(0.1), expected));
        assert!((f.param.get_value_at_time(0.1) - 0.632).abs() < 1e-3);
        assert!(f.param.get_value_at_time(10.0) < 1.0);
    }

    #[test]
    fn test_target_then_set_value() {
        let mut f = number_param();
        f.param
            .set_target_at_time(1.0, 0.0, 0.5)
            .unwrap()
            .set_value_at_time(0.2, 1.0)
            .unwrap();
        let approach = 1.0 - (-1.0_f64).exp();
        assert!(close(f.param.get_value_at_time(0.5), approach));
        assert_eq!(f.param.get_value_at_time(1.0), 0.2);
    }

    #[test]
    fn test_ramp_after_target_starts_from_approach_anchor() {
        let mut f = number_param();
        f.param
            .set_value_at_time(0.5, 0.0)
            .unwrap()
            .set_target_at_time(1.0, 1.0, 0.1)
            .unwrap()
            .linear_ramp_to_value_at_time(0.0, 2.0)
            .unwrap();
        // Ramp runs from the value before the approach (0.5), not its target
        assert!(close(f.param.get_value_at_time(1.5), 0.25));
    }

    #[test]
    fn test_invalid_time_constant() {
        let mut f = number_param();
        assert_eq!(
            f.param.set_target_at_time(1.0, 0.0, 0.0).unwrap_err(),
            ParamError::InvalidTimeConstant(0.0)
        );
        assert!(f.param.set_target_at_time(1.0, 0.0, -1.0).is_err());
        assert!(f.param.set_target_at_time(1.0, 0.0, f64::NAN).is_err());
        assert!(f.param.events().is_empty());
        assert!(f.sink.lock().commands().is_empty());
    }

    #[test]
    fn test_non_finite_leaves_state_unchanged() {
        let mut f = number_param();
        f.param.set_value_at_time(0.5, 0.0).unwrap();
        let before = f.param.events().clone();

        assert!(f.param.set_value_at_time(f64::NAN, 1.0).is_err());
        assert!(f.param.linear_ramp_to_value_at_time(1.0, f64::INFINITY).is_err());
        assert!(f.param.exponential_ramp_to_value_at_time(f64::NAN, 1.0).is_err());
        assert!(f.param.cancel_scheduled_values(f64::NAN).is_err());
        assert!(f.param.set_value_at_time(1.0, -1.0).is_err());

        assert_eq!(f.param.events(), &before);
        assert_eq!(f.sink.lock().commands().len(), 1);
    }

    #[test]
    fn test_commands_mirrored_to_sink() {
        let mut f = number_param();
        f.param
            .set_value_at_time(0.0, 0.0)
            .unwrap()
            .linear_ramp_to_value_at_time(1.0, 1.0)
            .unwrap()
            .set_target_at_time(0.5, 2.0, 0.3)
            .unwrap();

        let recorded: Vec<_> = f.param.events().iter().copied().collect();
        assert_eq!(f.sink.lock().commands(), recorded.as_slice());
    }

    #[test]
    fn test_value_curve() {
        let mut f = number_param();
        f.param
            .set_value_curve_at_time(&[0.0, 1.0, 0.0], 0.0, 2.0, 1.0)
            .unwrap();

        let events: Vec<_> = f.param.events().iter().copied().collect();
        assert_eq!(
            events,
            vec![
                AutomationEvent::SetValue {
                    time: 0.0,
                    value: 0.0
                },
                AutomationEvent::LinearRamp {
                    time: 1.0,
                    value: 1.0
                },
                AutomationEvent::LinearRamp {
                    time: 2.0,
                    value: 0.0
                },
            ]
        );
        assert!(close(f.param.get_value_at_time(0.5), 0.5));
        assert!(close(f.param.get_value_at_time(1.5), 0.5));
    }

    #[test]
    fn test_value_curve_scaling_and_errors() {
        let mut f = number_param();
        assert_eq!(
            f.param
                .set_value_curve_at_time(&[], 0.0, 1.0, 1.0)
                .unwrap_err(),
            ParamError::EmptyCurve
        );
        assert!(f
            .param
            .set_value_curve_at_time(&[0.0, f64::NAN], 0.0, 1.0, 1.0)
            .is_err());
        assert!(f.param.events().is_empty());

        f.param
            .set_value_curve_at_time(&[1.0, 2.0], 1.0, 1.0, 0.5)
            .unwrap();
        assert_eq!(f.param.get_value_at_time(1.0), 0.5);
        assert_eq!(f.param.get_value_at_time(2.0), 1.0);

        f.param.set_value_curve_at_time(&[3.0], 5.0, 1.0, 1.0).unwrap();
        assert_eq!(f.param.get_value_at_time(5.0), 3.0);
    }

    #[test]
    fn test_value_curve_clamps_after_scaling() {
        let mut f = fixture(ParamOptions::new(Unit::NormalRange), 0.0);
        f.param
            .set_value_curve_at_time(&[0.25, 0.8], 0.0, 1.0, 2.0)
            .unwrap();

        assert_eq!(f.param.get_value_at_time(0.0), 0.5);
        assert_eq!(f.param.get_value_at_time(1.0), 1.0);
        assert!(f
            .param
            .events()
            .iter()
            .filter_map(AutomationEvent::value)
            .all(|value| (0.0..=1.0).contains(&value)));
    }

    #[test]
    fn test_cancel_scheduled_values() {
        let mut f = number_param();
        f.param
            .set_value_at_time(0.2, 0.0)
            .unwrap()
            .set_value_at_time(0.4, 1.0)
            .unwrap()
            .linear_ramp_to_value_at_time(1.0, 2.0)
            .unwrap();

        f.param.cancel_scheduled_values(1.0).unwrap();
        assert_eq!(f.param.events().len(), 1);
        assert_eq!(f.param.get_value_at_time(1.5), 0.2);
        assert_eq!(
            f.sink.lock().commands().last(),
            Some(&AutomationEvent::Cancel { time: 1.0 })
        );

        f.param.cancel_scheduled_values(0.0).unwrap();
        assert_eq!(f.param.get_value_at_time(5.0), 0.0);
    }

    #[test]
    fn test_cancel_and_hold_mid_linear_ramp() {
        let mut f = number_param();
        f.param
            .set_value_at_time(0.0, 0.0)
            .unwrap()
            .linear_ramp_to_value_at_time(1.0, 2.0)
            .unwrap();
        let at_one = f.param.get_value_at_time(1.0);
        let at_half = f.param.get_value_at_time(0.5);

        f.param.cancel_and_hold_at_time(1.0).unwrap();
        assert!(close(f.param.get_value_at_time(1.0), at_one));
        assert!(close(f.param.get_value_at_time(0.5), at_half));
        assert!(close(f.param.get_value_at_time(3.0), at_one));
        assert!(f.param.events().iter().all(|event| event.time() <= 1.0));
    }

    #[test]
    fn test_cancel_and_hold_mid_exponential_ramp() {
        let mut f = number_param();
        f.param
            .set_value_at_time(1.0, 0.0)
            .unwrap()
            .exponential_ramp_to_value_at_time(4.0, 2.0)
            .unwrap();
        let at_half = f.param.get_value_at_time(0.5);

        f.param.cancel_and_hold_at_time(1.0).unwrap();
        assert!(close(f.param.get_value_at_time(1.0), 2.0));
        assert!(close(f.param.get_value_at_time(0.5), at_half));
        assert!(close(f.param.get_value_at_time(5.0), 2.0));
    }

    #[test]
    fn test_cancel_and_hold_on_event_time() {
        let mut f = number_param();
        f.param
            .set_value_at_time(0.0, 0.0)
            .unwrap()
            .linear_ramp_to_value_at_time(1.0, 1.0)
            .unwrap()
            .linear_ramp_to_value_at_time(0.0, 2.0)
            .unwrap();

        f.param.cancel_and_hold_at_time(1.0).unwrap();
        // The ramp ending at 1.0 survives, the one after it does not
        assert!(close(f.param.get_value_at_time(0.5), 0.5));
        assert!(close(f.param.get_value_at_time(1.0), 1.0));
        assert!(close(f.param.get_value_at_time(1.5), 1.0));
        assert!(f.param.events().iter().all(|event| event.time() <= 1.0));
    }

    #[test]
    fn test_cancel_and_hold_during_target() {
        let mut f = number_param();
        f.param.set_target_at_time(1.0, 0.0, 0.5).unwrap();
        let held = f.param.get_value_at_time(1.0);

        f.param.cancel_and_hold_at_time(1.0).unwrap();
        assert!(close(f.param.get_value_at_time(1.0), held));
        assert!(close(f.param.get_value_at_time(4.0), held));
        let mid = 1.0 - (-1.0_f64).exp();
        assert!(close(f.param.get_value_at_time(0.5), mid));
    }

    #[test]
    fn test_set_ramp_point_substitutes_min_output() {
        let mut f = number_param();
        f.param.set_value_at_time(0.0, 0.0).unwrap();
        f.param
            .set_ramp_point(1.0, RampShape::Exponential)
            .unwrap();
        assert_eq!(f.param.get_value_at_time(1.0), MIN_OUTPUT);

        let mut g = number_param();
        g.param.set_value_at_time(0.0, 0.0).unwrap();
        g.param.set_ramp_point(1.0, RampShape::Linear).unwrap();
        assert_eq!(g.param.get_value_at_time(1.0), 0.0);
    }

    #[test]
    fn test_linear_ramp_to() {
        let mut f = number_param();
        f.param.set_value_at_time(0.2, 0.0).unwrap();
        f.clock.set(1.0);
        f.param.linear_ramp_to(1.0, 1.0, Time::Now).unwrap();

        assert!(close(f.param.get_value_at_time(1.0), 0.2));
        assert!(close(f.param.get_value_at_time(1.5), 0.6));
        assert!(close(f.param.get_value_at_time(2.0), 1.0));
    }

    #[test]
    fn test_exponential_ramp_to_from_zero() {
        let mut f = number_param();
        f.param.exponential_ramp_to(1.0, 1.0, 0.0).unwrap();
        let mid = f.param.get_value_at_time(0.5);
        assert!(mid > 0.0 && mid < 0.01);
        assert!(close(f.param.get_value_at_time(1.0), 1.0));
    }

    #[test]
    fn test_exponential_approach_value_at_time() {
        let mut f = number_param();
        f.param
            .exponential_approach_value_at_time(1.0, 0.0, 1.0)
            .unwrap();
        let at_end = f.param.get_value_at_time(1.0);
        assert!(close(at_end, 1.0));
        let mid = f.param.get_value_at_time(0.5);
        assert!(mid > 0.9 && mid < 1.0);
        // Monotone rise through the hand-off at 90%
        assert!(f.param.get_value_at_time(0.89) <= f.param.get_value_at_time(0.95));
    }

    #[test]
    fn test_target_ramp_to() {
        let mut f = number_param();
        f.param.set_value_at_time(0.5, 0.0).unwrap();
        f.param.target_ramp_to(0.0, 0.5, 1.0).unwrap();
        assert_eq!(f.param.get_value_at_time(1.0), 0.5);
        assert!(close(f.param.get_value_at_time(1.5), 0.0));
        assert!(f.param.get_value_at_time(1.2) < 0.5);
    }

    #[test]
    fn test_ramp_to_picks_shape_from_units() {
        let mut freq = fixture(ParamOptions::new(Unit::Frequency), 100.0);
        freq.param.ramp_to(400.0, 2.0, 0.0).unwrap();
        assert!(close(freq.param.get_value_at_time(1.0), 200.0));

        let mut gain = fixture(ParamOptions::new(Unit::Gain), 0.0);
        gain.param.ramp_to(1.0, DEFAULT_RAMP_TIME, 0.0).unwrap();
        assert!(close(gain.param.get_value_at_time(0.05), 0.5));
    }

    #[test]
    fn test_decibel_conversion_round_trip() {
        let mut f = fixture(ParamOptions::new(Unit::Decibels), 1.0);
        assert!(close(f.param.get_value_at_time(0.0), 0.0));
        f.param.set_value_at_time(-20.0, 1.0).unwrap();
        assert!(close(f.param.get_value_at_time(1.0), -20.0));
        let stored = f.param.events().get(1.0).and_then(AutomationEvent::value);
        assert!(close(stored.unwrap(), 0.1));
        assert_eq!(f.param.min_value(), f64::NEG_INFINITY);
    }

    #[test]
    fn test_overridden_disables_conversion() {
        let mut f = fixture(ParamOptions::new(Unit::Decibels), 1.0);
        f.param.set_overridden(true);
        f.param.set_value_at_time(0.5, 0.0).unwrap();
        assert_eq!(f.param.events().get(0.0).and_then(AutomationEvent::value), Some(0.5));
        assert_eq!(f.param.get_value_at_time(0.0), 0.5);

        f.param.set_overridden(false);
        f.param.set_convert(false);
        assert!(!f.param.convert());
        assert_eq!(f.param.get_value_at_time(0.0), 0.5);
    }

    #[test]
    fn test_normal_range_clamps() {
        let mut f = fixture(ParamOptions::new(Unit::NormalRange), 0.0);
        f.param.set_value_at_time(1.5, 0.0).unwrap();
        assert_eq!(f.param.get_value_at_time(0.0), 1.0);
        assert_eq!(f.param.min_value(), 0.0);
        assert_eq!(f.param.max_value(), 1.0);
    }

    #[test]
    fn test_bounds_fall_back_to_sink() {
        let sink = Arc::new(Mutex::new(RecordingSink::new(0.0).with_range(-5.0, 5.0)));
        let param = AutomationParam::builder().sink(sink).build().unwrap();
        assert_eq!(param.min_value(), -5.0);
        assert_eq!(param.max_value(), 5.0);

        let sink = Arc::new(Mutex::new(RecordingSink::new(0.0)));
        let param = AutomationParam::builder()
            .sink(sink)
            .options(ParamOptions::default().with_range(-1.0, 2.0))
            .build()
            .unwrap();
        assert_eq!(param.min_value(), -1.0);
        assert_eq!(param.max_value(), 2.0);
    }

    #[test]
    fn test_value_property() {
        let mut f = number_param();
        f.param
            .set_value_at_time(0.0, 0.0)
            .unwrap()
            .linear_ramp_to_value_at_time(1.0, 2.0)
            .unwrap();
        f.clock.set(1.0);
        assert!(close(f.param.value(), 0.5));

        f.param.set_value(0.25).unwrap();
        assert_eq!(f.param.value(), 0.25);
        assert_eq!(f.param.get_value_at_time(3.0), 0.25);
        assert!(f.param.events().iter().all(|event| event.time() <= 1.0));
    }

    #[test]
    fn test_set_value_updates_initial_value() {
        let mut f = number_param();
        f.clock.set(1.0);
        f.param.set_value(0.25).unwrap();

        assert_eq!(f.param.initial_value(), 0.25);
        assert_eq!(f.param.get_value_at_time(0.5), 0.25);

        f.param.cancel_scheduled_values(0.0).unwrap();
        assert!(f.param.events().is_empty());
        assert_eq!(f.param.get_value_at_time(5.0), 0.25);
    }

    #[test]
    fn test_set_value_stores_raw_initial_value() {
        let mut f = fixture(ParamOptions::new(Unit::Decibels), 1.0);
        f.param.set_value(-20.0).unwrap();
        assert!(close(f.param.initial_value(), -20.0));

        assert!(f.param.set_value(f64::NAN).is_err());
        assert!(close(f.param.initial_value(), -20.0));
    }

    #[test]
    fn test_query_clamps_negative_time() {
        let mut f = number_param();
        f.param.set_value_at_time(0.7, 0.0).unwrap();
        assert_eq!(f.param.get_value_at_time(-1.0), 0.7);
    }

    #[test]
    fn test_apply_replays_future_events() {
        let mut f = number_param();
        f.param
            .set_value_at_time(0.0, 0.0)
            .unwrap()
            .linear_ramp_to_value_at_time(1.0, 2.0)
            .unwrap()
            .set_value_at_time(0.3, 3.0)
            .unwrap();
        f.clock.set(1.0);

        let mut target = RecordingSink::default();
        f.param.apply(&mut target);
        assert_eq!(
            target.commands(),
            &[
                AutomationEvent::SetValue {
                    time: 1.0,
                    value: 0.5
                },
                AutomationEvent::LinearRamp {
                    time: 2.0,
                    value: 1.0
                },
                AutomationEvent::SetValue {
                    time: 3.0,
                    value: 0.3
                },
            ]
        );
    }

    #[test]
    fn test_apply_samples_running_target() {
        let mut f = number_param();
        f.param
            .set_target_at_time(1.0, 0.0, 0.5)
            .unwrap()
            .set_value_at_time(0.0, 3.0)
            .unwrap();
        f.clock.set(1.0);

        let mut target = RecordingSink::default();
        f.param.apply(&mut target);
        let commands = target.commands();
        assert_eq!(commands.len(), 1 + APPLY_APPROACH_STEPS + 1);
        assert!(commands[1..=APPLY_APPROACH_STEPS]
            .iter()
            .all(|event| matches!(event, AutomationEvent::LinearRamp { .. })));
        assert_eq!(
            commands.last(),
            Some(&AutomationEvent::SetValue {
                time: 3.0,
                value: 0.0
            })
        );
        let last_step = commands[APPLY_APPROACH_STEPS].time();
        assert!(close(last_step, 2.8));
    }

    #[test]
    fn test_apply_target_without_following_event() {
        let mut f = number_param();
        f.param.set_target_at_time(1.0, 0.0, 0.5).unwrap();
        f.clock.set(1.0);

        let mut target = RecordingSink::default();
        f.param.apply(&mut target);
        let commands = target.commands();
        assert_eq!(commands.len(), 1 + APPLY_APPROACH_STEPS);
        assert!(matches!(commands[0], AutomationEvent::SetValue { time, .. } if time == 1.0));

        // Steps cover the two second horizon past now
        for (index, event) in commands[1..].iter().enumerate() {
            assert!(matches!(event, AutomationEvent::LinearRamp { .. }));
            assert!(close(event.time(), 1.0 + 0.2 * index as f64));
            let value = event.value().unwrap();
            assert!(close(value, f.param.get_value_at_time(event.time())));
        }
        assert!(close(commands[APPLY_APPROACH_STEPS].time(), 2.8));
    }

    #[test]
    fn test_iter_samples_non_finite_is_empty() {
        let mut f = number_param();
        f.param.set_value_at_time(0.5, 0.0).unwrap();
        assert_eq!(f.param.iter_samples(10.0, 0.0, f64::INFINITY).len(), 0);
        assert_eq!(f.param.iter_samples(f64::INFINITY, 0.0, 1.0).len(), 0);
        assert_eq!(f.param.iter_samples(f64::NAN, 0.0, 1.0).len(), 0);
        assert!(f.param.to_buffer(44_100.0, 0.0, f64::NAN).is_empty());
    }

    #[test]
    fn test_to_buffer() {
        let mut f = number_param();
        f.param
            .set_value_at_time(0.0, 0.0)
            .unwrap()
            .linear_ramp_to_value_at_time(1.0, 1.0)
            .unwrap();

        let buffer = f.param.to_buffer(10.0, 0.0, 1.0);
        assert_eq!(buffer.len(), 10);
        assert_eq!(buffer[0], 0.0);
        assert!((buffer[9] - 0.9).abs() < 1e-6);
        assert_eq!(f.param.iter_samples(10.0, 0.0, 1.0).len(), 10);
        assert_eq!(f.param.iter_samples(0.0, 0.0, 1.0).len(), 0);
    }

    #[test]
    fn test_idempotent_queries() {
        let mut f = number_param();
        f.param
            .set_value_at_time(0.1, 0.0)
            .unwrap()
            .exponential_ramp_to_value_at_time(0.9, 1.0)
            .unwrap()
            .set_target_at_time(0.2, 1.5, 0.3)
            .unwrap();
        for time in [0.0, 0.3, 1.2, 1.7, 5.0] {
            assert_eq!(
                f.param.get_value_at_time(time).to_bits(),
                f.param.get_value_at_time(time).to_bits()
            );
        }
    }

    #[test]
    fn test_dispose_leaves_sink_alone() {
        let mut f = number_param();
        f.param.set_value_at_time(0.5, 0.0).unwrap();
        let sink = f.sink.clone();
        f.param.dispose();
        assert_eq!(sink.lock().commands().len(), 1);
    }
}
