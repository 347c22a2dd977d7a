//! # automation-timeline
//!
//! Scheduled automation for a single control value, with the value
//! reconstructed at any time - past, present or future.
//!
//! This crate provides:
//! - **Automation events** - set, linear ramp, exponential ramp, target approach, cancel
//! - **Timeline** - bounded, time-ordered event store with binary-search lookups
//! - **Automation parameter** - scheduling API that mirrors every command to a sink
//! - **Curve math** - the interpolation laws between events
//! - **Semantic units** - decibels, frequency, normalized ranges and friends
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use automation_timeline::prelude::*;
//!
//! let sink = Arc::new(Mutex::new(RecordingSink::new(0.0)));
//! let mut gain = AutomationParam::builder().sink(sink.clone()).build().unwrap();
//!
//! gain.set_value_at_time(0.0, 0.0)
//!     .unwrap()
//!     .linear_ramp_to_value_at_time(1.0, 1.0)
//!     .unwrap();
//!
//! assert!((gain.get_value_at_time(0.5) - 0.5).abs() < 1e-9);
//! assert_eq!(gain.get_value_at_time(2.0), 1.0);
//!
//! // The sink saw the same two commands
//! assert_eq!(sink.lock().commands().len(), 2);
//! ```
//!
//! ## Cancel and hold
//!
//! ```rust
//! # use std::sync::Arc;
//! # use parking_lot::Mutex;
//! # use automation_timeline::prelude::*;
//! let sink = Arc::new(Mutex::new(RecordingSink::new(100.0)));
//! let mut cutoff = AutomationParam::builder()
//!     .sink(sink)
//!     .units(Unit::Frequency)
//!     .build()
//!     .unwrap();
//!
//! cutoff
//!     .set_value_at_time(100.0, 0.0)
//!     .unwrap()
//!     .exponential_ramp_to_value_at_time(1000.0, 3.0)
//!     .unwrap();
//! let mid = cutoff.get_value_at_time(1.5);
//! assert!((mid - 316.227766).abs() < 1e-3);
//!
//! cutoff.cancel_and_hold_at_time(1.5).unwrap();
//! assert!((cutoff.get_value_at_time(1.5) - mid).abs() < 1e-9);
//! assert!((cutoff.get_value_at_time(10.0) - mid).abs() < 1e-9);
//! ```

pub mod curve;
pub mod error;
pub mod event;
pub mod options;
pub mod param;
pub mod sink;
pub mod time;
pub mod timeline;
pub mod units;

pub use curve::{RampShape, MIN_OUTPUT};
pub use error::{ParamError, Result};
pub use event::AutomationEvent;
pub use options::ParamOptions;
pub use param::{AutomationParam, ParamBuilder, SampleIterator, SharedClock, DEFAULT_RAMP_TIME};
pub use sink::{ParamSink, RecordingSink};
pub use time::{Clock, ManualClock, Time};
pub use timeline::Timeline;
pub use units::Unit;

/// Prelude for common imports
pub mod prelude {
    pub use crate::curve::RampShape;
    pub use crate::error::ParamError;
    pub use crate::event::AutomationEvent;
    pub use crate::options::ParamOptions;
    pub use crate::param::{AutomationParam, DEFAULT_RAMP_TIME};
    pub use crate::sink::{ParamSink, RecordingSink};
    pub use crate::time::{Clock, ManualClock, Time};
    pub use crate::timeline::Timeline;
    pub use crate::units::Unit;
}
