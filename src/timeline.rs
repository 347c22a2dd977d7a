//! Time-ordered automation event store
//!
//! Events are kept sorted by time in a ring-backed sequence. Every lookup
//! is a binary search over that order. When several events share a time,
//! they stay in insertion order, so exact-time lookups see the newest one
//! and forward iteration visits the oldest one first.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::{ParamError, Result};
use crate::event::AutomationEvent;

/// Default number of events kept before the oldest are evicted
pub const DEFAULT_CAPACITY: usize = 1000;

/// Bounded, sorted list of automation events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TimelineData", into = "TimelineData")]
pub struct Timeline {
    events: VecDeque<AutomationEvent>,
    capacity: usize,
}

impl Timeline {
    /// Create an empty timeline holding at most `capacity` events
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(ParamError::InvalidCapacity);
        }
        Ok(Self {
            events: VecDeque::new(),
            capacity,
        })
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Events in time order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &AutomationEvent> + '_ {
        self.events.iter()
    }

    /// Insert an event after every event with the same or earlier time.
    ///
    /// A full timeline drops its oldest event first.
    pub fn add(&mut self, event: AutomationEvent) {
        if self.events.len() >= self.capacity {
            if let Some(evicted) = self.events.pop_front() {
                tracing::trace!(%evicted, capacity = self.capacity, "evicted oldest automation event");
            }
        }
        let index = self.upper_bound(event.time());
        self.events.insert(index, event);
    }

    /// Latest event with `time <= time`
    #[must_use]
    pub fn get(&self, time: f64) -> Option<&AutomationEvent> {
        match self.upper_bound(time) {
            0 => None,
            index => self.events.get(index - 1),
        }
    }

    /// Latest event with `time < time`
    #[must_use]
    pub fn get_before(&self, time: f64) -> Option<&AutomationEvent> {
        match self.lower_bound(time) {
            0 => None,
            index => self.events.get(index - 1),
        }
    }

    /// Earliest event with `time > time`
    #[must_use]
    pub fn get_after(&self, time: f64) -> Option<&AutomationEvent> {
        self.events.get(self.upper_bound(time))
    }

    /// Remove every event with `time >= time`
    pub fn cancel(&mut self, time: f64) {
        let index = self.lower_bound(time);
        let removed = self.events.len() - index;
        if removed > 0 {
            tracing::trace!(time, removed, "truncated automation events");
        }
        self.events.truncate(index);
    }

    /// Visit every event with `time > time` in ascending order
    pub fn for_each_after<F>(&self, time: f64, mut visitor: F)
    where
        F: FnMut(&AutomationEvent),
    {
        for event in self.iter_after(time) {
            visitor(event);
        }
    }

    /// Iterator over every event with `time > time`
    pub fn iter_after(&self, time: f64) -> impl Iterator<Item = &AutomationEvent> + '_ {
        self.events.range(self.upper_bound(time)..)
    }

    /// Events scheduled exactly at `time`, oldest first
    pub fn events_at(&self, time: f64) -> impl Iterator<Item = &AutomationEvent> + '_ {
        self.events.range(self.lower_bound(time)..self.upper_bound(time))
    }

    /// First index whose event time is `>= time`
    fn lower_bound(&self, time: f64) -> usize {
        self.events.partition_point(|event| event.time() < time)
    }

    /// First index whose event time is `> time`
    fn upper_bound(&self, time: f64) -> usize {
        self.events.partition_point(|event| event.time() <= time)
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self {
            events: VecDeque::new(),
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Serialized shape of a timeline; re-sorted and re-bounded on load.
#[derive(Serialize, Deserialize)]
struct TimelineData {
    capacity: usize,
    events: Vec<AutomationEvent>,
}

impl From<TimelineData> for Timeline {
    fn from(data: TimelineData) -> Self {
        let mut timeline = Timeline {
            events: VecDeque::with_capacity(data.events.len()),
            capacity: data.capacity.max(1),
        };
        for event in data.events {
            timeline.add(event);
        }
        timeline
    }
}

impl From<Timeline> for TimelineData {
    fn from(timeline: Timeline) -> Self {
        Self {
            capacity: timeline.capacity,
            events: timeline.events.into(),
        }
    }
}
