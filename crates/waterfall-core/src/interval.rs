use crate::event::{is_finalizing, Event, StackRef};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::ops::Range;

/// Closing side of an [`Interval`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntervalEnd {
    /// A real finalizing event from the provider.
    Event(Event),
    /// No finalizing event was seen. `at` is the reconstruction time for a transition that is
    /// still running, or the event's own time for a lone completion notice.
    Synthesized {
        status: String,
        at: DateTime<Utc>,
    },
}

impl IntervalEnd {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            IntervalEnd::Event(event) => event.timestamp,
            IntervalEnd::Synthesized { at, .. } => *at,
        }
    }

    pub fn status(&self) -> &str {
        match self {
            IntervalEnd::Event(event) => &event.resource_status,
            IntervalEnd::Synthesized { status, .. } => status,
        }
    }

    pub fn event(&self) -> Option<&Event> {
        match self {
            IntervalEnd::Event(event) => Some(event),
            IntervalEnd::Synthesized { .. } => None,
        }
    }
}

/// One resource's transition from an opening event to a finalizing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    pub start: Event,
    pub intermediate: Vec<Event>,
    pub end: IntervalEnd,
}

impl Interval {
    pub fn logical_resource_id(&self) -> &str {
        &self.start.logical_resource_id
    }

    pub fn stack(&self) -> &StackRef {
        &self.start.stack_id
    }

    pub fn duration(&self) -> Duration {
        self.end.timestamp() - self.start.timestamp
    }

    /// True while no finalizing event has been seen for this transition.
    pub fn is_running(&self) -> bool {
        matches!(&self.end, IntervalEnd::Synthesized { status, .. } if !is_finalizing(status))
    }

    /// Status that decides how the interval is drawn.
    pub fn display_status(&self) -> &str {
        self.end.status()
    }

    /// Provider events folded into this interval, in start/intermediate/end order.
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        std::iter::once(&self.start)
            .chain(self.intermediate.iter())
            .chain(self.end.event())
    }
}

/// Reconstructed intervals keyed by stack, then by owning operation id.
#[derive(Debug, Clone, Default)]
pub struct IntervalIndex {
    by_stack: HashMap<StackRef, HashMap<String, Vec<Interval>>>,
    orphaned: usize,
}

impl IntervalIndex {
    pub(crate) fn push(&mut self, stack: StackRef, operation_id: String, interval: Interval) {
        self.by_stack
            .entry(stack)
            .or_default()
            .entry(operation_id)
            .or_default()
            .push(interval);
    }

    pub(crate) fn set_orphaned(&mut self, orphaned: usize) {
        self.orphaned = orphaned;
    }

    pub(crate) fn lists_mut(&mut self) -> impl Iterator<Item = &mut Vec<Interval>> {
        self.by_stack.values_mut().flat_map(|ops| ops.values_mut())
    }

    pub fn get(&self, stack: &StackRef, operation_id: &str) -> &[Interval] {
        self.by_stack
            .get(stack)
            .and_then(|ops| ops.get(operation_id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every (stack, operation, intervals) entry, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&StackRef, &str, &[Interval])> {
        self.by_stack.iter().flat_map(|(stack, ops)| {
            ops.iter()
                .map(move |(op, intervals)| (stack, op.as_str(), intervals.as_slice()))
        })
    }

    pub fn interval_count(&self) -> usize {
        self.iter().map(|(_, _, intervals)| intervals.len()).sum()
    }

    /// Events that appeared before any operation in scan order and were left out.
    pub fn orphaned(&self) -> usize {
        self.orphaned
    }
}

/// Time bounds across a set of intervals, used to scale the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn of<'a, I>(intervals: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Interval>,
    {
        let mut window: Option<Window> = None;
        for interval in intervals {
            let start = interval.start.timestamp;
            let end = interval.end.timestamp();
            window = Some(match window {
                None => Window { start, end },
                Some(current) => Window {
                    start: current.start.min(start),
                    end: current.end.max(end),
                },
            });
        }
        window
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Columns of a `width`-wide track covered by `[start, end]`. Any interval inside the
    /// window covers at least one column.
    pub fn columns(&self, start: DateTime<Utc>, end: DateTime<Utc>, width: usize) -> Range<usize> {
        if width == 0 {
            return 0..0;
        }
        let total = self.duration().num_milliseconds();
        if total <= 0 {
            return 0..width;
        }
        let offset = |at: DateTime<Utc>| -> f64 {
            let millis = (at - self.start).num_milliseconds().clamp(0, total);
            millis as f64 / total as f64 * width as f64
        };
        let first = (offset(start).floor() as usize).min(width - 1);
        let last = (offset(end).ceil() as usize).clamp(first + 1, width);
        first..last
    }
}
