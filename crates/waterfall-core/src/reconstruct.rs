//! Rebuilds resource intervals from the merged provider event log.
//!
//! The merged log holds each tracked stack's events newest first, stacks in registration
//! order. Scanning it back to front visits each stack oldest first, which is what lets a
//! resource event be attributed to the operation seen most recently before it. Across stacks
//! the scan order is registration order reversed rather than a global clock, so attribution
//! of events from concurrently updating stacks is best effort.
//!
//! A completion event with no earlier interval for its resource still becomes an interval of
//! its own. Its `start` is that finalizing event and its end is synthesized at the same
//! instant, so the row shows up with zero length instead of being dropped.

use crate::event::{Event, StackRef};
use crate::interval::{Interval, IntervalEnd, IntervalIndex};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;

type ResourceKey<'a> = (&'a StackRef, &'a str);

/// Builds a fresh [`IntervalIndex`] from `events` (merged provider order).
///
/// `now` stamps the synthesized end of every transition that has not finalized yet.
pub fn rebuild(events: &[Event], now: DateTime<Utc>) -> IntervalIndex {
    let scan: Vec<&Event> = events.iter().rev().collect();

    let mut positions: HashMap<ResourceKey<'_>, Vec<usize>> = HashMap::new();
    for (pos, event) in scan.iter().enumerate() {
        positions.entry(resource_key(event)).or_default().push(pos);
    }

    let mut consumed = vec![false; scan.len()];
    let mut owner: Option<(StackRef, String)> = None;
    let mut published: Vec<(StackRef, String, Interval)> = Vec::new();
    let mut last_for_resource: HashMap<ResourceKey<'_>, usize> = HashMap::new();
    let mut orphaned = 0usize;

    for pos in 0..scan.len() {
        let event = scan[pos];
        if event.is_operation() {
            owner = Some((event.stack_id.clone(), event.event_id.clone()));
        }
        if consumed[pos] {
            continue;
        }
        consumed[pos] = true;
        let key = resource_key(event);

        let interval = if event.is_completed() {
            // Completion notice repeated after the real end was matched.
            if let Some(&idx) = last_for_resource.get(&key) {
                published[idx].2.intermediate.push(event.clone());
                continue;
            }
            Interval {
                start: event.clone(),
                intermediate: Vec::new(),
                end: IntervalEnd::Synthesized {
                    status: event.resource_status.clone(),
                    at: event.timestamp,
                },
            }
        } else {
            let later = positions
                .get(&key)
                .map(|found| {
                    let first = found.partition_point(|&p| p <= pos);
                    &found[first..]
                })
                .unwrap_or(&[]);
            open_interval(event, later, &scan, &mut consumed, now)
        };

        match &owner {
            Some((stack, operation)) => {
                last_for_resource.insert(key, published.len());
                published.push((stack.clone(), operation.clone(), interval));
            }
            None => {
                let skipped = interval.events().count();
                debug!(
                    event = "interval_orphaned",
                    stack = %event.stack_id,
                    resource = %event.logical_resource_id,
                    skipped
                );
                orphaned += skipped;
            }
        }
    }

    let mut index = IntervalIndex::default();
    for (stack, operation, interval) in published {
        index.push(stack, operation, interval);
    }
    for intervals in index.lists_mut() {
        intervals.sort_by_key(|interval| interval.start.timestamp);
    }
    index.set_orphaned(orphaned);

    debug!(
        event = "intervals_rebuilt",
        events = events.len(),
        intervals = index.interval_count(),
        orphaned
    );
    index
}

fn resource_key(event: &Event) -> ResourceKey<'_> {
    (&event.stack_id, event.logical_resource_id.as_str())
}

/// Folds later events for the opener's resource into a new interval. Same-status repeats and
/// non-finalizing notices become intermediates; the first finalizing event with a different
/// status closes it.
fn open_interval(
    opener: &Event,
    later: &[usize],
    scan: &[&Event],
    consumed: &mut [bool],
    now: DateTime<Utc>,
) -> Interval {
    let mut intermediate = Vec::new();
    let mut end = None;

    for &pos in later {
        if consumed[pos] {
            continue;
        }
        let target = scan[pos];
        consumed[pos] = true;
        if target.resource_status == opener.resource_status || !target.is_finalizing() {
            intermediate.push(target.clone());
        } else {
            end = Some(IntervalEnd::Event(target.clone()));
            break;
        }
    }

    Interval {
        start: opener.clone(),
        intermediate,
        end: end.unwrap_or_else(|| IntervalEnd::Synthesized {
            status: opener.resource_status.clone(),
            at: now,
        }),
    }
}
