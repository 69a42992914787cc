use crate::event::{Event, StackRef};
use crate::interval::{Interval, IntervalIndex};
use crate::operations::OperationIndex;
use crate::reconstruct;
use crate::store::EventStore;
use chrono::{DateTime, Utc};

/// Immutable result of one successful refresh. Readers hold it behind an `Arc` and swap the
/// whole thing when a newer one is published.
#[derive(Debug, Clone)]
pub struct DataSet {
    root: StackRef,
    store: EventStore,
    operations: OperationIndex,
    intervals: IntervalIndex,
    refreshed_at: DateTime<Utc>,
}

impl DataSet {
    pub fn empty(root: StackRef, now: DateTime<Utc>) -> Self {
        Self {
            store: EventStore::new(root.clone()),
            root,
            operations: OperationIndex::default(),
            intervals: IntervalIndex::default(),
            refreshed_at: now,
        }
    }

    /// Derives both indices from the same merged event list.
    pub fn build(root: StackRef, store: EventStore, now: DateTime<Utc>) -> Self {
        let events = store.all_events();
        let operations = OperationIndex::build(&events);
        let intervals = reconstruct::rebuild(&events, now);
        Self {
            root,
            store,
            operations,
            intervals,
            refreshed_at: now,
        }
    }

    pub fn root(&self) -> &StackRef {
        &self.root
    }

    pub fn stacks(&self) -> Vec<StackRef> {
        self.store.stacks()
    }

    pub fn stack_count(&self) -> usize {
        self.store.stack_count()
    }

    pub fn stack_events(&self, stack: &StackRef) -> &[Event] {
        self.store.events(stack)
    }

    pub fn all_events(&self) -> Vec<Event> {
        self.store.all_events()
    }

    pub fn operations(&self) -> &OperationIndex {
        &self.operations
    }

    pub fn interval_index(&self) -> &IntervalIndex {
        &self.intervals
    }

    pub fn refreshed_at(&self) -> DateTime<Utc> {
        self.refreshed_at
    }

    /// Intervals for the selection, grouped by operation (newest operation first), each group
    /// in chronological order.
    pub fn intervals(
        &self,
        stack: &StackRef,
        operation: Option<&str>,
        all_stacks: bool,
        all_operations: bool,
    ) -> Vec<Interval> {
        let mut selected = Vec::new();
        for op in self.operations.list(stack, all_stacks) {
            if all_operations || operation == Some(op.event_id.as_str()) {
                selected.extend_from_slice(self.intervals.get(&op.stack_id, &op.event_id));
            }
        }
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::USER_INITIATED;
    use chrono::TimeZone;

    fn ev(id: &str, stack: &str, logical: &str, status: &str, sec: u32, op: bool) -> Event {
        Event {
            event_id: id.to_string(),
            stack_id: StackRef::new(stack),
            stack_name: stack.to_string(),
            timestamp: Utc
                .with_ymd_and_hms(2024, 5, 1, 10, 0, sec)
                .single()
                .expect("valid timestamp"),
            logical_resource_id: logical.to_string(),
            physical_resource_id: String::new(),
            resource_status: status.to_string(),
            resource_status_reason: if op {
                USER_INITIATED.to_string()
            } else {
                String::new()
            },
            resource_type: String::new(),
        }
    }

    fn sample() -> DataSet {
        let root = StackRef::new("root");
        let mut store = EventStore::new(root.clone());
        store.ingest(
            root.clone(),
            vec![
                ev("s2", "root", "root", "UPDATE_COMPLETE", 22, false),
                ev("r4", "root", "Queue", "UPDATE_COMPLETE", 21, false),
                ev("r3", "root", "Queue", "UPDATE_IN_PROGRESS", 20, false),
                ev("op2", "root", "root", "UPDATE_IN_PROGRESS", 19, true),
                ev("s1", "root", "root", "CREATE_COMPLETE", 3, false),
                ev("r2", "root", "Queue", "CREATE_COMPLETE", 2, false),
                ev("r1", "root", "Queue", "CREATE_IN_PROGRESS", 1, false),
                ev("op1", "root", "root", "CREATE_IN_PROGRESS", 0, true),
            ],
        );
        let now = Utc
            .with_ymd_and_hms(2024, 5, 1, 10, 1, 0)
            .single()
            .expect("valid timestamp");
        DataSet::build(root, store, now)
    }

    #[test]
    fn filtered_intervals_follow_operation_selection() {
        let data = sample();
        let root = StackRef::new("root");

        let second = data.intervals(&root, Some("op2"), false, false);
        let starts: Vec<&str> = second.iter().map(|i| i.start.event_id.as_str()).collect();
        assert_eq!(starts, vec!["op2", "r3"]);

        let all = data.intervals(&root, Some("op2"), false, true);
        let starts: Vec<&str> = all.iter().map(|i| i.start.event_id.as_str()).collect();
        assert_eq!(starts, vec!["op2", "r3", "op1", "r1"]);

        assert!(data.intervals(&root, None, false, false).is_empty());
    }

    #[test]
    fn every_interval_is_reachable_through_the_operation_index() {
        let data = sample();
        for (stack, operation, intervals) in data.interval_index().iter() {
            assert!(!intervals.is_empty());
            assert!(data.operations().contains(stack, false, operation));
        }
    }
}
