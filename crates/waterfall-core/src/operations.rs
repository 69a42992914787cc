use crate::event::{Event, StackRef};

/// Operation events (user-initiated actions) sorted newest first.
#[derive(Debug, Clone, Default)]
pub struct OperationIndex {
    operations: Vec<Event>,
}

impl OperationIndex {
    pub fn build(events: &[Event]) -> Self {
        let mut operations: Vec<Event> = events
            .iter()
            .filter(|event| event.is_operation())
            .cloned()
            .collect();
        operations.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Self { operations }
    }

    pub fn all(&self) -> &[Event] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Operations on `stack`, or on every stack when `all_stacks` is set.
    pub fn list(&self, stack: &StackRef, all_stacks: bool) -> Vec<&Event> {
        self.operations
            .iter()
            .filter(|event| all_stacks || &event.stack_id == stack)
            .collect()
    }

    /// Most recent operation id for the filter; `None` means no operations yet.
    pub fn latest(&self, stack: &StackRef, all_stacks: bool) -> Option<String> {
        let mut latest: Option<&Event> = None;
        for event in self.list(stack, all_stacks) {
            if latest.map_or(true, |current| event.timestamp > current.timestamp) {
                latest = Some(event);
            }
        }
        latest.map(|event| event.event_id.clone())
    }

    pub fn contains(&self, stack: &StackRef, all_stacks: bool, operation_id: &str) -> bool {
        self.list(stack, all_stacks)
            .iter()
            .any(|event| event.event_id == operation_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::USER_INITIATED;
    use chrono::{TimeZone, Utc};

    fn op(id: &str, stack: &str, minute: u32) -> Event {
        Event {
            event_id: id.to_string(),
            stack_id: StackRef::new(stack),
            stack_name: stack.to_string(),
            timestamp: Utc
                .with_ymd_and_hms(2024, 5, 1, 10, minute, 0)
                .single()
                .expect("valid timestamp"),
            logical_resource_id: stack.to_string(),
            physical_resource_id: stack.to_string(),
            resource_status: "UPDATE_IN_PROGRESS".to_string(),
            resource_status_reason: USER_INITIATED.to_string(),
            resource_type: "AWS::CloudFormation::Stack".to_string(),
        }
    }

    #[test]
    fn build_keeps_only_operations_newest_first() {
        let mut noise = op("noise", "root", 30);
        noise.resource_status_reason = "Resource creation Initiated".to_string();
        let index = OperationIndex::build(&[
            op("a", "root", 1),
            noise,
            op("c", "child", 20),
            op("b", "root", 10),
        ]);

        let ids: Vec<&str> = index.all().iter().map(|e| e.event_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn latest_respects_stack_filter() {
        let index = OperationIndex::build(&[op("a", "root", 1), op("c", "child", 20)]);
        let root = StackRef::new("root");

        assert_eq!(index.latest(&root, false).as_deref(), Some("a"));
        assert_eq!(index.latest(&root, true).as_deref(), Some("c"));
        assert_eq!(index.latest(&StackRef::new("other"), false), None);
        assert!(index.contains(&root, true, "c"));
        assert!(!index.contains(&root, false, "c"));
    }
}
