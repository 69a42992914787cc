use crate::error::SourceError;
use crate::event::{Event, StackRef};
use crate::source::{StackEventSource, StackResource};
use indexmap::IndexMap;
use tracing::debug;

/// Per-stack event cache plus the registry of tracked stacks.
///
/// The registry is append-only and keeps first-seen order, which is also the order
/// [`EventStore::all_events`] merges stacks in.
#[derive(Debug, Clone, Default)]
pub struct EventStore {
    stacks: IndexMap<StackRef, Vec<Event>>,
}

impl EventStore {
    pub fn new(root: StackRef) -> Self {
        let mut store = Self::default();
        store.register_stack(root);
        store
    }

    /// Returns true when the stack was not tracked before.
    pub fn register_stack(&mut self, stack: StackRef) -> bool {
        if self.stacks.contains_key(&stack) {
            return false;
        }
        self.stacks.insert(stack, Vec::new());
        true
    }

    /// Replaces the cached events of one stack wholesale. Unknown stacks are registered.
    pub fn ingest(&mut self, stack: StackRef, events: Vec<Event>) {
        self.stacks.insert(stack, events);
    }

    pub fn stacks(&self) -> Vec<StackRef> {
        self.stacks.keys().cloned().collect()
    }

    pub fn stack_count(&self) -> usize {
        self.stacks.len()
    }

    pub fn events(&self, stack: &StackRef) -> &[Event] {
        self.stacks.get(stack).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All cached events: stacks in registration order, each in provider order.
    pub fn all_events(&self) -> Vec<Event> {
        self.stacks.values().flatten().cloned().collect()
    }

    /// Registers every nested stack resource of `stack`. Returns the newly tracked stacks.
    /// On error nothing already tracked is removed.
    pub fn discover_nested_stacks<S: StackEventSource + ?Sized>(
        &mut self,
        source: &S,
        stack: &StackRef,
    ) -> Result<Vec<StackRef>, SourceError> {
        let resources = source.list_stack_resources(stack)?;
        let mut added = Vec::new();
        for nested in resources.iter().filter_map(StackResource::nested_stack) {
            if self.register_stack(nested.clone()) {
                debug!(event = "nested_stack_registered", parent = %stack, stack = %nested);
                added.push(nested);
            }
        }
        Ok(added)
    }
}
