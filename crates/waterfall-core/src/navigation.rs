use crate::dataset::DataSet;
use crate::event::{Event, StackRef};
use crate::interval::{Interval, Window};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Waterfall,
    Help,
    Stacks,
    Operations,
    Details,
}

impl View {
    pub const ALL: [View; 5] = [
        View::Waterfall,
        View::Help,
        View::Stacks,
        View::Operations,
        View::Details,
    ];

    pub fn title(self) -> &'static str {
        match self {
            View::Waterfall => "WATERFALL",
            View::Help => "HELP",
            View::Stacks => "STACKS",
            View::Operations => "OPERATIONS",
            View::Details => "DETAILS",
        }
    }

    pub fn index(self) -> usize {
        match self {
            View::Waterfall => 0,
            View::Help => 1,
            View::Stacks => 2,
            View::Operations => 3,
            View::Details => 4,
        }
    }
}

/// Discrete entry points exposed to the input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Show(View),
    ToggleDetails,
    NextInterval,
    PrevInterval,
    NextOperation,
    PrevOperation,
    NextStack,
    PrevStack,
    ToggleAllStacks,
    ToggleAllOperations,
    Refresh,
    Quit,
}

/// What the owner of the state has to do after a command was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    Refresh,
    Quit,
}

/// Read-only view of everything the renderer needs for one frame.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub view: View,
    pub stacks: Vec<StackRef>,
    pub selected_stack: StackRef,
    pub selected_operation: Option<String>,
    pub all_stacks: bool,
    pub all_operations: bool,
    pub operations: Vec<Event>,
    pub intervals: Vec<Interval>,
    pub cursor: usize,
    pub window: Option<Window>,
    pub loading: bool,
    pub last_refreshed: DateTime<Utc>,
    pub last_error: Option<String>,
}

impl Snapshot {
    pub fn selected_interval(&self) -> Option<&Interval> {
        self.intervals.get(self.cursor)
    }
}

/// Interactive state. Owned by the input loop; background refreshes only hand it new
/// [`DataSet`] snapshots through [`NavigationState::publish`].
#[derive(Debug, Clone)]
pub struct NavigationState {
    data: Arc<DataSet>,
    view: View,
    selected_stack: StackRef,
    selected_operation: Option<String>,
    cursor: usize,
    all_stacks: bool,
    all_operations: bool,
    last_refreshed: DateTime<Utc>,
    last_error: Option<String>,
}

impl NavigationState {
    pub fn new(data: Arc<DataSet>) -> Self {
        let selected_stack = data.root().clone();
        let selected_operation = data.operations().latest(&selected_stack, false);
        let last_refreshed = data.refreshed_at();
        Self {
            data,
            view: View::Waterfall,
            selected_stack,
            selected_operation,
            cursor: 0,
            all_stacks: false,
            all_operations: false,
            last_refreshed,
            last_error: None,
        }
    }

    pub fn data(&self) -> &Arc<DataSet> {
        &self.data
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn selected_stack(&self) -> &StackRef {
        &self.selected_stack
    }

    pub fn selected_operation(&self) -> Option<&str> {
        self.selected_operation.as_deref()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn all_stacks(&self) -> bool {
        self.all_stacks
    }

    pub fn all_operations(&self) -> bool {
        self.all_operations
    }

    pub fn last_refreshed(&self) -> DateTime<Utc> {
        self.last_refreshed
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn filtered_intervals(&self) -> Vec<Interval> {
        self.data.intervals(
            &self.selected_stack,
            self.selected_operation.as_deref(),
            self.all_stacks,
            self.all_operations,
        )
    }

    pub fn filtered_operations(&self) -> Vec<Event> {
        self.data
            .operations()
            .list(&self.selected_stack, self.all_stacks)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn set_view(&mut self, view: View) {
        self.view = view;
    }

    /// Enter/back: Waterfall opens Details, every other view returns to Waterfall.
    pub fn toggle_details(&mut self) {
        self.view = if self.view == View::Waterfall {
            View::Details
        } else {
            View::Waterfall
        };
    }

    pub fn increment_interval(&mut self) {
        self.move_interval(true);
    }

    pub fn decrement_interval(&mut self) {
        self.move_interval(false);
    }

    fn move_interval(&mut self, forward: bool) {
        let total = self.filtered_intervals().len();
        if total == 0 {
            self.cursor = 0;
            return;
        }
        self.cursor = wrap(self.cursor.min(total - 1), total, forward);
    }

    pub fn increment_operation(&mut self) {
        self.move_operation(true);
    }

    pub fn decrement_operation(&mut self) {
        self.move_operation(false);
    }

    fn move_operation(&mut self, forward: bool) {
        let operations = self
            .data
            .operations()
            .list(&self.selected_stack, self.all_stacks);
        if operations.len() <= 1 {
            return;
        }
        let current = self
            .selected_operation
            .as_deref()
            .and_then(|id| operations.iter().position(|op| op.event_id == id));
        let next = match current {
            Some(idx) => wrap(idx, operations.len(), forward),
            None => 0,
        };
        self.selected_operation = Some(operations[next].event_id.clone());
        self.cursor = 0;
    }

    pub fn increment_stack(&mut self) {
        self.move_stack(true);
    }

    pub fn decrement_stack(&mut self) {
        self.move_stack(false);
    }

    fn move_stack(&mut self, forward: bool) {
        let stacks = self.data.stacks();
        if stacks.len() > 1 {
            let next = match stacks.iter().position(|s| s == &self.selected_stack) {
                Some(idx) => wrap(idx, stacks.len(), forward),
                None => 0,
            };
            self.selected_stack = stacks[next].clone();
        }
        self.resolve_latest_operation();
    }

    pub fn toggle_all_stacks(&mut self) {
        self.all_stacks = !self.all_stacks;
        self.resolve_latest_operation();
    }

    pub fn toggle_all_operations(&mut self) {
        self.all_operations = !self.all_operations;
        self.resolve_latest_operation();
    }

    fn resolve_latest_operation(&mut self) {
        self.selected_operation = self
            .data
            .operations()
            .latest(&self.selected_stack, self.all_stacks);
        self.cursor = 0;
    }

    pub fn apply(&mut self, command: Command) -> Effect {
        match command {
            Command::Show(view) => self.set_view(view),
            Command::ToggleDetails => self.toggle_details(),
            Command::NextInterval => self.increment_interval(),
            Command::PrevInterval => self.decrement_interval(),
            Command::NextOperation => self.increment_operation(),
            Command::PrevOperation => self.decrement_operation(),
            Command::NextStack => self.increment_stack(),
            Command::PrevStack => self.decrement_stack(),
            Command::ToggleAllStacks => self.toggle_all_stacks(),
            Command::ToggleAllOperations => self.toggle_all_operations(),
            Command::Refresh => return Effect::Refresh,
            Command::Quit => return Effect::Quit,
        }
        Effect::None
    }

    /// Swaps in a freshly built snapshot. A selected operation that no longer exists under the
    /// current filter is replaced by the latest one. The cursor follows the interval it pointed
    /// at, matched by stack and start event, and is only clamped when that interval is gone.
    pub fn publish(&mut self, data: Arc<DataSet>) {
        let anchor = self
            .filtered_intervals()
            .get(self.cursor)
            .map(|interval| (interval.stack().clone(), interval.start.event_id.clone()));

        self.last_refreshed = data.refreshed_at();
        self.last_error = None;
        self.data = data;

        let still_listed = self.selected_operation.as_deref().is_some_and(|id| {
            self.data
                .operations()
                .contains(&self.selected_stack, self.all_stacks, id)
        });
        if !still_listed {
            let latest = self
                .data
                .operations()
                .latest(&self.selected_stack, self.all_stacks);
            if latest != self.selected_operation {
                debug!(
                    event = "operation_reselected",
                    previous = ?self.selected_operation,
                    next = ?latest
                );
                self.selected_operation = latest;
                self.cursor = 0;
            }
        }

        let intervals = self.filtered_intervals();
        let found = anchor.and_then(|(stack, start_id)| {
            intervals.iter().position(|interval| {
                interval.stack() == &stack && interval.start.event_id == start_id
            })
        });
        match found {
            Some(position) => self.cursor = position,
            None if self.cursor >= intervals.len() => {
                self.cursor = intervals.len().saturating_sub(1);
            }
            None => {}
        }
    }

    pub fn record_refresh_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub fn snapshot(&self, loading: bool) -> Snapshot {
        let intervals = self.filtered_intervals();
        let window = Window::of(&intervals);
        let cursor = self.cursor.min(intervals.len().saturating_sub(1));
        Snapshot {
            view: self.view,
            stacks: self.data.stacks(),
            selected_stack: self.selected_stack.clone(),
            selected_operation: self.selected_operation.clone(),
            all_stacks: self.all_stacks,
            all_operations: self.all_operations,
            operations: self.filtered_operations(),
            intervals,
            cursor,
            window,
            loading,
            last_refreshed: self.last_refreshed,
            last_error: self.last_error.clone(),
        }
    }
}

fn wrap(current: usize, len: usize, forward: bool) -> usize {
    if forward {
        if current + 1 >= len {
            0
        } else {
            current + 1
        }
    } else if current == 0 {
        len - 1
    } else {
        current - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::USER_INITIATED;
    use crate::store::EventStore;
    use chrono::{Duration, TimeZone};

    fn at(sec: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0)
            .single()
            .expect("valid timestamp")
            + Duration::seconds(sec)
    }

    fn ev(id: &str, stack: &str, logical: &str, status: &str, sec: i64) -> Event {
        Event {
            event_id: id.to_string(),
            stack_id: StackRef::new(stack),
            stack_name: stack.to_string(),
            timestamp: at(sec),
            logical_resource_id: logical.to_string(),
            physical_resource_id: String::new(),
            resource_status: status.to_string(),
            resource_status_reason: String::new(),
            resource_type: String::new(),
        }
    }

    fn op(id: &str, stack: &str, status: &str, sec: i64) -> Event {
        let mut event = ev(id, stack, stack, status, sec);
        event.resource_status_reason = USER_INITIATED.to_string();
        event
    }

    fn newest_first(mut events: Vec<Event>) -> Vec<Event> {
        events.reverse();
        events
    }

    fn root_events(with_update: bool) -> Vec<Event> {
        let mut events = vec![
            op("r-op1", "root", "CREATE_IN_PROGRESS", 0),
            ev("a1", "root", "A", "CREATE_IN_PROGRESS", 1),
            ev("a2", "root", "A", "CREATE_COMPLETE", 2),
            ev("s1", "root", "root", "CREATE_COMPLETE", 3),
        ];
        if with_update {
            events.extend([
                op("r-op2", "root", "UPDATE_IN_PROGRESS", 100),
                ev("a3", "root", "A", "UPDATE_IN_PROGRESS", 101),
                ev("a4", "root", "A", "UPDATE_COMPLETE", 102),
                ev("b1", "root", "B", "CREATE_IN_PROGRESS", 103),
                ev("b2", "root", "B", "CREATE_COMPLETE", 104),
                ev("s2", "root", "root", "UPDATE_COMPLETE", 105),
            ]);
        }
        newest_first(events)
    }

    fn child_events() -> Vec<Event> {
        newest_first(vec![
            op("c-op", "child", "CREATE_IN_PROGRESS", 50),
            ev("v1", "child", "V", "CREATE_IN_PROGRESS", 51),
            ev("v2", "child", "V", "CREATE_COMPLETE", 52),
            ev("c1", "child", "child", "CREATE_COMPLETE", 53),
        ])
    }

    fn dataset(with_update: bool) -> Arc<DataSet> {
        let root = StackRef::new("root");
        let mut store = EventStore::new(root.clone());
        store.register_stack(StackRef::new("child"));
        store.register_stack(StackRef::new("empty"));
        store.ingest(root.clone(), root_events(with_update));
        store.ingest(StackRef::new("child"), child_events());
        Arc::new(DataSet::build(root, store, at(200)))
    }

    #[test]
    fn starts_on_waterfall_with_latest_root_operation() {
        let nav = NavigationState::new(dataset(true));
        assert_eq!(nav.view(), View::Waterfall);
        assert_eq!(nav.selected_stack(), &StackRef::new("root"));
        assert_eq!(nav.selected_operation(), Some("r-op2"));
        assert_eq!(nav.filtered_intervals().len(), 3);
        assert_eq!(nav.cursor(), 0);
    }

    #[test]
    fn interval_cursor_wraps_both_ways() {
        let mut nav = NavigationState::new(dataset(true));
        nav.decrement_interval();
        assert_eq!(nav.cursor(), 2);
        nav.increment_interval();
        assert_eq!(nav.cursor(), 0);
        nav.increment_interval();
        nav.increment_interval();
        assert_eq!(nav.cursor(), 2);
        nav.increment_interval();
        assert_eq!(nav.cursor(), 0);
    }

    #[test]
    fn cursor_moves_are_noops_on_empty_selection() {
        let mut nav = NavigationState::new(dataset(true));
        nav.decrement_stack();
        assert_eq!(nav.selected_stack(), &StackRef::new("empty"));
        assert_eq!(nav.selected_operation(), None);
        assert!(nav.filtered_intervals().is_empty());

        nav.increment_interval();
        assert_eq!(nav.cursor(), 0);
        nav.decrement_interval();
        assert_eq!(nav.cursor(), 0);
        nav.increment_operation();
        assert_eq!(nav.selected_operation(), None);

        let snapshot = nav.snapshot(false);
        assert!(snapshot.window.is_none());
        assert!(snapshot.selected_interval().is_none());
    }

    #[test]
    fn operation_cycling_wraps_and_resets_cursor() {
        let mut nav = NavigationState::new(dataset(true));
        nav.increment_interval();
        nav.increment_operation();
        assert_eq!(nav.selected_operation(), Some("r-op1"));
        assert_eq!(nav.cursor(), 0);
        nav.increment_operation();
        assert_eq!(nav.selected_operation(), Some("r-op2"));
        nav.decrement_operation();
        assert_eq!(nav.selected_operation(), Some("r-op1"));
    }

    #[test]
    fn single_operation_cannot_be_cycled() {
        let mut nav = NavigationState::new(dataset(true));
        nav.increment_stack();
        assert_eq!(nav.selected_operation(), Some("c-op"));
        nav.increment_interval();
        nav.increment_operation();
        assert_eq!(nav.selected_operation(), Some("c-op"));
        assert_eq!(nav.cursor(), 1);
    }

    #[test]
    fn stack_switch_reresolves_operation_and_resets_cursor() {
        let mut nav = NavigationState::new(dataset(true));
        nav.increment_interval();
        nav.increment_stack();
        assert_eq!(nav.selected_stack(), &StackRef::new("child"));
        assert_eq!(nav.selected_operation(), Some("c-op"));
        assert_eq!(nav.cursor(), 0);

        nav.increment_stack();
        nav.increment_stack();
        assert_eq!(nav.selected_stack(), &StackRef::new("root"));
        assert_eq!(nav.selected_operation(), Some("r-op2"));
    }

    #[test]
    fn toggling_all_stacks_never_leaves_dangling_operation() {
        let mut nav = NavigationState::new(dataset(true));
        nav.toggle_all_stacks();
        assert_eq!(nav.selected_operation(), Some("r-op2"));
        nav.increment_operation();
        assert_eq!(nav.selected_operation(), Some("c-op"));
        nav.increment_interval();

        nav.toggle_all_stacks();
        let selected = nav.selected_operation().expect("operation selected");
        assert_eq!(selected, "r-op2");
        assert!(nav
            .data()
            .operations()
            .contains(nav.selected_stack(), false, selected));
        assert_eq!(nav.cursor(), 0);
    }

    #[test]
    fn all_operations_combines_every_interval_of_the_filter() {
        let mut nav = NavigationState::new(dataset(true));
        nav.toggle_all_operations();
        assert_eq!(nav.filtered_intervals().len(), 5);
        nav.toggle_all_stacks();
        assert_eq!(nav.filtered_intervals().len(), 7);
        assert_eq!(nav.cursor(), 0);
    }

    #[test]
    fn publish_reselects_dropped_operation_and_clamps_cursor() {
        let mut nav = NavigationState::new(dataset(true));
        nav.decrement_interval();
        assert_eq!(nav.cursor(), 2);

        nav.publish(dataset(false));
        assert_eq!(nav.selected_operation(), Some("r-op1"));
        assert_eq!(nav.cursor(), 0);
        assert_eq!(nav.last_refreshed(), at(200));
    }

    #[test]
    fn publish_keeps_live_selection_and_clears_error() {
        let mut nav = NavigationState::new(dataset(true));
        nav.increment_interval();
        nav.record_refresh_error("throttled");
        assert_eq!(nav.last_error(), Some("throttled"));

        nav.publish(dataset(true));
        assert_eq!(nav.selected_operation(), Some("r-op2"));
        assert_eq!(nav.cursor(), 1);
        assert_eq!(nav.last_error(), None);
    }

    #[test]
    fn publish_keeps_cursor_on_same_interval_when_newer_operation_arrives() {
        let mut nav = NavigationState::new(dataset(false));
        nav.toggle_all_operations();
        nav.increment_interval();
        let before = nav.snapshot(false);
        let selected = before.selected_interval().expect("interval selected");
        assert_eq!(selected.start.event_id, "a1");

        nav.publish(dataset(true));
        let after = nav.snapshot(false);
        let selected = after.selected_interval().expect("interval selected");
        assert_eq!(selected.start.event_id, "a1");
        assert_eq!(selected.stack(), &StackRef::new("root"));
        assert_eq!(nav.cursor(), 4);
    }

    #[test]
    fn commands_switch_views_and_report_effects() {
        let mut nav = NavigationState::new(dataset(true));
        assert_eq!(nav.apply(Command::ToggleDetails), Effect::None);
        assert_eq!(nav.view(), View::Details);
        nav.apply(Command::ToggleDetails);
        assert_eq!(nav.view(), View::Waterfall);
        nav.apply(Command::Show(View::Help));
        nav.apply(Command::ToggleDetails);
        assert_eq!(nav.view(), View::Waterfall);

        assert_eq!(nav.apply(Command::Refresh), Effect::Refresh);
        assert_eq!(nav.apply(Command::Quit), Effect::Quit);
    }

    #[test]
    fn snapshot_window_covers_filtered_intervals() {
        let nav = NavigationState::new(dataset(true));
        let snapshot = nav.snapshot(true);
        let window = snapshot.window.expect("window");
        assert_eq!(window.start, at(100));
        assert_eq!(window.end, at(105));
        assert!(snapshot.loading);
        assert_eq!(snapshot.operations.len(), 2);
        assert_eq!(snapshot.stacks.len(), 3);
    }
}
