use crate::dataset::DataSet;
use crate::error::{RefreshError, SourceError, StartupError};
use crate::event::StackRef;
use crate::source::StackEventSource;
use crate::store::EventStore;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

/// Owns the event cache and turns provider fetches into published [`DataSet`] snapshots.
///
/// At most one refresh runs at a time. A failed refresh leaves the cache as it was, so the
/// last good snapshot keeps being shown.
pub struct RefreshCoordinator<S: StackEventSource + ?Sized> {
    source: Arc<S>,
    root: StackRef,
    store: Mutex<EventStore>,
    discover_nested: bool,
    loading: AtomicBool,
}

impl<S: StackEventSource + ?Sized> RefreshCoordinator<S> {
    pub fn new(source: Arc<S>, root: StackRef, discover_nested: bool) -> Self {
        Self {
            store: Mutex::new(EventStore::new(root.clone())),
            source,
            root,
            discover_nested,
            loading: AtomicBool::new(false),
        }
    }

    /// Authenticates, resolves `stack_name` and loads the first snapshot.
    pub fn start(
        source: Arc<S>,
        stack_name: &str,
        discover_nested: bool,
        now: DateTime<Utc>,
    ) -> Result<(Self, Arc<DataSet>), StartupError> {
        source.authenticate().map_err(StartupError::Auth)?;
        let root = source
            .stack_identifier(stack_name)
            .map_err(|err| match err {
                SourceError::NotFound(_) => StartupError::StackNotFound(stack_name.to_string()),
                other => StartupError::Lookup {
                    name: stack_name.to_string(),
                    source: other,
                },
            })?;
        info!(event = "stack_resolved", name = stack_name, stack = %root);

        let coordinator = Self::new(source, root.clone(), discover_nested);
        let data = coordinator.refresh(now)?;
        if data.stack_events(&root).is_empty() {
            return Err(StartupError::EmptyResult(root));
        }
        Ok((coordinator, data))
    }

    pub fn root(&self) -> &StackRef {
        &self.root
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Claims the in-flight slot on the calling thread, so [`is_loading`](Self::is_loading)
    /// turns true before the cycle itself is handed to another thread. `None` while another
    /// refresh holds the slot.
    pub fn try_begin(self: &Arc<Self>) -> Option<RefreshTicket<S>> {
        claim(&self.loading).then(|| RefreshTicket {
            coordinator: Arc::clone(self),
        })
    }

    /// Runs one discover-then-fetch cycle against a staging copy of the cache and commits it
    /// only when every stack loaded.
    pub fn refresh(&self, now: DateTime<Utc>) -> Result<Arc<DataSet>, RefreshError> {
        let _guard = LoadingGuard::acquire(&self.loading).ok_or(RefreshError::InFlight)?;
        self.cycle(now)
    }

    fn cycle(&self, now: DateTime<Utc>) -> Result<Arc<DataSet>, RefreshError> {
        let mut staging = self
            .store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        if self.discover_nested {
            self.discover(&mut staging)?;
        }

        let mut total = 0usize;
        for stack in staging.stacks() {
            let events = self.source.list_events(&stack).map_err(|source| {
                warn!(event = "stack_events_failed", stack = %stack, error = %source);
                RefreshError::Ingest {
                    stack: stack.clone(),
                    source,
                }
            })?;
            debug!(event = "stack_events_loaded", stack = %stack, count = events.len());
            total += events.len();
            staging.ingest(stack, events);
        }

        *self.store.lock().unwrap_or_else(PoisonError::into_inner) = staging.clone();
        let data = DataSet::build(self.root.clone(), staging, now);
        info!(
            event = "refresh_complete",
            stacks = data.stack_count(),
            events = total,
            operations = data.operations().len(),
            intervals = data.interval_index().interval_count()
        );
        Ok(Arc::new(data))
    }

    /// Walks nested stack resources breadth first from every tracked stack.
    fn discover(&self, staging: &mut EventStore) -> Result<(), RefreshError> {
        let mut pending: VecDeque<StackRef> = staging.stacks().into();
        while let Some(stack) = pending.pop_front() {
            let added = staging
                .discover_nested_stacks(self.source.as_ref(), &stack)
                .map_err(|source| {
                    warn!(event = "nested_discovery_failed", stack = %stack, error = %source);
                    RefreshError::Discovery {
                        stack: stack.clone(),
                        source,
                    }
                })?;
            pending.extend(added);
        }
        Ok(())
    }
}

/// Held in-flight slot for one refresh. Dropping it, run or not, releases the slot.
pub struct RefreshTicket<S: StackEventSource + ?Sized> {
    coordinator: Arc<RefreshCoordinator<S>>,
}

impl<S: StackEventSource + ?Sized> RefreshTicket<S> {
    pub fn run(self, now: DateTime<Utc>) -> Result<Arc<DataSet>, RefreshError> {
        self.coordinator.cycle(now)
    }
}

impl<S: StackEventSource + ?Sized> Drop for RefreshTicket<S> {
    fn drop(&mut self) {
        self.coordinator.loading.store(false, Ordering::Release);
    }
}

fn claim(flag: &AtomicBool) -> bool {
    flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_ok()
}

struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        claim(flag).then(|| Self(flag))
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
