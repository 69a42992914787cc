pub mod dataset;
pub mod error;
pub mod event;
pub mod interval;
pub mod navigation;
pub mod operations;
pub mod reconstruct;
pub mod refresh;
pub mod source;
pub mod store;

pub use dataset::DataSet;
pub use error::{RefreshError, SourceError, StartupError};
pub use event::{Event, StackRef};
pub use interval::{Interval, IntervalEnd, IntervalIndex, Window};
pub use navigation::{Command, Effect, NavigationState, Snapshot, View};
pub use operations::OperationIndex;
pub use refresh::{RefreshCoordinator, RefreshTicket};
pub use source::{StackEventSource, StackResource, StackSummary};
pub use store::EventStore;
