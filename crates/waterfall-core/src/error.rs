use crate::event::StackRef;
use thiserror::Error;

/// Failures reported by a [`crate::source::StackEventSource`].
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("stack not found: {0}")]
    NotFound(String),
    #[error("{command} failed: {message}")]
    Command { command: String, message: String },
    #[error("failed to parse {context}: {source}")]
    Parse {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of a single refresh cycle. The previously published snapshot stays in place.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("a refresh is already in flight")]
    InFlight,
    #[error("failed to discover nested stacks of {stack}: {source}")]
    Discovery {
        stack: StackRef,
        #[source]
        source: SourceError,
    },
    #[error("failed to load events for {stack}: {source}")]
    Ingest {
        stack: StackRef,
        #[source]
        source: SourceError,
    },
}

/// Failures that prevent the viewer from starting at all.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to authenticate: {0}")]
    Auth(#[source] SourceError),
    #[error("stack not found: {0}")]
    StackNotFound(String),
    #[error("failed to look up stack {name}: {source}")]
    Lookup {
        name: String,
        #[source]
        source: SourceError,
    },
    #[error("failed to get nested stacks: {0}")]
    Discovery(#[source] RefreshError),
    #[error("failed to get stack events: {0}")]
    Ingest(#[source] RefreshError),
    #[error("no events found for {0}")]
    EmptyResult(StackRef),
}

impl StartupError {
    pub fn exit_code(&self) -> i32 {
        match self {
            StartupError::Auth(_) => 2,
            StartupError::StackNotFound(_) => 3,
            StartupError::Lookup { .. } => 4,
            StartupError::Discovery(_) => 5,
            StartupError::Ingest(_) => 6,
            StartupError::EmptyResult(_) => 7,
        }
    }

    /// One-line message shown when verbose output is off.
    pub fn summary(&self) -> &'static str {
        match self {
            StartupError::Auth(_) => "failed to authenticate",
            StartupError::StackNotFound(_) => "stack not found",
            StartupError::Lookup { .. } => "unknown error",
            StartupError::Discovery(_) => "failed to get nested stacks",
            StartupError::Ingest(_) => "failed to get stack events",
            StartupError::EmptyResult(_) => "no events found",
        }
    }
}

impl From<RefreshError> for StartupError {
    fn from(err: RefreshError) -> Self {
        match err {
            RefreshError::Discovery { .. } => StartupError::Discovery(err),
            _ => StartupError::Ingest(err),
        }
    }
}
