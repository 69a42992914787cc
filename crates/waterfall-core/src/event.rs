use chrono::{DateTime, Utc};
use std::fmt;

/// Status reason the provider attaches to the event that starts a user action.
pub const USER_INITIATED: &str = "User Initiated";

pub const COMPLETE_SUFFIX: &str = "_COMPLETE";
pub const FAILED_SUFFIX: &str = "_FAILED";
pub const IN_PROGRESS_SUFFIX: &str = "_IN_PROGRESS";

/// Opaque identifier of a tracked stack (root or nested).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct StackRef(String);

impl StackRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short name for display. Stack ARNs look like
    /// `arn:aws:cloudformation:<region>:<account>:stack/<name>/<uuid>`.
    pub fn display_name(&self) -> &str {
        let mut parts = self.0.split('/');
        match (parts.next(), parts.next()) {
            (Some(_), Some(name)) if !name.is_empty() => name,
            _ => &self.0,
        }
    }
}

impl fmt::Display for StackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StackRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// One provider-reported state transition for a single resource. Never mutated after ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub event_id: String,
    pub stack_id: StackRef,
    pub stack_name: String,
    pub timestamp: DateTime<Utc>,
    pub logical_resource_id: String,
    pub physical_resource_id: String,
    pub resource_status: String,
    pub resource_status_reason: String,
    pub resource_type: String,
}

impl Event {
    pub fn is_operation(&self) -> bool {
        self.resource_status_reason == USER_INITIATED
    }

    pub fn is_finalizing(&self) -> bool {
        is_finalizing(&self.resource_status)
    }

    pub fn is_completed(&self) -> bool {
        is_completed(&self.resource_status)
    }
}

/// A transition has concluded, either successfully or in failure.
pub fn is_finalizing(status: &str) -> bool {
    status.ends_with(COMPLETE_SUFFIX) || status.ends_with(FAILED_SUFFIX)
}

pub fn is_completed(status: &str) -> bool {
    status.ends_with(COMPLETE_SUFFIX)
}

pub fn is_failed(status: &str) -> bool {
    status.ends_with(FAILED_SUFFIX)
}

pub fn is_in_progress(status: &str) -> bool {
    status.ends_with(IN_PROGRESS_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_extracts_stack_name_from_arn() {
        let stack = StackRef::new(
            "arn:aws:cloudformation:us-east-1:123456789012:stack/api-prod/8f1c2d30-1111-2222-3333-444455556666",
        );
        assert_eq!(stack.display_name(), "api-prod");
        assert_eq!(StackRef::new("plain-name").display_name(), "plain-name");
    }

    #[test]
    fn status_classification_follows_suffixes() {
        assert!(is_finalizing("CREATE_COMPLETE"));
        assert!(is_finalizing("UPDATE_ROLLBACK_FAILED"));
        assert!(!is_finalizing("UPDATE_COMPLETE_CLEANUP_IN_PROGRESS"));
        assert!(is_completed("DELETE_COMPLETE"));
        assert!(!is_completed("DELETE_FAILED"));
        assert!(is_in_progress("REVIEW_IN_PROGRESS"));
        assert!(!is_finalizing(""));
    }
}
