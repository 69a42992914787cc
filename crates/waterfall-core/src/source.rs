use crate::error::SourceError;
use crate::event::{Event, StackRef};
use chrono::{DateTime, Utc};
use serde::Deserialize;

pub const NESTED_STACK_RESOURCE_TYPE: &str = "AWS::CloudFormation::Stack";

/// Provider query interface. Implementations block; callers run them off the input loop.
pub trait StackEventSource: Send + Sync {
    fn authenticate(&self) -> Result<(), SourceError>;

    /// Resolves a stack name to its identifier, or `SourceError::NotFound`.
    fn stack_identifier(&self, name: &str) -> Result<StackRef, SourceError>;

    /// Events for one stack, newest first, as the provider returns them.
    fn list_events(&self, stack: &StackRef) -> Result<Vec<Event>, SourceError>;

    fn list_stack_resources(&self, stack: &StackRef) -> Result<Vec<StackResource>, SourceError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackResource {
    #[serde(default)]
    pub resource_type: String,
    #[serde(default)]
    pub physical_resource_id: String,
    #[serde(default)]
    pub logical_resource_id: String,
}

impl StackResource {
    pub fn nested_stack(&self) -> Option<StackRef> {
        if self.resource_type == NESTED_STACK_RESOURCE_TYPE && !self.physical_resource_id.is_empty()
        {
            Some(StackRef::new(self.physical_resource_id.clone()))
        } else {
            None
        }
    }
}

/// Event record in the provider's JSON shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawStackEvent {
    #[serde(default)]
    pub event_id: String,
    #[serde(default)]
    pub stack_id: String,
    #[serde(default)]
    pub stack_name: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub logical_resource_id: String,
    #[serde(default)]
    pub physical_resource_id: String,
    #[serde(default)]
    pub resource_status: String,
    #[serde(default)]
    pub resource_status_reason: String,
    #[serde(default)]
    pub resource_type: String,
}

impl From<RawStackEvent> for Event {
    fn from(raw: RawStackEvent) -> Self {
        Event {
            event_id: raw.event_id,
            stack_id: StackRef::new(raw.stack_id),
            stack_name: raw.stack_name,
            timestamp: raw.timestamp,
            logical_resource_id: raw.logical_resource_id,
            physical_resource_id: raw.physical_resource_id,
            resource_status: raw.resource_status,
            resource_status_reason: raw.resource_status_reason,
            resource_type: raw.resource_type,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StackEventsPage {
    #[serde(default)]
    stack_events: Vec<RawStackEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StackResourcesPage {
    #[serde(default)]
    stack_resources: Vec<StackResource>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackSummary {
    #[serde(default)]
    pub stack_id: String,
    #[serde(default)]
    pub stack_name: String,
    #[serde(default)]
    pub stack_status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StackSummariesPage {
    #[serde(default)]
    stack_summaries: Vec<StackSummary>,
}

pub fn parse_stack_events(json: &str) -> Result<Vec<Event>, SourceError> {
    let page: StackEventsPage =
        serde_json::from_str(json).map_err(|source| SourceError::Parse {
            context: "stack events".to_string(),
            source,
        })?;
    Ok(page.stack_events.into_iter().map(Event::from).collect())
}

pub fn parse_stack_resources(json: &str) -> Result<Vec<StackResource>, SourceError> {
    let page: StackResourcesPage =
        serde_json::from_str(json).map_err(|source| SourceError::Parse {
            context: "stack resources".to_string(),
            source,
        })?;
    Ok(page.stack_resources)
}

pub fn parse_stack_summaries(json: &str) -> Result<Vec<StackSummary>, SourceError> {
    let page: StackSummariesPage =
        serde_json::from_str(json).map_err(|source| SourceError::Parse {
            context: "stack summaries".to_string(),
            source,
        })?;
    Ok(page.stack_summaries)
}
