use std::process::Command;
use tracing::debug;
use waterfall_core::source::{
    parse_stack_events, parse_stack_resources, parse_stack_summaries, StackSummary,
};
use waterfall_core::{Event, SourceError, StackEventSource, StackRef, StackResource};

const DELETED_STATUS: &str = "DELETE_COMPLETE";

/// Stack event source backed by the `aws` command line. The CLI follows pagination tokens
/// itself, so every call returns the complete result set.
#[derive(Debug, Clone, Default)]
pub struct AwsCli {
    profile: Option<String>,
    region: Option<String>,
}

impl AwsCli {
    pub fn new(profile: Option<String>, region: Option<String>) -> Self {
        Self { profile, region }
    }

    fn args<'a>(&'a self, args: &[&'a str]) -> Vec<&'a str> {
        let mut full = args.to_vec();
        if let Some(profile) = self.profile.as_deref() {
            full.extend(["--profile", profile]);
        }
        if let Some(region) = self.region.as_deref() {
            full.extend(["--region", region]);
        }
        full.extend(["--output", "json"]);
        full
    }

    fn run(&self, args: &[&str]) -> Result<String, SourceError> {
        let full = self.args(args);
        debug!(event = "aws_cli_call", args = %full.join(" "));
        let output = Command::new("aws").args(&full).output()?;
        if !output.status.success() {
            return Err(SourceError::Command {
                command: format!("aws {}", args.join(" ")),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl StackEventSource for AwsCli {
    fn authenticate(&self) -> Result<(), SourceError> {
        self.run(&["sts", "get-caller-identity"])
            .map(|_| ())
            .map_err(|err| match err {
                SourceError::Command { message, .. } => SourceError::Auth(message),
                other => other,
            })
    }

    fn stack_identifier(&self, name: &str) -> Result<StackRef, SourceError> {
        let json = self.run(&["cloudformation", "list-stacks"])?;
        let summaries = parse_stack_summaries(&json)?;
        find_stack_id(&summaries, name).ok_or_else(|| SourceError::NotFound(name.to_string()))
    }

    fn list_events(&self, stack: &StackRef) -> Result<Vec<Event>, SourceError> {
        let json = self.run(&[
            "cloudformation",
            "describe-stack-events",
            "--stack-name",
            stack.as_str(),
        ])?;
        parse_stack_events(&json)
    }

    fn list_stack_resources(&self, stack: &StackRef) -> Result<Vec<StackResource>, SourceError> {
        let json = self.run(&[
            "cloudformation",
            "describe-stack-resources",
            "--stack-name",
            stack.as_str(),
        ])?;
        parse_stack_resources(&json)
    }
}

/// Live stack with this name. Deleted stacks keep their summaries for a while and are skipped.
fn find_stack_id(summaries: &[StackSummary], name: &str) -> Option<StackRef> {
    summaries
        .iter()
        .find(|summary| summary.stack_name == name && summary.stack_status != DELETED_STATUS)
        .map(|summary| StackRef::new(summary.stack_id.clone()))
}
