// ABOUTME: Per-stack outcomes and the aggregate result of a group operation.
// ABOUTME: A summary reports full success, full failure, or the fraction that succeeded.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::types::StackName;

use super::DeployError;

/// What happened to a stack that finished without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StackOutcome {
    Created,
    Updated,
    /// The provider found nothing to update.
    Unchanged,
    Deleted,
    /// Delete requested for a stack that does not exist.
    Absent,
}

impl fmt::Display for StackOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StackOutcome::Created => "created",
            StackOutcome::Updated => "updated",
            StackOutcome::Unchanged => "unchanged",
            StackOutcome::Deleted => "deleted",
            StackOutcome::Absent => "absent",
        };
        f.write_str(s)
    }
}

/// Result recorded for one member of a group.
#[derive(Debug)]
pub enum StackResult {
    Succeeded(StackOutcome),
    Failed(DeployError),
    /// Not attempted because an earlier stack failed.
    Skipped,
}

impl StackResult {
    pub fn is_success(&self) -> bool {
        matches!(self, StackResult::Succeeded(_))
    }
}

/// Which group operation produced a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Deploy,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Deploy => f.write_str("deploy"),
            Operation::Delete => f.write_str("delete"),
        }
    }
}

/// Aggregate signal for the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Success,
    /// Delete only: fraction of stacks that succeeded, strictly between 0 and 1.
    Partial(f64),
    Failure,
}

/// Per-stack results of one group operation.
#[derive(Debug)]
pub struct Summary {
    operation: Operation,
    results: Vec<(StackName, StackResult)>,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl Summary {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            results: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub(crate) fn record(&mut self, stack: StackName, result: StackResult) {
        self.results.push((stack, result));
    }

    pub(crate) fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn results(&self) -> &[(StackName, StackResult)] {
        &self.results
    }

    pub fn result(&self, stack: &str) -> Option<&StackResult> {
        self.results
            .iter()
            .find(|(name, _)| name == stack)
            .map(|(_, result)| result)
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_success()).count()
    }

    pub fn skipped(&self) -> usize {
        self.results
            .iter()
            .filter(|(_, r)| matches!(r, StackResult::Skipped))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&StackName, &DeployError)> {
        self.results.iter().filter_map(|(name, result)| match result {
            StackResult::Failed(e) => Some((name, e)),
            _ => None,
        })
    }

    /// Successes over total. An empty group counts as fully successful.
    pub fn fraction(&self) -> f64 {
        if self.results.is_empty() {
            return 1.0;
        }
        self.succeeded() as f64 / self.total() as f64
    }

    /// Deploys are all-or-nothing; only deletes report a partial fraction.
    pub fn outcome(&self) -> Outcome {
        let succeeded = self.succeeded();
        if succeeded == self.total() {
            Outcome::Success
        } else if succeeded == 0 || self.operation == Operation::Deploy {
            Outcome::Failure
        } else {
            Outcome::Partial(self.fraction())
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome() == Outcome::Success
    }

    /// Process exit code: 0 only when every stack succeeded.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn elapsed_secs(&self) -> f64 {
        let end = self.finished_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}
