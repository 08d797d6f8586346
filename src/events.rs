// ABOUTME: Deploy progress events and the sink interface that receives them.
// ABOUTME: Injected into group operations so the engine holds no global reporting state.

use std::sync::Mutex;

use crate::deploy::{Operation, StackOutcome};
use crate::types::StackName;

/// Progress reported while a group is deployed or deleted.
#[derive(Debug, Clone, PartialEq)]
pub enum DeployEvent {
    Started {
        stack: StackName,
        operation: Operation,
    },
    ReferenceResolved {
        stack: StackName,
        parameter: String,
        reference: String,
    },
    TemplateUploaded {
        stack: StackName,
        bucket: String,
    },
    Creating {
        stack: StackName,
    },
    Updating {
        stack: StackName,
    },
    Deleting {
        stack: StackName,
    },
    Finished {
        stack: StackName,
        outcome: StackOutcome,
    },
    Failed {
        stack: StackName,
        message: String,
    },
    Skipped {
        stack: StackName,
    },
}

impl DeployEvent {
    pub fn stack(&self) -> &StackName {
        match self {
            DeployEvent::Started { stack, .. }
            | DeployEvent::ReferenceResolved { stack, .. }
            | DeployEvent::TemplateUploaded { stack, .. }
            | DeployEvent::Creating { stack }
            | DeployEvent::Updating { stack }
            | DeployEvent::Deleting { stack }
            | DeployEvent::Finished { stack, .. }
            | DeployEvent::Failed { stack, .. }
            | DeployEvent::Skipped { stack } => stack,
        }
    }

    /// Short machine-friendly name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            DeployEvent::Started { .. } => "started",
            DeployEvent::ReferenceResolved { .. } => "reference_resolved",
            DeployEvent::TemplateUploaded { .. } => "template_uploaded",
            DeployEvent::Creating { .. } => "creating",
            DeployEvent::Updating { .. } => "updating",
            DeployEvent::Deleting { .. } => "deleting",
            DeployEvent::Finished { .. } => "finished",
            DeployEvent::Failed { .. } => "failed",
            DeployEvent::Skipped { .. } => "skipped",
        }
    }

    /// Human-readable progress line.
    pub fn message(&self) -> String {
        match self {
            DeployEvent::Started { stack, operation } => format!("  → {operation} {stack}"),
            DeployEvent::ReferenceResolved {
                parameter,
                reference,
                ..
            } => format!("  → resolved {parameter} from {reference}"),
            DeployEvent::TemplateUploaded { bucket, .. } => {
                format!("  → template uploaded to s3://{bucket}")
            }
            DeployEvent::Creating { stack } => format!("  → creating {stack}..."),
            DeployEvent::Updating { stack } => format!("  → updating {stack}..."),
            DeployEvent::Deleting { stack } => format!("  → deleting {stack}..."),
            DeployEvent::Finished { stack, outcome } => format!("  ✓ {stack} {outcome}"),
            DeployEvent::Failed { stack, message } => format!("  ✗ {stack}: {message}"),
            DeployEvent::Skipped { stack } => format!("  - {stack} skipped"),
        }
    }
}

/// Receives deploy events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &DeployEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &DeployEvent) {}
}

/// Keeps every event in memory, in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<DeployEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<DeployEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &DeployEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
