// ABOUTME: Error types for stack deploy and delete operations.
// ABOUTME: Covers configuration, reference resolution, remote service, and waiter failures.

use crate::gateway::{GatewayError, SettingError, WaitError};
use crate::types::{ReferenceError, StackNameError};

/// Errors that end a single stack's deploy or delete.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// The stack definition cannot be turned into a valid request.
    #[error("configuration error in {stack}: {message}")]
    Configuration { stack: String, message: String },

    /// A parameter references an output that cannot be found.
    #[error("unable to find an output named \"{output_key}\" in a stack named {target} (referenced by {stack})")]
    ReferenceNotFound {
        stack: String,
        target: String,
        output_key: String,
    },

    /// The provisioning service or template storage failed a call.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The stack did not reach the desired terminal condition.
    #[error(transparent)]
    Wait(#[from] WaitError),
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    Configuration,
    ReferenceResolution,
    RemoteService,
    WaiterFailure,
}

impl DeployError {
    pub fn configuration(stack: impl Into<String>, message: impl Into<String>) -> Self {
        DeployError::Configuration {
            stack: stack.into(),
            message: message.into(),
        }
    }

    pub fn from_setting(stack: impl Into<String>, err: SettingError) -> Self {
        Self::configuration(stack, err.to_string())
    }

    pub fn from_reference(stack: impl Into<String>, err: ReferenceError) -> Self {
        Self::configuration(stack, err.to_string())
    }

    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::Configuration { .. } => DeployErrorKind::Configuration,
            DeployError::ReferenceNotFound { .. } => DeployErrorKind::ReferenceResolution,
            DeployError::Gateway(_) | DeployError::Wait(WaitError::Gateway(_)) => {
                DeployErrorKind::RemoteService
            }
            DeployError::Wait(_) => DeployErrorKind::WaiterFailure,
        }
    }
}

/// Errors raised while assembling a stack group.
#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    #[error("stack {0} appears more than once in the group")]
    DuplicateStack(String),

    #[error("cannot namespace {stack} under group {group}: {source}")]
    InvalidName {
        group: String,
        stack: String,
        source: StackNameError,
    },
}
