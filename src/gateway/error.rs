// ABOUTME: Gateway error types with SNAFU pattern.
// ABOUTME: Separates the provider's benign conditions from genuine failures.

use snafu::Snafu;

/// Message the provider returns when an update has nothing to change.
pub const NO_UPDATES_MESSAGE: &str = "No updates are to be performed.";

/// Message the provider returns when describing a stack that does not exist.
pub fn not_found_message(stack: &str) -> String {
    format!("Stack with id {stack} does not exist")
}

/// Errors from the remote provisioning and blob storage services.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum GatewayError {
    #[snafu(display("stack {stack} does not exist"))]
    NotFound { stack: String },

    #[snafu(display("no updates are to be performed on {stack}"))]
    NoUpdates { stack: String },

    #[snafu(display("{operation} failed for {stack}: {message}"))]
    Service {
        operation: &'static str,
        stack: String,
        message: String,
    },

    #[snafu(display("failed to upload template to s3://{bucket}/{key}: {message}"))]
    Upload {
        bucket: String,
        key: String,
        message: String,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    /// The stack does not exist.
    NotFound,
    /// An update was accepted but had nothing to apply.
    NoUpdates,
    /// The service rejected or failed the call.
    Service,
    /// Template upload or URL signing failed.
    Upload,
}

impl GatewayError {
    pub fn kind(&self) -> GatewayErrorKind {
        match self {
            GatewayError::NotFound { .. } => GatewayErrorKind::NotFound,
            GatewayError::NoUpdates { .. } => GatewayErrorKind::NoUpdates,
            GatewayError::Service { .. } => GatewayErrorKind::Service,
            GatewayError::Upload { .. } => GatewayErrorKind::Upload,
        }
    }

    /// Classify a failed describe call by the provider's error message.
    pub fn from_describe(stack: &str, message: Option<&str>) -> Self {
        match message {
            Some(m) if m == not_found_message(stack) => GatewayError::NotFound {
                stack: stack.to_string(),
            },
            other => GatewayError::Service {
                operation: "describe_stacks",
                stack: stack.to_string(),
                message: other.unwrap_or("unknown error").to_string(),
            },
        }
    }

    /// Classify a failed update call by the provider's error message.
    pub fn from_update(stack: &str, message: Option<&str>) -> Self {
        match message {
            Some(NO_UPDATES_MESSAGE) => GatewayError::NoUpdates {
                stack: stack.to_string(),
            },
            other => GatewayError::Service {
                operation: "update_stack",
                stack: stack.to_string(),
                message: other.unwrap_or("unknown error").to_string(),
            },
        }
    }
}
