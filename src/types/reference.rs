// ABOUTME: Cross-stack output references used as parameter values.
// ABOUTME: Parses `cfnbotOutputs.<stack>.<output>` strings into typed references.

use std::fmt;
use thiserror::Error;

/// Marker that opens every output reference.
pub const REFERENCE_NAMESPACE: &str = "cfnbotOutputs";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("malformed output reference '{value}': expected 3 dot-separated parts, found {found}")]
    WrongPartCount { value: String, found: usize },

    #[error("malformed output reference '{value}': namespace must be '{REFERENCE_NAMESPACE}'")]
    WrongNamespace { value: String },

    #[error("malformed output reference '{value}': empty component")]
    EmptyComponent { value: String },
}

/// A parameter value pointing at another stack's output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputReference {
    stack: String,
    output_key: String,
}

impl OutputReference {
    /// Whether a parameter value is meant to be an output reference.
    pub fn is_reference(value: &str) -> bool {
        value.starts_with(REFERENCE_NAMESPACE)
    }

    /// Parse a parameter value.
    ///
    /// Returns `Ok(None)` for literal values and an error for values that carry the
    /// reference marker but are not of the form `cfnbotOutputs.<stack>.<output>`.
    pub fn parse(value: &str) -> Result<Option<Self>, ReferenceError> {
        if !Self::is_reference(value) {
            return Ok(None);
        }

        let parts: Vec<&str> = value.split('.').collect();
        let [namespace, stack, output_key] = parts.as_slice() else {
            return Err(ReferenceError::WrongPartCount {
                value: value.to_string(),
                found: parts.len(),
            });
        };

        if *namespace != REFERENCE_NAMESPACE {
            return Err(ReferenceError::WrongNamespace {
                value: value.to_string(),
            });
        }

        if stack.is_empty() || output_key.is_empty() {
            return Err(ReferenceError::EmptyComponent {
                value: value.to_string(),
            });
        }

        Ok(Some(Self {
            stack: stack.to_string(),
            output_key: output_key.to_string(),
        }))
    }

    /// Name of the stack that owns the output.
    pub fn stack(&self) -> &str {
        &self.stack
    }

    pub fn output_key(&self) -> &str {
        &self.output_key
    }
}

impl fmt::Display for OutputReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{REFERENCE_NAMESPACE}.{}.{}", self.stack, self.output_key)
    }
}
