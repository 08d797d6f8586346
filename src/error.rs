// ABOUTME: Application-wide error types for cfnbot.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

use crate::deploy::GroupError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("spec file not found: {0}")]
    SpecNotFound(PathBuf),

    #[error("unknown stackset: {name} (available: {})", available.join(", "))]
    UnknownGroup {
        name: String,
        available: Vec<String>,
    },

    #[error("invalid spec: {0}")]
    InvalidSpec(String),

    #[error(transparent)]
    Group(#[from] GroupError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
