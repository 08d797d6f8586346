// ABOUTME: Deployment state types for the type state pattern.
// ABOUTME: Each state carries the data that only exists from that point on.

use crate::gateway::{StackArgs, WaitCondition};
use crate::types::{OutputReference, StackStatus};

use super::outcome::StackOutcome;

/// Definition validated; references parsed but not resolved.
/// Available actions: `resolve()`
#[derive(Debug, Clone)]
pub struct Planned {
    pub(crate) references: Vec<(String, OutputReference)>,
}

/// Every parameter holds a literal value.
/// Available actions: `prepare()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Resolved;

/// Provider arguments built, template embedded or uploaded.
/// Available actions: `submit()`
#[derive(Debug, Clone)]
pub struct Prepared {
    pub(crate) args: StackArgs,
}

/// Create or update accepted by the provider.
/// Available actions: `wait()`
#[derive(Debug, Clone, Copy)]
pub struct Submitted {
    pub(crate) condition: WaitCondition,
}

/// Terminal success.
/// Available actions: `outcome()`, `status()`
#[derive(Debug, Clone)]
pub struct Completed {
    pub(crate) outcome: StackOutcome,
    pub(crate) status: Option<StackStatus>,
}
