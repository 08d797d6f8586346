// ABOUTME: Stack and group orchestration using the type state pattern.
// ABOUTME: Exports the stack entity, the group engine, and per-deploy state markers.

mod deployment;
mod error;
mod group;
mod outcome;
mod stack;
mod state;
mod template;
mod transitions;

pub use deployment::Deployment;
pub use error::{DeployError, DeployErrorKind, GroupError};
pub use group::{DEFAULT_GROUP, StackGroup};
pub use outcome::{Operation, Outcome, StackOutcome, StackResult, Summary};
pub use stack::Stack;
pub use state::{Completed, Planned, Prepared, Resolved, Submitted};
pub use template::{INLINE_TEMPLATE_LIMIT, TEMPLATE_URL_VALIDITY, resolve_template};
pub use transitions::Submission;
