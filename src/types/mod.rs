// ABOUTME: Validated domain types shared by the spec parser and the deploy engine.
// ABOUTME: Stack names, output references, and remote stack statuses.

mod reference;
mod stack_name;
mod status;

pub use reference::{OutputReference, REFERENCE_NAMESPACE, ReferenceError};
pub use stack_name::{MAX_STACK_NAME_LEN, NAMESPACE_SEPARATOR, StackName, StackNameError};
pub use status::StackStatus;

use std::collections::BTreeMap;

/// Output key -> output value for one stack.
pub type OutputMap = BTreeMap<String, String>;
