// ABOUTME: Generic deployment struct parameterized by state marker.
// ABOUTME: Holds a snapshot of the stack definition that the transitions operate on.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::gateway::Setting;
use crate::types::StackName;

/// A stack deploy in progress, parameterized by its current state.
///
/// The deployment owns a snapshot of the stack's definition so that the
/// group can be borrowed again (for reference resolution) between transitions.
#[derive(Debug)]
pub struct Deployment<S> {
    pub(crate) stack_name: StackName,
    pub(crate) template_path: PathBuf,
    pub(crate) template_bucket: Option<String>,
    pub(crate) parameters: BTreeMap<String, String>,
    pub(crate) tags: Vec<(String, String)>,
    pub(crate) settings: Vec<Setting>,
    pub(crate) state: S,
}

impl<S> Deployment<S> {
    pub fn stack_name(&self) -> &StackName {
        &self.stack_name
    }

    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    /// Template bucket after group inheritance.
    pub fn template_bucket(&self) -> Option<&str> {
        self.template_bucket.as_deref()
    }

    pub(crate) fn transition<T>(self, state: T) -> Deployment<T> {
        Deployment {
            stack_name: self.stack_name,
            template_path: self.template_path,
            template_bucket: self.template_bucket,
            parameters: self.parameters,
            tags: self.tags,
            settings: self.settings,
            state,
        }
    }
}
