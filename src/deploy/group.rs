// ABOUTME: Ordered, named collection of stacks deployed and deleted together.
// ABOUTME: Deploy short-circuits on the first failure; delete attempts every stack.

use std::collections::BTreeMap;

use crate::events::{DeployEvent, EventSink};
use crate::gateway::{Provider, StackGateway, WaitPolicy};
use crate::types::OutputReference;

use super::deployment::Deployment;
use super::error::GroupError;
use super::outcome::{Operation, StackOutcome, StackResult, Summary};
use super::stack::Stack;
use super::transitions::Submission;
use super::DeployError;

/// Name of the group used when a spec does not name one. Its stacks are not namespaced.
pub const DEFAULT_GROUP: &str = "Default";

/// A named set of stacks sharing a namespace, credentials, and template bucket.
///
/// Member order is deploy order: a stack may only reference outputs of stacks
/// that precede it.
#[derive(Debug, Clone)]
pub struct StackGroup {
    name: String,
    profile: Option<String>,
    region: Option<String>,
    template_bucket: Option<String>,
    wait_policy: WaitPolicy,
    stacks: Vec<Stack>,
}

impl Default for StackGroup {
    fn default() -> Self {
        Self::new(DEFAULT_GROUP)
    }
}

impl StackGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            profile: None,
            region: None,
            template_bucket: None,
            wait_policy: WaitPolicy::default(),
            stacks: Vec::new(),
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_template_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.template_bucket = Some(bucket.into());
        self
    }

    pub fn with_wait_policy(mut self, policy: WaitPolicy) -> Self {
        self.wait_policy = policy;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_GROUP
    }

    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn template_bucket(&self) -> Option<&str> {
        self.template_bucket.as_deref()
    }

    pub fn wait_policy(&self) -> &WaitPolicy {
        &self.wait_policy
    }

    pub fn stacks(&self) -> &[Stack] {
        &self.stacks
    }

    pub fn stacks_mut(&mut self) -> &mut [Stack] {
        &mut self.stacks
    }

    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Find a member by qualified or declared name.
    pub fn stack(&self, name: &str) -> Option<&Stack> {
        self.position(name).map(|i| &self.stacks[i])
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.stacks.iter().position(|s| s.answers_to(name))
    }

    /// Append a stack, namespacing its name under this group.
    ///
    /// # Errors
    ///
    /// Fails if the qualified name is invalid, or if either of the stack's names
    /// is already a name of another member.
    pub fn push(&mut self, mut stack: Stack) -> Result<(), GroupError> {
        if !self.is_default() {
            let qualified = stack
                .declared_name()
                .namespaced(&self.name)
                .map_err(|source| GroupError::InvalidName {
                    group: self.name.clone(),
                    stack: stack.declared_name().to_string(),
                    source,
                })?;
            tracing::debug!("stack name namespaced to {}", qualified);
            stack.set_qualified_name(qualified);
        }

        // Every name a member answers to must identify exactly one member.
        let taken = self.stacks.iter().any(|s| {
            s.answers_to(stack.name().as_str()) || s.answers_to(stack.declared_name().as_str())
        });
        if taken {
            return Err(GroupError::DuplicateStack(stack.name().to_string()));
        }

        self.stacks.push(stack);
        Ok(())
    }

    /// Look up the value of another member's output, fetching outputs if needed.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::ReferenceNotFound` if the stack or key is missing.
    /// No default is ever substituted.
    pub async fn resolve_reference<G: StackGateway + ?Sized>(
        &mut self,
        requested_by: &str,
        reference: &OutputReference,
        gateway: &G,
    ) -> Result<String, DeployError> {
        let not_found = || DeployError::ReferenceNotFound {
            stack: requested_by.to_string(),
            target: reference.stack().to_string(),
            output_key: reference.output_key().to_string(),
        };

        tracing::debug!(
            "searching {} stacks for {}.{}",
            self.stacks.len(),
            reference.stack(),
            reference.output_key()
        );

        let index = self.position(reference.stack()).ok_or_else(not_found)?;
        let outputs = self.stacks[index].outputs(gateway).await?;

        let value = outputs
            .and_then(|o| o.get(reference.output_key()))
            .cloned()
            .ok_or_else(not_found)?;
        tracing::debug!("found output reference {}: {}", reference, value);

        Ok(value)
    }

    /// Deploy one member: plan, resolve references, prepare, submit, wait.
    pub async fn deploy_stack<P: Provider + ?Sized>(
        &mut self,
        index: usize,
        provider: &P,
        events: &dyn EventSink,
    ) -> Result<StackOutcome, DeployError> {
        let planned = Deployment::plan(&self.stacks[index], self.template_bucket.as_deref())?;
        let stack_name = planned.stack_name().clone();

        let mut values = BTreeMap::new();
        for (parameter, reference) in planned.references() {
            let value = self
                .resolve_reference(stack_name.as_str(), reference, provider)
                .await?;
            events.emit(&DeployEvent::ReferenceResolved {
                stack: stack_name.clone(),
                parameter: parameter.clone(),
                reference: reference.to_string(),
            });
            values.insert(parameter.clone(), value);
        }

        let resolved = planned.resolve(&values)?;
        self.stacks[index].apply_parameters(resolved.parameters());

        let prepared = resolved.prepare(provider, events).await?;

        let stack = &mut self.stacks[index];
        let exists = stack.refresh(provider).await?;

        let completed = match prepared.submit(provider, exists, events).await? {
            Submission::Pending(submitted) => submitted.wait(provider).await?,
            Submission::Unchanged(completed) => completed,
        };

        match completed.status() {
            Some(status) => stack.record_status(status.clone()),
            None => stack.invalidate(),
        }

        Ok(completed.outcome())
    }

    /// Create or update every stack in order, stopping at the first failure.
    ///
    /// Stacks after a failure are recorded as skipped, since they may depend
    /// on outputs of the one that failed.
    pub async fn deploy<P: Provider + ?Sized>(
        &mut self,
        provider: &P,
        events: &dyn EventSink,
    ) -> Summary {
        let mut summary = Summary::new(Operation::Deploy);
        let mut failed = false;

        for index in 0..self.stacks.len() {
            let name = self.stacks[index].name().clone();

            if failed {
                events.emit(&DeployEvent::Skipped {
                    stack: name.clone(),
                });
                summary.record(name, StackResult::Skipped);
                continue;
            }

            events.emit(&DeployEvent::Started {
                stack: name.clone(),
                operation: Operation::Deploy,
            });

            match self.deploy_stack(index, provider, events).await {
                Ok(outcome) => {
                    events.emit(&DeployEvent::Finished {
                        stack: name.clone(),
                        outcome,
                    });
                    summary.record(name, StackResult::Succeeded(outcome));
                }
                Err(e) => {
                    tracing::error!("deploy of {} failed: {}", name, e);
                    events.emit(&DeployEvent::Failed {
                        stack: name.clone(),
                        message: e.to_string(),
                    });
                    summary.record(name, StackResult::Failed(e));
                    failed = true;
                }
            }
        }

        summary.finish()
    }

    /// Delete every stack, continuing past failures.
    pub async fn delete<G: StackGateway + ?Sized>(
        &mut self,
        gateway: &G,
        events: &dyn EventSink,
    ) -> Summary {
        let mut summary = Summary::new(Operation::Delete);

        for stack in &mut self.stacks {
            let name = stack.name().clone();
            events.emit(&DeployEvent::Started {
                stack: name.clone(),
                operation: Operation::Delete,
            });

            match stack.delete(gateway, events).await {
                Ok(outcome) => {
                    events.emit(&DeployEvent::Finished {
                        stack: name.clone(),
                        outcome,
                    });
                    summary.record(name, StackResult::Succeeded(outcome));
                }
                Err(e) => {
                    tracing::error!("delete of {} failed: {}", name, e);
                    events.emit(&DeployEvent::Failed {
                        stack: name.clone(),
                        message: e.to_string(),
                    });
                    summary.record(name, StackResult::Failed(e));
                }
            }
        }

        summary.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StackName;

    fn stack(name: &str) -> Stack {
        Stack::new(StackName::new(name).unwrap(), format!("{name}.yml"))
    }

    #[test]
    fn default_group_keeps_names() {
        let mut group = StackGroup::default();
        group.push(stack("Bucket")).unwrap();
        assert_eq!(group.stacks()[0].name().as_str(), "Bucket");
    }

    #[test]
    fn named_group_namespaces_once() {
        let mut group = StackGroup::new("Dev");
        group.push(stack("Bucket")).unwrap();
        assert_eq!(group.stacks()[0].name().as_str(), "Dev-Bucket");

        // Re-attaching to another group namespaces from the declared name.
        let moved = group.stacks()[0].clone();
        let mut other = StackGroup::new("Prod");
        other.push(moved).unwrap();
        assert_eq!(other.stacks()[0].name().as_str(), "Prod-Bucket");
    }

    #[test]
    fn duplicate_members_are_rejected() {
        let mut group = StackGroup::new("Dev");
        group.push(stack("Bucket")).unwrap();
        assert!(matches!(
            group.push(stack("Bucket")),
            Err(GroupError::DuplicateStack(_))
        ));
    }

    #[test]
    fn declared_name_clashing_with_a_qualified_name_is_rejected() {
        let mut group = StackGroup::new("Dev");
        group.push(stack("Dev-Bucket")).unwrap();
        assert!(matches!(
            group.push(stack("Bucket")),
            Err(GroupError::DuplicateStack(name)) if name == "Dev-Bucket"
        ));

        let mut group = StackGroup::new("Dev");
        group.push(stack("Bucket")).unwrap();
        assert!(matches!(
            group.push(stack("Dev-Bucket")),
            Err(GroupError::DuplicateStack(_))
        ));
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn members_are_found_by_either_name() {
        let mut group = StackGroup::new("Dev");
        group.push(stack("Bucket")).unwrap();
        assert!(group.stack("Dev-Bucket").is_some());
        assert!(group.stack("Bucket").is_some());
        assert!(group.stack("Queue").is_none());
    }

    #[test]
    fn preserves_insertion_order() {
        let mut group = StackGroup::default();
        for name in ["Zeta", "Alpha", "Mid"] {
            group.push(stack(name)).unwrap();
        }
        let names: Vec<_> = group.stacks().iter().map(|s| s.name().as_str()).collect();
        assert_eq!(names, ["Zeta", "Alpha", "Mid"]);
    }
}
