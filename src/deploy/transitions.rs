// ABOUTME: State transition methods for a single stack deploy.
// ABOUTME: Each method consumes self and returns the next state on success.

use std::collections::BTreeMap;

use crate::events::{DeployEvent, EventSink};
use crate::gateway::{
    GatewayError, StackArgs, StackGateway, TemplateSource, TemplateStore, WaitCondition,
};
use crate::types::{OutputReference, StackStatus};

use super::DeployError;
use super::deployment::Deployment;
use super::outcome::StackOutcome;
use super::stack::Stack;
use super::state::{Completed, Planned, Prepared, Resolved, Submitted};
use super::template::resolve_template;

/// What the provider did with a submitted create or update.
#[derive(Debug)]
pub enum Submission {
    /// Accepted; the stack must be waited on.
    Pending(Deployment<Submitted>),
    /// The provider found nothing to update. No wait required.
    Unchanged(Deployment<Completed>),
}

// =============================================================================
// Stack -> Planned
// =============================================================================

impl Deployment<Planned> {
    /// Validate a stack's definition without touching the provider.
    ///
    /// Tags and settings are checked, output references are parsed, and the
    /// group's template bucket is inherited when the stack has none.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Configuration` for non-string tags, reserved or
    /// unsupported settings, and malformed references.
    pub fn plan(stack: &Stack, group_bucket: Option<&str>) -> Result<Self, DeployError> {
        let tags = stack.validated_tags()?;
        let settings = stack.validated_settings()?;

        let mut references = Vec::new();
        for (key, value) in stack.parameters() {
            match OutputReference::parse(value) {
                Ok(Some(reference)) => {
                    tracing::debug!("output reference found, checking group for {}", reference);
                    references.push((key.clone(), reference));
                }
                Ok(None) => {}
                Err(e) => return Err(DeployError::from_reference(stack.name().as_str(), e)),
            }
        }

        let template_bucket = match (stack.template_bucket(), group_bucket) {
            (Some(own), _) => Some(own.to_string()),
            (None, Some(inherited)) => {
                tracing::debug!("{} inherited template bucket {}", stack.name(), inherited);
                Some(inherited.to_string())
            }
            (None, None) => None,
        };

        Ok(Deployment {
            stack_name: stack.name().clone(),
            template_path: stack.template_path().to_path_buf(),
            template_bucket,
            parameters: stack.parameters().clone(),
            tags,
            settings,
            state: Planned { references },
        })
    }

    /// Parameters whose values are output references, keyed by parameter name.
    pub fn references(&self) -> &[(String, OutputReference)] {
        &self.state.references
    }

    /// Replace every reference with its resolved value.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::ReferenceNotFound` if any reference has no value;
    /// no placeholder ever reaches the provider.
    pub fn resolve(
        mut self,
        values: &BTreeMap<String, String>,
    ) -> Result<Deployment<Resolved>, DeployError> {
        for (key, reference) in &self.state.references {
            let value = values
                .get(key)
                .ok_or_else(|| DeployError::ReferenceNotFound {
                    stack: self.stack_name.to_string(),
                    target: reference.stack().to_string(),
                    output_key: reference.output_key().to_string(),
                })?;
            tracing::debug!("parameter \"{}\" updated", key);
            self.parameters.insert(key.clone(), value.clone());
        }

        Ok(self.transition(Resolved))
    }
}

// =============================================================================
// Resolved -> Prepared
// =============================================================================

impl Deployment<Resolved> {
    /// Build the provider arguments, uploading the template if it is too large.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Configuration` if the template is missing or needs
    /// a bucket that was not given, `DeployError::Gateway` if the upload fails.
    pub async fn prepare<T: TemplateStore + ?Sized>(
        self,
        store: &T,
        events: &dyn EventSink,
    ) -> Result<Deployment<Prepared>, DeployError> {
        let template = resolve_template(
            store,
            &self.stack_name,
            &self.template_path,
            self.template_bucket.as_deref(),
        )
        .await?;

        if let (TemplateSource::Url(_), Some(bucket)) = (&template, &self.template_bucket) {
            events.emit(&DeployEvent::TemplateUploaded {
                stack: self.stack_name.clone(),
                bucket: bucket.clone(),
            });
        }

        let args = StackArgs {
            stack_name: self.stack_name.clone(),
            template,
            parameters: self
                .parameters
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            tags: self.tags.clone(),
            settings: self.settings.clone(),
        };

        Ok(self.transition(Prepared { args }))
    }
}

// =============================================================================
// Prepared -> Submitted | Completed
// =============================================================================

impl Deployment<Prepared> {
    pub fn args(&self) -> &StackArgs {
        &self.state.args
    }

    /// Create the stack, or update it if it already exists.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Gateway` when the provider rejects the request.
    /// A no-op update is not an error.
    pub async fn submit<G: StackGateway + ?Sized>(
        self,
        gateway: &G,
        exists: bool,
        events: &dyn EventSink,
    ) -> Result<Submission, DeployError> {
        if !exists {
            gateway.create_stack(&self.state.args).await?;
            tracing::info!("creating {}...", self.stack_name);
            events.emit(&DeployEvent::Creating {
                stack: self.stack_name.clone(),
            });
            return Ok(Submission::Pending(self.transition(Submitted {
                condition: WaitCondition::CreateComplete,
            })));
        }

        match gateway.update_stack(&self.state.args).await {
            Ok(()) => {
                tracing::info!("updating {}...", self.stack_name);
                events.emit(&DeployEvent::Updating {
                    stack: self.stack_name.clone(),
                });
                Ok(Submission::Pending(self.transition(Submitted {
                    condition: WaitCondition::UpdateComplete,
                })))
            }
            Err(GatewayError::NoUpdates { .. }) => {
                tracing::info!("no updates required for {}", self.stack_name);
                Ok(Submission::Unchanged(self.transition(Completed {
                    outcome: StackOutcome::Unchanged,
                    status: None,
                })))
            }
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// Submitted -> Completed
// =============================================================================

impl Deployment<Submitted> {
    pub fn condition(&self) -> WaitCondition {
        self.state.condition
    }

    /// Block until the submitted operation reaches its terminal condition.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Wait` on rollback, failure, or timeout.
    pub async fn wait<G: StackGateway + ?Sized>(
        self,
        gateway: &G,
    ) -> Result<Deployment<Completed>, DeployError> {
        let condition = self.state.condition;
        let status = gateway.wait_until(&self.stack_name, condition).await?;

        let outcome = match condition {
            WaitCondition::CreateComplete => StackOutcome::Created,
            WaitCondition::UpdateComplete => StackOutcome::Updated,
            WaitCondition::DeleteComplete => StackOutcome::Deleted,
        };

        Ok(self.transition(Completed {
            outcome,
            status: Some(status),
        }))
    }
}

// =============================================================================
// Completed
// =============================================================================

impl Deployment<Completed> {
    pub fn outcome(&self) -> StackOutcome {
        self.state.outcome
    }

    /// Final status reported by the waiter. `None` for unchanged stacks.
    pub fn status(&self) -> Option<&StackStatus> {
        self.state.status.as_ref()
    }
}
