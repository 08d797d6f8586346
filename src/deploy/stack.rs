// ABOUTME: A single stack's desired configuration and cached remote state.
// ABOUTME: Status and outputs are fetched lazily and only cleared by an explicit refresh.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

use crate::events::{DeployEvent, EventSink};
use crate::gateway::{GatewayError, Setting, StackDescription, StackGateway, WaitCondition};
use crate::types::{OutputMap, StackName, StackStatus};

use super::DeployError;
use super::outcome::StackOutcome;

/// One infrastructure stack.
#[derive(Debug, Clone)]
pub struct Stack {
    name: StackName,
    declared_name: StackName,
    template_path: PathBuf,
    template_bucket: Option<String>,
    parameters: BTreeMap<String, String>,
    output_checks: Vec<String>,
    tags: Mapping,
    settings: Mapping,
    cache: RemoteCache,
}

/// Last known remote state. `None` means "not fetched yet".
#[derive(Debug, Clone, Default)]
struct RemoteCache {
    status: Option<StackStatus>,
    outputs: Option<OutputMap>,
}

impl Stack {
    pub fn new(name: StackName, template_path: impl Into<PathBuf>) -> Self {
        Stack {
            declared_name: name.clone(),
            name,
            template_path: template_path.into(),
            template_bucket: None,
            parameters: BTreeMap::new(),
            output_checks: Vec::new(),
            tags: Mapping::new(),
            settings: Mapping::new(),
            cache: RemoteCache::default(),
        }
    }

    pub fn with_template_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.template_bucket = Some(bucket.into());
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn with_parameters(mut self, parameters: BTreeMap<String, String>) -> Self {
        self.parameters.extend(parameters);
        self
    }

    pub fn with_output_checks(mut self, checks: Vec<String>) -> Self {
        self.output_checks = checks;
        self
    }

    /// Tags are kept loosely typed; both keys and values must be strings by deploy time.
    pub fn with_tags(mut self, tags: Mapping) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_tag(mut self, key: impl Into<Value>, value: impl Into<Value>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_settings(mut self, settings: Mapping) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.settings
            .insert(Value::String(key.into()), value.into());
        self
    }

    /// Qualified name used with the provider.
    pub fn name(&self) -> &StackName {
        &self.name
    }

    /// Name as written in the spec, before group namespacing.
    pub fn declared_name(&self) -> &StackName {
        &self.declared_name
    }

    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    pub fn template_bucket(&self) -> Option<&str> {
        self.template_bucket.as_deref()
    }

    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    pub fn output_checks(&self) -> &[String] {
        &self.output_checks
    }

    pub fn tags(&self) -> &Mapping {
        &self.tags
    }

    pub fn settings(&self) -> &Mapping {
        &self.settings
    }

    /// Whether the stack is known to match `name`, qualified or as declared.
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == *name || self.declared_name == *name
    }

    pub(crate) fn set_qualified_name(&mut self, name: StackName) {
        self.name = name;
    }

    /// Replace parameter values in place, e.g. with resolved output references.
    pub(crate) fn apply_parameters(&mut self, parameters: &BTreeMap<String, String>) {
        for (key, value) in parameters {
            self.parameters.insert(key.clone(), value.clone());
        }
    }

    /// Validate tags: both keys and values must be strings.
    pub fn validated_tags(&self) -> Result<Vec<(String, String)>, DeployError> {
        self.tags
            .iter()
            .map(|(key, value)| {
                let key = key.as_str().ok_or_else(|| {
                    DeployError::configuration(
                        self.name.as_str(),
                        format!("tag key must be a string, found {}", yaml_kind(key)),
                    )
                })?;
                let value = value.as_str().ok_or_else(|| {
                    DeployError::configuration(
                        self.name.as_str(),
                        format!(
                            "tag value for {key} must be a string, found {}",
                            yaml_kind(value)
                        ),
                    )
                })?;
                tracing::debug!("adding tag: {}: {}", key, value);
                Ok((key.to_string(), value.to_string()))
            })
            .collect()
    }

    /// Validate passthrough settings against the reserved and supported argument names.
    pub fn validated_settings(&self) -> Result<Vec<Setting>, DeployError> {
        self.settings
            .iter()
            .map(|(key, value)| {
                let key = key.as_str().ok_or_else(|| {
                    DeployError::configuration(
                        self.name.as_str(),
                        format!("setting name must be a string, found {}", yaml_kind(key)),
                    )
                })?;
                tracing::debug!("adding extra setting: {}", key);
                Setting::parse(key, value)
                    .map_err(|e| DeployError::from_setting(self.name.as_str(), e))
            })
            .collect()
    }

    /// Cached status, if one has been fetched.
    pub fn cached_status(&self) -> Option<&StackStatus> {
        self.cache.status.as_ref()
    }

    /// Cached outputs, if they have been fetched.
    pub fn cached_outputs(&self) -> Option<&OutputMap> {
        self.cache.outputs.as_ref()
    }

    /// Remote status, fetched on first access. `None` when the stack does not exist.
    pub async fn status<G: StackGateway + ?Sized>(
        &mut self,
        gateway: &G,
    ) -> Result<Option<&StackStatus>, GatewayError> {
        if self.cache.status.is_none() {
            self.fetch(gateway).await?;
        }
        Ok(self.cache.status.as_ref())
    }

    /// Remote outputs, fetched on first access. `None` when the stack does not exist.
    pub async fn outputs<G: StackGateway + ?Sized>(
        &mut self,
        gateway: &G,
    ) -> Result<Option<&OutputMap>, GatewayError> {
        if self.cache.outputs.is_none() {
            self.fetch(gateway).await?;
        }
        Ok(self.cache.outputs.as_ref())
    }

    /// Clear the cache and describe the stack again. Returns whether it exists.
    pub async fn refresh<G: StackGateway + ?Sized>(
        &mut self,
        gateway: &G,
    ) -> Result<bool, GatewayError> {
        tracing::debug!("refreshing status and outputs of {}", self.name);
        self.invalidate();
        self.fetch(gateway).await
    }

    /// Forget everything known about the remote stack.
    pub fn invalidate(&mut self) {
        self.cache = RemoteCache::default();
    }

    pub(crate) fn record_status(&mut self, status: StackStatus) {
        self.cache.status = Some(status);
        self.cache.outputs = None;
    }

    async fn fetch<G: StackGateway + ?Sized>(&mut self, gateway: &G) -> Result<bool, GatewayError> {
        match gateway.describe_stack(&self.name).await? {
            Some(StackDescription { status, outputs }) => {
                tracing::debug!("{} already exists", self.name);
                self.cache.status = status;
                self.cache.outputs = Some(outputs);
                Ok(true)
            }
            None => {
                self.cache = RemoteCache::default();
                Ok(false)
            }
        }
    }

    /// Delete the stack and wait for deletion to finish.
    ///
    /// A stack that does not exist is already deleted.
    pub async fn delete<G: StackGateway + ?Sized>(
        &mut self,
        gateway: &G,
        events: &dyn EventSink,
    ) -> Result<StackOutcome, DeployError> {
        if !self.refresh(gateway).await? {
            tracing::debug!("{} doesn't exist, skipping delete", self.name);
            return Ok(StackOutcome::Absent);
        }

        gateway.delete_stack(&self.name).await?;
        events.emit(&DeployEvent::Deleting {
            stack: self.name.clone(),
        });
        tracing::info!("deleting {}...", self.name);

        let status = gateway
            .wait_until(&self.name, WaitCondition::DeleteComplete)
            .await?;
        self.record_status(status);

        Ok(StackOutcome::Deleted)
    }
}

fn yaml_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
