// ABOUTME: Capability traits for the provisioning service and template storage.
// ABOUTME: StackGateway and TemplateStore combine into the Provider used by the engine.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use super::args::StackArgs;
use super::error::GatewayError;
use super::waiter::{WaitCondition, WaitError};
use crate::types::{OutputMap, StackName, StackStatus};

/// What the provider reports about an existing stack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackDescription {
    /// Current status. The provider may omit it.
    pub status: Option<StackStatus>,
    pub outputs: OutputMap,
}

/// Stack lifecycle operations against the provisioning service.
#[async_trait]
pub trait StackGateway: Send + Sync {
    /// Describe a stack. Returns `Ok(None)` when the stack does not exist;
    /// every other failure is an error.
    async fn describe_stack(
        &self,
        name: &StackName,
    ) -> Result<Option<StackDescription>, GatewayError>;

    /// Submit a create request.
    async fn create_stack(&self, args: &StackArgs) -> Result<(), GatewayError>;

    /// Submit an update request. Returns `GatewayError::NoUpdates` when the
    /// provider finds nothing to change.
    async fn update_stack(&self, args: &StackArgs) -> Result<(), GatewayError>;

    /// Submit a delete request.
    async fn delete_stack(&self, name: &StackName) -> Result<(), GatewayError>;

    /// Block until the stack reaches `condition`, returning its final status.
    async fn wait_until(
        &self,
        name: &StackName,
        condition: WaitCondition,
    ) -> Result<StackStatus, WaitError>;
}

/// Blob storage for templates too large to send inline.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Upload the file at `path` to `bucket` under its base file name and
    /// return a pre-signed GET URL valid for `expires_in`.
    async fn upload_template(
        &self,
        bucket: &str,
        path: &Path,
        expires_in: Duration,
    ) -> Result<String, GatewayError>;
}

/// Everything the deploy engine needs from the outside world.
pub trait Provider: StackGateway + TemplateStore {}

impl<T: StackGateway + TemplateStore> Provider for T {}
