// ABOUTME: AWS implementation of the gateway traits.
// ABOUTME: CloudFormation for stack lifecycle, S3 for oversized template uploads.

use std::fmt::Debug;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_cloudformation as cloudformation;
use aws_sdk_cloudformation::config::Region;
use aws_sdk_cloudformation::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_cloudformation::types::{Capability, Parameter, Tag};
use aws_sdk_s3 as s3;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;

use super::args::{Setting, StackArgs, TemplateSource};
use super::error::GatewayError;
use super::traits::{StackDescription, StackGateway, TemplateStore};
use super::waiter::{WaitCondition, WaitError, WaitPolicy, poll_until};
use crate::types::{StackName, StackStatus};

/// Gateway backed by the AWS SDK.
#[derive(Debug, Clone)]
pub struct AwsProvider {
    cloudformation: cloudformation::Client,
    s3: s3::Client,
    wait_policy: WaitPolicy,
}

impl AwsProvider {
    /// Load shared AWS configuration, optionally pinned to a named profile and region.
    pub async fn connect(
        profile: Option<&str>,
        region: Option<&str>,
        wait_policy: WaitPolicy,
    ) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(profile) = profile {
            tracing::debug!("using credential profile {}", profile);
            loader = loader.profile_name(profile);
        }
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        let sdk_config = loader.load().await;

        Self {
            cloudformation: cloudformation::Client::new(&sdk_config),
            s3: s3::Client::new(&sdk_config),
            wait_policy,
        }
    }
}

/// Best available message for an SDK failure.
fn sdk_message<E, R>(err: &SdkError<E, R>) -> String
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: Debug,
{
    err.as_service_error()
        .and_then(|e| e.message())
        .map(str::to_string)
        .unwrap_or_else(|| DisplayErrorContext(err).to_string())
}

fn service_error(operation: &'static str, stack: &StackName, message: String) -> GatewayError {
    tracing::error!("{} failed on {}: {}", operation, stack, message);
    GatewayError::Service {
        operation,
        stack: stack.to_string(),
        message,
    }
}

fn describe(stack: &cloudformation::types::Stack) -> StackDescription {
    let outputs = stack
        .outputs()
        .iter()
        .filter_map(|o| Some((o.output_key()?.to_string(), o.output_value()?.to_string())))
        .collect();

    let status = stack.stack_status().map(|s| StackStatus::parse(s.as_str()));
    if status.is_none() {
        tracing::warn!("describe_stacks returned no StackStatus but did not fail");
    }

    StackDescription { status, outputs }
}

fn parameters(args: &StackArgs) -> Vec<Parameter> {
    args.parameters
        .iter()
        .map(|(key, value)| {
            Parameter::builder()
                .parameter_key(key)
                .parameter_value(value)
                .build()
        })
        .collect()
}

fn tags(args: &StackArgs) -> Vec<Tag> {
    args.tags
        .iter()
        .map(|(key, value)| Tag::builder().key(key).value(value).build())
        .collect()
}

/// Settings that apply to an update; create-only ones are dropped with a warning.
fn update_settings(args: &StackArgs) -> impl Iterator<Item = &Setting> {
    args.settings.iter().filter(move |setting| {
        if setting.is_create_only() {
            tracing::warn!(
                "{} only applies when creating a stack; ignoring it for the update of {}",
                setting.name(),
                args.stack_name
            );
        }
        !setting.is_create_only()
    })
}

fn capabilities(values: &[String]) -> Vec<Capability> {
    values.iter().map(|c| Capability::from(c.as_str())).collect()
}

#[async_trait]
impl StackGateway for AwsProvider {
    async fn describe_stack(
        &self,
        name: &StackName,
    ) -> Result<Option<StackDescription>, GatewayError> {
        let output = match self
            .cloudformation
            .describe_stacks()
            .stack_name(name.as_str())
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                let message = sdk_message(&err);
                return match GatewayError::from_describe(name.as_str(), Some(&message)) {
                    GatewayError::NotFound { .. } => {
                        tracing::debug!("describe_stacks says {} doesn't exist", name);
                        Ok(None)
                    }
                    other => {
                        tracing::error!("describe_stacks failed for {}: {}", name, message);
                        Err(other)
                    }
                };
            }
        };

        match output.stacks() {
            [stack] => Ok(Some(describe(stack))),
            stacks => Err(service_error(
                "describe_stacks",
                name,
                format!("expected exactly one stack, got {}", stacks.len()),
            )),
        }
    }

    async fn create_stack(&self, args: &StackArgs) -> Result<(), GatewayError> {
        let mut request = self
            .cloudformation
            .create_stack()
            .stack_name(args.stack_name.as_str())
            .set_parameters(Some(parameters(args)))
            .set_tags(Some(tags(args)));

        request = match &args.template {
            TemplateSource::Body(body) => request.template_body(body),
            TemplateSource::Url(url) => request.template_url(url),
        };

        for setting in &args.settings {
            request = match setting {
                Setting::Capabilities(c) => request.set_capabilities(Some(capabilities(c))),
                Setting::NotificationArns(a) => request.set_notification_arns(Some(a.clone())),
                Setting::ResourceTypes(r) => request.set_resource_types(Some(r.clone())),
                Setting::RoleArn(arn) => request.role_arn(arn),
                Setting::StackPolicyBody(body) => request.stack_policy_body(body),
                Setting::StackPolicyUrl(url) => request.stack_policy_url(url),
                Setting::DisableRollback(d) => request.disable_rollback(*d),
                Setting::OnFailure(o) => {
                    request.on_failure(cloudformation::types::OnFailure::from(o.as_str()))
                }
                Setting::TimeoutInMinutes(t) => request.timeout_in_minutes(*t),
                Setting::EnableTerminationProtection(e) => {
                    request.enable_termination_protection(*e)
                }
            };
        }

        request
            .send()
            .await
            .map_err(|err| service_error("create_stack", &args.stack_name, sdk_message(&err)))?;

        Ok(())
    }

    async fn update_stack(&self, args: &StackArgs) -> Result<(), GatewayError> {
        let mut request = self
            .cloudformation
            .update_stack()
            .stack_name(args.stack_name.as_str())
            .set_parameters(Some(parameters(args)))
            .set_tags(Some(tags(args)));

        request = match &args.template {
            TemplateSource::Body(body) => request.template_body(body),
            TemplateSource::Url(url) => request.template_url(url),
        };

        for setting in update_settings(args) {
            request = match setting {
                Setting::Capabilities(c) => request.set_capabilities(Some(capabilities(c))),
                Setting::NotificationArns(a) => request.set_notification_arns(Some(a.clone())),
                Setting::ResourceTypes(r) => request.set_resource_types(Some(r.clone())),
                Setting::RoleArn(arn) => request.role_arn(arn),
                Setting::StackPolicyBody(body) => request.stack_policy_body(body),
                Setting::StackPolicyUrl(url) => request.stack_policy_url(url),
                Setting::DisableRollback(d) => request.disable_rollback(*d),
                Setting::OnFailure(_)
                | Setting::TimeoutInMinutes(_)
                | Setting::EnableTerminationProtection(_) => request,
            };
        }

        if let Err(err) = request.send().await {
            let message = sdk_message(&err);
            return match GatewayError::from_update(args.stack_name.as_str(), Some(&message)) {
                no_updates @ GatewayError::NoUpdates { .. } => Err(no_updates),
                _ => Err(service_error("update_stack", &args.stack_name, message)),
            };
        }

        Ok(())
    }

    async fn delete_stack(&self, name: &StackName) -> Result<(), GatewayError> {
        self.cloudformation
            .delete_stack()
            .stack_name(name.as_str())
            .send()
            .await
            .map_err(|err| service_error("delete_stack", name, sdk_message(&err)))?;

        Ok(())
    }

    async fn wait_until(
        &self,
        name: &StackName,
        condition: WaitCondition,
    ) -> Result<StackStatus, WaitError> {
        poll_until(self, name, condition, &self.wait_policy).await
    }
}

#[async_trait]
impl TemplateStore for AwsProvider {
    async fn upload_template(
        &self,
        bucket: &str,
        path: &Path,
        expires_in: Duration,
    ) -> Result<String, GatewayError> {
        let key = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let upload_error = |message: String| GatewayError::Upload {
            bucket: bucket.to_string(),
            key: key.clone(),
            message,
        };

        if key.is_empty() {
            return Err(upload_error("template path has no file name".to_string()));
        }

        let body = tokio::fs::read(path)
            .await
            .map_err(|e| upload_error(e.to_string()))?;

        self.s3
            .put_object()
            .bucket(bucket)
            .key(&key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|err| upload_error(sdk_message(&err)))?;

        let presigning =
            PresigningConfig::expires_in(expires_in).map_err(|e| upload_error(e.to_string()))?;

        let request = self
            .s3
            .get_object()
            .bucket(bucket)
            .key(&key)
            .presigned(presigning)
            .await
            .map_err(|err| upload_error(sdk_message(&err)))?;

        Ok(request.uri().to_string())
    }
}
