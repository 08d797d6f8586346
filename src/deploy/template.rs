// ABOUTME: Resolves a local template file into an inline body or an uploaded URL.
// ABOUTME: Templates above the provider's inline limit go through template storage.

use std::path::Path;
use std::time::Duration;

use crate::gateway::{TemplateSource, TemplateStore};
use crate::types::StackName;

use super::DeployError;

/// Largest template the provider accepts inline, in bytes.
pub const INLINE_TEMPLATE_LIMIT: u64 = 51_200;

/// Validity of the pre-signed URL handed to the provider.
pub const TEMPLATE_URL_VALIDITY: Duration = Duration::from_secs(120);

/// Turn a template path into the form the provider should receive.
///
/// Files at or below [`INLINE_TEMPLATE_LIMIT`] are embedded; larger files are
/// uploaded to `bucket`, which is then mandatory.
pub async fn resolve_template<S: TemplateStore + ?Sized>(
    store: &S,
    stack: &StackName,
    path: &Path,
    bucket: Option<&str>,
) -> Result<TemplateSource, DeployError> {
    let metadata = tokio::fs::metadata(path)
        .await
        .ok()
        .filter(|m| m.is_file())
        .ok_or_else(|| {
            DeployError::configuration(
                stack.as_str(),
                format!(
                    "path specified does not lead to a valid file: {}",
                    path.display()
                ),
            )
        })?;

    if metadata.len() <= INLINE_TEMPLATE_LIMIT {
        let body = tokio::fs::read_to_string(path).await.map_err(|e| {
            DeployError::configuration(
                stack.as_str(),
                format!("failed to read template {}: {e}", path.display()),
            )
        })?;
        return Ok(TemplateSource::Body(body));
    }

    tracing::warn!(
        "{} is larger than {} bytes, uploading to S3...",
        path.display(),
        INLINE_TEMPLATE_LIMIT
    );

    let bucket = bucket.ok_or_else(|| {
        DeployError::configuration(
            stack.as_str(),
            format!(
                "{} cannot be uploaded to S3 because a TemplateBucket was not specified",
                path.display()
            ),
        )
    })?;

    let url = store
        .upload_template(bucket, path, TEMPLATE_URL_VALIDITY)
        .await?;
    tracing::debug!(
        "template uploaded, pre-signed url valid for {}s: {}",
        TEMPLATE_URL_VALIDITY.as_secs(),
        url
    );

    Ok(TemplateSource::Url(url))
}
