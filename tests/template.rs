// ABOUTME: Tests for choosing between an inline template body and an uploaded URL.
// ABOUTME: Uses temp files of controlled size around the provider's inline limit.

mod support;

use std::fs;
use std::time::Duration;

use cfnbot::deploy::{DeployErrorKind, INLINE_TEMPLATE_LIMIT, resolve_template};
use cfnbot::gateway::TemplateSource;
use cfnbot::types::StackName;
use support::{Call, MockProvider};
use tempfile::TempDir;

fn name() -> StackName {
    StackName::new("App").unwrap()
}

fn template_of_size(dir: &TempDir, file: &str, size: usize) -> std::path::PathBuf {
    let path = dir.path().join(file);
    fs::write(&path, "x".repeat(size)).unwrap();
    path
}

#[tokio::test]
async fn template_at_the_limit_is_inlined() {
    let dir = TempDir::new().unwrap();
    let path = template_of_size(&dir, "edge.yml", INLINE_TEMPLATE_LIMIT as usize);
    let store = MockProvider::new();

    let source = resolve_template(&store, &name(), &path, None).await.unwrap();

    match source {
        TemplateSource::Body(body) => assert_eq!(body.len(), 51_200),
        other => panic!("expected inline body, got {other:?}"),
    }
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn template_over_the_limit_is_uploaded() {
    let dir = TempDir::new().unwrap();
    let path = template_of_size(&dir, "big.yml", 51_201);
    let store = MockProvider::new();

    let source = resolve_template(&store, &name(), &path, Some("my-templates"))
        .await
        .unwrap();

    assert!(matches!(source, TemplateSource::Url(ref url) if url.contains("my-templates")));
    assert_eq!(
        store.calls(),
        vec![Call::Upload {
            bucket: "my-templates".to_string(),
            file: "big.yml".to_string(),
        }]
    );
    assert_eq!(store.upload_expiry(), Some(Duration::from_secs(120)));
}

#[tokio::test]
async fn large_template_without_bucket_is_a_configuration_error() {
    let dir = TempDir::new().unwrap();
    let path = template_of_size(&dir, "big.yml", 60_000);
    let store = MockProvider::new();

    let err = resolve_template(&store, &name(), &path, None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), DeployErrorKind::Configuration);
    assert!(err.to_string().contains("TemplateBucket was not specified"));
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn missing_template_is_a_configuration_error() {
    let dir = TempDir::new().unwrap();
    let store = MockProvider::new();

    let err = resolve_template(&store, &name(), &dir.path().join("nope.yml"), None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), DeployErrorKind::Configuration);
}

#[tokio::test]
async fn directory_is_not_a_template() {
    let dir = TempDir::new().unwrap();
    let store = MockProvider::new();

    let err = resolve_template(&store, &name(), dir.path(), Some("bucket"))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("does not lead to a valid file"));
}
