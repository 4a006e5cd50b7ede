//! Test: Staging - existing destinations, optional and missing sources

use crate::helpers::*;
use bundle_pipeline::core::{Environment, PipelineError, PipelinePhase, StageError};
use bundle_pipeline::execution::{ExecutionEvent, StageEvent};

const STATIC_SITE: &str = r#"
name: "static-site"
base:
  output_path: "dist"
assets:
  - from: "index.html"
  - from: "robots.txt"
    required: false
  - from: "favicon.ico"
environments:
  development: {}
"#;

/// An existing destination without force fails the run, but later rules still apply
#[tokio::test]
async fn test_existing_destination_without_force() {
    let workspace = tempfile::tempdir().unwrap();
    write_file(workspace.path(), "www/index.html", b"new");
    write_file(workspace.path(), "www/favicon.ico", b"icon");
    write_file(workspace.path(), "www/dist/index.html", b"old");
    let mut pipeline = load_pipeline(workspace.path(), STATIC_SITE, Environment::Development);

    let result = run_pipeline_with_fake(&mut pipeline, FakeExecutor::new()).await;

    assert_pipeline_failed(&result);
    assert_phases(
        &result,
        &[
            PipelinePhase::Idle,
            PipelinePhase::Merging,
            PipelinePhase::Building,
            PipelinePhase::Staging,
            PipelinePhase::Failed,
        ],
    );
    match result.error() {
        PipelineError::Stage(StageError::DestinationExists(path)) => {
            assert!(path.ends_with("dist/index.html"));
        }
        other => panic!("Expected DestinationExists, got {:?}", other),
    }

    assert_staged(&result, "index.html", b"old");
    assert_staged(&result, "favicon.ico", b"icon");
}

/// Optional sources are skipped; required ones are not
#[tokio::test]
async fn test_optional_and_required_sources() {
    let workspace = tempfile::tempdir().unwrap();
    write_file(workspace.path(), "www/index.html", b"page");
    let mut pipeline = load_pipeline(workspace.path(), STATIC_SITE, Environment::Development);

    let result = run_pipeline_with_fake(&mut pipeline, FakeExecutor::new()).await;

    assert_pipeline_failed(&result);
    match result.error() {
        PipelineError::Stage(StageError::SourceNotFound(path)) => {
            assert!(path.ends_with("favicon.ico"));
        }
        other => panic!("Expected SourceNotFound, got {:?}", other),
    }

    let skipped = result
        .events
        .iter()
        .filter(|e| matches!(e, ExecutionEvent::Asset(StageEvent::Skipped { .. })))
        .count();
    assert_eq!(skipped, 1);
    assert_staged(&result, "index.html", b"page");
    assert!(!result.output_dir().join("robots.txt").exists());
}

/// A missing output path fails once staging begins
#[tokio::test]
async fn test_missing_output_path() {
    let yaml = r#"
name: "static-site"
assets:
  - from: "index.html"
environments:
  development: {}
"#;
    let workspace = tempfile::tempdir().unwrap();
    write_file(workspace.path(), "www/index.html", b"page");
    let mut pipeline = load_pipeline(workspace.path(), yaml, Environment::Development);

    let result = run_pipeline_with_fake(&mut pipeline, FakeExecutor::new()).await;

    assert_pipeline_failed(&result);
    assert!(matches!(
        result.error(),
        PipelineError::Config(bundle_pipeline::core::ConfigError::MissingField("output_path"))
    ));
    assert_eq!(result.asset_events(), 0);
}
