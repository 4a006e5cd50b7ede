//! Test: Development - debug API build, transformed .htaccess, debug binary

use crate::helpers::*;
use bundle_pipeline::core::{BuildError, Environment, Mode, PipelineError, PipelinePhase};

const STRIPPED_HTACCESS: &str = "\
Options -Indexes
RewriteEngine On
ErrorDocument 404 /index.html
";

/// A clean development run stages every asset and walks every phase
#[tokio::test]
async fn test_development_run_stages_bundle() {
    let workspace = web_workspace();
    let mut pipeline = load_pipeline(workspace.path(), WEB_BUNDLE, Environment::Development);
    let executor = FakeExecutor::new();
    let log = executor.log();

    let result = run_pipeline_with_fake(&mut pipeline, executor).await;

    assert_pipeline_done(&result);
    assert_phases(
        &result,
        &[
            PipelinePhase::Idle,
            PipelinePhase::Merging,
            PipelinePhase::Building,
            PipelinePhase::Staging,
            PipelinePhase::Bundling,
            PipelinePhase::Done,
        ],
    );
    assert_eq!(
        *log.lock().unwrap(),
        vec!["cargo build --manifest-path=../api/Cargo.toml"]
    );

    assert_staged(&result, ".htaccess", STRIPPED_HTACCESS.as_bytes());
    assert_staged(&result, "api", b"debug-binary");
    assert!(result.output_dir().join("index.html").exists());
}

/// The environment supplies the mode; the base supplies everything else
#[tokio::test]
async fn test_development_effective_config() {
    let workspace = web_workspace();
    let mut pipeline = load_pipeline(workspace.path(), WEB_BUNDLE, Environment::Development);

    let result = run_pipeline_with_fake(&mut pipeline, FakeExecutor::new()).await;
    let config = &result.handoff().config;

    assert_eq!(config.mode(), Some(Mode::Development));
    assert_eq!(config.entry_point(), Some("./bootstrap.js"));
    assert_eq!(config.output_filename(), Some("bootstrap.js"));
    assert_eq!(config.performance_hints(), Some(false));
    assert!(config.missing_fields().is_empty());
}

/// A failing compile stops the run before any asset is copied
#[tokio::test]
async fn test_development_compile_failure_copies_nothing() {
    let workspace = web_workspace();
    let mut pipeline = load_pipeline(workspace.path(), WEB_BUNDLE, Environment::Development);
    let executor = FakeExecutor::new().failing("cargo build --manifest-path=../api/Cargo.toml");

    let result = run_pipeline_with_fake(&mut pipeline, executor).await;

    assert_pipeline_failed(&result);
    assert_phases(
        &result,
        &[
            PipelinePhase::Idle,
            PipelinePhase::Merging,
            PipelinePhase::Building,
            PipelinePhase::Failed,
        ],
    );
    match result.error() {
        PipelineError::Build(BuildError::Exited { command, code }) => {
            assert_eq!(command, "cargo build --manifest-path=../api/Cargo.toml");
            assert_eq!(*code, Some(1));
        }
        other => panic!("Expected build failure, got {:?}", other),
    }
    assert_eq!(result.asset_events(), 0);
    assert!(!result.output_dir().exists());
    assert!(result.pipeline.state.error.is_some());
}

/// Running twice overwrites the forced assets
#[tokio::test]
async fn test_development_rerun_overwrites_forced_assets() {
    let workspace = web_workspace();
    let mut pipeline = load_pipeline(workspace.path(), WEB_BUNDLE, Environment::Development);

    let first = run_pipeline_with_fake(&mut pipeline, FakeExecutor::new()).await;
    assert_pipeline_done(&first);

    write_file(workspace.path(), "api/target/debug/api", b"rebuilt");
    let second = run_pipeline_with_fake(&mut pipeline, FakeExecutor::new()).await;

    assert_pipeline_done(&second);
    assert_staged(&second, "api", b"rebuilt");
    assert_ne!(
        first.pipeline.state.execution_id,
        second.pipeline.state.execution_id
    );
}
