//! Test: Bundler handoff - the effective config reaches the bundler command

use crate::helpers::*;
use bundle_pipeline::core::{BundleError, ConfigError, Environment, PipelineError, PipelinePhase};
use bundle_pipeline::execution::ExecutionEngine;

/// The bundler sees the merged settings through its environment
#[cfg(unix)]
#[tokio::test]
async fn test_bundler_receives_effective_config() {
    let yaml = r#"
name: "web-bundle"
base:
  entry_point: "./bootstrap.js"
  output_path: "dist"
  output_filename: "bootstrap.js"
  performance_hints: false
assets:
  - from: "index.html"
    force: true
bundler:
  command: "printf '%s|%s|%s|%s' \"$BUNDLE_ENV\" \"$BUNDLE_MODE\" \"$BUNDLE_ENTRY_POINT\" \"$BUNDLE_OUTPUT_FILENAME\" > \"$BUNDLE_OUTPUT_PATH/handoff.txt\""
environments:
  production: {}
"#;
    let workspace = tempfile::tempdir().unwrap();
    write_file(workspace.path(), "www/index.html", b"page");
    let mut pipeline = load_pipeline(workspace.path(), yaml, Environment::Production);

    let engine = ExecutionEngine::for_pipeline(&pipeline);
    let handoff = engine.execute(&mut pipeline).await.unwrap();

    let written = std::fs::read_to_string(handoff.output_dir.join("handoff.txt")).unwrap();
    assert_eq!(written, "production|production|./bootstrap.js|bootstrap.js");
    assert_eq!(pipeline.state.phase, PipelinePhase::Done);
}

/// An incomplete configuration is only rejected when the bundler needs it
#[tokio::test]
async fn test_incomplete_config_fails_in_bundling() {
    let yaml = r#"
name: "web-bundle"
base:
  output_path: "dist"
assets:
  - from: "index.html"
bundler:
  command: "true"
environments:
  development: {}
"#;
    let workspace = tempfile::tempdir().unwrap();
    write_file(workspace.path(), "www/index.html", b"page");
    let mut pipeline = load_pipeline(workspace.path(), yaml, Environment::Development);

    let engine = ExecutionEngine::for_pipeline(&pipeline);
    let err = engine.execute(&mut pipeline).await.unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Bundle(BundleError::Config(ConfigError::MissingField("entry_point")))
    ));
    assert_eq!(pipeline.state.phase, PipelinePhase::Failed);
    assert!(pipeline.state.phases().contains(&PipelinePhase::Bundling));
    assert!(pipeline.root().join("dist/index.html").exists());
}
