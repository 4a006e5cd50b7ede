//! Test: Production - release API build then wasm-pack, in order

use crate::helpers::*;
use bundle_pipeline::core::{Environment, Mode, PipelineError, PipelinePhase};
use bundle_pipeline::execution::{NoopBundler, ShellExecutor};

/// Both blocking steps run, in declaration order
#[tokio::test]
async fn test_production_steps_run_in_order() {
    let workspace = web_workspace();
    let mut pipeline = load_pipeline(workspace.path(), WEB_BUNDLE, Environment::Production);
    let executor = FakeExecutor::new();
    let log = executor.log();

    let result = run_pipeline_with_fake(&mut pipeline, executor).await;

    assert_pipeline_done(&result);
    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "cargo build --manifest-path=../api/Cargo.toml --release",
            "wasm-pack build ../",
        ]
    );
    assert_eq!(result.handoff().config.mode(), Some(Mode::Production));
    assert_staged(&result, "api", b"release-binary");
}

/// wasm-pack failing after a successful native build still stops staging
#[tokio::test]
async fn test_production_wasm_failure_aborts() {
    let workspace = web_workspace();
    let mut pipeline = load_pipeline(workspace.path(), WEB_BUNDLE, Environment::Production);
    let executor = FakeExecutor::new().failing("wasm-pack build ../");
    let log = executor.log();

    let result = run_pipeline_with_fake(&mut pipeline, executor).await;

    assert_pipeline_failed(&result);
    assert!(matches!(result.error(), PipelineError::Build(_)));
    assert_eq!(log.lock().unwrap().len(), 2);
    assert!(!result.output_dir().exists());
}

/// Real shell commands produce the binary the stager then copies
#[cfg(unix)]
#[tokio::test]
async fn test_production_with_real_shell() {
    use std::os::unix::fs::PermissionsExt;

    let yaml = r#"
name: "web-bundle"
base:
  entry_point: "./bootstrap.js"
  output_path: "dist"
  output_filename: "bootstrap.js"
environments:
  production:
    build:
      - name: "compile"
        steps:
          - command: "mkdir -p ../api/target/release && printf 'fresh' > ../api/target/release/api && chmod 755 ../api/target/release/api"
          - command: "test -x ../api/target/release/api && touch wasm.built"
    assets:
      - from: ".htaccess"
        force: true
        transform: strip-https-redirect
      - from: "../api/target/release/api"
        force: true
"#;
    let workspace = tempfile::tempdir().unwrap();
    write_file(workspace.path(), "www/.htaccess", HTACCESS.as_bytes());
    let mut pipeline = load_pipeline(workspace.path(), yaml, Environment::Production);
    let executor = ShellExecutor::new(pipeline.root());

    let result = run_pipeline_with(&mut pipeline, executor, NoopBundler).await;

    assert_pipeline_done(&result);
    assert!(workspace.path().join("www/wasm.built").exists());
    assert_staged(&result, "api", b"fresh");

    let htaccess = std::fs::read_to_string(result.output_dir().join(".htaccess")).unwrap();
    assert!(!htaccess.contains("RewriteCond %{HTTPS} off"));
    assert!(!htaccess.contains("[L,R=301]"));
    assert!(htaccess.contains("RewriteEngine On"));

    let mode = std::fs::metadata(result.output_dir().join("api"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o111, 0o111);
    assert_eq!(result.pipeline.state.phase, PipelinePhase::Done);
}

/// The shipped demo pipeline parses and resolves for both environments
#[test]
fn test_demo_pipeline_resolves() {
    use bundle_pipeline::core::PipelineConfig;

    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/www/pipeline.yaml");
    let config = PipelineConfig::from_file(&path).unwrap();

    for env in Environment::ALL {
        let pipeline = config.to_pipeline(env).unwrap();
        assert!(pipeline.effective_config().missing_fields().is_empty());
        assert!(pipeline.bundler.is_some());
    }

    let production = config.to_pipeline(Environment::Production).unwrap();
    assert_eq!(production.step_count(), 2);
    assert_eq!(production.assets.len(), 4);
}

/// A pipeline loaded from a bare file name runs commands in the current directory
#[cfg(unix)]
#[tokio::test]
async fn test_bare_file_name_root_runs_commands() {
    use bundle_pipeline::core::{BuildStep, PipelineConfig};
    use bundle_pipeline::execution::CommandExecutor;

    let pipeline = PipelineConfig::from_yaml(WEB_BUNDLE)
        .unwrap()
        .with_source_dir("")
        .to_pipeline(Environment::Development)
        .unwrap();
    assert_eq!(pipeline.root(), std::path::Path::new("."));

    let executor = ShellExecutor::new(pipeline.root());
    executor.execute(&BuildStep::new("true")).await.unwrap();
}
