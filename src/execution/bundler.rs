//! Handoff to the external bundler

use crate::core::{config::BundlerConfig, BuildStep, BundleError, EffectiveConfig, Environment};
use crate::execution::runner::{CommandExecutor, ShellExecutor};
use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

/// Everything the bundler receives once building and staging are done
#[derive(Debug, Clone, Serialize)]
pub struct BundleHandoff {
    pub execution_id: Uuid,
    pub environment: Environment,
    pub config: EffectiveConfig,
    /// Fully populated output directory
    pub output_dir: PathBuf,
}

/// Trait for the final bundling stage
#[async_trait]
pub trait Bundler: Send + Sync {
    async fn bundle(&self, handoff: &BundleHandoff) -> Result<(), BundleError>;
}

/// Leaves bundling to the caller
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBundler;

#[async_trait]
impl Bundler for NoopBundler {
    async fn bundle(&self, handoff: &BundleHandoff) -> Result<(), BundleError> {
        info!(
            "No bundler configured; output ready in {}",
            handoff.output_dir.display()
        );
        Ok(())
    }
}

/// Runs a bundler command with the effective configuration in its environment
#[derive(Debug, Clone)]
pub struct CommandBundler {
    step: BuildStep,
    working_dir: PathBuf,
}

impl CommandBundler {
    pub fn new(config: &BundlerConfig, working_dir: impl Into<PathBuf>) -> Self {
        let mut step = BuildStep::new(config.command.clone()).named("bundler");
        step.timeout_secs = config.timeout_secs;
        Self {
            step,
            working_dir: working_dir.into(),
        }
    }
}

#[async_trait]
impl Bundler for CommandBundler {
    async fn bundle(&self, handoff: &BundleHandoff) -> Result<(), BundleError> {
        // The bundler is where an incomplete configuration finally matters.
        handoff.config.require_complete()?;
        let config = &handoff.config;

        let executor = ShellExecutor::new(&self.working_dir)
            .with_env("BUNDLE_ENV", handoff.environment.as_str())
            .with_env("BUNDLE_MODE", config.mode().map(|m| m.to_string()).unwrap_or_default())
            .with_env("BUNDLE_ENTRY_POINT", config.entry_point().unwrap_or_default())
            .with_env("BUNDLE_OUTPUT_PATH", handoff.output_dir.to_string_lossy())
            .with_env("BUNDLE_OUTPUT_FILENAME", config.output_filename().unwrap_or_default())
            .with_env(
                "BUNDLE_PERFORMANCE_HINTS",
                config.performance_hints().unwrap_or(false).to_string(),
            );

        info!("Handing off to bundler: `{}`", self.step.command);
        executor.execute(&self.step).await?;
        Ok(())
    }
}

/// Pick the bundler for an optional configuration
pub fn bundler_for(config: Option<&BundlerConfig>, working_dir: impl Into<PathBuf>) -> Box<dyn Bundler> {
    match config {
        Some(config) => Box::new(CommandBundler::new(config, working_dir)),
        None => Box::new(NoopBundler),
    }
}

#[async_trait]
impl Bundler for Box<dyn Bundler> {
    async fn bundle(&self, handoff: &BundleHandoff) -> Result<(), BundleError> {
        self.as_ref().bundle(handoff).await
    }
}
