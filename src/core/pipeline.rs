//! Pipeline domain model

use crate::core::{
    asset::AssetRule,
    config::{BundlerConfig, Environment, PipelineConfig},
    error::ConfigError,
    merge::{merge, ConfigRecord, EffectiveConfig},
    state::PipelineState,
    step::BuildStage,
};
use std::path::{Path, PathBuf};

/// One resolved pipeline run for a single environment
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// Pipeline name
    pub name: String,

    /// Target environment
    pub environment: Environment,

    /// Directory commands run in and relative paths resolve against
    pub root: PathBuf,

    /// Shared configuration
    pub base: ConfigRecord,

    /// Environment overlay
    pub overlay: ConfigRecord,

    /// Build stages, in order
    pub build: Vec<BuildStage>,

    /// Asset rules, in order (shared rules first)
    pub assets: Vec<AssetRule>,

    /// Bundler to hand off to
    pub bundler: Option<BundlerConfig>,

    /// Execution state
    pub state: PipelineState,
}

impl Pipeline {
    /// Create a pipeline for `env` from configuration
    pub fn from_config(config: &PipelineConfig, env: Environment) -> Result<Self, ConfigError> {
        let profile = config.profile(env)?;

        let assets = config
            .assets
            .iter()
            .chain(profile.assets.iter())
            .cloned()
            .collect();

        Ok(Pipeline {
            name: config.name.clone(),
            environment: env,
            root: config.root_dir(),
            base: config.base.clone(),
            overlay: profile.overlay_for(env),
            build: profile.build.clone(),
            assets,
            bundler: config.bundler.clone(),
            state: PipelineState::new(),
        })
    }

    /// Resolve the effective configuration
    pub fn effective_config(&self) -> EffectiveConfig {
        merge(&self.base, &self.overlay)
    }

    /// Whether this environment needs compiled artifacts
    pub fn requires_build(&self) -> bool {
        self.build.iter().any(|stage| !stage.steps.is_empty())
    }

    /// Total number of build steps across all stages
    pub fn step_count(&self) -> usize {
        self.build.iter().map(|stage| stage.steps.len()).sum()
    }

    /// Output directory for `config`, resolved against the root
    pub fn output_dir(&self, config: &EffectiveConfig) -> Option<PathBuf> {
        config.output_path().map(|p| self.root.join(p))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
