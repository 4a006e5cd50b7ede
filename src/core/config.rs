//! Pipeline configuration from YAML

use crate::core::{
    asset::AssetRule,
    error::ConfigError,
    merge::{ConfigRecord, Mode},
    step::BuildStage,
    Pipeline,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Target environment of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub const ALL: [Environment; 2] = [Environment::Development, Environment::Production];

    /// Bundler mode implied by this environment
    pub fn mode(&self) -> Mode {
        match self {
            Environment::Development => Mode::Development,
            Environment::Production => Mode::Production,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Environment::Development),
            "production" => Ok(Environment::Production),
            other => Err(ConfigError::UnknownEnvironment(other.to_string())),
        }
    }
}

/// Top-level pipeline configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name
    pub name: String,

    /// Directory commands run in and relative paths resolve against.
    /// Relative to the pipeline file; defaults to the file's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    /// Settings shared by every environment
    #[serde(default)]
    pub base: ConfigRecord,

    /// Asset rules staged for every environment, before the environment's own
    #[serde(default)]
    pub assets: Vec<AssetRule>,

    /// External bundler to hand off to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundler: Option<BundlerConfig>,

    /// Per-environment profiles
    pub environments: BTreeMap<Environment, EnvironmentProfile>,

    /// Directory of the file this config was loaded from
    #[serde(skip)]
    source_dir: Option<PathBuf>,
}

/// What one environment adds on top of the base
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentProfile {
    /// Overlay merged onto `base`
    #[serde(default)]
    pub config: ConfigRecord,

    /// Build stages, run in order
    #[serde(default)]
    pub build: Vec<BuildStage>,

    /// Asset rules, staged after the shared ones
    #[serde(default)]
    pub assets: Vec<AssetRule>,
}

/// External bundler invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundlerConfig {
    /// Shell command line, e.g. `webpack --config webpack.prod.js`
    pub command: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl PipelineConfig {
    /// Load pipeline configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml(&content)?;
        config.source_dir = Some(parent_dir(path));
        Ok(config)
    }

    /// Parse pipeline configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the pipeline configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(invalid("Pipeline name must not be empty"));
        }

        if self.environments.is_empty() {
            return Err(invalid("At least one environment must be declared"));
        }

        validate_assets("assets", &self.assets)?;

        for (env, profile) in &self.environments {
            let mut seen_stages = HashSet::new();
            for stage in &profile.build {
                if !seen_stages.insert(stage.name.as_str()) {
                    return Err(invalid(format!(
                        "Environment '{}' declares build stage '{}' twice",
                        env, stage.name
                    )));
                }
                if stage.steps.is_empty() {
                    return Err(invalid(format!(
                        "Build stage '{}' in environment '{}' has no steps",
                        stage.name, env
                    )));
                }
                for step in &stage.steps {
                    if step.command.trim().is_empty() {
                        return Err(invalid(format!(
                            "Build stage '{}' in environment '{}' has an empty command",
                            stage.name, env
                        )));
                    }
                    if step.timeout_secs == Some(0) {
                        return Err(invalid(format!(
                            "Step '{}' has a zero timeout",
                            step.label()
                        )));
                    }
                }
            }

            validate_assets(&format!("environments.{}.assets", env), &profile.assets)?;
        }

        if let Some(bundler) = &self.bundler {
            if bundler.command.trim().is_empty() {
                return Err(invalid("Bundler command must not be empty"));
            }
        }

        Ok(())
    }

    /// Profile for `env`
    pub fn profile(&self, env: Environment) -> Result<&EnvironmentProfile, ConfigError> {
        self.environments
            .get(&env)
            .ok_or_else(|| ConfigError::MissingEnvironment(env.to_string()))
    }

    /// Working root for commands and relative paths
    pub fn root_dir(&self) -> PathBuf {
        let base = self
            .source_dir
            .clone()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| PathBuf::from("."));
        match &self.root {
            Some(root) => base.join(root),
            None => base,
        }
    }

    /// Set the directory relative paths resolve against
    pub fn with_source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source_dir = Some(dir.into());
        self
    }

    /// Convert config to a Pipeline domain model for one environment
    pub fn to_pipeline(&self, env: Environment) -> Result<Pipeline, ConfigError> {
        Pipeline::from_config(self, env)
    }
}

impl EnvironmentProfile {
    /// Overlay for `env`; the mode follows the environment unless set explicitly
    pub fn overlay_for(&self, env: Environment) -> ConfigRecord {
        let mut overlay = self.config.clone();
        if overlay.mode.is_none() {
            overlay.mode = Some(env.mode());
        }
        overlay
    }
}

/// Directory containing `path`; `.` for a bare file name
fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}

fn validate_assets(scope: &str, rules: &[AssetRule]) -> Result<(), ConfigError> {
    for (i, rule) in rules.iter().enumerate() {
        if rule.from.as_os_str().is_empty() {
            return Err(invalid(format!("{}[{}] has an empty source path", scope, i)));
        }
        match rule.destination() {
            None => {
                return Err(invalid(format!(
                    "{}[{}] ({}) has no file name; set an explicit destination",
                    scope,
                    i,
                    rule.from.display()
                )))
            }
            Some(dest) if rule.contained_destination().is_none() => {
                return Err(invalid(format!(
                    "{}[{}] destination must stay inside the output directory: {}",
                    scope,
                    i,
                    dest.display()
                )))
            }
            Some(_) => {}
        }
    }
    Ok(())
}
