//! CLI command definitions

use crate::core::Environment;
use clap::Args;
use std::path::PathBuf;

/// Run a pipeline
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to pipeline YAML file
    #[arg(short, long, default_value = "pipeline.yaml")]
    pub file: PathBuf,

    /// Target environment
    #[arg(short, long, value_enum)]
    pub env: EnvironmentArg,

    /// Print the effective configuration as JSON once the run succeeds
    #[arg(long)]
    pub emit_config: bool,
}

/// Validate a pipeline configuration
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to pipeline YAML file
    #[arg(short, long, default_value = "pipeline.yaml")]
    pub file: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Show the resolved plan for one environment
#[derive(Debug, Args, Clone)]
pub struct PlanCommand {
    /// Path to pipeline YAML file
    #[arg(short, long, default_value = "pipeline.yaml")]
    pub file: PathBuf,

    /// Target environment
    #[arg(short, long, value_enum)]
    pub env: EnvironmentArg,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Environment argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum EnvironmentArg {
    Development,
    Production,
}

impl From<EnvironmentArg> for Environment {
    fn from(arg: EnvironmentArg) -> Self {
        match arg {
            EnvironmentArg::Development => Environment::Development,
            EnvironmentArg::Production => Environment::Production,
        }
    }
}
