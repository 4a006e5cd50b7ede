//! Error taxonomy for the pipeline

use crate::core::state::PipelinePhase;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration problems (file loading, validation, missing fields)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read pipeline file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse pipeline file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid pipeline configuration: {0}")]
    Invalid(String),

    #[error("Unknown environment '{0}' (expected 'development' or 'production')")]
    UnknownEnvironment(String),

    #[error("No profile declared for environment '{0}'")]
    MissingEnvironment(String),

    #[error("Effective configuration is missing required field '{0}'")]
    MissingField(&'static str),
}

/// External build command failures
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {}", describe_exit(.code))]
    Exited { command: String, code: Option<i32> },

    #[error("`{command}` timed out after {timeout_secs} seconds")]
    TimedOut { command: String, timeout_secs: u64 },
}

impl BuildError {
    /// The command that failed
    pub fn command(&self) -> &str {
        match self {
            BuildError::Spawn { command, .. }
            | BuildError::Exited { command, .. }
            | BuildError::TimedOut { command, .. } => command,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// Asset staging failures
#[derive(Debug, Error)]
pub enum StageError {
    #[error("Source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Destination already exists (set force to overwrite): {}", .0.display())]
    DestinationExists(PathBuf),

    #[error("Destination escapes the output directory: {}", .0.display())]
    DestinationOutsideOutput(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Bundler handoff failures
#[derive(Debug, Error)]
pub enum BundleError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Command(#[from] BuildError),
}

/// Any failure that aborts a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Build failed: {0}")]
    Build(#[from] BuildError),

    #[error("Staging failed: {0}")]
    Stage(#[from] StageError),

    #[error("Bundler handoff failed: {0}")]
    Bundle(#[from] BundleError),

    #[error("Invalid phase transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: PipelinePhase,
        to: PipelinePhase,
    },
}
