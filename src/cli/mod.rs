//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{PlanCommand, RunCommand, ValidateCommand};
use std::ffi::OsString;

/// Build and stage a deployable web bundle
#[derive(Debug, Parser, Clone)]
#[command(name = "bundle-pipeline")]
#[command(author = "bundle-pipeline Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Builds native and wasm artifacts, then stages a web bundle", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Build, stage and hand off to the bundler
    Run(RunCommand),

    /// Validate a pipeline file
    Validate(ValidateCommand),

    /// Show what a run would do without executing anything
    Plan(PlanCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
