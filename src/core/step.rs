//! Build step and stage models

use serde::{Deserialize, Serialize};

/// How the steps of one stage are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionPolicy {
    /// One step at a time, in declared order. Steps never overlap.
    #[default]
    Sequential,

    /// Launch every step in declared order without waiting in between;
    /// the stage ends once all blocking steps have exited.
    ConcurrentUnordered,
}

/// One external command invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStep {
    /// Display name (defaults to the command)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Shell command line
    pub command: String,

    /// Whether the pipeline must wait for (and succeed on) this step
    #[serde(default = "default_blocking")]
    pub blocking: bool,

    /// Kill the command after this many seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_blocking() -> bool {
    true
}

impl BuildStep {
    /// A blocking step with no timeout
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            name: None,
            command: command.into(),
            blocking: true,
            timeout_secs: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn non_blocking(mut self) -> Self {
        self.blocking = false;
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Name used in logs and events
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.command)
    }
}

/// An ordered group of build steps sharing one scheduling policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStage {
    pub name: String,

    #[serde(default)]
    pub policy: ExecutionPolicy,

    pub steps: Vec<BuildStep>,
}

impl BuildStage {
    /// A sequential stage
    pub fn sequential(name: impl Into<String>, steps: Vec<BuildStep>) -> Self {
        Self {
            name: name.into(),
            policy: ExecutionPolicy::Sequential,
            steps,
        }
    }

    /// A concurrent stage
    pub fn concurrent(name: impl Into<String>, steps: Vec<BuildStep>) -> Self {
        Self {
            name: name.into(),
            policy: ExecutionPolicy::ConcurrentUnordered,
            steps,
        }
    }
}
