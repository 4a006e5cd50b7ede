//! Subprocess build runner
//!
//! Runs build stages in declared order. Within a stage the
//! [`ExecutionPolicy`] decides whether steps overlap. A stage is finished
//! only once every blocking step has exited successfully, so anything that
//! runs after [`BuildRunner::run`] returns `Ok` can rely on the artifacts
//! being on disk.

use crate::core::{BuildError, BuildStage, BuildStep, ExecutionPolicy};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Trait for command execution - allows for different implementations
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run the step's command to completion
    async fn execute(&self, step: &BuildStep) -> Result<(), BuildError>;
}

/// Runs commands through the platform shell with inherited stdout/stderr
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    /// Working directory for every command
    working_dir: PathBuf,

    /// Extra environment variables
    envs: Vec<(String, String)>,
}

impl ShellExecutor {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            envs: Vec::new(),
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    fn command(&self, command_line: &str) -> Command {
        let (shell, args) = shell();
        let mut command = Command::new(shell);
        command
            .args(args)
            .arg(command_line)
            .current_dir(&self.working_dir)
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        command
    }
}

#[cfg(unix)]
fn shell() -> (&'static str, &'static [&'static str]) {
    ("/bin/sh", &["-c"])
}

#[cfg(windows)]
fn shell() -> (&'static str, &'static [&'static str]) {
    ("cmd.exe", &["/C"])
}

#[async_trait]
impl CommandExecutor for ShellExecutor {
    async fn execute(&self, step: &BuildStep) -> Result<(), BuildError> {
        debug!(command = %step.command, working_dir = ?self.working_dir, "spawning build command");

        let mut child = self
            .command(&step.command)
            .spawn()
            .map_err(|source| BuildError::Spawn {
                command: step.command.clone(),
                source,
            })?;

        let status = match step.timeout_secs {
            Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), child.wait()).await {
                Ok(status) => status,
                Err(_) => {
                    warn!(command = %step.command, "build command timed out, killing it");
                    if let Err(e) = child.kill().await {
                        warn!("Failed to kill `{}`: {}", step.command, e);
                    }
                    return Err(BuildError::TimedOut {
                        command: step.command.clone(),
                        timeout_secs: secs,
                    });
                }
            },
            None => child.wait().await,
        }
        .map_err(|source| BuildError::Spawn {
            command: step.command.clone(),
            source,
        })?;

        if !status.success() {
            return Err(BuildError::Exited {
                command: step.command.clone(),
                code: status.code(),
            });
        }

        Ok(())
    }
}

/// Progress notifications from the runner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepEvent {
    Started {
        stage: String,
        step: String,
    },
    Finished {
        stage: String,
        step: String,
        error: Option<String>,
    },
}

/// Runs build stages against a [`CommandExecutor`]
pub struct BuildRunner<E> {
    executor: Arc<E>,
}

impl<E: CommandExecutor + 'static> BuildRunner<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor: Arc::new(executor),
        }
    }

    pub fn from_shared(executor: Arc<E>) -> Self {
        Self { executor }
    }

    /// Run every stage in order, stopping at the first blocking failure
    pub async fn run(&self, stages: &[BuildStage]) -> Result<(), BuildError> {
        self.run_observed(stages, &|_| {}).await
    }

    /// Same as [`run`](Self::run), reporting step progress to `observer`
    pub async fn run_observed(
        &self,
        stages: &[BuildStage],
        observer: &(dyn Fn(StepEvent) + Send + Sync),
    ) -> Result<(), BuildError> {
        for stage in stages {
            info!(
                "Running build stage '{}' ({} steps, {:?})",
                stage.name,
                stage.steps.len(),
                stage.policy
            );
            match stage.policy {
                ExecutionPolicy::Sequential => self.run_sequential(stage, observer).await?,
                ExecutionPolicy::ConcurrentUnordered => self.run_concurrent(stage, observer).await?,
            }
        }
        Ok(())
    }

    async fn run_sequential(
        &self,
        stage: &BuildStage,
        observer: &(dyn Fn(StepEvent) + Send + Sync),
    ) -> Result<(), BuildError> {
        for step in &stage.steps {
            observer(started(stage, step));
            info!("Running `{}`", step.command);

            match self.executor.execute(step).await {
                Ok(()) => observer(finished(stage, step, None)),
                Err(e) if step.blocking => {
                    observer(finished(stage, step, Some(&e)));
                    return Err(e);
                }
                Err(e) => {
                    // Non-blocking steps are still awaited so nothing overlaps.
                    warn!("Non-blocking step '{}' failed: {}", step.label(), e);
                    observer(finished(stage, step, Some(&e)));
                }
            }
        }
        Ok(())
    }

    async fn run_concurrent(
        &self,
        stage: &BuildStage,
        observer: &(dyn Fn(StepEvent) + Send + Sync),
    ) -> Result<(), BuildError> {
        let mut blocking = JoinSet::new();

        for step in &stage.steps {
            observer(started(stage, step));
            info!("Launching `{}`", step.command);

            let executor = Arc::clone(&self.executor);
            let owned = step.clone();

            if step.blocking {
                blocking.spawn(async move {
                    let result = executor.execute(&owned).await;
                    (owned, result)
                });
            } else {
                tokio::spawn(async move {
                    match executor.execute(&owned).await {
                        Ok(()) => debug!("Detached step '{}' finished", owned.label()),
                        Err(e) => warn!("Detached step '{}' failed: {}", owned.label(), e),
                    }
                });
            }
        }

        while let Some(joined) = blocking.join_next().await {
            match joined {
                Ok((step, Ok(()))) => observer(finished(stage, &step, None)),
                Ok((step, Err(e))) => {
                    observer(finished(stage, &step, Some(&e)));
                    blocking.shutdown().await;
                    return Err(e);
                }
                Err(join_error) => {
                    // The task panicked, so the step it ran is unknown here.
                    let command = format!("<stage {}>", stage.name);
                    warn!("Build task in stage '{}' aborted: {}", stage.name, join_error);
                    blocking.shutdown().await;
                    return Err(BuildError::Exited { command, code: None });
                }
            }
        }

        Ok(())
    }
}

fn started(stage: &BuildStage, step: &BuildStep) -> StepEvent {
    StepEvent::Started {
        stage: stage.name.clone(),
        step: step.label().to_string(),
    }
}

fn finished(stage: &BuildStage, step: &BuildStep, error: Option<&BuildError>) -> StepEvent {
    StepEvent::Finished {
        stage: stage.name.clone(),
        step: step.label().to_string(),
        error: error.map(|e| e.to_string()),
    }
}
