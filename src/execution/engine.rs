//! Main execution engine - drives one pipeline run through its phases

use crate::{
    core::{ConfigError, EffectiveConfig, Environment, Pipeline, PipelineError, PipelinePhase, PipelineState},
    execution::{
        bundler::{bundler_for, BundleHandoff, Bundler},
        runner::{BuildRunner, CommandExecutor, ShellExecutor, StepEvent},
        stager::{AssetStager, StageEvent},
    },
};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Events that can occur during pipeline execution
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    PipelineStarted {
        execution_id: Uuid,
        pipeline_name: String,
        environment: Environment,
    },
    PhaseChanged {
        phase: PipelinePhase,
    },
    ConfigResolved {
        config: EffectiveConfig,
    },
    /// The environment declares no build steps
    BuildSkipped,
    Step(StepEvent),
    Asset(StageEvent),
    PipelineCompleted {
        execution_id: Uuid,
        phase: PipelinePhase,
        error: Option<String>,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

/// Main pipeline execution engine
pub struct ExecutionEngine<E, B> {
    runner: BuildRunner<E>,
    bundler: B,
    event_handlers: Vec<EventHandler>,
}

impl ExecutionEngine<ShellExecutor, Box<dyn Bundler>> {
    /// Engine that runs commands through the shell in the pipeline root and
    /// hands off to the pipeline's configured bundler
    pub fn for_pipeline(pipeline: &Pipeline) -> Self {
        Self::new(
            ShellExecutor::new(pipeline.root()),
            bundler_for(pipeline.bundler.as_ref(), pipeline.root()),
        )
    }
}

impl<E: CommandExecutor + 'static, B: Bundler> ExecutionEngine<E, B> {
    pub fn new(executor: E, bundler: B) -> Self {
        Self {
            runner: BuildRunner::new(executor),
            bundler,
            event_handlers: Vec::new(),
        }
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
    }

    /// Emit an event to all handlers
    fn emit_event(&self, event: ExecutionEvent) {
        for handler in &self.event_handlers {
            handler(event.clone());
        }
    }

    /// Execute the pipeline: merge, build, stage, hand off
    ///
    /// Every phase finishes before the next one begins. The pipeline's state
    /// is reset first, so each call is a fresh run starting from `Idle`.
    pub async fn execute(&self, pipeline: &mut Pipeline) -> Result<BundleHandoff, PipelineError> {
        pipeline.state = PipelineState::new();
        let execution_id = pipeline.state.execution_id;

        info!(
            "Starting pipeline execution: {} [{}] ({})",
            pipeline.name, pipeline.environment, execution_id
        );
        self.emit_event(ExecutionEvent::PipelineStarted {
            execution_id,
            pipeline_name: pipeline.name.clone(),
            environment: pipeline.environment,
        });

        // Merging
        self.transition(pipeline, PipelinePhase::Merging)?;
        let config = pipeline.effective_config();
        for field in config.missing_fields() {
            warn!("Effective configuration has no '{}'; the bundler may reject it", field);
        }
        self.emit_event(ExecutionEvent::ConfigResolved {
            config: config.clone(),
        });

        // Building
        self.transition(pipeline, PipelinePhase::Building)?;
        if pipeline.requires_build() {
            let observer = |event: StepEvent| self.emit_event(ExecutionEvent::Step(event));
            if let Err(e) = self.runner.run_observed(&pipeline.build, &observer).await {
                return self.abort(pipeline, e.into());
            }
        } else {
            info!("No build steps for {}", pipeline.environment);
            self.emit_event(ExecutionEvent::BuildSkipped);
        }

        // Staging
        self.transition(pipeline, PipelinePhase::Staging)?;
        let output_dir = match pipeline.output_dir(&config) {
            Some(dir) => dir,
            None => return self.abort(pipeline, ConfigError::MissingField("output_path").into()),
        };
        let stager = AssetStager::new(pipeline.root());
        let observer = |event: &StageEvent| self.emit_event(ExecutionEvent::Asset(event.clone()));
        if let Err(e) = stager
            .stage_observed(&pipeline.assets, &output_dir, &observer)
            .await
        {
            return self.abort(pipeline, e.into());
        }

        // Bundling
        self.transition(pipeline, PipelinePhase::Bundling)?;
        let handoff = BundleHandoff {
            execution_id,
            environment: pipeline.environment,
            config,
            output_dir,
        };
        if let Err(e) = self.bundler.bundle(&handoff).await {
            return self.abort(pipeline, e.into());
        }

        self.transition(pipeline, PipelinePhase::Done)?;
        info!("Pipeline execution finished: {} - Done", pipeline.name);
        self.emit_event(ExecutionEvent::PipelineCompleted {
            execution_id,
            phase: PipelinePhase::Done,
            error: None,
        });

        Ok(handoff)
    }

    fn transition(&self, pipeline: &mut Pipeline, next: PipelinePhase) -> Result<(), PipelineError> {
        pipeline
            .state
            .advance(next)
            .map_err(|(from, to)| PipelineError::InvalidTransition { from, to })?;
        self.emit_event(ExecutionEvent::PhaseChanged { phase: next });
        Ok(())
    }

    /// Record the failure and stop the run
    fn abort(&self, pipeline: &mut Pipeline, err: PipelineError) -> Result<BundleHandoff, PipelineError> {
        error!("Pipeline {} failed during {:?}: {}", pipeline.name, pipeline.state.phase, err);

        if let Err((from, to)) = pipeline.state.fail(err.to_string()) {
            warn!("Cannot mark pipeline failed from {:?} to {:?}", from, to);
        } else {
            self.emit_event(ExecutionEvent::PhaseChanged {
                phase: PipelinePhase::Failed,
            });
        }

        self.emit_event(ExecutionEvent::PipelineCompleted {
            execution_id: pipeline.state.execution_id,
            phase: pipeline.state.phase,
            error: Some(err.to_string()),
        });
        Err(err)
    }
}
