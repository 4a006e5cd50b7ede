//! Execution state models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Phase of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    /// Not started
    Idle,
    /// Resolving the effective configuration
    Merging,
    /// Running external build commands
    Building,
    /// Copying assets into the output directory
    Staging,
    /// Handing off to the bundler
    Bundling,
    /// Finished successfully
    Done,
    /// Aborted on a build, staging or handoff error
    Failed,
}

impl PipelinePhase {
    /// Check if the phase is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelinePhase::Done | PipelinePhase::Failed)
    }

    /// Whether `self -> next` is a legal transition
    pub fn can_transition_to(&self, next: PipelinePhase) -> bool {
        use PipelinePhase::*;
        matches!(
            (self, next),
            (Idle, Merging)
                | (Merging, Building)
                | (Building, Staging)
                | (Staging, Bundling)
                | (Bundling, Done)
                | (Building, Failed)
                | (Staging, Failed)
                | (Bundling, Failed)
        )
    }
}

/// Record of one phase the pipeline went through
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub phase: PipelinePhase,
    pub entered_at: DateTime<Utc>,
}

/// Overall pipeline state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    /// Unique execution ID
    pub execution_id: Uuid,

    /// Current phase
    pub phase: PipelinePhase,

    /// When execution started
    pub started_at: Option<DateTime<Utc>>,

    /// When execution reached Done or Failed
    pub completed_at: Option<DateTime<Utc>>,

    /// Every phase entered, in order
    pub history: Vec<PhaseRecord>,

    /// Error message when the run failed
    pub error: Option<String>,
}

impl PipelineState {
    /// Create a new pipeline state
    pub fn new() -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            phase: PipelinePhase::Idle,
            started_at: None,
            completed_at: None,
            history: vec![PhaseRecord {
                phase: PipelinePhase::Idle,
                entered_at: Utc::now(),
            }],
            error: None,
        }
    }

    /// Move to `next`, returning the rejected pair on an illegal transition
    pub fn advance(&mut self, next: PipelinePhase) -> Result<(), (PipelinePhase, PipelinePhase)> {
        if !self.phase.can_transition_to(next) {
            return Err((self.phase, next));
        }

        let now = Utc::now();
        if self.phase == PipelinePhase::Idle {
            self.started_at = Some(now);
        }
        if next.is_terminal() {
            self.completed_at = Some(now);
        }

        self.phase = next;
        self.history.push(PhaseRecord {
            phase: next,
            entered_at: now,
        });
        Ok(())
    }

    /// Mark the run as failed from its current phase
    pub fn fail(&mut self, error: String) -> Result<(), (PipelinePhase, PipelinePhase)> {
        self.advance(PipelinePhase::Failed)?;
        self.error = Some(error);
        Ok(())
    }

    /// Phases entered so far, in order
    pub fn phases(&self) -> Vec<PipelinePhase> {
        self.history.iter().map(|r| r.phase).collect()
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}
