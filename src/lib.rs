//! bundle-pipeline - builds the native backend and wasm module, then stages a deployable web bundle

pub mod cli;
pub mod core;
pub mod execution;

// Re-export commonly used types
pub use crate::core::{
    AssetRule, BuildStage, BuildStep, ConfigRecord, EffectiveConfig, Environment, ExecutionPolicy, Mode, Pipeline,
    PipelineConfig, PipelineError, PipelinePhase, Transform,
};
pub use crate::execution::{AssetStager, BuildRunner, BundleHandoff, ExecutionEngine, ExecutionEvent, ShellExecutor};
