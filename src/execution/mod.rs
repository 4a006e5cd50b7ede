//! Pipeline execution: build runner, asset stager, bundler handoff and the engine driving them

pub mod bundler;
pub mod engine;
pub mod runner;
pub mod stager;

pub use bundler::{BundleHandoff, Bundler, CommandBundler, NoopBundler};
pub use engine::{EventHandler, ExecutionEngine, ExecutionEvent};
pub use runner::{BuildRunner, CommandExecutor, ShellExecutor, StepEvent};
pub use stager::{AssetStager, StageEvent, StageReport, StagedAsset};
