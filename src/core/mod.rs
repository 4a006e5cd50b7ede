//! Core domain models for the bundle pipeline
//!
//! This module defines the configuration records, build steps, asset rules
//! and execution state a pipeline run is made of.

pub mod asset;
pub mod config;
pub mod error;
pub mod merge;
pub mod pipeline;
pub mod state;
pub mod step;
pub mod transform;

pub use asset::*;
pub use config::{Environment, PipelineConfig};
pub use error::*;
pub use merge::{merge, ConfigRecord, EffectiveConfig, Mode};
pub use pipeline::*;
pub use state::*;
pub use step::*;
pub use transform::Transform;
