//! Scenario-based tests for bundle-pipeline

mod bundler_handoff;
mod development;
mod production;
mod staging_conflicts;
