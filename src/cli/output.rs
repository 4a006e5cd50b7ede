//! CLI output formatting

use crate::{
    core::{AssetRule, EffectiveConfig, ExecutionPolicy, Pipeline, PipelinePhase},
    execution::{ExecutionEvent, StageEvent, StepEvent},
};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");
pub static PACKAGE: Emoji<'_, '_> = Emoji("📦 ", "+ ");

/// Create a progress bar for the staging pass
pub fn create_progress_bar(total: usize) -> ProgressBar {
    let progress = ProgressBar::new(total as u64);
    let template = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    progress.set_style(template.progress_chars("#>-"));
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// Format a pipeline phase for display
pub fn format_phase(phase: PipelinePhase) -> String {
    match phase {
        PipelinePhase::Idle => style("IDLE").dim().to_string(),
        PipelinePhase::Merging => style("MERGING").cyan().to_string(),
        PipelinePhase::Building => style("BUILDING").yellow().to_string(),
        PipelinePhase::Staging => style("STAGING").yellow().to_string(),
        PipelinePhase::Bundling => style("BUNDLING").blue().to_string(),
        PipelinePhase::Done => style("DONE").green().to_string(),
        PipelinePhase::Failed => style("FAILED").red().to_string(),
    }
}

/// Format an execution event for display
///
/// Returns `None` for events that are not worth a line of their own.
pub fn format_execution_event(event: &ExecutionEvent) -> Option<String> {
    let line = match event {
        ExecutionEvent::PipelineStarted {
            execution_id,
            pipeline_name,
            environment,
        } => format!(
            "{} Starting pipeline {} [{}] ({})",
            ROCKET,
            style(pipeline_name).bold(),
            style(environment).cyan(),
            style(&execution_id.to_string()[..8]).dim()
        ),
        ExecutionEvent::PhaseChanged { phase } => match phase {
            PipelinePhase::Done | PipelinePhase::Failed => return None,
            _ => format!("{} {}", INFO, format_phase(*phase)),
        },
        ExecutionEvent::ConfigResolved { config } => {
            let missing = config.missing_fields();
            if missing.is_empty() {
                return None;
            }
            format!(
                "{} Effective configuration is missing: {}",
                WARN,
                style(missing.join(", ")).yellow()
            )
        }
        ExecutionEvent::BuildSkipped => format!("{} {}", INFO, style("No build steps").dim()),
        ExecutionEvent::Step(StepEvent::Started { stage, step }) => {
            format!("{} {} {}", SPINNER, style(stage).dim(), style(step).cyan())
        }
        ExecutionEvent::Step(StepEvent::Finished { stage, step, error }) => match error {
            None => format!("{} {} {}", CHECK, style(stage).dim(), style(step).green()),
            Some(error) => format!("{} {} {}: {}", CROSS, style(stage).dim(), style(step).red(), error),
        },
        ExecutionEvent::Asset(event) => format_stage_event(event),
        ExecutionEvent::PipelineCompleted {
            execution_id,
            phase,
            error,
        } => match error {
            None => format!(
                "{} Pipeline ({}) {}",
                INFO,
                style(&execution_id.to_string()[..8]).dim(),
                format_phase(*phase)
            ),
            Some(error) => format!(
                "{} Pipeline ({}) {}: {}",
                CROSS,
                style(&execution_id.to_string()[..8]).dim(),
                format_phase(*phase),
                style(error).red()
            ),
        },
    };
    Some(line)
}

/// Format one staging outcome
pub fn format_stage_event(event: &StageEvent) -> String {
    match event {
        StageEvent::Staged(asset) => {
            let mut line = format!(
                "{} {} → {} ({} bytes)",
                PACKAGE,
                asset.source.display(),
                style(asset.destination.display()).green(),
                asset.bytes
            );
            if asset.transformed {
                line.push_str(&format!(" {}", style("[transformed]").dim()));
            }
            if asset.overwritten {
                line.push_str(&format!(" {}", style("[overwritten]").dim()));
            }
            line
        }
        StageEvent::Skipped { source } => format!(
            "{} {} {}",
            WARN,
            source.display(),
            style("(optional, not found)").dim()
        ),
        StageEvent::Failed { source, error } => {
            format!("{} {}: {}", CROSS, style(source.display()).red(), error)
        }
    }
}

/// Format the effective configuration as indented `key: value` lines
pub fn format_config(config: &EffectiveConfig) -> String {
    let show = |value: Option<String>| match value {
        Some(v) => style(v).cyan().to_string(),
        None => style("(unset)").red().to_string(),
    };

    let mut out = String::new();
    out.push_str(&format!("  entry_point: {}\n", show(config.entry_point().map(str::to_string))));
    out.push_str(&format!(
        "  output_path: {}\n",
        show(config.output_path().map(|p| p.display().to_string()))
    ));
    out.push_str(&format!(
        "  output_filename: {}\n",
        show(config.output_filename().map(str::to_string))
    ));
    out.push_str(&format!("  mode: {}\n", show(config.mode().map(|m| m.to_string()))));
    out.push_str(&format!(
        "  performance_hints: {}\n",
        show(config.performance_hints().map(|h| h.to_string()))
    ));
    for key in config.extra().keys() {
        out.push_str(&format!("  {}: {}\n", key, style("(passed through)").dim()));
    }
    out
}

/// Format the plan of a pipeline run
pub fn format_plan(pipeline: &Pipeline) -> String {
    let mut out = format!(
        "{} Plan for {} [{}]\n\n{}\n",
        INFO,
        style(&pipeline.name).bold(),
        style(pipeline.environment).cyan(),
        style("Effective configuration").bold()
    );
    out.push_str(&format_config(&pipeline.effective_config()));

    out.push_str(&format!("\n{}\n", style("Build").bold()));
    if pipeline.build.is_empty() {
        out.push_str(&format!("  {}\n", style("(none)").dim()));
    }
    for stage in &pipeline.build {
        let policy = match stage.policy {
            ExecutionPolicy::Sequential => "sequential",
            ExecutionPolicy::ConcurrentUnordered => "concurrent",
        };
        out.push_str(&format!("  {} ({})\n", style(&stage.name).bold(), style(policy).dim()));
        for (i, step) in stage.steps.iter().enumerate() {
            let blocking = if step.blocking { "" } else { " [non-blocking]" };
            out.push_str(&format!("    {}. {}{}\n", i + 1, step.command, style(blocking).dim()));
        }
    }

    out.push_str(&format!("\n{}\n", style("Assets").bold()));
    if pipeline.assets.is_empty() {
        out.push_str(&format!("  {}\n", style("(none)").dim()));
    }
    for rule in &pipeline.assets {
        out.push_str(&format!("  {}\n", format_rule(rule)));
    }
    out
}

fn format_rule(rule: &AssetRule) -> String {
    let destination = rule
        .destination()
        .map(|d| d.display().to_string())
        .unwrap_or_else(|| "?".to_string());
    let mut flags = Vec::new();
    if rule.force {
        flags.push("force".to_string());
    }
    if !rule.required {
        flags.push("optional".to_string());
    }
    if let Some(transform) = &rule.transform {
        flags.push(transform.name().to_string());
    }

    let mut line = format!("{} → {}", rule.from.display(), destination);
    if !flags.is_empty() {
        line.push_str(&format!(" {}", style(format!("[{}]", flags.join(", "))).dim()));
    }
    line
}

/// Format a duration compactly
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}.{:01}s", secs, duration.subsec_millis() / 100)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
