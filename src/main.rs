use anyhow::{Context, Result};
use bundle_pipeline::cli::commands::{PlanCommand, RunCommand, ValidateCommand};
use bundle_pipeline::cli::output::*;
use bundle_pipeline::cli::{Cli, Command};
use bundle_pipeline::core::{Environment, PipelineConfig, PipelinePhase};
use bundle_pipeline::execution::{ExecutionEngine, ExecutionEvent};
use indicatif::ProgressBar;
use std::sync::Mutex;
use std::time::Instant;
use tracing::{error, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging; RUST_LOG wins over the verbosity flag
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("bundle_pipeline={}", log_level)));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    match &cli.command {
        Command::Run(cmd) => run_pipeline(cmd).await?,
        Command::Validate(cmd) => validate_pipeline(cmd)?,
        Command::Plan(cmd) => show_plan(cmd)?,
    }

    Ok(())
}

async fn run_pipeline(cmd: &RunCommand) -> Result<()> {
    let config = PipelineConfig::from_file(&cmd.file)
        .context("Failed to load pipeline config")?;
    let environment = Environment::from(cmd.env);

    println!(
        "{} Loaded pipeline: {} [{}]",
        INFO,
        style(&config.name).bold(),
        style(environment).cyan()
    );

    let mut pipeline = config
        .to_pipeline(environment)
        .context("Failed to resolve environment")?;

    let mut engine = ExecutionEngine::for_pipeline(&pipeline);

    // Console output, with a progress bar while assets are staged
    let asset_count = pipeline.assets.len();
    let progress: Mutex<Option<ProgressBar>> = Mutex::new(None);
    engine.add_event_handler(move |event| {
        let Ok(mut progress) = progress.lock() else {
            return;
        };

        if let ExecutionEvent::PhaseChanged { phase } = &event {
            if let Some(bar) = progress.take() {
                bar.finish_and_clear();
            }
            if *phase == PipelinePhase::Staging && asset_count > 0 {
                *progress = Some(create_progress_bar(asset_count));
            }
        }

        let Some(line) = format_execution_event(&event) else {
            return;
        };
        match (&event, progress.as_ref()) {
            (ExecutionEvent::Asset(_), Some(bar)) => {
                bar.println(line);
                bar.inc(1);
            }
            _ => println!("{}", line),
        }
    });

    println!();
    let started = Instant::now();
    let result = engine.execute(&mut pipeline).await;
    let elapsed = format_duration(started.elapsed());

    match result {
        Ok(handoff) => {
            println!(
                "\n{} {} completed {} in {}",
                CHECK,
                style(&pipeline.name).bold(),
                style("successfully").green(),
                style(elapsed).dim()
            );
            println!(
                "  Output: {}",
                style(handoff.output_dir.display()).cyan()
            );
            if cmd.emit_config {
                println!("\n{}", serde_json::to_string_pretty(&handoff.config)?);
            }
            Ok(())
        }
        Err(e) => {
            println!(
                "\n{} {} {} after {}",
                CROSS,
                style(&pipeline.name).bold(),
                style("failed").red(),
                style(elapsed).dim()
            );
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

fn validate_pipeline(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating pipeline...", INFO);

    match PipelineConfig::from_file(&cmd.file) {
        Ok(config) => {
            println!("{} Pipeline configuration is valid!", CHECK);
            println!("  Name: {}", style(&config.name).bold());
            println!("  Shared assets: {}", style(config.assets.len()).cyan());
            for (env, profile) in &config.environments {
                let steps: usize = profile.build.iter().map(|s| s.steps.len()).sum();
                println!(
                    "  {}: {} build step(s), {} asset(s)",
                    style(env).bold(),
                    style(steps).cyan(),
                    style(profile.assets.len()).cyan()
                );
            }
            if config.bundler.is_none() {
                println!("{} No bundler configured; runs stop after staging", WARN);
            }

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(e).red());
            std::process::exit(1);
        }
    }
}

fn show_plan(cmd: &PlanCommand) -> Result<()> {
    let config = PipelineConfig::from_file(&cmd.file)
        .context("Failed to load pipeline config")?;
    let pipeline = config
        .to_pipeline(Environment::from(cmd.env))
        .context("Failed to resolve environment")?;

    if cmd.json {
        let effective = pipeline.effective_config();
        let data = serde_json::json!({
            "name": pipeline.name,
            "environment": pipeline.environment,
            "root": pipeline.root,
            "config": effective,
            "missing": effective.missing_fields(),
            "build": pipeline.build,
            "assets": pipeline.assets,
            "bundler": pipeline.bundler,
        });
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        print!("{}", format_plan(&pipeline));
    }

    Ok(())
}
