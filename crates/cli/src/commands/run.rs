//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_scenario(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading scenario");

    if !args.config.exists() {
        return Err(CliError::config_not_found(&args.config).into());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    info!(
        actors = blueprint.actors.len(),
        radars = blueprint.radars.len(),
        fixed_delta_seconds = blueprint.episode.fixed_delta_seconds,
        "Scenario loaded"
    );

    if args.dry_run {
        info!("Dry run mode - scenario is valid, exiting");
        print_scenario_summary(&blueprint);
        return Ok(());
    }

    let pipeline = Pipeline::new(PipelineConfig {
        blueprint,
        max_frames: (args.max_frames > 0).then_some(args.max_frames),
        timeout: (args.timeout > 0).then(|| Duration::from_secs(args.timeout)),
        buffer_size: args.buffer_size.max(1),
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
        output: args.output.clone(),
    });

    tokio::select! {
        result = pipeline.run() => {
            let stats = result.context("Pipeline execution failed")?;
            info!(
                events = stats.events_written,
                dropped = stats.events_dropped,
                frames = stats.frames(),
                duration_secs = stats.duration.as_secs_f64(),
                "Pipeline completed"
            );
            stats.print_summary();
        }
        _ = shutdown_signal() => {
            warn!("Received shutdown signal, stopping pipeline...");
        }
    }

    info!("radar-sim finished");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
///
/// A handler that cannot be installed never resolves.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print scenario summary for dry-run mode
fn print_scenario_summary(blueprint: &contracts::ScenarioBlueprint) {
    println!("\n=== Scenario Summary ===\n");
    println!("Episode:");
    println!(
        "  Fixed delta: {}s",
        blueprint.episode.fixed_delta_seconds
    );
    println!("  Tick interval: {}ms", blueprint.episode.tick_interval_ms);
    println!("\nActors ({}):", blueprint.actors.len());
    for actor in &blueprint.actors {
        println!("  - {} ({})", actor.id, actor.kind.as_str());
    }
    println!("\nRadars ({}):", blueprint.radars.len());
    for radar in &blueprint.radars {
        println!("  - {} on {}", radar.id, radar.parent);
    }
    println!();
}
