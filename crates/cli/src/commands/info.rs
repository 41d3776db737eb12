//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{ScenarioBlueprint, Transform, Vector3D};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Scenario info for JSON output
#[derive(Serialize)]
struct ScenarioInfo {
    version: String,
    episode: EpisodeInfo,
    actors: Vec<ActorInfo>,
    radars: Vec<RadarInfo>,
}

#[derive(Serialize)]
struct EpisodeInfo {
    fixed_delta_seconds: f64,
    tick_interval_ms: u64,
    start_frame: u64,
}

#[derive(Serialize)]
struct ActorInfo {
    id: String,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    blueprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    transform: Option<Transform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    velocity: Option<Vector3D>,
}

#[derive(Serialize)]
struct RadarInfo {
    id: String,
    parent: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading scenario info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_scenario_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize scenario info")?;
        println!("{}", json);
    } else {
        print_scenario_info(&blueprint, args);
    }

    Ok(())
}

fn build_scenario_info(blueprint: &ScenarioBlueprint, args: &InfoArgs) -> ScenarioInfo {
    let actors = blueprint
        .actors
        .iter()
        .map(|a| ActorInfo {
            id: a.id.clone(),
            kind: a.kind.as_str(),
            blueprint: a.blueprint.clone(),
            transform: args.actors.then_some(a.transform),
            velocity: args.actors.then_some(a.velocity),
        })
        .collect();

    let radars = blueprint
        .radars
        .iter()
        .map(|r| RadarInfo {
            id: r.id.clone(),
            parent: r.parent.clone(),
        })
        .collect();

    ScenarioInfo {
        version: format!("{:?}", blueprint.version),
        episode: EpisodeInfo {
            fixed_delta_seconds: blueprint.episode.fixed_delta_seconds,
            tick_interval_ms: blueprint.episode.tick_interval_ms,
            start_frame: blueprint.episode.start_frame,
        },
        actors,
        radars,
    }
}

fn print_scenario_info(blueprint: &ScenarioBlueprint, args: &InfoArgs) {
    println!("=== Radar Scenario ===\n");

    println!("Episode");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!(
        "   ├─ Fixed delta: {}s",
        blueprint.episode.fixed_delta_seconds
    );
    println!(
        "   ├─ Tick interval: {}ms",
        blueprint.episode.tick_interval_ms
    );
    println!("   └─ Start frame: {}", blueprint.episode.start_frame);

    println!("\nActors ({})", blueprint.actors.len());
    for (i, actor) in blueprint.actors.iter().enumerate() {
        let prefix = if i + 1 == blueprint.actors.len() { "└─" } else { "├─" };
        println!("   {} {} ({})", prefix, actor.id, actor.kind.as_str());
        if args.actors {
            let loc = actor.transform.location;
            println!(
                "        at ({:.1}, {:.1}, {:.1}), speed {:.2} m/s",
                loc.x,
                loc.y,
                loc.z,
                actor.velocity.length()
            );
        }
    }

    println!("\nRadars ({})", blueprint.radars.len());
    for (i, radar) in blueprint.radars.iter().enumerate() {
        let prefix = if i + 1 == blueprint.radars.len() { "└─" } else { "├─" };
        println!("   {} {} -> {}", prefix, radar.id, radar.parent);
    }

    println!();
}
