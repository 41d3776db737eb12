//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Radar Sim - long-range radar scenarios on a simulated episode
#[derive(Parser, Debug)]
#[command(
    name = "radar-sim",
    author,
    version,
    about = "Long-range radar scenario runner",
    long_about = "Spawns actors and long-range radars from a scenario file, ticks the \n\
                  episode and writes one radar event per sensor and frame as JSON lines."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "RADAR_SIM_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "RADAR_SIM_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a scenario and stream radar events
    Run(RunArgs),

    /// Validate a scenario file without running it
    Validate(ValidateArgs),

    /// Display scenario information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to scenario file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "scenario.toml",
        env = "RADAR_SIM_CONFIG"
    )]
    pub config: PathBuf,

    /// Number of episode frames to record (0 = unlimited)
    #[arg(long, default_value = "0", env = "RADAR_SIM_MAX_FRAMES")]
    pub max_frames: u64,

    /// Run timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "RADAR_SIM_TIMEOUT")]
    pub timeout: u64,

    /// Write events to this file instead of stdout
    #[arg(short, long, env = "RADAR_SIM_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Event queue capacity between the tick thread and the writer
    #[arg(long, default_value = "256", env = "RADAR_SIM_BUFFER_SIZE")]
    pub buffer_size: usize,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "RADAR_SIM_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to scenario file to validate
    #[arg(short, long, default_value = "scenario.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to scenario file
    #[arg(short, long, default_value = "scenario.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show actor poses and velocities
    #[arg(long)]
    pub actors: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
