//! # Radar Sim CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 场景配置加载与验证
//! - Episode 驱动与雷达事件输出
//! - 优雅关闭处理

mod cli;
mod commands;
mod error;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_info, run_scenario, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "radar-sim starting");

    let result = match &cli.command {
        Commands::Run(args) => run_scenario(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging based on CLI options
fn init_logging(cli: &Cli) -> Result<()> {
    observability::init_with_config(observability::ObservabilityConfig::from_verbosity(
        cli.log_format.into(),
        cli.verbose,
        cli.quiet,
    ))
}
