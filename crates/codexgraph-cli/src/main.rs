mod cli;
mod config;
mod service;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use config::{Config, LogFormat};
use service::CodexGraphService;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load()?;

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    match config.logging.format {
        LogFormat::Pretty => codexgraph_logging::init_logging(&level)?,
        LogFormat::Json => codexgraph_logging::init_json_logging(&level)?,
    }

    let service = CodexGraphService::new(config);
    service.run(cli.command).await
}
