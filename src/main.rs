use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use salmon_rules::config::EngineConfig;
use salmon_rules::uci::UciHandler;

/// UCI chess engine backed by the salmon-rules game service.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// TOML file with engine settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Search depth in plies, overriding the config file
    #[arg(long)]
    depth: Option<u32>,

    /// AI strength from 1 to 6, overriding the config file
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=6))]
    level: Option<u8>,
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only protocol output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(depth) = args.depth {
        config.search_depth = depth;
    }
    if let Some(level) = args.level {
        config.ai_level = level;
    }
    info!(
        "starting engine at level {} depth {}",
        config.ai_level, config.search_depth
    );

    let mut uci = UciHandler::new(config);
    uci.run()
}
