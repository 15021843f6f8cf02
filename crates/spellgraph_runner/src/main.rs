// SPDX-License-Identifier: MIT OR Apache-2.0
//! `spellgraph` - run effect graphs from the command line.
//!
//! Loads a graph description (`.ron` or `.json`), lints it, and runs it
//! against an in-memory sandbox host: the root branch first, then any
//! number of simulated auto attacks for event-driven effects.

mod app;
mod config;
mod error;
mod loader;

use app::EffectRunner;
use clap::Parser;
use config::{RunnerConfig, CONFIG_FILE_NAME};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "spellgraph", version, about = "Run SpellGraph effect graphs")]
struct Cli {
    /// Effect graph description (.ron or .json)
    #[arg(required_unless_present = "write_config")]
    effect: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    /// Only lint the graph and report issues
    #[arg(long)]
    check: bool,

    /// Number of auto attacks to simulate (overrides the config)
    #[arg(long)]
    auto_attacks: Option<u32>,

    /// Write the effective config to the config path and exit
    #[arg(long)]
    write_config: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Config first so its log filter applies; report load failures after init
    let (config, config_error) = match RunnerConfig::load_or_default(&cli.config) {
        Ok(config) => (config, None),
        Err(e) => (RunnerConfig::default(), Some(e)),
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Some(e) = config_error {
        tracing::error!("Failed to load config: {e}");
        return ExitCode::FAILURE;
    }

    tracing::info!("Starting spellgraph v{}", env!("CARGO_PKG_VERSION"));

    if cli.write_config {
        return match config.save(&cli.config) {
            Ok(()) => {
                tracing::info!(path = %cli.config.display(), "config written");
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!("Failed to write config: {e}");
                ExitCode::FAILURE
            }
        };
    }
    let Some(effect) = cli.effect else {
        tracing::error!("No effect given");
        return ExitCode::FAILURE;
    };

    let auto_attacks = cli.auto_attacks.unwrap_or(config.auto_attacks);
    let runner = EffectRunner::new(config);

    let graph = match runner.load(&effect) {
        Ok(graph) => graph,
        Err(e) => {
            tracing::error!("Failed to load effect: {e}");
            return ExitCode::FAILURE;
        }
    };

    let issues = runner.check(&graph);
    for issue in &issues {
        tracing::warn!(graph = %graph.name, "{issue}");
    }
    if cli.check {
        tracing::info!(graph = %graph.name, issues = issues.len(), "check finished");
        return if issues.is_empty() {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(2)
        };
    }

    match runner.run(graph, auto_attacks).await {
        Ok(report) => {
            report.log();
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Effect failed: {e}");
            ExitCode::FAILURE
        }
    }
}
