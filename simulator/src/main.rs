use anyhow::Context;
use clap::Parser;
use commonware_runtime::{tokio, Runner};
use gamba_execution::Memory;
use gamba_simulator::{run, SimulatorConfig};
use std::{path::PathBuf, str::FromStr};
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML file with `ledger`, `workload` and `log_level` sections
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the configured number of rounds
    #[arg(short, long)]
    rounds: Option<u64>,

    /// Overrides the configured number of users
    #[arg(short, long)]
    users: Option<u64>,
}

fn load(args: &Args) -> anyhow::Result<SimulatorConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_yaml::from_str(&contents)
                .with_context(|| format!("failed to parse {}", path.display()))?
        }
        None => SimulatorConfig::default(),
    };
    if let Some(rounds) = args.rounds {
        config.workload.rounds = rounds;
    }
    if let Some(users) = args.users {
        config.workload.users = users;
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    // Parse args
    let args = Args::parse();
    let config = load(&args)?;

    // Create logger
    let level = Level::from_str(&config.log_level).context("invalid log level")?;
    tracing_subscriber::fmt().with_max_level(level).init();

    // Start runtime
    let executor = tokio::Runner::new(tokio::Config::default().with_catch_panics(true));
    let summary = executor.start(|context| async move {
        run(context, Memory::default(), config.ledger, &config.workload).await
    })?;
    info!(verified = summary.verified, "simulation complete");

    let output = serde_json::to_string_pretty(&summary).context("failed to render summary")?;
    println!("{output}");
    Ok(())
}
