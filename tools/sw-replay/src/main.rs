//! Scenario replay harness for the PWAKit service worker.
//!
//! Runs a JSON scenario of host actions and worker events against the
//! in-memory host and prints a JSON report, one entry per step.
//!
//! ## Usage
//!
//! ```bash
//! # Replay a scenario
//! sw-replay scenarios/offline-shell.json
//!
//! # Override the worker config and write the report to a file
//! sw-replay scenarios/push-click.json --config worker.json --output report.json -v
//! ```

use clap::Parser;
use pwakit_common::{try_init_logging, LogConfig, LogFormat};
use pwakit_sw::WorkerConfig;
use std::path::PathBuf;

mod scenario;

use scenario::Scenario;

#[derive(Parser)]
#[command(name = "sw-replay")]
#[command(about = "Replay worker events against the in-memory PWAKit host")]
struct Cli {
    /// Scenario file (JSON)
    scenario: PathBuf,

    /// Worker config file (JSON), overriding the scenario's own config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log format: pretty, compact, or json
    #[arg(long, default_value = "compact")]
    log_format: LogFormat,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    try_init_logging(&LogConfig::from_verbosity(cli.verbose).with_format(cli.log_format))?;

    let scenario = Scenario::from_file(&cli.scenario)?;
    let config = match cli.config {
        Some(ref path) => Some(WorkerConfig::from_json_file(path)?),
        None => None,
    };

    let reports = scenario.run(config).await?;
    let json = serde_json::to_string_pretty(&reports)?;

    match cli.output {
        Some(path) => std::fs::write(&path, json)?,
        None => println!("{}", json),
    }

    Ok(())
}
