mod config;
mod environment;
mod executors;
mod schedule;

use clap::Parser;
use config::RunnerConfig;
use environment::Identity;
use executors::Executors;
use itertools::Itertools;
use std::{path::PathBuf, process};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Run a training program repeatedly under a cluster allocation, then once
/// more with the ensemble flag appended.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// YAML config file, built-in defaults apply when absent
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of plain repetitions before the ensemble run, 0 runs the
    /// ensemble only
    runs: u32,

    /// Target program to invoke
    program: String,

    /// Arguments forwarded verbatim to every invocation
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match RunnerConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load config: {e}");
            process::exit(1);
        }
    };

    let identity = Identity::detect();
    let environment = config.environment.select(&identity.host).to_string();
    let prefix = config.environment.activation_prefix(&environment);

    info!("Requested by {} on {}", identity.requester, identity.host);
    info!("Running {} with: {}", cli.program, cli.args.iter().join(" "));
    info!(environment = %environment, runs = cli.runs, "Selected environment");

    let invocations = schedule::build(cli.runs, &cli.args);

    let mut executor = match Executors::load(config, prefix) {
        Ok(executor) => executor,
        Err(e) => {
            error!("Failed to load executor: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = executor.execute(&cli.program, &invocations) {
        error!("Aborting after failed invocation: {e}");
        process::exit(e.exit_code());
    }
}
