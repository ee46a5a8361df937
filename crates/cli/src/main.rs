use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use dao_config::SimulatorConfig;
use dao_core::{format_units, DEFAULT_DECIMALS};

mod deployments;
mod scenario;

use scenario::{Scenario, ScenarioRunner};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file; falls back to DAO_SIM_CONFIG_FILE and DAO_SIM_* variables
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scenario file on a fresh simulated chain
    Run {
        /// Scenario YAML file
        scenario: PathBuf,
        /// Skip writing deployment files
        #[arg(long)]
        no_deployments: bool,
    },
    /// Print the default configuration as YAML
    InitConfig {
        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SimulatorConfig::from_file(path)?,
        None => SimulatorConfig::from_env()?,
    };
    dao_core::init_tracing(&config.log_level)?;

    match &cli.command {
        Commands::Run {
            scenario,
            no_deployments,
        } => run(config, scenario, *no_deployments),
        Commands::InitConfig { output } => {
            let defaults = SimulatorConfig::default();
            match output {
                Some(path) => {
                    defaults.save(path)?;
                    info!("Wrote default configuration to {}", path.display());
                }
                None => print!("{}", defaults.to_yaml()?),
            }
            Ok(())
        }
    }
}

fn run(config: SimulatorConfig, path: &Path, no_deployments: bool) -> Result<()> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read scenario {}", path.display()))?;
    let scenario = Scenario::from_yaml(&text).with_context(|| format!("Invalid scenario {}", path.display()))?;

    let report = ScenarioRunner::run(config.clone(), &scenario)?;

    if !no_deployments {
        deployments::write_deployments(Path::new(&config.deployments_dir), &config.network, &report.deployments)?;
    }

    println!(
        "{} steps applied ({} failed as expected), {} DAO(s) deployed",
        report.steps,
        report.expected_failures,
        report.deployments.len()
    );
    for (name, balance) in &report.balances {
        println!("  {:<12} {} ETH", name, format_units(*balance, DEFAULT_DECIMALS));
    }
    Ok(())
}
