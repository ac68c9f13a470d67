// -----------------------------------------------------------------------------
// elbencho-sweep - drives elbencho across a client fleet and a set of shared
// mounts to map throughput and latency as thread count and pattern vary
// -----------------------------------------------------------------------------

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use elbencho_sweep::command::CommandSettings;
use elbencho_sweep::config::SweepConfig;
use elbencho_sweep::exec::{CommandRunner, DryRunRunner, SystemRunner};
use elbencho_sweep::lifecycle::DirectoryLifecycle;
use elbencho_sweep::sweep::run_sweep;
use elbencho_sweep::validation::display_config_summary;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::info;

// -----------------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------------
#[derive(Parser)]
#[command(name = "elbencho-sweep", version, about = "Sweep elbencho workloads across hosts and shared mounts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v for info, -vv for debug, -vvv for trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the sweep
    ///
    /// Examples:
    ///   elbencho-sweep run
    ///   elbencho-sweep run --config sweep.yaml
    ///   elbencho-sweep run --config sweep.yaml --dry-run
    ///   elbencho-sweep run --only 1MB_seq_write --only 1MB_seq_read
    Run {
        /// YAML sweep definition (defaults to the built-in sweep)
        #[arg(short = 'c', long)]
        config: Option<PathBuf>,

        /// Print every command instead of executing it
        #[arg(long)]
        dry_run: bool,

        /// Only run the named workloads, in catalog order (repeatable)
        #[arg(long, value_name = "WORKLOAD")]
        only: Vec<String>,
    },
    /// Parse a sweep definition and print what it would run
    Validate {
        #[arg(short = 'c', long)]
        config: Option<PathBuf>,
    },
}

// -----------------------------------------------------------------------------
// main
// -----------------------------------------------------------------------------
fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    use tracing_subscriber::{fmt, EnvFilter};
    let filter = EnvFilter::new(format!("elbencho_sweep={}", level));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    match cli.command {
        Commands::Run { config, dry_run, only } => run_cmd(config, dry_run, &only),
        Commands::Validate { config } => {
            let (config, label) = load_config(config)?;
            display_config_summary(&config, &label)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<(SweepConfig, String)> {
    match path {
        Some(path) => {
            let config = SweepConfig::load(&path)?;
            Ok((config, path.display().to_string()))
        }
        None => Ok((SweepConfig::builtin()?, "<built-in>".to_string())),
    }
}

fn run_cmd(config_path: Option<PathBuf>, dry_run: bool, only: &[String]) -> Result<ExitCode> {
    let (mut config, label) = load_config(config_path)?;
    config
        .retain_workloads(only)
        .context("invalid --only selection")?;

    if dry_run {
        display_config_summary(&config, &label)?;
    }

    let topology = config.topology()?;
    let mut lifecycle = DirectoryLifecycle::new(
        topology,
        CommandSettings::from(&config),
        config.canonical_producer.clone(),
    );

    let mut system = SystemRunner;
    let mut dry = DryRunRunner::default();
    let runner: &mut dyn CommandRunner = if dry_run {
        &mut dry as &mut dyn CommandRunner
    } else {
        &mut system as &mut dyn CommandRunner
    };

    info!("Starting sweep of {} workloads from {}", config.workloads.len(), label);
    let start = Instant::now();
    let report = run_sweep(&config, &mut lifecycle, runner);
    report.print_summary();
    println!("\nSweep wall time: {:.1}s", start.elapsed().as_secs_f64());

    Ok(if report.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
