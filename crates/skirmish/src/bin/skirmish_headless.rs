//! # SKIRMISH Headless
//!
//! Runs the kernel without a window and prints a run summary.
//!
//! ```bash
//! # seeded random skirmish with the default config
//! skirmish_headless --units 500 --ticks 300
//!
//! # config and scenario from files
//! skirmish_headless --config sim.toml --scenario crates/skirmish/scenarios/duel.toml
//!
//! # per-tick logs
//! RUST_LOG=skirmish_core=debug skirmish_headless
//! ```

use std::process::ExitCode;

use skirmish::core::{SimConfig, SimResult, Simulation};
use skirmish::{run, Scenario};
use tracing::error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_TICKS: u64 = 200;
const DEFAULT_UNITS: usize = 200;

/// Command line options.
struct Options {
    config: Option<String>,
    scenario: Option<String>,
    ticks: u64,
    units: usize,
}

impl Options {
    fn parse(args: &[String]) -> Result<Self, String> {
        let value_of = |flag: &str| -> Option<&String> {
            args.iter()
                .position(|a| a == flag)
                .and_then(|i| args.get(i + 1))
        };
        let number = |flag: &str, default: u64| -> Result<u64, String> {
            value_of(flag).map_or(Ok(default), |v| {
                v.parse().map_err(|_| format!("{flag} expects a number, got `{v}`"))
            })
        };
        Ok(Self {
            config: value_of("--config").cloned(),
            scenario: value_of("--scenario").cloned(),
            ticks: number("--ticks", DEFAULT_TICKS)?,
            units: number("--units", DEFAULT_UNITS as u64)? as usize,
        })
    }
}

fn print_usage() {
    println!("Usage: skirmish_headless [options]");
    println!();
    println!("Options:");
    println!("  --config <path>     Simulation config (TOML)");
    println!("  --scenario <path>   Spawn list (TOML); random skirmish if absent");
    println!("  --units <n>         Units in the random skirmish (default {DEFAULT_UNITS})");
    println!("  --ticks <n>         Ticks to run (default {DEFAULT_TICKS})");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

fn execute(options: &Options) -> SimResult<()> {
    let config = match &options.config {
        Some(path) => SimConfig::from_file(path)?,
        None => SimConfig::default(),
    };
    let scenario = match &options.scenario {
        Some(path) => Scenario::from_file(path)?,
        None => Scenario::random(&config, options.units),
    };

    println!("  Field:    {} x {}", config.width, config.height);
    println!("  Seed:     {}", config.seed);
    println!("  Units:    {}", scenario.units.len());
    println!("  Ticks:    {}", options.ticks);
    println!();

    let mut sim = Simulation::new(config)?;
    scenario.spawn_into(&mut sim)?;
    let summary = run(&mut sim, options.ticks);
    println!("{summary}");
    Ok(())
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return ExitCode::SUCCESS;
    }

    init_tracing();

    println!("═══════════════════════════════════════════════════════════════════");
    println!("                    SKIRMISH HEADLESS v{}", env!("CARGO_PKG_VERSION"));
    println!("═══════════════════════════════════════════════════════════════════");
    println!();

    let options = match Options::parse(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("error: {message}");
            print_usage();
            return ExitCode::from(2);
        }
    };

    match execute(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "run failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
