//! Headless tactical controller runner.
//!
//! Steps the controller against a scenario without an engine, writing each
//! tick's outcome as JSON on stdout.
//!
//! # Usage
//!
//! ```bash
//! # Run a scenario
//! cargo run -p tactics_headless -- run --scenario scenarios/early_rush.ron --ticks 60
//!
//! # Run with a tuned config, two match seconds per tick
//! cargo run -p tactics_headless -- run -s scenarios/mid_game.ron --config tuned.ron --secs-per-tick 2
//!
//! # Validate a config file
//! cargo run -p tactics_headless -- validate-config tuned.ron
//!
//! # Print the default config as RON
//! cargo run -p tactics_headless -- default-config > tuned.ron
//! ```
//!
//! Logs go to stderr; set `RUST_LOG` to override the level.

use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tactics_core::config::ControllerConfig;
use tactics_core::math::Fixed;
use tactics_headless::{Scenario, ScenarioRunner};

#[derive(Parser)]
#[command(name = "tactics_headless")]
#[command(about = "Headless tactical controller runner for replay and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Step the controller against a scenario
    Run {
        /// Scenario file to load
        #[arg(short, long)]
        scenario: PathBuf,

        /// Number of ticks to run
        #[arg(short, long, default_value = "60")]
        ticks: u64,

        /// Controller config (RON); defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Match seconds added to the clock after each tick
        #[arg(long, default_value = "1")]
        secs_per_tick: u32,

        /// Override the config's seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Load and validate a config file
    ValidateConfig {
        /// Config file path
        path: PathBuf,
    },

    /// Print the default config as RON
    DefaultConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr (stdout carries tick output)
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    match cli.command {
        Commands::Run {
            scenario,
            ticks,
            config,
            secs_per_tick,
            seed,
        } => cmd_run(scenario, ticks, config, secs_per_tick, seed),
        Commands::ValidateConfig { path } => cmd_validate_config(path),
        Commands::DefaultConfig => cmd_default_config(),
    }
}

/// Run a scenario and stream tick outcomes to stdout
fn cmd_run(
    scenario_path: PathBuf,
    ticks: u64,
    config_path: Option<PathBuf>,
    secs_per_tick: u32,
    seed: Option<u64>,
) -> ExitCode {
    let scenario = match Scenario::load(&scenario_path) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, path = %scenario_path.display(), "Failed to load scenario");
            return ExitCode::FAILURE;
        }
    };

    let mut config = match config_path {
        Some(path) => match ControllerConfig::load(&path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, path = %path.display(), "Failed to load config");
                return ExitCode::FAILURE;
            }
        },
        None => ControllerConfig::default(),
    };
    if let Some(seed) = seed {
        config.seed = seed;
    }

    tracing::info!(
        scenario = %scenario.name,
        ticks,
        secs_per_tick,
        seed = config.seed,
        "Starting run"
    );

    let mut runner = ScenarioRunner::new(scenario, config, Fixed::from_num(secs_per_tick));
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match runner.run(ticks, &mut out) {
        Ok(summary) => {
            eprintln!(
                "Ran {} ticks: {} orders, production on {} ticks, defending on {} ticks",
                summary.ticks, summary.orders, summary.production_ticks, summary.defense_ticks
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Run aborted");
            ExitCode::FAILURE
        }
    }
}

/// Load a config and report whether it validates
fn cmd_validate_config(path: PathBuf) -> ExitCode {
    match ControllerConfig::load(&path) {
        Ok(config) => {
            eprintln!("{}: OK (seed {})", path.display(), config.seed);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", path.display(), e);
            ExitCode::FAILURE
        }
    }
}

/// Print the defaults so they can be tuned
fn cmd_default_config() -> ExitCode {
    let pretty = ron::ser::PrettyConfig::new().depth_limit(3);
    match ron::ser::to_string_pretty(&ControllerConfig::default(), pretty) {
        Ok(text) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode default config");
            ExitCode::FAILURE
        }
    }
}
