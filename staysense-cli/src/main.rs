//! StaySense CLI - Command-line interface
//!
//! Replays GPS traces through the adaptive sampling controller, prints
//! sampling curves, compares sampled trajectories and manages the
//! configuration file.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::common::InputFormat;
use commands::compare::CompareArgs;
use commands::config::ConfigCommands;
use commands::curve::{parse_start, CurveArgs, CurveType, EventType};
use commands::run::RunArgs;

#[derive(Parser)]
#[command(name = "staysense")]
#[command(version, about = "Stay point detection and adaptive GPS sampling", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ~/.staysense/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Mirror log output to stdout
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a GPS trace through the sampling controller
    Run {
        /// Trace to replay
        #[arg(long, short)]
        input: PathBuf,

        /// Input file schema
        #[arg(long, value_enum, default_value = "logger")]
        format: InputFormat,

        /// Adapt the sampling interval to predicted stays
        #[arg(long)]
        adaptive: bool,

        /// Seconds between fixes while moving
        #[arg(long, value_name = "SECS")]
        base_sampling: Option<i64>,

        /// Write stay points, visits and sampled fixes to this directory
        #[arg(long, short)]
        output_dir: Option<PathBuf>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,

        /// Known stay points (latitude,longitude,arrival_time,departure_time,amount_of_fixes)
        #[arg(long)]
        preload: Option<PathBuf>,
    },

    /// Print the schedule of a sampling curve
    Curve {
        /// Curve length in seconds
        #[arg(long)]
        length: f64,

        /// Curve shape
        #[arg(long, value_enum, default_value = "sliced")]
        kind: CurveType,

        /// Number of schedules (linear and sigmoid curves)
        #[arg(long, default_value = "10")]
        schedules: usize,

        /// Sigmoid steepness (defaults to the configured value)
        #[arg(long)]
        alpha: Option<f64>,

        /// Print the sampling times chosen after this mobility event instead
        #[arg(long, value_enum)]
        event: Option<EventType>,

        /// Start of the prediction, "YYYY-MM-DD HH:MM:SS" (defaults to now)
        #[arg(long, value_parser = parse_start, requires = "event")]
        start: Option<chrono::NaiveDateTime>,
    },

    /// Measure how far a sampled trajectory strays from its ground truth
    Compare {
        /// Full-resolution trace
        #[arg(long)]
        ground_truth: PathBuf,

        /// Schema of the ground truth file
        #[arg(long, value_enum, default_value = "logger")]
        format: InputFormat,

        /// Sampled fixes, as written by `run --output-dir`
        #[arg(long)]
        sampled: PathBuf,

        /// Interpolate between samples instead of using the nearest one
        #[arg(long)]
        interpolate: bool,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            input,
            format,
            adaptive,
            base_sampling,
            output_dir,
            json,
            preload,
        } => commands::run::run(RunArgs {
            config: cli.config,
            verbose: cli.verbose,
            input,
            format,
            adaptive,
            base_sampling,
            output_dir,
            json,
            preload,
        }),
        Commands::Curve {
            length,
            kind,
            schedules,
            alpha,
            event,
            start,
        } => commands::curve::run(CurveArgs {
            config: cli.config,
            length,
            kind,
            schedules,
            alpha,
            event,
            start,
        }),
        Commands::Compare {
            ground_truth,
            format,
            sampled,
            interpolate,
        } => commands::compare::run(CompareArgs {
            ground_truth,
            format,
            sampled,
            interpolate,
        }),
        Commands::Config { command } => commands::config::run(command, cli.config),
    };

    if let Err(e) = result {
        e.exit();
    }
}
