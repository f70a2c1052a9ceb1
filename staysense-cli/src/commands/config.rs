//! Configuration management CLI commands.
//!
//! Provides `config path`, `config show` and `config init`.

use std::path::PathBuf;

use clap::Subcommand;
use staysense::config::{format_segments, ConfigFile};

use super::common::{config_path, load_config};
use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Show the active settings
    Show,

    /// Write a configuration file with default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, path: Option<PathBuf>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => run_path(path),
        ConfigCommands::Show => run_show(path),
        ConfigCommands::Init { force } => run_init(path, force),
    }
}

/// Show the configuration file path.
fn run_path(path: Option<PathBuf>) -> Result<(), CliError> {
    println!("{}", config_path(path).display());
    Ok(())
}

/// Show the active settings.
fn run_show(path: Option<PathBuf>) -> Result<(), CliError> {
    let config = load_config(path.as_deref())?;

    println!("Configuration Settings");
    println!("======================");
    println!();
    println!("[detector]");
    println!("  time_threshold = {}", config.detector.time_threshold);
    println!("  distance_threshold = {}", config.detector.distance_threshold);
    println!();
    println!("[geofence]");
    println!("  radius = {}", config.geofence.radius);
    println!("  window_size = {}", config.geofence.window_size);
    println!();

    let sampling = &config.sampling;
    println!("[sampling]");
    println!("  adaptive = {}", sampling.adaptive);
    println!("  base_interval = {}", sampling.base_interval);
    println!("  late_departure_interval = {}", sampling.late_departure_interval);
    println!("  min_interval = {}", sampling.min_interval);
    println!("  fallback_interval = {}", sampling.fallback_interval);
    println!("  accuracy_threshold = {}", sampling.accuracy_threshold);
    println!("  dedup_radius = {}", sampling.dedup_radius);
    println!("  alpha = {}", sampling.alpha);
    println!("  segments = {}", format_segments(&sampling.segments));
    println!();
    println!("[logging]");
    println!("  file = {}", config.logging.file.display());

    if let Err(e) = config.to_controller_config().validate() {
        println!();
        println!("Warning: {}", e);
    }

    Ok(())
}

/// Write a configuration file with default settings.
fn run_init(path: Option<PathBuf>, force: bool) -> Result<(), CliError> {
    let path = config_path(path);

    if force {
        ConfigFile::default().save_to(&path)?;
        println!("Wrote default configuration to {}", path.display());
    } else if ConfigFile::ensure_exists_at(&path)? {
        println!("Created {}", path.display());
    } else {
        println!("{} already exists (use --force to overwrite)", path.display());
    }

    Ok(())
}
