//! Common types and utilities shared across CLI commands.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use staysense::config::ConfigFile;
use staysense::ingest::{read_fix_csv, read_logger_csv};
use staysense::logging::{init_logging, split_log_path, LoggingGuard};
use staysense::model::Fix;

use crate::error::CliError;

/// Input file schema selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum InputFormat {
    /// GPS logger export (UTC DATE, UTC TIME, LATITUDE, N/S, ...)
    Logger,
    /// latitude,longitude,timestamp[,altitude,accuracy,speed]
    Simple,
}

/// Read fixes from `path` in the given schema.
pub fn read_fixes(path: &Path, format: InputFormat) -> Result<Vec<Fix>, CliError> {
    let result = match format {
        InputFormat::Logger => read_logger_csv(path),
        InputFormat::Simple => read_fix_csv(path),
    };
    result.map_err(|error| CliError::Input {
        path: path.display().to_string(),
        error,
    })
}

/// Load the configuration from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let config = match path {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    Ok(config)
}

/// Path of the configuration file in use.
pub fn config_path(path: Option<PathBuf>) -> PathBuf {
    path.unwrap_or_else(staysense::config::config_file_path)
}

/// Start logging to the configured log file.
pub fn start_logging(config: &ConfigFile, verbose: bool) -> Result<LoggingGuard, CliError> {
    let (dir, file) = split_log_path(&config.logging.file);
    init_logging(&dir, &file, verbose).map_err(|e| {
        CliError::LoggingInit(format!("{} ({})", e, config.logging.file.display()))
    })
}
