//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use staysense::config::ConfigFileError;
use staysense::controller::ControllerError;
use staysense::ingest::IngestError;
use staysense::sampling::CurveError;
use staysense::source::SourceError;
use staysense::trajectory::ComparisonError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to read an input file
    Input { path: String, error: IngestError },
    /// Input fixes cannot drive a run
    Source { path: String, error: SourceError },
    /// Failed to write an output file
    Output { path: String, error: IngestError },
    /// The sampling run stopped
    Run(ControllerError),
    /// A curve could not be generated
    Curve(CurveError),
    /// Trajectories could not be compared
    Compare(ComparisonError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Source {
                error: SourceError::Unordered { .. },
                ..
            } => {
                eprintln!();
                eprintln!("Fixes must be sorted by timestamp. Sort the file, e.g.:");
                eprintln!("  (head -n 1 FILE && tail -n +2 FILE | sort -t, -k3) > sorted.csv");
            }
            CliError::Input {
                error: IngestError::Csv(_),
                ..
            } => {
                eprintln!();
                eprintln!("Expected columns:");
                eprintln!("  logger: UTC DATE,UTC TIME,LATITUDE,N/S,LONGITUDE,E/W,SPEED,ALTITUDE");
                eprintln!("  simple: latitude,longitude,timestamp[,altitude,accuracy,speed]");
            }
            CliError::Config(_) => {
                eprintln!();
                eprintln!("Run 'staysense config show' to inspect the active settings.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Input { path, error } => {
                write!(f, "Failed to read '{}': {}", path, error)
            }
            CliError::Source { path, error } => {
                write!(f, "Cannot replay '{}': {}", path, error)
            }
            CliError::Output { path, error } => {
                write!(f, "Failed to write '{}': {}", path, error)
            }
            CliError::Run(e) => write!(f, "Sampling run failed: {}", e),
            CliError::Curve(e) => write!(f, "Invalid curve: {}", e),
            CliError::Compare(e) => write!(f, "Comparison failed: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Input { error, .. } => Some(error),
            CliError::Source { error, .. } => Some(error),
            CliError::Output { error, .. } => Some(error),
            CliError::Run(e) => Some(e),
            CliError::Curve(e) => Some(e),
            CliError::Compare(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<ControllerError> for CliError {
    fn from(e: ControllerError) -> Self {
        CliError::Run(e)
    }
}

impl From<CurveError> for CliError {
    fn from(e: CurveError) -> Self {
        CliError::Curve(e)
    }
}

impl From<ComparisonError> for CliError {
    fn from(e: ComparisonError) -> Self {
        CliError::Compare(e)
    }
}
