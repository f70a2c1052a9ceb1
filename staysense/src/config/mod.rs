//! User configuration stored in `~/.staysense/config.ini`.
//!
//! [`ConfigFile`] holds one settings struct per INI section. Parsing lives in
//! `parser`, serialization in `writer`, and [`ConfigFile::to_controller_config`]
//! turns the settings into a [`ControllerConfig`](crate::controller::ControllerConfig).

mod file;
mod parser;
mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use parser::{format_segments, parse_segments};
pub use settings::{
    default_log_file, ConfigFile, DetectorSettings, GeoFenceSettings, LoggingSettings,
    SamplingSettings,
};
