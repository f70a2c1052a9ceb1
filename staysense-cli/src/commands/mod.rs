//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`compare`] - Sampled trajectory error against ground truth
//! - [`config`] - Configuration management (path, show, init)
//! - [`curve`] - Sampling curve schedules
//! - [`run`] - Main command (replay a trace through the controller)

pub mod common;
pub mod compare;
pub mod config;
pub mod curve;
pub mod run;
