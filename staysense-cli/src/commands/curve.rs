//! Curve command - print the schedule of a sampling curve.
//!
//! With `--event`, prints the absolute sampling times the decision maker
//! picks after an arrival or departure instead.

use std::path::PathBuf;

use chrono::{Duration, Local, NaiveDateTime};
use clap::ValueEnum;
use staysense::model::DISPLAY_TIME_FORMAT;
use staysense::sampling::{CurveKind, MobilityEvent, SamplingCurveGenerator, SamplingDecisionMaker};

use super::common::load_config;
use crate::error::CliError;

/// Curve shape selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum CurveType {
    /// Evenly spaced schedules
    Linear,
    /// Schedules following a logistic curve
    Sigmoid,
    /// Logistic curve sliced by the configured segments
    Sliced,
}

/// Mobility event selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum EventType {
    /// Arrived at a stay point
    Arrival,
    /// Left a stay point
    Departure,
}

impl From<EventType> for MobilityEvent {
    fn from(event: EventType) -> Self {
        match event {
            EventType::Arrival => MobilityEvent::Arrival,
            EventType::Departure => MobilityEvent::Departure,
        }
    }
}

/// Arguments for the curve command.
pub struct CurveArgs {
    pub config: Option<PathBuf>,
    pub length: f64,
    pub kind: CurveType,
    pub schedules: usize,
    pub alpha: Option<f64>,
    pub event: Option<EventType>,
    pub start: Option<NaiveDateTime>,
}

/// Parse a `--start` value.
pub fn parse_start(value: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(value.trim(), DISPLAY_TIME_FORMAT)
        .map_err(|e| format!("expected \"YYYY-MM-DD HH:MM:SS\": {}", e))
}

/// Run the curve command.
pub fn run(args: CurveArgs) -> Result<(), CliError> {
    if let Some(event) = args.event {
        let start = args.start.unwrap_or_else(|| Local::now().naive_local());
        return run_decision(event.into(), start, args.length);
    }

    let config = load_config(args.config.as_deref())?;
    let alpha = args.alpha.unwrap_or(config.sampling.alpha);

    let kind = match args.kind {
        CurveType::Linear => CurveKind::Linear {
            total_schedules: args.schedules,
        },
        CurveType::Sigmoid => CurveKind::Sigmoid {
            total_schedules: args.schedules,
            alpha,
        },
        CurveType::Sliced => CurveKind::SlicedSigmoid {
            alpha,
            segments: config.sampling.segments,
        },
    };

    let curve = SamplingCurveGenerator::with_length(args.length, kind)?;

    println!("{:>5}  {:>10}  {:>8}  segment", "#", "offset", "delta");
    let mut previous = 0.0;
    for (index, offset) in curve.offsets().iter().enumerate() {
        let segment = curve
            .segment_of(index)
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>5}  {:>10.1}  {:>8.1}  {}",
            index,
            offset,
            offset - previous,
            segment
        );
        previous = *offset;
    }

    Ok(())
}

/// Print the sampling times chosen for a prediction of `length` seconds.
fn run_decision(event: MobilityEvent, start: NaiveDateTime, length: f64) -> Result<(), CliError> {
    let end = start + Duration::milliseconds((length * 1000.0).round() as i64);

    let mut decisions = SamplingDecisionMaker::new();
    decisions.receive_notification(event, start, end)?;

    println!("{:>5}  {:>19}  {:>8}", "#", "time", "delta");
    let mut previous = start;
    let mut index = 0;
    while let Some(at) = decisions.next_action() {
        println!(
            "{:>5}  {:>19}  {:>8}",
            index,
            at.format(DISPLAY_TIME_FORMAT).to_string(),
            (at - previous).num_seconds()
        );
        previous = at;
        index += 1;
    }

    Ok(())
}
