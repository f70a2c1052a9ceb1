//! Run command - replay a trace through the sampling controller.

use std::path::{Path, PathBuf};

use console::style;
use serde::Serialize;

use staysense::controller::{AdaptiveSamplingController, RunSummary};
use staysense::ingest::{
    read_live_stay_points_csv, write_fix_csv, write_json, write_live_stay_points_csv,
    write_stay_points_csv, write_visits_csv, IngestError,
};
use staysense::model::{LiveStayPoint, StayPoint, Visit};
use staysense::source::FixStream;

use super::common::{load_config, read_fixes, start_logging, InputFormat};
use crate::error::CliError;

/// Arguments for the run command.
pub struct RunArgs {
    pub config: Option<PathBuf>,
    pub verbose: bool,
    pub input: PathBuf,
    pub format: InputFormat,
    pub adaptive: bool,
    pub base_sampling: Option<i64>,
    pub output_dir: Option<PathBuf>,
    pub json: bool,
    pub preload: Option<PathBuf>,
}

/// Everything a run produced, as printed with `--json`.
#[derive(Serialize)]
struct RunReport<'a> {
    summary: &'a RunSummary,
    stay_points: &'a [StayPoint],
    visits: &'a [Visit],
}

/// Run the run command.
pub fn run(args: RunArgs) -> Result<(), CliError> {
    let config_file = load_config(args.config.as_deref())?;
    let _guard = start_logging(&config_file, args.verbose)?;

    let mut config = config_file.to_controller_config();
    if args.adaptive {
        config = config.with_adaptive(true);
    }
    if let Some(secs) = args.base_sampling {
        config = config.with_base_interval(secs);
    }

    let fixes = read_fixes(&args.input, args.format)?;
    tracing::info!(
        input = %args.input.display(),
        fixes = fixes.len(),
        "Trace loaded"
    );
    let source = FixStream::new(fixes).map_err(|error| CliError::Source {
        path: args.input.display().to_string(),
        error,
    })?;

    let mut controller = AdaptiveSamplingController::new(config, source)?;
    if let Some(path) = &args.preload {
        let known = read_live_stay_points_csv(path).map_err(|error| CliError::Input {
            path: path.display().to_string(),
            error,
        })?;
        controller.preload_stay_points(known);
    }

    let summary = controller.run()?;

    if let Some(dir) = &args.output_dir {
        write_outputs(dir, &controller, &summary)?;
    }

    let report = RunReport {
        summary: &summary,
        stay_points: controller.stay_points(),
        visits: controller.visits(),
    };
    if args.json {
        let text = serde_json::to_string_pretty(&report).map_err(|e| CliError::Output {
            path: "stdout".to_string(),
            error: IngestError::Json(e),
        })?;
        println!("{}", text);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn write_outputs(
    dir: &Path,
    controller: &AdaptiveSamplingController<FixStream>,
    summary: &RunSummary,
) -> Result<(), CliError> {
    let output_error = |path: &Path, error: IngestError| CliError::Output {
        path: path.display().to_string(),
        error,
    };

    std::fs::create_dir_all(dir).map_err(|e| output_error(dir, IngestError::Io(e)))?;

    let path = dir.join("stay_points.csv");
    write_stay_points_csv(&path, controller.stay_points()).map_err(|e| output_error(&path, e))?;

    let path = dir.join("visits.csv");
    write_visits_csv(&path, controller.visits()).map_err(|e| output_error(&path, e))?;

    let path = dir.join("sampled_fixes.csv");
    write_fix_csv(&path, controller.valid_fixes()).map_err(|e| output_error(&path, e))?;

    let candidates: Vec<LiveStayPoint> = controller
        .live_stay_points()
        .iter()
        .map(|detection| detection.stay_point.clone())
        .collect();
    let path = dir.join("candidates.csv");
    write_live_stay_points_csv(&path, &candidates).map_err(|e| output_error(&path, e))?;

    let path = dir.join("summary.json");
    write_json(&path, summary).map_err(|e| output_error(&path, e))?;

    tracing::info!(dir = %dir.display(), "Results written");
    Ok(())
}

fn print_report(report: &RunReport<'_>) {
    println!("{}", style("Run Summary").bold());
    println!("===========");
    println!("{}", report.summary);
    println!();

    println!("{}", style("Stay Points").bold());
    println!("===========");
    if report.stay_points.is_empty() {
        println!("  (none)");
    }
    for stay_point in report.stay_points {
        println!(
            "  #{:<3} {:>11.6} {:>11.6}  {} visit(s)",
            stay_point.id, stay_point.latitude, stay_point.longitude, stay_point.visit_count
        );
    }
    println!();

    println!("{}", style("Visits").bold());
    println!("======");
    if report.visits.is_empty() {
        println!("  (none)");
    }
    for visit in report.visits {
        println!(
            "  #{:<3} stay point {:<3} {} -> {}  ({} s)",
            visit.id,
            visit.stay_point_id,
            visit.arrival_time(),
            visit.departure_time(),
            visit.stay_time_seconds()
        );
    }
}
