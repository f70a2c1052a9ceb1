//! Integration tests for file-driven runs.
//!
//! A logger export is written to a temp directory, replayed through the
//! controller, and the results are exported back to CSV and JSON.
//!
//! Run with: `cargo test --test ingest_integration`

use std::fmt::Write as _;

use chrono::{Duration, NaiveDate};
use tempfile::TempDir;

use staysense::controller::{AdaptiveSamplingController, ControllerConfig};
use staysense::ingest::{
    read_fix_csv, read_live_stay_points_csv, read_logger_csv, write_fix_csv, write_json,
    write_live_stay_points_csv, write_stay_points_csv, write_visits_csv,
};
use staysense::source::FixStream;

/// Logger export: 5 minutes moving south, 50 minutes parked, 5 minutes moving north.
fn logger_export() -> String {
    let start = NaiveDate::from_ymd_opt(2017, 4, 3)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap();

    let mut latitudes = Vec::new();
    latitudes.extend((1..=10).rev().map(|k| 19.4326 + 0.01 * k as f64));
    latitudes.extend(std::iter::repeat(19.4326).take(101));
    latitudes.extend((1..=10).map(|k| 19.4326 + 0.01 * k as f64));

    let mut csv = String::from("INDEX,UTC DATE,UTC TIME,LATITUDE,N/S,LONGITUDE,E/W,SPEED,ALTITUDE\n");
    for (i, latitude) in latitudes.iter().enumerate() {
        let at = start + Duration::seconds(30 * i as i64);
        writeln!(
            csv,
            "{},{},{},{:.6},N,99.133200,W,0.0,2240.0",
            i + 1,
            at.format("%Y/%m/%d"),
            at.format("%H:%M:%S"),
            latitude
        )
        .unwrap();
    }
    csv
}

#[test]
fn test_logger_file_to_exported_results() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("trace.csv");
    std::fs::write(&input, logger_export()).unwrap();

    let fixes = read_logger_csv(&input).unwrap();
    assert_eq!(fixes.len(), 121);
    assert!(fixes.iter().all(|f| f.longitude < 0.0));

    let mut controller =
        AdaptiveSamplingController::new(ControllerConfig::default(), FixStream::new(fixes).unwrap())
            .unwrap();
    let summary = controller.run().unwrap();
    assert_eq!(summary.stay_points, 1);

    write_stay_points_csv(dir.path().join("stay_points.csv"), controller.stay_points()).unwrap();
    write_visits_csv(dir.path().join("visits.csv"), controller.visits()).unwrap();
    write_json(dir.path().join("summary.json"), &summary).unwrap();

    let visits = std::fs::read_to_string(dir.path().join("visits.csv")).unwrap();
    assert_eq!(visits.lines().count(), 2);
    assert!(visits.lines().nth(1).unwrap().ends_with(",3030"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("summary.json")).unwrap())
            .unwrap();
    assert_eq!(json["stay_points"], 1);
    assert_eq!(json["fixes_requested"], 121);
}

#[test]
fn test_sampled_fixes_and_candidates_reload() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("trace.csv");
    std::fs::write(&input, logger_export()).unwrap();

    let fixes = read_logger_csv(&input).unwrap();
    let mut controller =
        AdaptiveSamplingController::new(ControllerConfig::default(), FixStream::new(fixes).unwrap())
            .unwrap();
    controller.run().unwrap();

    let sampled_path = dir.path().join("sampled.csv");
    write_fix_csv(&sampled_path, controller.valid_fixes()).unwrap();
    assert_eq!(read_fix_csv(&sampled_path).unwrap(), controller.valid_fixes());

    let candidates: Vec<_> = controller
        .live_stay_points()
        .iter()
        .map(|d| d.stay_point.clone())
        .collect();
    let known_path = dir.path().join("known.csv");
    write_live_stay_points_csv(&known_path, &candidates).unwrap();

    // A second run over the same trace with the candidates preloaded sees the
    // arrival as it happens.
    let fixes = read_logger_csv(&input).unwrap();
    let mut rerun =
        AdaptiveSamplingController::new(ControllerConfig::default(), FixStream::new(fixes).unwrap())
            .unwrap();
    rerun.preload_stay_points(read_live_stay_points_csv(&known_path).unwrap());
    let summary = rerun.run().unwrap();

    assert_eq!(summary.stay_points, 1);
    assert_eq!(summary.arrivals, 1);
    assert_eq!(summary.departures, 1);
}
