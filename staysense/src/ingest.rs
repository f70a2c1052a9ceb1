//! CSV ingestion and CSV/JSON export.
//!
//! Three input schemas are understood:
//!
//! - GPS logger exports (`UTC DATE,UTC TIME,LATITUDE,N/S,LONGITUDE,E/W,SPEED,ALTITUDE`),
//!   with unsigned coordinates and hemisphere columns;
//! - a simple fix schema (`latitude,longitude,timestamp[,altitude,accuracy,speed]`);
//! - stay point candidates (`latitude,longitude,arrival_time,departure_time,amount_of_fixes`)
//!   used to preload known places.
//!
//! Extra columns are ignored. Results are written back as CSV or JSON.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Fix, LiveStayPoint, StayPoint, Visit, DISPLAY_TIME_FORMAT};

/// Timestamp format of logger exports (date and time columns joined by a space).
pub const LOGGER_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Errors raised while reading or writing data files.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("record {record}: invalid timestamp '{value}'")]
    Timestamp { record: usize, value: String },
}

#[derive(Debug, Deserialize)]
struct LoggerRecord {
    #[serde(rename = "UTC DATE")]
    date: String,
    #[serde(rename = "UTC TIME")]
    time: String,
    #[serde(rename = "LATITUDE")]
    latitude: f64,
    #[serde(rename = "N/S")]
    north_south: String,
    #[serde(rename = "LONGITUDE")]
    longitude: f64,
    #[serde(rename = "E/W")]
    east_west: String,
    #[serde(rename = "SPEED")]
    speed: f64,
    #[serde(rename = "ALTITUDE")]
    altitude: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct FixRecord {
    latitude: f64,
    longitude: f64,
    timestamp: String,
    #[serde(default)]
    altitude: Option<f64>,
    #[serde(default)]
    accuracy: Option<f64>,
    #[serde(default)]
    speed: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LiveStayPointRecord {
    latitude: f64,
    longitude: f64,
    arrival_time: String,
    departure_time: String,
    amount_of_fixes: usize,
}

#[derive(Debug, Serialize)]
struct VisitRecord {
    id: u32,
    stay_point_id: u32,
    arrival_time: String,
    departure_time: String,
    detection_arrival_time: String,
    detection_departure_time: String,
    stay_time_seconds: i64,
}

fn parse_time(value: &str, format: &str, record: usize) -> Result<NaiveDateTime, IngestError> {
    NaiveDateTime::parse_from_str(value.trim(), format).map_err(|_| IngestError::Timestamp {
        record,
        value: value.to_string(),
    })
}

fn format_time(time: &NaiveDateTime) -> String {
    time.format(DISPLAY_TIME_FORMAT).to_string()
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

// ─────────────────────────────────────────────────────────────────────────────
// Readers
// ─────────────────────────────────────────────────────────────────────────────

/// Read fixes from a GPS logger export.
pub fn read_logger_csv(path: impl AsRef<Path>) -> Result<Vec<Fix>, IngestError> {
    let fixes = read_logger(File::open(path.as_ref())?)?;
    tracing::debug!(path = %path.as_ref().display(), fixes = fixes.len(), "Read logger fixes");
    Ok(fixes)
}

/// Read fixes from a GPS logger export.
pub fn read_logger<R: Read>(reader: R) -> Result<Vec<Fix>, IngestError> {
    let mut reader = csv_reader(reader);
    let mut fixes = Vec::new();

    for (index, record) in reader.deserialize::<LoggerRecord>().enumerate() {
        let record = record?;
        let joined = format!("{} {}", record.date, record.time);
        let timestamp = parse_time(&joined, LOGGER_TIME_FORMAT, index + 1)?;

        let latitude = if record.north_south == "S" {
            -record.latitude
        } else {
            record.latitude
        };
        let longitude = if record.east_west == "W" {
            -record.longitude
        } else {
            record.longitude
        };

        fixes.push(Fix::with_details(
            latitude,
            longitude,
            timestamp,
            record.altitude,
            0.0,
            record.speed,
        ));
    }
    Ok(fixes)
}

/// Read fixes in the simple schema.
pub fn read_fix_csv(path: impl AsRef<Path>) -> Result<Vec<Fix>, IngestError> {
    let fixes = read_fixes(File::open(path.as_ref())?)?;
    tracing::debug!(path = %path.as_ref().display(), fixes = fixes.len(), "Read fixes");
    Ok(fixes)
}

/// Read fixes in the simple schema.
pub fn read_fixes<R: Read>(reader: R) -> Result<Vec<Fix>, IngestError> {
    let mut reader = csv_reader(reader);
    reader
        .deserialize::<FixRecord>()
        .enumerate()
        .map(|(index, record)| -> Result<Fix, IngestError> {
            let record = record?;
            let timestamp = parse_time(&record.timestamp, DISPLAY_TIME_FORMAT, index + 1)?;
            Ok(Fix::with_details(
                record.latitude,
                record.longitude,
                timestamp,
                record.altitude.unwrap_or(0.0),
                record.accuracy.unwrap_or(0.0),
                record.speed.unwrap_or(0.0),
            ))
        })
        .collect()
}

/// Read stay point candidates.
pub fn read_live_stay_points_csv(path: impl AsRef<Path>) -> Result<Vec<LiveStayPoint>, IngestError> {
    read_live_stay_points(File::open(path.as_ref())?)
}

/// Read stay point candidates.
pub fn read_live_stay_points<R: Read>(reader: R) -> Result<Vec<LiveStayPoint>, IngestError> {
    let mut reader = csv_reader(reader);
    reader
        .deserialize::<LiveStayPointRecord>()
        .enumerate()
        .map(|(index, record)| -> Result<LiveStayPoint, IngestError> {
            let record = record?;
            Ok(LiveStayPoint::new(
                record.latitude,
                record.longitude,
                parse_time(&record.arrival_time, DISPLAY_TIME_FORMAT, index + 1)?,
                parse_time(&record.departure_time, DISPLAY_TIME_FORMAT, index + 1)?,
                record.amount_of_fixes,
            ))
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Writers
// ─────────────────────────────────────────────────────────────────────────────

fn write_records<T: Serialize>(
    path: &Path,
    records: impl IntoIterator<Item = T>,
) -> Result<(), IngestError> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write fixes in the simple schema.
pub fn write_fix_csv(path: impl AsRef<Path>, fixes: &[Fix]) -> Result<(), IngestError> {
    write_records(
        path.as_ref(),
        fixes.iter().map(|fix| FixRecord {
            latitude: fix.latitude,
            longitude: fix.longitude,
            timestamp: format_time(&fix.timestamp),
            altitude: Some(fix.altitude),
            accuracy: Some(fix.accuracy),
            speed: Some(fix.speed),
        }),
    )
}

/// Write stay points.
pub fn write_stay_points_csv(
    path: impl AsRef<Path>,
    stay_points: &[StayPoint],
) -> Result<(), IngestError> {
    write_records(path.as_ref(), stay_points)
}

/// Write stay point candidates in the preload schema.
pub fn write_live_stay_points_csv(
    path: impl AsRef<Path>,
    stay_points: &[LiveStayPoint],
) -> Result<(), IngestError> {
    write_records(
        path.as_ref(),
        stay_points.iter().map(|sp| LiveStayPointRecord {
            latitude: sp.latitude,
            longitude: sp.longitude,
            arrival_time: format_time(&sp.arrival_time),
            departure_time: format_time(&sp.departure_time),
            amount_of_fixes: sp.fix_count,
        }),
    )
}

/// Write visits.
pub fn write_visits_csv(path: impl AsRef<Path>, visits: &[Visit]) -> Result<(), IngestError> {
    write_records(
        path.as_ref(),
        visits.iter().map(|visit| VisitRecord {
            id: visit.id,
            stay_point_id: visit.stay_point_id,
            arrival_time: format_time(&visit.arrival_time()),
            departure_time: format_time(&visit.departure_time()),
            detection_arrival_time: format_time(&visit.detection_arrival_fix.timestamp),
            detection_departure_time: format_time(&visit.detection_departure_fix.timestamp),
            stay_time_seconds: visit.stay_time_seconds(),
        }),
    )
}

/// Write any serializable value as pretty-printed JSON.
pub fn write_json<T: Serialize + ?Sized>(path: impl AsRef<Path>, value: &T) -> Result<(), IngestError> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
