//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use ini::{Ini, Properties};
use std::path::PathBuf;
use std::str::FromStr;

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::sampling::CurveSegment;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [detector] section
    if let Some(section) = ini.section(Some("detector")) {
        if let Some(v) = parse_number(section, "detector", "time_threshold", "seconds")? {
            config.detector.time_threshold = v;
        }
        if let Some(v) = parse_number(section, "detector", "distance_threshold", "meters")? {
            config.detector.distance_threshold = v;
        }
    }

    // [geofence] section
    if let Some(section) = ini.section(Some("geofence")) {
        if let Some(v) = parse_number(section, "geofence", "radius", "meters")? {
            config.geofence.radius = v;
        }
        if let Some(v) = parse_number(section, "geofence", "window_size", "count")? {
            config.geofence.window_size = v;
        }
    }

    // [sampling] section
    if let Some(section) = ini.section(Some("sampling")) {
        let sampling = &mut config.sampling;
        if let Some(v) = section.get("adaptive") {
            sampling.adaptive = parse_bool(v);
        }
        if let Some(v) = parse_number(section, "sampling", "base_interval", "seconds")? {
            sampling.base_interval = v;
        }
        if let Some(v) = parse_number(section, "sampling", "late_departure_interval", "seconds")? {
            sampling.late_departure_interval = v;
        }
        if let Some(v) = parse_number::<i64>(section, "sampling", "min_interval", "seconds")? {
            if v < 1 {
                return Err(ConfigFileError::InvalidValue {
                    section: "sampling".to_string(),
                    key: "min_interval".to_string(),
                    value: v.to_string(),
                    reason: "must be at least 1 second".to_string(),
                });
            }
            sampling.min_interval = v;
        }
        if let Some(v) = parse_number(section, "sampling", "fallback_interval", "seconds")? {
            sampling.fallback_interval = v;
        }
        if let Some(v) = parse_number(section, "sampling", "accuracy_threshold", "meters")? {
            sampling.accuracy_threshold = v;
        }
        if let Some(v) = parse_number(section, "sampling", "dedup_radius", "meters")? {
            sampling.dedup_radius = v;
        }
        if let Some(v) = parse_number(section, "sampling", "alpha", "number")? {
            sampling.alpha = v;
        }
        if let Some(v) = section.get("segments") {
            sampling.segments = parse_segments(v).map_err(|reason| ConfigFileError::InvalidValue {
                section: "sampling".to_string(),
                key: "segments".to_string(),
                value: v.to_string(),
                reason,
            })?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn parse_number<T: FromStr>(
    section: &Properties,
    section_name: &str,
    key: &str,
    unit: &str,
) -> Result<Option<T>, ConfigFileError> {
    let Some(v) = section.get(key) else {
        return Ok(None);
    };
    v.trim()
        .parse()
        .map(Some)
        .map_err(|_| ConfigFileError::InvalidValue {
            section: section_name.to_string(),
            key: key.to_string(),
            value: v.to_string(),
            reason: format!("must be a number ({})", unit),
        })
}

/// Parse sigmoid slices written as `start:end:max_separation, ...`.
pub fn parse_segments(value: &str) -> Result<Vec<CurveSegment>, String> {
    let segments = value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| -> Result<CurveSegment, String> {
            let fields: Vec<&str> = part.split(':').map(str::trim).collect();
            let [start, end, separation] = fields.as_slice() else {
                return Err(format!(
                    "segment '{}' must look like start:end:max_separation",
                    part
                ));
            };
            let number = |s: &str| {
                s.parse::<f64>()
                    .map_err(|_| format!("'{}' in segment '{}' is not a number", s, part))
            };
            Ok(CurveSegment::new(
                number(*start)?,
                number(*end)?,
                number(*separation)?,
            ))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if segments.is_empty() {
        return Err("at least one segment is required".to_string());
    }
    Ok(segments)
}

/// Format sigmoid slices the way [`parse_segments`] reads them.
pub fn format_segments(segments: &[CurveSegment]) -> String {
    segments
        .iter()
        .map(|s| format!("{}:{}:{}", s.start, s.end, s.max_separation_secs))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a boolean value from a config string.
/// Accepts: true/false, yes/no, 1/0, on/off (case-insensitive)
pub(super) fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
