//! INI serialization logic for converting `ConfigFile` → INI string.

use super::parser::format_segments;
use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let sampling = &config.sampling;

    format!(
        r#"[detector]
; Minimum time (seconds) a run of fixes must span to become a stay point
time_threshold = {}
; Maximum distance (meters) the subject may roam within one stay
distance_threshold = {}

[geofence]
; Radius (meters) around a stay point that counts as inside
radius = {}
; Number of fixes voting on arrivals and departures (odd)
window_size = {}

[sampling]
; Adapt the sampling interval to the predicted stay (true/false)
adaptive = {}
; Seconds between fixes while moving
base_interval = {}
; Seconds between fixes once the predicted stay is over
late_departure_interval = {}
; Smallest interval the stay curve may request (seconds)
min_interval = {}
; Interval used instead of anything below min_interval (seconds)
fallback_interval = {}
; Fixes with an accuracy radius at or above this (meters) are discarded
accuracy_threshold = {}
; New stay points closer than this (meters) to a known one are dropped
dedup_radius = {}
; Sigmoid steepness
alpha = {}
; Sigmoid slices as start:end:max_separation (seconds), comma separated
segments = {}

[logging]
; Log file path
file = {}
"#,
        config.detector.time_threshold,
        config.detector.distance_threshold,
        config.geofence.radius,
        config.geofence.window_size,
        sampling.adaptive,
        sampling.base_interval,
        sampling.late_departure_interval,
        sampling.min_interval,
        sampling.fallback_interval,
        sampling.accuracy_threshold,
        sampling.dedup_radius,
        sampling.alpha,
        format_segments(&sampling.segments),
        config.logging.file.display(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_section_written() {
        let content = to_config_string(&ConfigFile::default());
        for section in ["[detector]", "[geofence]", "[sampling]", "[logging]"] {
            assert!(content.contains(section), "missing {}", section);
        }
        assert!(content.contains("time_threshold = 2700"));
        assert!(content.contains("segments = -5:-2:600, -2:2:120, 2:5:600"));
        assert!(content.contains("adaptive = false"));
    }

    #[test]
    fn test_output_parses_back() {
        let mut config = ConfigFile::default();
        config.sampling.fallback_interval = 45;
        config.geofence.radius = 120.5;

        let ini = ini::Ini::load_from_str(&to_config_string(&config)).unwrap();
        let parsed = super::super::parser::parse_ini(&ini).unwrap();

        assert_eq!(parsed, config);
    }
}
