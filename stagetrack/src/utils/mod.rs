//! Identifier, clock and duration helpers shared across the crate.

use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

/// A UTC timestamp.
pub type Timestamp = DateTime<Utc>;

/// Generates a random (v4) UUID for a new run.
#[must_use]
pub fn generate_uuid() -> Uuid {
    Uuid::new_v4()
}

/// Wall-clock time now.
#[must_use]
pub fn now_utc() -> Timestamp {
    Utc::now()
}

/// Wall-clock time now as ISO 8601 with microseconds and an explicit offset,
/// e.g. `2024-05-01T12:00:00.000000+00:00`.
#[must_use]
pub fn iso_timestamp() -> String {
    now_utc().format("%Y-%m-%dT%H:%M:%S%.6f+00:00").to_string()
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
#[must_use]
pub fn whole_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Fractional milliseconds in `duration`.
#[must_use]
pub fn fractional_millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_uuids_are_random() {
        let a = generate_uuid();
        assert_eq!(a.get_version_num(), 4);
        assert_ne!(a, generate_uuid());
    }

    #[test]
    fn test_iso_timestamp_parses_back() {
        let ts = iso_timestamp();
        assert!(ts.ends_with("+00:00"));
        let parsed = DateTime::parse_from_rfc3339(&ts).unwrap();
        assert_eq!(parsed.offset().local_minus_utc(), 0);
    }

    #[test]
    fn test_millis() {
        assert_eq!(whole_millis(Duration::from_micros(1_999)), 1);
        assert_eq!(whole_millis(Duration::MAX), u64::MAX);
        assert!((fractional_millis(Duration::from_micros(1_500)) - 1.5).abs() < f64::EPSILON);
    }
}
