//! Time handling utilities for meteorological data.

use chrono::{Datelike, DateTime, Duration, DurationRound, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Represents a valid time for meteorological data.
///
/// Combines reference time (issuance / analysis time) and forecast offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidTime {
    /// Reference time
    pub reference_time: DateTime<Utc>,
    /// Forecast hour offset from reference time
    pub forecast_hour: u32,
}

impl ValidTime {
    pub fn new(reference_time: DateTime<Utc>, forecast_hour: u32) -> Self {
        Self {
            reference_time,
            forecast_hour,
        }
    }

    /// Create from analysis time (forecast_hour = 0)
    pub fn analysis(reference_time: DateTime<Utc>) -> Self {
        Self {
            reference_time,
            forecast_hour: 0,
        }
    }

    /// Calculate the actual valid time (reference + forecast offset)
    pub fn valid_datetime(&self) -> DateTime<Utc> {
        self.reference_time + Duration::hours(self.forecast_hour as i64)
    }

    /// Parse from ISO 8601 string.
    pub fn from_iso8601(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }

        // Without timezone (assume UTC)
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
            return Ok(Utc.from_utc_datetime(&ndt));
        }

        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M") {
            return Ok(Utc.from_utc_datetime(&ndt));
        }

        Err(TimeParseError::InvalidFormat(s.to_string()))
    }
}

/// Truncate an instant to the start of its hour.
pub fn truncate_to_hour(t: DateTime<Utc>) -> DateTime<Utc> {
    t.duration_trunc(Duration::hours(1)).unwrap_or(t)
}

/// Decode a CF-convention time value such as `value` in `"hours since 2024-01-15 00:00:00"`.
///
/// Epochs before the Gregorian reform (GrADS uses `days since 1-1-1`) are
/// interpreted in the mixed Julian/Gregorian calendar.
pub fn decode_cf_time(value: f64, units: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let (unit, epoch) = units
        .split_once(" since ")
        .ok_or_else(|| TimeParseError::InvalidUnits(units.to_string()))?;

    let seconds_per_unit = match unit.trim().to_ascii_lowercase().as_str() {
        "days" | "day" | "d" => 86_400.0,
        "hours" | "hour" | "hr" | "h" => 3_600.0,
        "minutes" | "minute" | "min" => 60.0,
        "seconds" | "second" | "sec" | "s" => 1.0,
        _ => return Err(TimeParseError::InvalidUnits(units.to_string())),
    };

    let mut epoch = parse_cf_epoch(epoch.trim())
        .ok_or_else(|| TimeParseError::InvalidUnits(units.to_string()))?;
    if epoch.year() < 1582 {
        epoch -= Duration::days(2);
    }

    let offset_ms = (value * seconds_per_unit * 1000.0).round();
    if !offset_ms.is_finite() || offset_ms.abs() >= i64::MAX as f64 {
        return Err(TimeParseError::InvalidFormat(value.to_string()));
    }
    epoch
        .checked_add_signed(Duration::milliseconds(offset_ms as i64))
        .ok_or_else(|| TimeParseError::InvalidFormat(value.to_string()))
}

/// Parse `Y-M-D[ H:M:S[.f]]` with unpadded fields, optionally ending in `Z`.
fn parse_cf_epoch(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim_end_matches('Z').trim_end_matches(" UTC");
    let (date, time) = match s.split_once([' ', 'T']) {
        Some((d, t)) => (d, Some(t.trim())),
        None => (s, None),
    };

    let mut parts = date.split('-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next()?.parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let (h, m, sec) = match time {
        Some(t) if !t.is_empty() => {
            let mut fields = t.split(':');
            let h: u32 = fields.next()?.parse().ok()?;
            let m: u32 = fields.next().unwrap_or("0").parse().ok()?;
            let sec: f64 = fields.next().unwrap_or("0").parse().ok()?;
            (h, m, sec)
        }
        _ => (0, 0, 0.0),
    };

    let naive = date.and_hms_opt(h, m, sec.trunc() as u32)?;
    Some(Utc.from_utc_datetime(&naive))
}

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),

    #[error("Unsupported time units: {0}")]
    InvalidUnits(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_iso8601() {
        let dt = ValidTime::from_iso8601("2024-01-15T12:00:00Z").unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.month(), 1);
        assert_eq!(dt.day(), 15);
        assert_eq!(dt.hour(), 12);
    }

    #[test]
    fn test_valid_datetime() {
        let vt = ValidTime::new(Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(), 30);
        assert_eq!(
            vt.valid_datetime(),
            Utc.with_ymd_and_hms(2024, 1, 16, 18, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_truncate_to_hour() {
        let t = Utc.with_ymd_and_hms(2024, 1, 15, 12, 47, 13).unwrap();
        assert_eq!(
            truncate_to_hour(t),
            Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_decode_hours_since() {
        let t = decode_cf_time(9.0, "hours since 2024-01-15 00:00:00").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_decode_grads_days_since_year_one() {
        // 2024-01-15 00Z as served by GrADS Data Server
        let t = decode_cf_time(738_900.0, "days since 1-1-1 00:00:0.0").unwrap();
        assert_eq!(t.year(), 2024);
        assert_eq!(t.hour(), 0);
    }

    #[test]
    fn test_decode_rejects_bad_units() {
        assert!(decode_cf_time(1.0, "fortnights since 2024-01-01").is_err());
        assert!(decode_cf_time(1.0, "hours").is_err());
    }

    #[test]
    fn test_decode_out_of_range_value_is_error() {
        // A missing_value fill leaking into the time axis
        assert!(matches!(
            decode_cf_time(9.999e20, "days since 1-1-1 00:00:00"),
            Err(TimeParseError::InvalidFormat(_))
        ));
        assert!(decode_cf_time(1.0e13, "hours since 2024-01-15 00:00:00").is_err());
        assert!(decode_cf_time(f64::NAN, "hours since 2024-01-15 00:00:00").is_err());
    }
}
