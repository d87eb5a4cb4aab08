//! Julian Date helpers for the date-window queries.

use chrono::{DateTime, Utc};

/// Julian Date of the Unix epoch (1970-01-01T00:00:00 UTC).
pub const JD_UNIX_EPOCH: f64 = 2_440_587.5;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Julian Date representation.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct JulianDate(f64);

impl JulianDate {
    /// Create from chrono DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        let secs = dt.timestamp() as f64 + dt.timestamp_subsec_nanos() as f64 / 1e9;
        Self(secs / SECONDS_PER_DAY + JD_UNIX_EPOCH)
    }

    /// Convert to chrono DateTime<Utc>, rounded to the millisecond.
    ///
    /// `None` when the date falls outside chrono's representable range.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let millis = ((self.0 - JD_UNIX_EPOCH) * SECONDS_PER_DAY * 1_000.0).round();
        if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
            return None;
        }
        DateTime::from_timestamp_millis(millis as i64)
    }

    /// Shift by a (possibly fractional) number of days.
    pub fn minus_days(&self, days: f64) -> Self {
        Self(self.0 - days)
    }
}

/// ISO rendering accepted by the Fink API: `YYYY-MM-DD HH:MM:SS.sss` (UTC).
pub fn to_iso(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

/// `[now - days_in_past, now]` as ISO strings, computed through Julian Dates.
///
/// `None` when either bound is not a representable date.
pub fn window_ending_at(now: DateTime<Utc>, days_in_past: f64) -> Option<(String, String)> {
    let stop = JulianDate::from_datetime(now);
    let start = stop.minus_days(days_in_past);
    Some((to_iso(start.to_datetime()?), to_iso(stop.to_datetime()?)))
}
