//! # Temporal Types — UTC-Only Timestamps
//!
//! Submission times, schedule slots and transition records all use
//! [`Timestamp`]: UTC, truncated to seconds, rendered as
//! `YYYY-MM-DDTHH:MM:SSZ`.
//!
//! Attendees pick a display time zone (`UTC-12` .. `UTC+11`) but nothing is
//! ever stored in local time.

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A UTC-only timestamp, truncated to seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// Wrap a `DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse an RFC 3339 string with any offset, converting to UTC.
    ///
    /// Schedule times arrive from organizers in their own zone; the
    /// offset is honoured and then discarded.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|e| ValidationError::InvalidTimestamp(format!("{s:?}: {e}")))?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// The calendar date in UTC.
    pub fn date(&self) -> NaiveDate {
        self.0.date_naive()
    }

    /// Whole days elapsed between `origin` and this timestamp's date.
    ///
    /// Negative when the timestamp falls before `origin`.
    pub fn days_since(&self, origin: NaiveDate) -> i64 {
        (self.date() - origin).num_days()
    }

    /// Render as ISO8601 with Z suffix (e.g., `2021-04-01T12:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_utc(dt)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn now_has_no_subseconds() {
        assert_eq!(Timestamp::now().as_datetime().nanosecond(), 0);
    }

    #[test]
    fn parse_converts_offset_to_utc() {
        let ts = Timestamp::parse("2021-09-14T17:00:00+05:00").unwrap();
        assert_eq!(ts.to_iso8601(), "2021-09-14T12:00:00Z");
    }

    #[test]
    fn parse_truncates_subseconds() {
        let ts = Timestamp::parse("2021-09-14T12:00:00.987Z").unwrap();
        assert_eq!(ts.to_iso8601(), "2021-09-14T12:00:00Z");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Timestamp::parse("tomorrow").is_err());
        assert!(Timestamp::parse("2021-09-14").is_err());
    }

    #[test]
    fn days_since_counts_calendar_days() {
        let open = NaiveDate::from_ymd_opt(2021, 4, 1).unwrap();
        let late = Timestamp::from_utc(Utc.with_ymd_and_hms(2021, 5, 28, 23, 59, 0).unwrap());
        assert_eq!(late.days_since(open), 57);
        let early = Timestamp::from_utc(Utc.with_ymd_and_hms(2021, 3, 31, 0, 0, 0).unwrap());
        assert_eq!(early.days_since(open), -1);
    }

    #[test]
    fn ordering_follows_time() {
        let a = Timestamp::parse("2021-04-01T00:00:00Z").unwrap();
        let b = Timestamp::parse("2021-04-01T00:00:01Z").unwrap();
        assert!(a < b);
    }
}
