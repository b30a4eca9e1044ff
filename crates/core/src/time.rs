//! # Temporal Normalizer
//!
//! Appointments used to store their schedule as a calendar date plus a free-form
//! time string (`"09:00"`, `"9:30 AM"`, ...). This module folds that pair into a
//! single timezone-aware instant.
//!
//! Parsing never fails from the caller's point of view: any malformed time string
//! degrades to 09:00 ([`default_time`]). The hour is taken as written (24-hour form), so an
//! `AM`/`PM` marker is discarded rather than applied: `"9:30 PM"` yields 09:30.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;
use tracing::warn;

use crate::errors::{CampusError, CampusResult};

/// Zone used when no `TIME_ZONE` is configured.
pub const DEFAULT_TIME_ZONE: &str = "Asia/Kathmandu";

/// Hour substituted for empty or unparseable legacy time strings.
pub const DEFAULT_HOUR: u32 = 9;

/// 09:00, the time of day used whenever a legacy time string cannot be read.
pub fn default_time() -> NaiveTime {
    NaiveTime::from_hms_opt(DEFAULT_HOUR, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Reasons a legacy time string could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeParseError {
    Empty,
    InvalidHour(String),
    InvalidMinute(String),
    OutOfRange { hour: u32, minute: u32 },
}

impl fmt::Display for TimeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty time string"),
            Self::InvalidHour(segment) => write!(f, "invalid hour segment {segment:?}"),
            Self::InvalidMinute(segment) => write!(f, "invalid minute segment {segment:?}"),
            Self::OutOfRange { hour, minute } => {
                write!(f, "{hour:02}:{minute:02} is not a time of day")
            }
        }
    }
}

impl std::error::Error for TimeParseError {}

/// Reads a legacy time string.
///
/// The text before the first `:` is the hour. The text after it contributes the
/// minute through its leading decimal digits; anything following those digits
/// (seconds, whitespace, an `AM`/`PM` marker) is ignored. The minute must start
/// right after the `:`. A string without `:` is an hour on its own.
pub fn parse_legacy_time(raw: &str) -> Result<NaiveTime, TimeParseError> {
    if raw.trim().is_empty() {
        return Err(TimeParseError::Empty);
    }

    let mut segments = raw.split(':');
    let hour_segment = segments.next().unwrap_or_default();
    let hour = hour_segment
        .trim()
        .parse::<u32>()
        .map_err(|_| TimeParseError::InvalidHour(hour_segment.to_string()))?;

    let minute = match segments.next() {
        None => 0,
        Some(segment) => {
            let digits_end = segment
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(segment.len());
            segment[..digits_end]
                .parse::<u32>()
                .map_err(|_| TimeParseError::InvalidMinute(segment.to_string()))?
        }
    };

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or(TimeParseError::OutOfRange { hour, minute })
}

/// Like [`parse_legacy_time`], falling back to [`default_time`] on any failure.
pub fn legacy_time_or_default(raw: Option<&str>) -> NaiveTime {
    let Some(raw) = raw else {
        return default_time();
    };

    match parse_legacy_time(raw) {
        Ok(time) => time,
        Err(TimeParseError::Empty) => default_time(),
        Err(err) => {
            warn!("Falling back to 09:00 for legacy appointment time: {}", err);
            default_time()
        }
    }
}

/// Attaches `tz` to a wall-clock time.
///
/// Ambiguous local times (clocks turned back) resolve to the earlier instant. Local
/// times skipped by a forward transition are moved past the gap.
pub fn localize(naive: NaiveDateTime, tz: &Tz) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(instant) => instant,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            let shifted = naive + Duration::hours(1);
            tz.from_local_datetime(&shifted)
                .earliest()
                .unwrap_or_else(|| tz.from_utc_datetime(&naive))
        }
    }
}

/// Combines a legacy date and time string into an instant in `tz`.
pub fn normalize(date: NaiveDate, time: Option<&str>, tz: &Tz) -> DateTime<Tz> {
    localize(date.and_time(legacy_time_or_default(time)), tz)
}

/// The pre-migration scheduling fields of one appointment row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacySchedule {
    pub appointment_date: NaiveDate,
    pub appointment_time: Option<String>,
}

impl LegacySchedule {
    pub fn new(appointment_date: NaiveDate, appointment_time: impl Into<Option<String>>) -> Self {
        Self {
            appointment_date,
            appointment_time: appointment_time.into(),
        }
    }

    pub fn normalize(&self, tz: &Tz) -> DateTime<Tz> {
        normalize(self.appointment_date, self.appointment_time.as_deref(), tz)
    }

    /// Value to write into `appointment_datetime`, or `None` when the row already
    /// has one and must be left alone.
    pub fn backfill<Z: TimeZone>(
        &self,
        current: Option<&DateTime<Z>>,
        tz: &Tz,
    ) -> Option<DateTime<Tz>> {
        match current {
            Some(_) => None,
            None => Some(self.normalize(tz)),
        }
    }
}

/// Parses an IANA zone name such as `Asia/Kathmandu`.
pub fn parse_time_zone(name: &str) -> CampusResult<Tz> {
    Tz::from_str(name.trim())
        .map_err(|_| CampusError::Validation(format!("Unknown time zone: {}", name)))
}
