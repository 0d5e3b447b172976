//! Time span value type and its interval algebra.
//!
//! A [`TimeSpan`] is an immutable interval with second precision: a start
//! instant plus a strictly positive duration. All operations return new
//! values. Intersection and subtraction are the building blocks of the
//! reconciliation engine in [`crate::reconcile`].

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec;

/// Canonical date carried by spans whose real calendar date is not yet known
/// (templates, sequence entries). Matches the time-only serialized form.
pub const PLACEHOLDER_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1, 1, 1) {
    Some(date) => date,
    None => panic!("0001-01-01 is a valid date"),
};

/// Daily workload in seconds (7.7 h).
pub const DAILY_WORKLOAD_SECS: i64 = 27_720;

/// Start of a regular working day.
pub const DAY_START: NaiveTime = match NaiveTime::from_hms_opt(9, 30, 0) {
    Some(time) => time,
    None => panic!("09:30:00 is a valid time"),
};

/// Start of the lunch break.
pub const LUNCH_BREAK_START: NaiveTime = match NaiveTime::from_hms_opt(12, 30, 0) {
    Some(time) => time,
    None => panic!("12:30:00 is a valid time"),
};

/// End of the lunch break.
pub const LUNCH_BREAK_END: NaiveTime = match NaiveTime::from_hms_opt(13, 30, 0) {
    Some(time) => time,
    None => panic!("13:30:00 is a valid time"),
};

/// Construction errors for [`TimeSpan`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimeSpanError {
    /// The explicit end did not lie after the start.
    #[error("end time {end} must be greater than start time {start}")]
    InvalidRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    /// The duration was zero or negative after truncation.
    #[error("time span duration must be positive, got {seconds}s")]
    EmptyDuration { seconds: i64 },
}

/// Serialized shape of a [`TimeSpan`].
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct TimeSpanRepr {
    #[serde(with = "codec::datetime")]
    start: NaiveDateTime,
    #[serde(with = "codec::duration")]
    duration: TimeDelta,
}

/// An immutable time interval: start instant + positive duration, second
/// precision.
///
/// Sub-second components are truncated (floored) at construction, so two
/// spans built through different constructors compare equal whenever their
/// truncated `(start, duration)` pairs match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TimeSpanRepr", into = "TimeSpanRepr")]
pub struct TimeSpan {
    start: NaiveDateTime,
    duration: TimeDelta,
}

impl TimeSpan {
    /// Creates a span from a start instant and a duration.
    ///
    /// # Errors
    ///
    /// Returns [`TimeSpanError::EmptyDuration`] if the truncated duration is
    /// not strictly positive.
    pub fn from_start_and_duration(
        start: NaiveDateTime,
        duration: TimeDelta,
    ) -> Result<Self, TimeSpanError> {
        let start = start.with_nanosecond(0).unwrap_or(start);
        let duration = TimeDelta::seconds(duration.num_seconds());
        if duration <= TimeDelta::zero() {
            return Err(TimeSpanError::EmptyDuration {
                seconds: duration.num_seconds(),
            });
        }
        Ok(Self { start, duration })
    }

    /// Creates a span from two instants.
    ///
    /// # Errors
    ///
    /// Returns [`TimeSpanError::InvalidRange`] if `end <= start`.
    pub fn from_start_and_end(
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Self, TimeSpanError> {
        let start = start.with_nanosecond(0).unwrap_or(start);
        let end = end.with_nanosecond(0).unwrap_or(end);
        if end <= start {
            return Err(TimeSpanError::InvalidRange { start, end });
        }
        Ok(Self::unchecked(start, end - start))
    }

    /// Creates a date-level span: 00:00 on `start_date` through 23:59 on
    /// `end_date`. Used by the date-range commands.
    ///
    /// # Errors
    ///
    /// Returns [`TimeSpanError::InvalidRange`] if `end_date < start_date`.
    pub fn from_dates(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self, TimeSpanError> {
        Self::from_start_and_end(
            start_date.and_time(NaiveTime::MIN),
            end_date.and_time(day_end()),
        )
    }

    /// Internal constructor for values already known to hold the invariants.
    fn unchecked(start: NaiveDateTime, duration: TimeDelta) -> Self {
        debug_assert!(duration > TimeDelta::zero());
        debug_assert_eq!(start.nanosecond(), 0);
        Self { start, duration }
    }

    /// The start instant.
    #[must_use]
    pub const fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// The duration.
    #[must_use]
    pub const fn duration(&self) -> TimeDelta {
        self.duration
    }

    /// The end instant (`start + duration`).
    #[must_use]
    pub fn end(&self) -> NaiveDateTime {
        self.start + self.duration
    }

    /// Every calendar day this span touches, from `start.date()` through
    /// `end().date()` inclusive.
    #[must_use]
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut days = Vec::new();
        let mut day = self.start.date();
        let last = self.end().date();
        while day <= last {
            days.push(day);
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        days
    }

    /// Returns a copy whose calendar date is replaced, preserving the
    /// time of day and the duration.
    #[must_use]
    pub fn change_date(&self, new_date: NaiveDate) -> Self {
        Self::unchecked(new_date.and_time(self.start.time()), self.duration)
    }

    /// The overlapping portion of two spans, if any.
    ///
    /// Spans touching only at an endpoint do not intersect. Symmetric:
    /// `a.intersection(b) == b.intersection(a)`.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let starts_inside =
            |a: &Self, b: &Self| b.start <= a.start && a.start < b.end();
        if starts_inside(self, other) || starts_inside(other, self) {
            let start = self.start.max(other.start);
            let end = self.end().min(other.end());
            Some(Self::unchecked(start, end - start))
        } else {
            None
        }
    }

    /// Removes the part of `self` that overlaps with `other`.
    ///
    /// Returns, left to right:
    /// - `[self]` unchanged when there is no overlap,
    /// - nothing when `other` fully covers `self`,
    /// - one remnant when only the head or the tail survives,
    /// - two remnants when `other` is strictly contained in `self`.
    #[must_use]
    pub fn subtract(&self, other: &Self) -> Vec<Self> {
        let Some(overlap) = self.intersection(other) else {
            return vec![*self];
        };

        let mut remnants = Vec::new();
        if self.start < overlap.start {
            remnants.push(Self::unchecked(self.start, overlap.start - self.start));
        }
        if overlap.end() < self.end() {
            remnants.push(Self::unchecked(overlap.end(), self.end() - overlap.end()));
        }
        remnants
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            codec::format_datetime(&self.start),
            codec::format_datetime(&self.end())
        )
    }
}

impl TryFrom<TimeSpanRepr> for TimeSpan {
    type Error = TimeSpanError;

    fn try_from(repr: TimeSpanRepr) -> Result<Self, Self::Error> {
        Self::from_start_and_duration(repr.start, repr.duration)
    }
}

impl From<TimeSpan> for TimeSpanRepr {
    fn from(span: TimeSpan) -> Self {
        Self {
            start: span.start,
            duration: span.duration,
        }
    }
}

/// 23:59, the end-of-day instant used by [`TimeSpan::from_dates`].
fn day_end() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN)
}

/// A full working day on the placeholder date: 7.7 h from [`DAY_START`],
/// no lunch break.
#[must_use]
pub fn full_day() -> TimeSpan {
    TimeSpan::unchecked(
        PLACEHOLDER_DATE.and_time(DAY_START),
        TimeDelta::seconds(DAILY_WORKLOAD_SECS),
    )
}

/// The morning block: [`DAY_START`] until [`LUNCH_BREAK_START`].
#[must_use]
pub fn morning() -> TimeSpan {
    let start = PLACEHOLDER_DATE.and_time(DAY_START);
    let end = PLACEHOLDER_DATE.and_time(LUNCH_BREAK_START);
    TimeSpan::unchecked(start, end - start)
}

/// The afternoon block: [`LUNCH_BREAK_END`] plus whatever the morning
/// leaves of the daily workload.
#[must_use]
pub fn afternoon() -> TimeSpan {
    TimeSpan::unchecked(
        PLACEHOLDER_DATE.and_time(LUNCH_BREAK_END),
        TimeDelta::seconds(DAILY_WORKLOAD_SECS) - morning().duration(),
    )
}
