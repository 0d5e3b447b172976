//! Text codecs for the persisted worklog representation.
//!
//! Instants serialize as ISO-8601 (`YYYY-MM-DDTHH:MM:SS`, or `HH:MM:SS`
//! when the date is the placeholder), durations as `<days>T<HH:MM:SS>`.
//! Parsing additionally accepts the compact duration grammar
//! (`[Nd][Nh][Nm][Ns]`) and relative date arguments
//! (`today|week-start|week-end[±DAYS]`).
//!
//! The codecs are explicit functions plus `#[serde(with = ...)]` adapter
//! modules; there is no process-wide converter registry.

use std::sync::LazyLock;

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use regex::Regex;
use thiserror::Error;

use crate::time_span::PLACEHOLDER_DATE;

const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const TIME_FORMAT: &str = "%H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

static RELATIVE_DAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(today|week-start|week-end)([+-]\d+)?$").expect("hard-coded pattern is valid")
});

static COMPACT_DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\d+)d)?(?:(\d{1,2})h)?(?:(\d{1,2})m)?(?:(\d{1,2})s)?$")
        .expect("hard-coded pattern is valid")
});

/// Errors converting text to time values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("could not convert '{0}' to a datetime")]
    Datetime(String),
    #[error("could not convert '{0}' to a duration")]
    Duration(String),
    #[error("could not convert '{0}' to a date")]
    Date(String),
}

/// Formats an instant as `YYYY-MM-DDTHH:MM:SS`, or time-only `HH:MM:SS`
/// when the date component is the placeholder date.
#[must_use]
pub fn format_datetime(value: &NaiveDateTime) -> String {
    if value.date() == PLACEHOLDER_DATE {
        value.format(TIME_FORMAT).to_string()
    } else {
        value.format(DATETIME_FORMAT).to_string()
    }
}

/// Parses an instant from ISO-8601, or from a bare time of day, which lands
/// on the placeholder date. Fractional seconds are accepted and truncated
/// downstream by the span constructor.
pub fn parse_datetime(text: &str) -> Result<NaiveDateTime, ParseError> {
    if let Ok(value) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(value);
    }
    NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
        .map(|time| PLACEHOLDER_DATE.and_time(time))
        .map_err(|_| ParseError::Datetime(text.to_owned()))
}

/// Formats a duration as `<days>T<HH:MM:SS>`.
#[must_use]
pub fn format_duration(value: &TimeDelta) -> String {
    let total = value.num_seconds();
    let days = total.div_euclid(86_400);
    let rest = total.rem_euclid(86_400);
    format!(
        "{days}T{:02}:{:02}:{:02}",
        rest / 3600,
        rest % 3600 / 60,
        rest % 60
    )
}

/// Parses a duration from `<days>T<HH:MM:SS>` (days optional) or the
/// compact form `[Nd][Nh][Nm][Ns]` with at least one group present.
pub fn parse_duration(text: &str) -> Result<TimeDelta, ParseError> {
    if let Some(captures) = COMPACT_DURATION_RE.captures(text) {
        if captures.iter().skip(1).any(|group| group.is_some()) {
            let number = |index: usize| -> i64 {
                captures
                    .get(index)
                    .and_then(|group| group.as_str().parse().ok())
                    .unwrap_or(0)
            };
            return Ok(TimeDelta::days(number(1))
                + TimeDelta::hours(number(2))
                + TimeDelta::minutes(number(3))
                + TimeDelta::seconds(number(4)));
        }
    }

    let (days, time_part) = match text.split_once('T') {
        Some((day_part, time_part)) => {
            let days = day_part
                .parse::<i64>()
                .map_err(|_| ParseError::Duration(text.to_owned()))?;
            (days, time_part)
        }
        None => (0, text),
    };
    let time = NaiveTime::parse_from_str(time_part, TIME_FORMAT)
        .map_err(|_| ParseError::Duration(text.to_owned()))?;
    Ok(TimeDelta::days(days) + TimeDelta::seconds(i64::from(time.num_seconds_from_midnight())))
}

/// Formats a date as `YYYY-MM-DD`.
#[must_use]
pub fn format_date(value: &NaiveDate) -> String {
    value.format(DATE_FORMAT).to_string()
}

/// Parses a date from `YYYY-MM-DD` or the relative forms
/// `today|week-start|week-end[±DAYS]`, resolved against the given `today`.
///
/// `week-start` is this week's Monday, `week-end` this week's Friday.
pub fn resolve_date(text: &str, today: NaiveDate) -> Result<NaiveDate, ParseError> {
    let Some(captures) = RELATIVE_DAY_RE.captures(text) else {
        return NaiveDate::parse_from_str(text, DATE_FORMAT)
            .map_err(|_| ParseError::Date(text.to_owned()));
    };

    let weekday = i64::from(today.weekday().num_days_from_monday());
    let base = match &captures[1] {
        "week-start" => today - TimeDelta::days(weekday),
        "week-end" => today + TimeDelta::days(4 - weekday),
        _ => today,
    };
    let offset = captures
        .get(2)
        .map(|group| {
            group
                .as_str()
                .parse::<i64>()
                .map_err(|_| ParseError::Date(text.to_owned()))
        })
        .transpose()?
        .unwrap_or(0);
    Ok(base + TimeDelta::days(offset))
}

/// [`resolve_date`] against the local calendar date.
pub fn parse_date(text: &str) -> Result<NaiveDate, ParseError> {
    resolve_date(text, Local::now().date_naive())
}

/// Serde adapter for instants.
pub mod datetime {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &NaiveDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_datetime(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_datetime(&text).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for durations.
pub mod duration {
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_duration(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimeDelta, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for dates.
pub mod date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_date(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_date(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn datetime_formats_iso() {
        let value = date(1999, 12, 31).and_hms_opt(23, 59, 59).unwrap();
        assert_eq!(format_datetime(&value), "1999-12-31T23:59:59");
        assert_eq!(parse_datetime("1999-12-31T23:59:59").unwrap(), value);
    }

    #[test]
    fn datetime_uses_time_only_form_on_placeholder_date() {
        let value = PLACEHOLDER_DATE.and_hms_opt(18, 0, 0).unwrap();
        assert_eq!(format_datetime(&value), "18:00:00");
        assert_eq!(parse_datetime("18:00:00").unwrap(), value);
        assert_eq!(
            parse_datetime("15:32:18").unwrap(),
            PLACEHOLDER_DATE.and_hms_opt(15, 32, 18).unwrap()
        );
    }

    #[test]
    fn datetime_accepts_fractional_seconds() {
        assert_eq!(
            parse_datetime("2023-01-01T10:00:00.25")
                .unwrap()
                .and_utc()
                .timestamp_subsec_millis(),
            250
        );
    }

    #[test]
    fn datetime_rejects_garbage() {
        assert!(parse_datetime("not a time").is_err());
        assert!(parse_datetime("2023-01-01").is_err());
    }

    #[test]
    fn duration_round_trips() {
        for (text, value) in [
            ("0T00:00:01", TimeDelta::seconds(1)),
            ("1T00:00:01", TimeDelta::days(1) + TimeDelta::seconds(1)),
            (
                "0T12:34:56",
                TimeDelta::hours(12) + TimeDelta::minutes(34) + TimeDelta::seconds(56),
            ),
            (
                "7T12:30:00",
                TimeDelta::weeks(1) + TimeDelta::hours(12) + TimeDelta::minutes(30),
            ),
        ] {
            assert_eq!(parse_duration(text).unwrap(), value, "{text}");
            assert_eq!(format_duration(&value), text);
        }
    }

    #[test]
    fn duration_accepts_bare_time_and_compact_forms() {
        assert_eq!(parse_duration("01:30:00").unwrap(), TimeDelta::minutes(90));
        assert_eq!(parse_duration("1h").unwrap(), TimeDelta::hours(1));
        assert_eq!(
            parse_duration("1d30m").unwrap(),
            TimeDelta::days(1) + TimeDelta::minutes(30)
        );
        assert_eq!(
            parse_duration("2d2h3m4s").unwrap(),
            TimeDelta::days(2)
                + TimeDelta::hours(2)
                + TimeDelta::minutes(3)
                + TimeDelta::seconds(4)
        );
    }

    #[test]
    fn duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("later").is_err());
        assert!(parse_duration("xT00:00:01").is_err());
    }

    #[test]
    fn date_parses_iso() {
        assert_eq!(
            resolve_date("2023-09-11", date(2000, 1, 1)).unwrap(),
            date(2023, 9, 11)
        );
        assert_eq!(format_date(&date(2023, 9, 11)), "2023-09-11");
    }

    #[test]
    fn date_resolves_relative_forms() {
        // 2023-09-13 was a Wednesday.
        let today = date(2023, 9, 13);
        let monday = date(2023, 9, 11);
        let friday = date(2023, 9, 15);

        assert_eq!(resolve_date("today", today).unwrap(), today);
        assert_eq!(resolve_date("today-3", today).unwrap(), date(2023, 9, 10));
        assert_eq!(resolve_date("today+7", today).unwrap(), date(2023, 9, 20));
        assert_eq!(resolve_date("week-start", today).unwrap(), monday);
        assert_eq!(resolve_date("week-end", today).unwrap(), friday);
        assert_eq!(resolve_date("week-start+4", today).unwrap(), friday);
        assert_eq!(resolve_date("week-end-4", today).unwrap(), monday);
    }

    #[test]
    fn date_rejects_garbage() {
        assert!(resolve_date("someday", date(2023, 9, 13)).is_err());
        assert!(resolve_date("week-start+", date(2023, 9, 13)).is_err());
    }
}
