//! Batch generation of worklogs over a date range.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::time_span::{TimeSpan, afternoon, full_day, morning};
use crate::work_log::{IssueKey, WorkLog};

/// Description source for generated entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descriptions {
    /// One description applied to every generated entry.
    Shared(String),
    /// One description per (day, template) pair, in source order.
    PerEntry(Vec<String>),
}

/// Whether a date falls on a Saturday or Sunday.
#[must_use]
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Generates one worklog per (day, template) pair from `start_date` through
/// `end_date` inclusive, moving each template span onto the day.
///
/// Weekend days generate nothing, but their description slots are still
/// consumed in source order: the pairing is a plain zip over all
/// (day, template) pairs, applied before the weekend skip. A
/// [`Descriptions::PerEntry`] count that does not match the number of
/// pairs is logged as a warning and the shorter sequence wins.
#[must_use]
pub fn expand_date_range(
    start_date: NaiveDate,
    end_date: NaiveDate,
    issue: &IssueKey,
    templates: &[TimeSpan],
    descriptions: &Descriptions,
) -> Vec<WorkLog> {
    if end_date < start_date {
        tracing::warn!(%start_date, %end_date, "empty date range, nothing to generate");
        return Vec::new();
    }

    if let Descriptions::PerEntry(list) = descriptions {
        let days = usize::try_from((end_date - start_date).num_days() + 1).unwrap_or(0);
        let expected = days * templates.len();
        if list.len() != expected {
            tracing::warn!(
                got = list.len(),
                expected,
                "description count does not match the generated entries"
            );
        }
    }

    let mut logs = Vec::new();
    let mut slot = 0usize;
    let mut day = start_date;
    while day <= end_date {
        for template in templates {
            let index = slot;
            slot += 1;
            if is_weekend(day) {
                continue;
            }
            let description = match descriptions {
                Descriptions::Shared(text) => text.clone(),
                Descriptions::PerEntry(list) => match list.get(index) {
                    Some(text) => text.clone(),
                    None => return logs,
                },
            };
            logs.push(WorkLog::new(
                issue.clone(),
                template.change_date(day),
                description,
            ));
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    logs
}

/// Full-day holiday entries for every weekday in the range.
#[must_use]
pub fn holidays(start_date: NaiveDate, end_date: NaiveDate, issue: &IssueKey) -> Vec<WorkLog> {
    expand_date_range(
        start_date,
        end_date,
        issue,
        &[full_day()],
        &Descriptions::Shared("holidays".to_owned()),
    )
}

/// Morning and afternoon entries for every weekday in the range, with a
/// lunch break in between.
#[must_use]
pub fn workdays(
    start_date: NaiveDate,
    end_date: NaiveDate,
    issue: &IssueKey,
    descriptions: &Descriptions,
) -> Vec<WorkLog> {
    expand_date_range(start_date, end_date, issue, &[morning(), afternoon()], descriptions)
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;
    use crate::time_span::{DAILY_WORKLOAD_SECS, PLACEHOLDER_DATE};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn issue() -> IssueKey {
        IssueKey::new("PP-7").unwrap()
    }

    #[test]
    fn weekend_days_generate_nothing() {
        // 2023-09-22 was a Friday; the range covers Sat 23rd and Sun 24th.
        let logs = holidays(date(2023, 9, 22), date(2023, 9, 25), &issue());

        let days: Vec<NaiveDate> = logs
            .iter()
            .map(|log| log.time_span.start().date())
            .collect();
        assert_eq!(days, vec![date(2023, 9, 22), date(2023, 9, 25)]);
        assert!(days.iter().all(|day| !is_weekend(*day)));
    }

    #[test]
    fn holidays_fill_the_daily_workload() {
        let logs = holidays(date(2023, 9, 25), date(2023, 9, 25), &issue());
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].description, "holidays");
        assert_eq!(
            logs[0].time_span.duration(),
            TimeDelta::seconds(DAILY_WORKLOAD_SECS)
        );
        assert_eq!(logs[0].worklog_id, None);
    }

    #[test]
    fn workdays_create_two_entries_per_day() {
        let logs = workdays(
            date(2023, 9, 25),
            date(2023, 9, 26),
            &issue(),
            &Descriptions::Shared("dev".to_owned()),
        );
        assert_eq!(logs.len(), 4);
        // Morning and afternoon never overlap on the same day.
        assert_eq!(
            logs[0].time_span.intersection(&logs[1].time_span),
            None
        );
        assert!(logs.iter().all(|log| log.description == "dev"));
        // Templates carry the placeholder date; generated entries must not.
        assert!(
            logs.iter()
                .all(|log| log.time_span.start().date() != PLACEHOLDER_DATE)
        );
    }

    #[test]
    fn per_entry_descriptions_are_consumed_in_source_order_across_weekends() {
        // Fri 22nd through Mon 25th, two templates per day: slots 0-1 are
        // Friday, 2-5 are burned on the weekend, 6-7 land on Monday.
        let descriptions: Vec<String> = (0..8).map(|i| format!("d{i}")).collect();
        let logs = workdays(
            date(2023, 9, 22),
            date(2023, 9, 25),
            &issue(),
            &Descriptions::PerEntry(descriptions),
        );

        let got: Vec<&str> = logs.iter().map(|log| log.description.as_str()).collect();
        assert_eq!(got, vec!["d0", "d1", "d6", "d7"]);
    }

    #[test]
    fn generation_stops_when_descriptions_run_out() {
        let logs = workdays(
            date(2023, 9, 25),
            date(2023, 9, 26),
            &issue(),
            &Descriptions::PerEntry(vec!["only".to_owned()]),
        );
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].description, "only");
    }

    #[test]
    fn an_inverted_range_generates_nothing() {
        let logs = holidays(date(2023, 9, 26), date(2023, 9, 25), &issue());
        assert!(logs.is_empty());
    }
}
