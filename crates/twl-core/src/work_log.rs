//! Worklog records and their batch forms.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec;
use crate::time_span::{PLACEHOLDER_DATE, TimeSpan};

/// Validation errors for worklog fields.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The issue key was empty.
    #[error("issue key cannot be empty")]
    EmptyIssueKey,
}

/// A validated issue key (e.g. `PP-1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IssueKey(String);

impl IssueKey {
    /// Creates a new issue key after validation.
    pub fn new(key: impl Into<String>) -> Result<Self, ValidationError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ValidationError::EmptyIssueKey);
        }
        Ok(Self(key))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for IssueKey {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<IssueKey> for String {
    fn from(key: IssueKey) -> Self {
        key.0
    }
}

impl AsRef<str> for IssueKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IssueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A worklog record: issue, time span, description and - for entries that
/// already exist on the remote side - the Tempo worklog id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkLog {
    /// Issue the time is booked on.
    pub issue: IssueKey,

    /// The booked time interval.
    pub time_span: TimeSpan,

    /// Free-text description.
    pub description: String,

    /// Remote identity. `None` for entries that are yet to be created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worklog_id: Option<i64>,
}

impl WorkLog {
    /// Creates a new, not-yet-persisted worklog (no remote identity).
    #[must_use]
    pub fn new(issue: IssueKey, time_span: TimeSpan, description: impl Into<String>) -> Self {
        Self {
            issue,
            time_span,
            description: description.into(),
            worklog_id: None,
        }
    }

    /// Returns a copy with the time span replaced.
    #[must_use]
    pub fn with_time_span(&self, time_span: TimeSpan) -> Self {
        Self {
            time_span,
            ..self.clone()
        }
    }

    /// Returns a copy without a remote identity.
    #[must_use]
    pub fn without_id(mut self) -> Self {
        self.worklog_id = None;
        self
    }
}

impl fmt::Display for WorkLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.issue, self.time_span, self.description)?;
        if let Some(id) = self.worklog_id {
            write!(f, " (worklog {id})")?;
        }
        Ok(())
    }
}

/// Returns every pair of worklogs from `logs` whose time spans overlap.
#[must_use]
pub fn overlapping(logs: &[WorkLog]) -> Vec<(WorkLog, WorkLog)> {
    let mut pairs = Vec::new();
    for (index, first) in logs.iter().enumerate() {
        for second in &logs[index + 1..] {
            if first.time_span.intersection(&second.time_span).is_some() {
                pairs.push((first.clone(), second.clone()));
            }
        }
    }
    pairs
}

/// Worklogs grouped by day offset from a single start date.
///
/// The "sequence" persisted form: each entry's span carries only a time of
/// day (on the placeholder date) and is resolved against `start_date` plus
/// its group's offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkLogSequence {
    /// Date of day offset 0.
    #[serde(with = "codec::date")]
    pub start_date: NaiveDate,

    /// Worklogs per day offset.
    pub day_to_logs: BTreeMap<i64, Vec<WorkLog>>,
}

impl WorkLogSequence {
    /// Folds dated worklogs into the offset form. The earliest start date
    /// becomes day 0. Returns `None` for an empty input.
    #[must_use]
    pub fn from_worklogs(logs: &[WorkLog]) -> Option<Self> {
        let start_date = logs.iter().map(|log| log.time_span.start().date()).min()?;
        let mut day_to_logs: BTreeMap<i64, Vec<WorkLog>> = BTreeMap::new();
        for log in logs {
            let day = (log.time_span.start().date() - start_date).num_days();
            day_to_logs
                .entry(day)
                .or_default()
                .push(log.with_time_span(log.time_span.change_date(PLACEHOLDER_DATE)));
        }
        Some(Self {
            start_date,
            day_to_logs,
        })
    }

    /// Resolves the sequence back into dated worklogs.
    #[must_use]
    pub fn worklogs(&self) -> Vec<WorkLog> {
        self.day_to_logs
            .iter()
            .flat_map(|(day, logs)| {
                let date = self.start_date + TimeDelta::days(*day);
                logs.iter()
                    .map(move |log| log.with_time_span(log.time_span.change_date(date)))
            })
            .collect()
    }
}
