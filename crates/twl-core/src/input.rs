//! YAML batch-input parsing.
//!
//! Two shapes are accepted: a flat list of worklog records, or a
//! [`WorkLogSequence`] mapping grouping time-only entries by day offset.

use serde::Deserialize;
use thiserror::Error;

use crate::work_log::{WorkLog, WorkLogSequence};

/// Batch-input errors.
#[derive(Debug, Error)]
pub enum InputError {
    /// The document matched neither supported shape.
    #[error("unsupported worklog file format: {0}")]
    Format(#[from] serde_yaml::Error),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BatchInput {
    Sequence(WorkLogSequence),
    List(Vec<WorkLog>),
}

/// Parses a batch of worklogs from YAML text.
pub fn parse_batch(text: &str) -> Result<Vec<WorkLog>, InputError> {
    match serde_yaml::from_str(text)? {
        BatchInput::Sequence(sequence) => Ok(sequence.worklogs()),
        BatchInput::List(logs) => Ok(logs),
    }
}
