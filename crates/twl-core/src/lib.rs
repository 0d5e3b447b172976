//! Worklog domain logic for the Tempo CLI.
//!
//! This crate contains the fundamental types and logic for:
//! - Time span algebra: intersection, subtraction, date shifting
//! - Reconciliation: replacing overlapping remote time with new entries
//! - Batch generation: holidays, workdays, per-day templates
//! - Codecs for the persisted worklog representation
//!
//! Everything here is pure and synchronous; talking to Jira/Tempo is the
//! `twl-tempo` crate's job.

pub mod codec;
pub mod generate;
mod input;
mod reconcile;
mod time_span;
mod work_log;

pub use input::{InputError, parse_batch};
pub use reconcile::{Plan, ReconcileError, affected_days, reconcile};
pub use time_span::{
    DAILY_WORKLOAD_SECS, DAY_START, LUNCH_BREAK_END, LUNCH_BREAK_START, PLACEHOLDER_DATE,
    TimeSpan, TimeSpanError, afternoon, full_day, morning,
};
pub use work_log::{IssueKey, ValidationError, WorkLog, WorkLogSequence, overlapping};
