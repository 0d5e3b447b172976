//! Conflict resolution between desired and existing worklogs.
//!
//! Given a batch of desired entries and the entries already present on the
//! remote side, computes the set of creates, updates and deletes that
//! replaces overlapping remote time with the desired entries while leaving
//! non-overlapping remote time untouched. Purely synchronous; the caller is
//! responsible for fetching existing entries and executing the plan.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use thiserror::Error;

use crate::work_log::{WorkLog, overlapping};

/// Reconciliation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// The desired batch contained mutually overlapping entries. Carries
    /// the offending pairs; raised before any lookup.
    #[error("overlapping worklogs in batch: {0:?}")]
    OverlappingInput(Vec<(WorkLog, WorkLog)>),
}

/// The operations that realize a reconciled batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    /// Entries to create (no identity yet).
    pub to_create: Vec<WorkLog>,

    /// Existing entries to update, identity preserved, span shrunk.
    pub to_update: Vec<WorkLog>,

    /// Identities of existing entries fully covered by desired time.
    pub to_delete: Vec<i64>,
}

impl Plan {
    /// Total number of operations in the plan.
    #[must_use]
    pub fn len(&self) -> usize {
        self.to_create.len() + self.to_update.len() + self.to_delete.len()
    }

    /// Whether the plan contains no operations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Every calendar day touched by any of the given worklogs.
///
/// Exposed separately from [`reconcile`] so a caller can fetch the existing
/// entries for all affected days concurrently before running the
/// synchronous reconciliation.
#[must_use]
pub fn affected_days(logs: &[WorkLog]) -> BTreeSet<NaiveDate> {
    logs.iter()
        .flat_map(|log| log.time_span.dates())
        .collect()
}

/// Reconciles a batch of desired worklogs against the existing entries
/// returned by `existing_on`.
///
/// Steps:
/// 1. the desired batch must be free of self-overlaps, otherwise the whole
///    call fails before any lookup;
/// 2. existing entries are looked up once per affected day;
/// 3. every existing entry accumulates all desired entries overlapping it;
/// 4. the overlapping spans are subtracted from the existing span, and the
///    remnant set decides the entry's fate: nothing left - delete; one
///    remnant - update in place; two remnants - update plus a brand-new
///    entry for the far side of the split.
///
/// All desired entries, including fragments synthesized by splits, end up
/// in [`Plan::to_create`]. Existing entries the batch never touches are
/// left alone. The subtraction fold is order-independent because desired
/// entries are mutually non-overlapping.
///
/// # Errors
///
/// Returns [`ReconcileError::OverlappingInput`] if `desired` contains
/// pairwise-overlapping entries.
pub fn reconcile<F>(mut desired: Vec<WorkLog>, mut existing_on: F) -> Result<Plan, ReconcileError>
where
    F: FnMut(NaiveDate) -> Vec<WorkLog>,
{
    let conflicts = overlapping(&desired);
    if !conflicts.is_empty() {
        return Err(ReconcileError::OverlappingInput(conflicts));
    }

    let mut day_to_desired: BTreeMap<NaiveDate, Vec<usize>> = BTreeMap::new();
    for (index, log) in desired.iter().enumerate() {
        for day in log.time_span.dates() {
            day_to_desired.entry(day).or_default().push(index);
        }
    }

    // Existing entry -> indices of overlapping desired entries. A multi-day
    // existing entry shows up in several day lookups; accumulate it once,
    // in first-seen order, so the plan is deterministic.
    let mut hits: Vec<(WorkLog, Vec<usize>)> = Vec::new();
    for (day, candidates) in &day_to_desired {
        for existing in existing_on(*day) {
            let overlaps: Vec<usize> = candidates
                .iter()
                .copied()
                .filter(|&index| {
                    desired[index]
                        .time_span
                        .intersection(&existing.time_span)
                        .is_some()
                })
                .collect();
            if overlaps.is_empty() {
                continue;
            }
            match hits.iter_mut().find(|(seen, _)| *seen == existing) {
                Some((_, indices)) => {
                    for index in overlaps {
                        if !indices.contains(&index) {
                            indices.push(index);
                        }
                    }
                }
                None => hits.push((existing, overlaps)),
            }
        }
    }

    let mut plan = Plan::default();
    for (existing, indices) in hits {
        let mut remaining = vec![existing.time_span];
        for &index in &indices {
            let desired_span = desired[index].time_span;
            remaining = remaining
                .iter()
                .flat_map(|span| span.subtract(&desired_span))
                .collect();
        }

        let mut remnants = remaining.into_iter();
        match remnants.next() {
            None => match existing.worklog_id {
                Some(id) => plan.to_delete.push(id),
                None => tracing::warn!(%existing, "existing worklog has no id, cannot delete"),
            },
            Some(first) => {
                // The first remnant keeps the identity; any further remnant
                // becomes a brand-new entry carrying over issue and
                // description.
                for span in remnants {
                    desired.push(existing.with_time_span(span).without_id());
                }
                plan.to_update.push(existing.with_time_span(first));
            }
        }
    }

    plan.to_create = desired;
    Ok(plan)
}
