//! High-level worklog operations against the remote timesheet.
//!
//! The reconciliation itself is synchronous and lives in `twl-core`; this
//! module surrounds it with the two concurrent phases: fetching the
//! existing entries for every affected day, and executing the resulting
//! plan. Both phases run on a `JoinSet` bounded by the worker count, one
//! task per independent day or operation.
//!
//! A failing remote operation never aborts the batch: it is logged with
//! its payload and the affected entry is dropped from the result.

use std::collections::{HashMap, HashSet};
use std::thread;

use chrono::NaiveDate;
use tokio::task::{JoinError, JoinSet};
use twl_core::{
    IssueKey, ReconcileError, TimeSpan, WorkLog, affected_days, generate, overlapping, reconcile,
};

use crate::api::{Client, TempoError};

/// Worklog operations bound to one authenticated user.
#[derive(Debug)]
pub struct WorkLogService {
    client: Client,
    account_id: String,
    workers: usize,
}

impl WorkLogService {
    /// Connects the service: resolves the caller's account id up front.
    ///
    /// `workers` bounds the number of concurrent remote calls and defaults
    /// to the host's available parallelism.
    pub async fn connect(client: Client, workers: Option<usize>) -> Result<Self, TempoError> {
        let account_id = client.myself().await?;
        let workers = workers.unwrap_or_else(default_workers).max(1);
        tracing::debug!(%account_id, workers, "connected to tempo");
        Ok(Self {
            client,
            account_id,
            workers,
        })
    }

    /// All worklogs on a single day.
    pub async fn get_logs_on_date(&self, day: NaiveDate) -> Result<Vec<WorkLog>, TempoError> {
        self.client.worklogs_on(&self.account_id, day).await
    }

    /// All worklogs overlapping the given span, in day order, deduplicated
    /// by identity. Days that fail to fetch are logged and skipped.
    pub async fn get_logs_in_span(&self, span: &TimeSpan) -> Vec<WorkLog> {
        let days = span.dates();
        let (fetched, _failed) = self.fetch_days(days.clone()).await;

        let mut seen = HashSet::new();
        let mut logs = Vec::new();
        for day in days {
            for log in fetched.get(&day).into_iter().flatten() {
                if log.time_span.intersection(span).is_none() {
                    continue;
                }
                if let Some(id) = log.worklog_id {
                    if !seen.insert(id) {
                        continue;
                    }
                }
                logs.push(log.clone());
            }
        }
        logs
    }

    /// Deletes every worklog overlapping the given span. Per-entry
    /// failures are logged and skipped.
    pub async fn delete_logs(&self, span: &TimeSpan) {
        let ids: Vec<i64> = self
            .get_logs_in_span(span)
            .await
            .iter()
            .filter_map(|log| log.worklog_id)
            .collect();
        self.delete_all(ids).await;
    }

    /// Creates a batch of worklogs, reconciling them against whatever
    /// already exists on the affected days.
    ///
    /// Entries starting on a weekend are dropped up front (with a warning)
    /// unless `skip_weekend` is off. Existing entries overlapped by the
    /// batch are shrunk, split or deleted so that no overlap remains.
    /// Returns the entries that were actually created.
    ///
    /// # Errors
    ///
    /// Fails fast with [`twl_core::ReconcileError::OverlappingInput`]
    /// (wrapped in [`TempoError::Reconcile`]) if the batch overlaps itself;
    /// no remote entry is touched in that case.
    pub async fn create_logs(
        &self,
        desired: Vec<WorkLog>,
        skip_weekend: bool,
    ) -> Result<Vec<WorkLog>, TempoError> {
        let desired: Vec<WorkLog> = desired
            .into_iter()
            .filter(|log| {
                if skip_weekend && generate::is_weekend(log.time_span.start().date()) {
                    tracing::warn!(%log, "worklog starts on a weekend, skipping");
                    return false;
                }
                true
            })
            .collect();
        if desired.is_empty() {
            return Ok(Vec::new());
        }

        // The batch must be internally consistent before any remote call.
        let conflicts = overlapping(&desired);
        if !conflicts.is_empty() {
            return Err(ReconcileError::OverlappingInput(conflicts).into());
        }

        let days: Vec<NaiveDate> = affected_days(&desired).into_iter().collect();
        let (fetched, failed) = self.fetch_days(days).await;

        // Entries on a day we could not inspect are dropped rather than
        // risking an overlap with unseen existing entries.
        let desired: Vec<WorkLog> = desired
            .into_iter()
            .filter(|log| {
                let unseen = log.time_span.dates().iter().any(|day| failed.contains(day));
                if unseen {
                    tracing::error!(%log, "dropping entry, could not inspect its days");
                }
                !unseen
            })
            .collect();
        if desired.is_empty() {
            return Ok(Vec::new());
        }

        let plan = reconcile(desired, |day| {
            fetched.get(&day).cloned().unwrap_or_default()
        })?;
        tracing::debug!(
            creates = plan.to_create.len(),
            updates = plan.to_update.len(),
            deletes = plan.to_delete.len(),
            "reconciled batch"
        );

        self.update_all(plan.to_update).await;
        self.delete_all(plan.to_delete).await;
        Ok(self.create_all(plan.to_create).await)
    }

    /// Full-day holiday entries for every weekday in the range.
    pub async fn create_holidays(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        issue: &IssueKey,
        skip_weekend: bool,
    ) -> Result<Vec<WorkLog>, TempoError> {
        self.create_logs(generate::holidays(start_date, end_date, issue), skip_weekend)
            .await
    }

    /// Morning + afternoon entries for every weekday in the range.
    pub async fn create_workdays(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        issue: &IssueKey,
        descriptions: &generate::Descriptions,
        skip_weekend: bool,
    ) -> Result<Vec<WorkLog>, TempoError> {
        self.create_logs(
            generate::workdays(start_date, end_date, issue, descriptions),
            skip_weekend,
        )
        .await
    }

    /// Fetches the existing worklogs for every given day, up to `workers`
    /// days in flight at once. Failed days are logged and reported back.
    async fn fetch_days(
        &self,
        days: Vec<NaiveDate>,
    ) -> (HashMap<NaiveDate, Vec<WorkLog>>, Vec<NaiveDate>) {
        let mut tasks: JoinSet<(NaiveDate, Result<Vec<WorkLog>, TempoError>)> = JoinSet::new();
        let mut fetched = HashMap::new();
        let mut failed = Vec::new();

        for day in days.iter().copied() {
            let client = self.client.clone();
            let account_id = self.account_id.clone();
            tasks.spawn(async move { (day, client.worklogs_on(&account_id, day).await) });

            if tasks.len() >= self.workers {
                if let Some(joined) = tasks.join_next().await {
                    collect_fetched(joined, &mut fetched, &mut failed);
                }
            }
        }
        while let Some(joined) = tasks.join_next().await {
            collect_fetched(joined, &mut fetched, &mut failed);
        }

        // A task that died before reporting (join error) leaves its day in
        // neither map; such days count as failed, not as empty.
        mark_unreported_days(days, &fetched, &mut failed);

        (fetched, failed)
    }

    /// Updates every entry, up to `workers` in flight at once.
    async fn update_all(&self, logs: Vec<WorkLog>) {
        let mut tasks: JoinSet<(WorkLog, Result<WorkLog, TempoError>)> = JoinSet::new();

        for log in logs {
            let client = self.client.clone();
            let account_id = self.account_id.clone();
            tasks.spawn(async move {
                let result = client.update_worklog(&account_id, &log).await;
                (log, result)
            });

            if tasks.len() >= self.workers {
                if let Some(joined) = tasks.join_next().await {
                    collect_updated(joined);
                }
            }
        }
        while let Some(joined) = tasks.join_next().await {
            collect_updated(joined);
        }
    }

    /// Deletes every identity, up to `workers` in flight at once.
    async fn delete_all(&self, ids: Vec<i64>) {
        let mut tasks: JoinSet<(i64, Result<(), TempoError>)> = JoinSet::new();

        for id in ids {
            let client = self.client.clone();
            tasks.spawn(async move { (id, client.delete_worklog(id).await) });

            if tasks.len() >= self.workers {
                if let Some(joined) = tasks.join_next().await {
                    collect_deleted(joined);
                }
            }
        }
        while let Some(joined) = tasks.join_next().await {
            collect_deleted(joined);
        }
    }

    /// Creates every entry, up to `workers` in flight at once. Returns the
    /// created entries in input order; failed entries are dropped.
    async fn create_all(&self, logs: Vec<WorkLog>) -> Vec<WorkLog> {
        let mut tasks: JoinSet<(usize, WorkLog, Result<WorkLog, TempoError>)> = JoinSet::new();
        let mut slots: Vec<Option<WorkLog>> = vec![None; logs.len()];

        for (index, log) in logs.into_iter().enumerate() {
            let client = self.client.clone();
            let account_id = self.account_id.clone();
            tasks.spawn(async move {
                let result = client.create_worklog(&account_id, &log).await;
                (index, log, result)
            });

            if tasks.len() >= self.workers {
                if let Some(joined) = tasks.join_next().await {
                    collect_created(joined, &mut slots);
                }
            }
        }
        while let Some(joined) = tasks.join_next().await {
            collect_created(joined, &mut slots);
        }

        slots.into_iter().flatten().collect()
    }
}

fn default_workers() -> usize {
    thread::available_parallelism().map_or(4, std::num::NonZeroUsize::get)
}

fn mark_unreported_days(
    days: Vec<NaiveDate>,
    fetched: &HashMap<NaiveDate, Vec<WorkLog>>,
    failed: &mut Vec<NaiveDate>,
) {
    for day in days {
        if !fetched.contains_key(&day) && !failed.contains(&day) {
            tracing::error!(%day, "no result for day, treating its lookup as failed");
            failed.push(day);
        }
    }
}

fn collect_fetched(
    joined: Result<(NaiveDate, Result<Vec<WorkLog>, TempoError>), JoinError>,
    fetched: &mut HashMap<NaiveDate, Vec<WorkLog>>,
    failed: &mut Vec<NaiveDate>,
) {
    match joined {
        Ok((day, Ok(logs))) => {
            fetched.insert(day, logs);
        }
        Ok((day, Err(error))) => {
            tracing::error!(%day, %error, "failed to fetch existing worklogs");
            failed.push(day);
        }
        Err(error) => tracing::error!(%error, "worklog fetch task failed"),
    }
}

fn collect_updated(joined: Result<(WorkLog, Result<WorkLog, TempoError>), JoinError>) {
    match joined {
        Ok((_, Ok(updated))) => tracing::info!(%updated, "updated worklog"),
        Ok((log, Err(error))) => tracing::error!(%error, payload = %log, "failed to update worklog"),
        Err(error) => tracing::error!(%error, "worklog update task failed"),
    }
}

fn collect_deleted(joined: Result<(i64, Result<(), TempoError>), JoinError>) {
    match joined {
        Ok((id, Ok(()))) => tracing::info!(id, "deleted worklog"),
        Ok((id, Err(error))) => tracing::error!(%error, id, "failed to delete worklog"),
        Err(error) => tracing::error!(%error, "worklog delete task failed"),
    }
}

fn collect_created(
    joined: Result<(usize, WorkLog, Result<WorkLog, TempoError>), JoinError>,
    slots: &mut [Option<WorkLog>],
) {
    match joined {
        Ok((index, _, Ok(created))) => {
            tracing::info!(%created, "created worklog");
            if let Some(slot) = slots.get_mut(index) {
                *slot = Some(created);
            }
        }
        Ok((_, log, Err(error))) => {
            tracing::error!(%error, payload = %log, "failed to create worklog");
        }
        Err(error) => tracing::error!(%error, "worklog create task failed"),
    }
}
