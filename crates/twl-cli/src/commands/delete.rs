//! Delete command for clearing worklogs in a date range.

use anyhow::Result;
use chrono::NaiveDate;
use twl_core::TimeSpan;
use twl_tempo::WorkLogService;

pub async fn run(service: &WorkLogService, start: NaiveDate, end: NaiveDate) -> Result<()> {
    let span = TimeSpan::from_dates(start, end)?;
    service.delete_logs(&span).await;
    Ok(())
}
