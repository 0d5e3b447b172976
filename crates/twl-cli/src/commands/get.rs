//! Get command for listing worklogs in a date range.

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;
use twl_core::TimeSpan;
use twl_tempo::WorkLogService;

pub async fn run<W: Write>(
    writer: &mut W,
    service: &WorkLogService,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<()> {
    let span = TimeSpan::from_dates(start, end)?;
    let logs = service.get_logs_in_span(&span).await;

    if logs.is_empty() {
        writeln!(writer, "No worklogs between {start} and {end}.")?;
        return Ok(());
    }
    for log in &logs {
        writeln!(writer, "{log}")?;
    }
    Ok(())
}
