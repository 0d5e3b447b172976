//! Create commands: batch files and generated date ranges.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use twl_core::generate::Descriptions;
use twl_core::{IssueKey, WorkLog, parse_batch};
use twl_tempo::WorkLogService;

/// Loads a YAML batch file and creates its entries.
pub async fn from_yaml<W: Write>(
    writer: &mut W,
    service: &WorkLogService,
    file: &Path,
    skip_weekend: bool,
) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let desired =
        parse_batch(&text).with_context(|| format!("invalid batch file {}", file.display()))?;

    let created = service.create_logs(desired, skip_weekend).await?;
    report(writer, &created)
}

/// Creates full-day entries on the holidays issue.
pub async fn holidays<W: Write>(
    writer: &mut W,
    service: &WorkLogService,
    start: NaiveDate,
    end: NaiveDate,
    issue: &str,
    skip_weekend: bool,
) -> Result<()> {
    let issue = IssueKey::new(issue).context("invalid holidays issue key")?;
    let created = service
        .create_holidays(start, end, &issue, skip_weekend)
        .await?;
    report(writer, &created)
}

/// Creates morning and afternoon entries for every day in the range.
pub async fn workdays<W: Write>(
    writer: &mut W,
    service: &WorkLogService,
    start: NaiveDate,
    end: NaiveDate,
    issue: &str,
    descriptions: &[String],
    skip_weekend: bool,
) -> Result<()> {
    let issue = IssueKey::new(issue).context("invalid issue key")?;
    let descriptions = match descriptions {
        [] => {
            tracing::warn!("no descriptions given, nothing to create");
            return Ok(());
        }
        [shared] => Descriptions::Shared(shared.clone()),
        many => Descriptions::PerEntry(many.to_vec()),
    };

    let created = service
        .create_workdays(start, end, &issue, &descriptions, skip_weekend)
        .await?;
    report(writer, &created)
}

fn report<W: Write>(writer: &mut W, created: &[WorkLog]) -> Result<()> {
    writeln!(writer, "Created {} worklog(s).", created.len())?;
    for log in created {
        writeln!(writer, "{log}")?;
    }
    Ok(())
}
