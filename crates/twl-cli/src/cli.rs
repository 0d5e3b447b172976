//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use twl_core::codec;

/// Tempo worklog reconciler.
///
/// Creates, lists and deletes Tempo worklogs; any existing time a new batch
/// overlaps is shrunk, split or deleted to make room.
#[derive(Debug, Parser)]
#[command(name = "twl", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print worklogs between two dates (inclusive).
    Get {
        /// First day: YYYY-MM-DD, or today|week-start|week-end with an
        /// optional +N/-N day offset.
        #[arg(value_parser = parse_date)]
        start: NaiveDate,

        /// Last day (inclusive), same formats.
        #[arg(value_parser = parse_date)]
        end: NaiveDate,
    },

    /// Delete all worklogs between two dates (inclusive).
    Delete {
        /// First day.
        #[arg(value_parser = parse_date)]
        start: NaiveDate,

        /// Last day (inclusive).
        #[arg(value_parser = parse_date)]
        end: NaiveDate,
    },

    /// Create worklogs, replacing whatever they overlap.
    Create {
        #[command(subcommand)]
        batch: CreateCommand,
    },
}

/// Batch sources for `twl create`.
#[derive(Debug, Subcommand)]
pub enum CreateCommand {
    /// Load a batch from a YAML file.
    FromYaml {
        /// Batch file: either a worklog list or a start-date plus
        /// day-offset sequence.
        file: PathBuf,

        /// Also create entries starting on a weekend.
        #[arg(long)]
        include_weekends: bool,
    },

    /// Full-day entries on the configured holidays issue.
    Holidays {
        /// First day.
        #[arg(value_parser = parse_date)]
        start: NaiveDate,

        /// Last day (inclusive).
        #[arg(value_parser = parse_date)]
        end: NaiveDate,

        /// Also create entries on weekend days.
        #[arg(long)]
        include_weekends: bool,
    },

    /// Morning and afternoon entries for every day in the range.
    Workdays {
        /// First day.
        #[arg(value_parser = parse_date)]
        start: NaiveDate,

        /// Last day (inclusive).
        #[arg(value_parser = parse_date)]
        end: NaiveDate,

        /// Issue key to log against.
        issue: String,

        /// One shared description, or one per generated entry.
        descriptions: Vec<String>,

        /// Also create entries on weekend days.
        #[arg(long)]
        include_weekends: bool,
    },
}

fn parse_date(text: &str) -> Result<NaiveDate, String> {
    codec::parse_date(text).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn date_arguments_accept_relative_forms() {
        let cli = Cli::try_parse_from(["twl", "get", "week-start", "today"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Get { .. })));
    }

    #[test]
    fn create_workdays_collects_descriptions() {
        let cli = Cli::try_parse_from([
            "twl",
            "create",
            "workdays",
            "2023-09-25",
            "2023-09-26",
            "PP-1",
            "review",
            "development",
            "--include-weekends",
        ])
        .unwrap();
        let Some(Commands::Create {
            batch:
                CreateCommand::Workdays {
                    issue,
                    descriptions,
                    include_weekends,
                    ..
                },
        }) = cli.command
        else {
            panic!("expected a workdays command");
        };
        assert_eq!(issue, "PP-1");
        assert_eq!(descriptions, vec!["review", "development"]);
        assert!(include_weekends);
    }

    #[test]
    fn malformed_dates_are_rejected() {
        assert!(Cli::try_parse_from(["twl", "get", "someday", "today"]).is_err());
    }
}
