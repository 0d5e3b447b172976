use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use twl_cli::commands::{create, delete, get};
use twl_cli::{Cli, Commands, Config, CreateCommand};
use twl_tempo::{Client, WorkLogService};

/// Load config and connect the worklog service.
async fn connect(config_path: Option<&Path>) -> Result<(WorkLogService, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let client = Client::new(
        config.jira_url.as_str(),
        config.tempo_url.as_str(),
        config.user_email.as_str(),
        config.jira_token.as_str(),
        config.tempo_token.as_str(),
    )?;
    let service = WorkLogService::connect(client, config.workers)
        .await
        .context("failed to connect to tempo")?;
    Ok((service, config))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let mut stdout = std::io::stdout();
    match &cli.command {
        Some(Commands::Get { start, end }) => {
            let (service, _config) = connect(cli.config.as_deref()).await?;
            get::run(&mut stdout, &service, *start, *end).await?;
        }
        Some(Commands::Delete { start, end }) => {
            let (service, _config) = connect(cli.config.as_deref()).await?;
            delete::run(&service, *start, *end).await?;
        }
        Some(Commands::Create { batch }) => {
            let (service, config) = connect(cli.config.as_deref()).await?;
            match batch {
                CreateCommand::FromYaml {
                    file,
                    include_weekends,
                } => {
                    create::from_yaml(&mut stdout, &service, file, !include_weekends).await?;
                }
                CreateCommand::Holidays {
                    start,
                    end,
                    include_weekends,
                } => {
                    create::holidays(
                        &mut stdout,
                        &service,
                        *start,
                        *end,
                        &config.holidays_issue,
                        !include_weekends,
                    )
                    .await?;
                }
                CreateCommand::Workdays {
                    start,
                    end,
                    issue,
                    descriptions,
                    include_weekends,
                } => {
                    create::workdays(
                        &mut stdout,
                        &service,
                        *start,
                        *end,
                        issue,
                        descriptions,
                        !include_weekends,
                    )
                    .await?;
                }
            }
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
