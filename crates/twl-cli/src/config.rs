//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the Jira instance.
    pub jira_url: String,
    /// Base URL of the Tempo REST API.
    pub tempo_url: String,
    /// Email address of the Jira account.
    pub user_email: String,
    /// Jira API token (basic auth together with the email).
    pub jira_token: String,
    /// Tempo API bearer token.
    pub tempo_token: String,
    /// Issue the holidays command logs against.
    pub holidays_issue: String,
    /// Maximum number of concurrent remote calls.
    pub workers: Option<usize>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("jira_url", &self.jira_url)
            .field("tempo_url", &self.tempo_url)
            .field("user_email", &self.user_email)
            .field("jira_token", &"[REDACTED]")
            .field("tempo_token", &"[REDACTED]")
            .field("holidays_issue", &self.holidays_issue)
            .field("workers", &self.workers)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            jira_url: String::new(),
            tempo_url: "https://api.tempo.io/4".to_owned(),
            user_email: String::new(),
            jira_token: String::new(),
            tempo_token: String::new(),
            holidays_issue: "PP-7".to_owned(),
            workers: None,
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (TWL_*)
        figment = figment.merge(Env::prefixed("TWL_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for twl.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("twl"))
}
