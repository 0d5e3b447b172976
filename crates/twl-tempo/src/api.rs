//! HTTP client for the Jira and Tempo REST APIs.
//!
//! Jira (REST v2, basic auth) resolves the caller's account id and maps
//! issue keys to numeric ids; Tempo (REST v4, bearer token) owns the
//! worklog records themselves.

use std::fmt;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime, TimeDelta};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use twl_core::{IssueKey, ReconcileError, TimeSpan, WorkLog, codec};

/// Default request timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const TIME_FORMAT: &str = "%H:%M:%S";
const PAGE_LIMIT: &str = "1000";

/// Remote collaborator errors.
#[derive(Debug, Error)]
pub enum TempoError {
    /// A required credential was empty.
    #[error("missing credentials: {0} must be set")]
    MissingCredentials(&'static str),
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The API returned a non-success status.
    #[error("API error (status {status}): {message}")]
    Api {
        status: reqwest::StatusCode,
        message: String,
    },
    /// An update was requested for an entry without a remote identity.
    #[error("worklog has no id: {0}")]
    MissingWorklogId(Box<WorkLog>),
    /// The API response could not be turned into a worklog.
    #[error("invalid worklog in response: {0}")]
    InvalidResponse(String),
    /// The desired batch failed reconciliation validation.
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

/// Jira + Tempo API client.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    jira_url: String,
    tempo_url: String,
    user_email: String,
    jira_token: String,
    tempo_token: String,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("jira_url", &self.jira_url)
            .field("tempo_url", &self.tempo_url)
            .field("user_email", &self.user_email)
            .field("jira_token", &"[REDACTED]")
            .field("tempo_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns [`TempoError::MissingCredentials`] if any parameter is empty
    /// or whitespace-only, and [`TempoError::ClientBuild`] if the HTTP
    /// client fails to build.
    pub fn new(
        jira_url: impl Into<String>,
        tempo_url: impl Into<String>,
        user_email: impl Into<String>,
        jira_token: impl Into<String>,
        tempo_token: impl Into<String>,
    ) -> Result<Self, TempoError> {
        let jira_url = require("jira_url", jira_url.into())?;
        let tempo_url = require("tempo_url", tempo_url.into())?;
        let user_email = require("user_email", user_email.into())?;
        let jira_token = require("jira_token", jira_token.into())?;
        let tempo_token = require("tempo_token", tempo_token.into())?;

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(TempoError::ClientBuild)?;

        Ok(Self {
            http,
            jira_url: jira_url.trim_end_matches('/').to_owned(),
            tempo_url: tempo_url.trim_end_matches('/').to_owned(),
            user_email,
            jira_token,
            tempo_token,
        })
    }

    /// The caller's Jira account id.
    pub async fn myself(&self) -> Result<String, TempoError> {
        let me: Myself = check(self.jira_get("myself").send().await?)
            .await?
            .json()
            .await?;
        Ok(me.account_id)
    }

    /// Resolves an issue key to its numeric Jira id.
    pub async fn issue_id(&self, key: &IssueKey) -> Result<i64, TempoError> {
        let issue = self.issue(key.as_str()).await?;
        issue.id.parse().map_err(|_| {
            TempoError::InvalidResponse(format!("issue id '{}' is not numeric", issue.id))
        })
    }

    /// Resolves a numeric Jira issue id back to its key.
    pub async fn issue_key(&self, id: i64) -> Result<IssueKey, TempoError> {
        let issue = self.issue(&id.to_string()).await?;
        IssueKey::new(issue.key).map_err(|err| TempoError::InvalidResponse(err.to_string()))
    }

    /// All worklogs of `account_id` on the given day, unfiltered by time.
    /// Follows the `metadata.next` link until the page set is exhausted.
    pub async fn worklogs_on(
        &self,
        account_id: &str,
        day: NaiveDate,
    ) -> Result<Vec<WorkLog>, TempoError> {
        let date = codec::format_date(&day);
        let mut page: WorklogPage = check(
            self.tempo_request(Method::GET, &format!("worklogs/user/{account_id}"))
                .query(&[
                    ("from", date.clone()),
                    ("to", date),
                    ("limit", PAGE_LIMIT.to_owned()),
                ])
                .send()
                .await?,
        )
        .await?
        .json()
        .await?;

        let mut dtos = Vec::new();
        loop {
            dtos.append(&mut page.results);
            let Some(next) = page.metadata.next.take() else {
                break;
            };
            page = check(self.http.get(next).bearer_auth(&self.tempo_token).send().await?)
                .await?
                .json()
                .await?;
        }

        let mut logs = Vec::with_capacity(dtos.len());
        for dto in dtos {
            logs.push(self.worklog_from_dto(dto).await?);
        }
        Ok(logs)
    }

    /// Creates a new worklog and returns it with its remote identity.
    pub async fn create_worklog(
        &self,
        account_id: &str,
        log: &WorkLog,
    ) -> Result<WorkLog, TempoError> {
        let issue_id = self.issue_id(&log.issue).await?;
        // The creation payload carries the issue id but never a worklog id.
        let payload = payload(account_id, log, Some(issue_id));
        let dto: WorklogDto = check(
            self.tempo_request(Method::POST, "worklogs")
                .json(&payload)
                .send()
                .await?,
        )
        .await?
        .json()
        .await?;
        self.worklog_from_dto(dto).await
    }

    /// Replaces the data of an existing worklog, keyed by its identity.
    ///
    /// # Errors
    ///
    /// Returns [`TempoError::MissingWorklogId`] if `log` has no identity.
    pub async fn update_worklog(
        &self,
        account_id: &str,
        log: &WorkLog,
    ) -> Result<WorkLog, TempoError> {
        let id = log
            .worklog_id
            .ok_or_else(|| TempoError::MissingWorklogId(Box::new(log.clone())))?;
        // The update payload may carry neither the worklog id nor the issue
        // id; the issue stays fixed.
        let payload = payload(account_id, log, None);
        let dto: WorklogDto = check(
            self.tempo_request(Method::PUT, &format!("worklogs/{id}"))
                .json(&payload)
                .send()
                .await?,
        )
        .await?
        .json()
        .await?;
        self.worklog_from_dto(dto).await
    }

    /// Deletes a worklog by its identity.
    pub async fn delete_worklog(&self, id: i64) -> Result<(), TempoError> {
        check(
            self.tempo_request(Method::DELETE, &format!("worklogs/{id}"))
                .send()
                .await?,
        )
        .await?;
        Ok(())
    }

    async fn issue(&self, id_or_key: &str) -> Result<JiraIssue, TempoError> {
        check(self.jira_get(&format!("issue/{id_or_key}")).send().await?)
            .await?
            .json()
            .await
            .map_err(TempoError::from)
    }

    fn jira_get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .get(format!("{}/rest/api/2/{path}", self.jira_url))
            .basic_auth(&self.user_email, Some(&self.jira_token))
    }

    fn tempo_request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}/{path}", self.tempo_url))
            .bearer_auth(&self.tempo_token)
    }

    async fn worklog_from_dto(&self, dto: WorklogDto) -> Result<WorkLog, TempoError> {
        let issue = self.issue_key(dto.issue.id).await?;
        let start = dto.start_date.and_time(dto.start_time);
        let time_span =
            TimeSpan::from_start_and_duration(start, TimeDelta::seconds(dto.time_spent_seconds))
                .map_err(|err| TempoError::InvalidResponse(err.to_string()))?;
        Ok(WorkLog {
            issue,
            time_span,
            description: dto.description,
            worklog_id: Some(dto.tempo_worklog_id),
        })
    }
}

fn require(name: &'static str, value: String) -> Result<String, TempoError> {
    if value.trim().is_empty() {
        return Err(TempoError::MissingCredentials(name));
    }
    Ok(value)
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, TempoError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(TempoError::Api { status, message })
}

/// Builds the Tempo worklog payload. `issue_id` is `Some` for creation and
/// `None` for updates.
fn payload<'a>(account_id: &'a str, log: &'a WorkLog, issue_id: Option<i64>) -> WorklogPayload<'a> {
    let start = log.time_span.start();
    WorklogPayload {
        author_account_id: account_id,
        issue_id,
        start_date: codec::format_date(&start.date()),
        start_time: start.time().format(TIME_FORMAT).to_string(),
        time_spent_seconds: log.time_span.duration().num_seconds(),
        description: &log.description,
    }
}

#[derive(Debug, Deserialize)]
struct Myself {
    #[serde(rename = "accountId")]
    account_id: String,
}

/// Jira issue lookup response. Jira serializes ids as strings.
#[derive(Debug, Deserialize)]
struct JiraIssue {
    id: String,
    key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WorklogPayload<'a> {
    author_account_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    issue_id: Option<i64>,
    start_date: String,
    start_time: String,
    time_spent_seconds: i64,
    description: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorklogDto {
    tempo_worklog_id: i64,
    issue: IssueRef,
    start_date: NaiveDate,
    start_time: NaiveTime,
    time_spent_seconds: i64,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct IssueRef {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct WorklogPage {
    results: Vec<WorklogDto>,
    #[serde(default)]
    metadata: PageMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct PageMetadata {
    next: Option<String>,
}
