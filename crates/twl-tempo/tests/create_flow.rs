//! End-to-end create flow against a mocked Jira/Tempo server: an existing
//! entry overlapped by the batch is shrunk and the new entry is created.

use chrono::{NaiveDateTime, TimeDelta};
use serde_json::json;
use twl_core::{IssueKey, TimeSpan, WorkLog};
use twl_tempo::{Client, WorkLogService};

fn span(start: &str, hours: i64) -> TimeSpan {
    let start: NaiveDateTime = start.parse().unwrap();
    TimeSpan::from_start_and_duration(start, TimeDelta::hours(hours)).unwrap()
}

#[tokio::test]
async fn creating_over_an_existing_entry_shrinks_it() {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("GET", "/rest/api/2/myself")
        .with_header("content-type", "application/json")
        .with_body(json!({"accountId": "acct"}).to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/rest/api/2/issue/10001")
        .with_header("content-type", "application/json")
        .with_body(json!({"id": "10001", "key": "PP-1"}).to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/rest/api/2/issue/PP-2")
        .with_header("content-type", "application/json")
        .with_body(json!({"id": "10002", "key": "PP-2"}).to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/rest/api/2/issue/10002")
        .with_header("content-type", "application/json")
        .with_body(json!({"id": "10002", "key": "PP-2"}).to_string())
        .create_async()
        .await;

    // Existing entry 10:00 - 12:00 on PP-1, worklog id 7.
    server
        .mock("GET", "/worklogs/user/acct")
        .match_query(mockito::Matcher::AllOf(vec![
            mockito::Matcher::UrlEncoded("from".into(), "2023-09-25".into()),
            mockito::Matcher::UrlEncoded("to".into(), "2023-09-25".into()),
        ]))
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "results": [{
                    "tempoWorklogId": 7,
                    "issue": {"id": 10_001},
                    "startDate": "2023-09-25",
                    "startTime": "10:00:00",
                    "timeSpentSeconds": 7200,
                    "description": "existing",
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    // The existing entry must be shrunk to 10:00 - 11:00, keeping its id.
    let update = server
        .mock("PUT", "/worklogs/7")
        .match_body(mockito::Matcher::PartialJson(json!({
            "startTime": "10:00:00",
            "timeSpentSeconds": 3600,
        })))
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "tempoWorklogId": 7,
                "issue": {"id": 10_001},
                "startDate": "2023-09-25",
                "startTime": "10:00:00",
                "timeSpentSeconds": 3600,
                "description": "existing",
            })
            .to_string(),
        )
        .create_async()
        .await;

    // The desired entry is created as-is.
    let create = server
        .mock("POST", "/worklogs")
        .match_body(mockito::Matcher::PartialJson(json!({
            "issueId": 10_002,
            "startTime": "11:00:00",
            "timeSpentSeconds": 3600,
        })))
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "tempoWorklogId": 42,
                "issue": {"id": 10_002},
                "startDate": "2023-09-25",
                "startTime": "11:00:00",
                "timeSpentSeconds": 3600,
                "description": "new work",
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = Client::new(server.url(), server.url(), "me@example.com", "j", "t").unwrap();
    let service = WorkLogService::connect(client, Some(1)).await.unwrap();

    let desired = vec![WorkLog::new(
        IssueKey::new("PP-2").unwrap(),
        span("2023-09-25T11:00:00", 1),
        "new work".to_owned(),
    )];
    let created = service.create_logs(desired, true).await.unwrap();

    update.assert_async().await;
    create.assert_async().await;

    assert_eq!(
        created,
        vec![WorkLog {
            issue: IssueKey::new("PP-2").unwrap(),
            time_span: span("2023-09-25T11:00:00", 1),
            description: "new work".to_owned(),
            worklog_id: Some(42),
        }]
    );
}

#[tokio::test]
async fn an_overlapping_batch_touches_nothing() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/rest/api/2/myself")
        .with_header("content-type", "application/json")
        .with_body(json!({"accountId": "acct"}).to_string())
        .create_async()
        .await;
    // No worklog endpoint may be hit for an invalid batch.
    let fetch = server
        .mock("GET", mockito::Matcher::Regex("^/worklogs".to_owned()))
        .with_status(501)
        .expect(0)
        .create_async()
        .await;

    let client = Client::new(server.url(), server.url(), "me@example.com", "j", "t").unwrap();
    let service = WorkLogService::connect(client, Some(1)).await.unwrap();

    let issue = IssueKey::new("PP-2").unwrap();
    let desired = vec![
        WorkLog::new(issue.clone(), span("2023-09-25T10:00:00", 2), String::new()),
        WorkLog::new(issue, span("2023-09-25T11:00:00", 2), String::new()),
    ];
    let error = service.create_logs(desired, true).await.unwrap_err();

    fetch.assert_async().await;
    assert!(matches!(error, twl_tempo::TempoError::Reconcile(_)));
}
