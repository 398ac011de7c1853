//! Integration tests for `BigQueryClient::load_table` and the
//! service-account token exchange, against wiremock servers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use staydb_core::{NormalizedRecord, WarehouseNamespace};
use staydb_sink::{
    fetch_access_token, load_service_account, BigQueryClient, ServiceAccountKey, SinkError, Table,
    TokenSource, WriteDisposition,
};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const TEST_KEY: &str = include_str!("fixtures/test_key.pem");

fn namespace() -> WarehouseNamespace {
    WarehouseNamespace {
        project: "proj".to_owned(),
        dataset: "dataset_stayunique".to_owned(),
        table: "bookings_scraping".to_owned(),
    }
}

fn sample_table(rows: usize) -> Table {
    let records: Vec<NormalizedRecord> = (0..rows)
        .map(|id| NormalizedRecord {
            link: format!("www.airbnb.com/rooms/{id}"),
            name: format!("Listing {id}"),
            price: Some(120),
            rating: Some("4.90".to_owned()),
            review_count: None,
        })
        .collect();
    Table::from_records(&records)
}

fn static_client(server: &MockServer) -> BigQueryClient {
    BigQueryClient::with_base_url(TokenSource::Static("test-token".to_owned()), 5, &server.uri())
        .expect("client construction should not fail")
        .with_polling(Duration::from_millis(10), 5)
}

fn done_job() -> serde_json::Value {
    json!({"jobReference": {"projectId": "proj", "jobId": "j"}, "status": {"state": "DONE"}})
}

#[tokio::test]
async fn load_submits_multipart_job_with_bearer_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload/bigquery/v2/projects/proj/jobs"))
        .and(query_param("uploadType", "multipart"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_string_contains("\"writeDisposition\":\"WRITE_TRUNCATE\""))
        .and(body_string_contains("\"tableId\":\"bookings_scraping\""))
        .and(body_string_contains("link,name,price,rating,review_count"))
        .respond_with(ResponseTemplate::new(200).set_body_json(done_job()))
        .expect(1)
        .mount(&server)
        .await;

    let summary = static_client(&server)
        .load_table(&sample_table(3), &namespace(), WriteDisposition::Replace)
        .await
        .expect("load should succeed");

    assert_eq!(summary.rows, 3);
    assert!(summary.job_id.starts_with("staydb_load_"));
}

#[tokio::test]
async fn load_polls_until_job_is_done() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload/bigquery/v2/projects/proj/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": {"state": "PENDING"}})))
        .mount(&server)
        .await;

    // First status poll still running, the next one finished.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": {"state": "RUNNING"}})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(done_job()))
        .mount(&server)
        .await;

    let summary = static_client(&server)
        .load_table(&sample_table(2), &namespace(), WriteDisposition::Append)
        .await
        .expect("load should succeed after polling");
    assert_eq!(summary.rows, 2);

    let polls = server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == "GET")
        .count();
    assert_eq!(polls, 2);
}

#[tokio::test]
async fn job_that_never_finishes_exhausts_poll_budget() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": {"state": "RUNNING"}})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": {"state": "RUNNING"}})))
        .expect(5)
        .mount(&server)
        .await;

    let err = static_client(&server)
        .load_table(&sample_table(1), &namespace(), WriteDisposition::Replace)
        .await
        .unwrap_err();
    assert!(matches!(err, SinkError::LoadFailed { .. }), "got: {err:?}");
}

#[tokio::test]
async fn job_error_result_is_load_failed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": {
                "state": "DONE",
                "errorResult": {"reason": "invalid", "message": "CSV table references column position 5"}
            }
        })))
        .mount(&server)
        .await;

    let err = static_client(&server)
        .load_table(&sample_table(1), &namespace(), WriteDisposition::Replace)
        .await
        .unwrap_err();

    match err {
        SinkError::LoadFailed { table, reason } => {
            assert_eq!(table, "proj.dataset_stayunique.bookings_scraping");
            assert!(reason.contains("column position 5"));
        }
        other => panic!("expected LoadFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn fail_policy_on_existing_table_is_table_exists() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("\"writeDisposition\":\"WRITE_EMPTY\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": {
                "state": "DONE",
                "errorResult": {"reason": "duplicate", "message": "Already Exists: Table proj:dataset_stayunique.bookings_scraping"}
            }
        })))
        .mount(&server)
        .await;

    let err = static_client(&server)
        .load_table(&sample_table(1), &namespace(), WriteDisposition::Fail)
        .await
        .unwrap_err();
    assert!(matches!(err, SinkError::TableExists { .. }), "got: {err:?}");
}

#[tokio::test]
async fn non_ok_insert_is_unexpected_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Access Denied"))
        .mount(&server)
        .await;

    let err = static_client(&server)
        .load_table(&sample_table(1), &namespace(), WriteDisposition::Replace)
        .await
        .unwrap_err();

    match err {
        SinkError::UnexpectedStatus { status, body, .. } => {
            assert_eq!(status, 403);
            assert_eq!(body, "Access Denied");
        }
        other => panic!("expected UnexpectedStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_table_is_rejected_without_requests() {
    let server = MockServer::start().await;

    let err = static_client(&server)
        .load_table(&sample_table(0), &namespace(), WriteDisposition::Replace)
        .await
        .unwrap_err();

    assert!(matches!(err, SinkError::EmptyRecords { .. }));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

/// Emulates a warehouse table: applies each load job's disposition to an
/// in-memory row count per table.
struct TableEmulator {
    rows: Arc<Mutex<HashMap<String, usize>>>,
}

impl Respond for TableEmulator {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body = String::from_utf8_lossy(&request.body);
        let Some(csv_start) = body.find("Content-Type: application/octet-stream\r\n\r\n") else {
            return ResponseTemplate::new(400);
        };
        let media = &body[csv_start + "Content-Type: application/octet-stream\r\n\r\n".len()..];
        let media = media.split("\r\n--").next().unwrap_or_default();
        let loaded = media.lines().count().saturating_sub(1);

        let mut rows = self.rows.lock().expect("emulator lock");
        let table = rows.entry("bookings_scraping".to_owned()).or_insert(0);
        if body.contains("WRITE_TRUNCATE") {
            *table = loaded;
        } else {
            *table += loaded;
        }
        ResponseTemplate::new(200).set_body_json(json!({"status": {"state": "DONE"}}))
    }
}

#[tokio::test]
async fn replace_reruns_leave_a_single_run_row_count() {
    let server = MockServer::start().await;
    let rows = Arc::new(Mutex::new(HashMap::new()));

    Mock::given(method("POST"))
        .respond_with(TableEmulator {
            rows: Arc::clone(&rows),
        })
        .mount(&server)
        .await;

    let client = static_client(&server);
    let table = sample_table(7);
    client
        .load_table(&table, &namespace(), WriteDisposition::Replace)
        .await
        .unwrap();
    let after_first = rows.lock().unwrap()["bookings_scraping"];

    client
        .load_table(&table, &namespace(), WriteDisposition::Replace)
        .await
        .unwrap();
    let after_second = rows.lock().unwrap()["bookings_scraping"];

    assert_eq!(after_first, 7);
    assert_eq!(after_second, after_first);

    client
        .load_table(&table, &namespace(), WriteDisposition::Append)
        .await
        .unwrap();
    assert_eq!(rows.lock().unwrap()["bookings_scraping"], 14);
}

// ---------------------------------------------------------------------------
// Service-account token exchange
// ---------------------------------------------------------------------------

fn service_account(token_uri: String) -> ServiceAccountKey {
    ServiceAccountKey {
        client_email: "loader@proj.iam.gserviceaccount.com".to_owned(),
        private_key: TEST_KEY.to_owned(),
        token_uri,
    }
}

#[tokio::test]
async fn service_account_exchanges_signed_assertion_for_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains(
            "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer",
        ))
        .and(body_string_contains("assertion=ey"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "sa-token",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let key = service_account(format!("{}/token", server.uri()));
    let token = fetch_access_token(&reqwest::Client::new(), &key).await.unwrap();
    assert_eq!(token, "sa-token");
}

#[tokio::test]
async fn refused_token_exchange_is_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_grant"}"#))
        .mount(&server)
        .await;

    let key = service_account(format!("{}/token", server.uri()));
    let err = fetch_access_token(&reqwest::Client::new(), &key).await.unwrap_err();
    assert!(
        matches!(err, SinkError::Auth(ref msg) if msg.contains("invalid_grant")),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn load_with_service_account_uses_exchanged_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "sa-token"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/upload/bigquery/v2/projects/proj/jobs"))
        .and(header("authorization", "Bearer sa-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(done_job()))
        .expect(1)
        .mount(&server)
        .await;

    let key = service_account(format!("{}/token", server.uri()));
    let client = BigQueryClient::with_base_url(TokenSource::ServiceAccount(key), 5, &server.uri())
        .unwrap()
        .with_polling(Duration::from_millis(10), 5);

    client
        .load_table(&sample_table(1), &namespace(), WriteDisposition::Replace)
        .await
        .expect("load should succeed");
}

#[test]
fn credentials_file_is_read_and_validated() {
    let dir = std::env::temp_dir().join(format!("staydb-creds-{}", uuid::Uuid::new_v4().simple()));
    std::fs::create_dir_all(&dir).unwrap();

    let good = dir.join("credentials.json");
    std::fs::write(
        &good,
        json!({
            "type": "service_account",
            "project_id": "proj",
            "client_email": "loader@proj.iam.gserviceaccount.com",
            "private_key": TEST_KEY,
        })
        .to_string(),
    )
    .unwrap();
    let key = load_service_account(&good).unwrap();
    assert_eq!(key.client_email, "loader@proj.iam.gserviceaccount.com");
    assert_eq!(key.token_uri, "https://oauth2.googleapis.com/token");

    let bad = dir.join("bad.json");
    std::fs::write(&bad, r#"{"client_email": ""}"#).unwrap();
    assert!(matches!(
        load_service_account(&bad),
        Err(SinkError::Credentials { .. })
    ));

    let missing = dir.join("missing.json");
    assert!(matches!(load_service_account(&missing), Err(SinkError::Io { .. })));

    std::fs::remove_dir_all(&dir).ok();
}
