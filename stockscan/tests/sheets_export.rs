//! Google Sheets upload against a mock token endpoint and Sheets API.

use serde_json::{json, Value};
use std::path::PathBuf;
use stockscan::export::{ExportError, ServiceAccountKey, SheetsUploader};
use stockscan::metrics::Metric;
use stockscan::screener::{MetricSet, PassingRow};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SHEET_ID: &str = "1xYz-SHEET_id";
const TOKEN: &str = "ya29.test-token";

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn uploader(server: &MockServer) -> SheetsUploader {
    let mut key = ServiceAccountKey::from_file(&fixture("service_account.json")).unwrap();
    key.token_uri = format!("{}/token", server.uri());
    SheetsUploader::new(key).with_api_base(server.uri())
}

fn sheet_url() -> String {
    format!("https://docs.google.com/spreadsheets/d/{}/edit#gid=0", SHEET_ID)
}

fn rows() -> Vec<PassingRow> {
    vec![
        PassingRow {
            ticker: "HIGH".into(),
            metrics: MetricSet {
                pe: Metric::Value(9.0),
                ev_to_ebitda: Metric::Undefined,
                revenue_growth_pct: Metric::Value(14.0),
                eps_growth_pct: Metric::Value(22.5),
                sortino: Metric::Value(1.4),
                alpha: Metric::Value(0.08),
                croci_pct: Metric::Value(19.0),
            },
        },
        PassingRow {
            ticker: "LOW".into(),
            metrics: MetricSet {
                pe: Metric::Value(12.0),
                alpha: Metric::Value(0.01),
                ..MetricSet::default()
            },
        },
    ]
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant-type%3Ajwt-bearer"))
        .and(body_string_contains("assertion="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": TOKEN,
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .mount(server)
        .await;
}

async fn mount_sheet_titles(server: &MockServer, titles: &[&str]) {
    let sheets: Vec<Value> = titles
        .iter()
        .map(|t| json!({ "properties": { "title": t } }))
        .collect();
    Mock::given(method("GET"))
        .and(path(meta_path()))
        .and(query_param("fields", "sheets.properties.title"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sheets": sheets })))
        .mount(server)
        .await;
}

fn meta_path() -> String {
    format!("/v4/spreadsheets/{}", SHEET_ID)
}

fn clear_path() -> String {
    format!("/v4/spreadsheets/{}/values/'Results':clear", SHEET_ID)
}

fn write_path() -> String {
    format!("/v4/spreadsheets/{}/values/'Results'!A1", SHEET_ID)
}

#[tokio::test]
async fn test_upload_clears_then_writes_rows() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_sheet_titles(&server, &["Results", "Archive"]).await;

    Mock::given(method("POST"))
        .and(path(clear_path()))
        .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path(write_path()))
        .and(query_param("valueInputOption", "RAW"))
        .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "updatedRows": 3 })))
        .expect(1)
        .mount(&server)
        .await;

    let written = uploader(&server).upload(&sheet_url(), &rows()).await.unwrap();
    assert_eq!(written, 2);

    let requests = server.received_requests().await.unwrap();
    let paths: Vec<&str> = requests.iter().map(|r| r.url.path()).collect();
    assert_eq!(
        paths,
        vec!["/token".to_string(), meta_path(), clear_path(), write_path()]
    );

    let body: Value = serde_json::from_slice(&requests[3].body).unwrap();
    assert_eq!(body["range"], "'Results'!A1");
    assert_eq!(body["majorDimension"], "ROWS");

    let values = body["values"].as_array().unwrap();
    assert_eq!(values.len(), 3);
    assert_eq!(
        values[0],
        json!(["Ticker", "PE", "EV/EBITDA", "Rev YoY %", "EPS YoY %", "Sortino", "Alpha", "CROCI %"])
    );
    assert_eq!(values[1], json!(["HIGH", 9.0, "", 14.0, 22.5, 1.4, 0.08, 19.0]));
    assert_eq!(values[2][0], "LOW");
    assert_eq!(values[2][6], 0.01);
    assert_eq!(values[2][7], "");
}

#[tokio::test]
async fn test_forbidden_sheet_is_destination_error() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_sheet_titles(&server, &["Results"]).await;

    Mock::given(method("POST"))
        .and(path(clear_path()))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "status": "PERMISSION_DENIED" }
        })))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = uploader(&server).upload(&sheet_url(), &rows()).await.unwrap_err();

    match err {
        ExportError::Destination(msg) => {
            assert!(msg.contains("scanner@stockscan-test.iam.gserviceaccount.com"), "{}", msg)
        }
        other => panic!("expected destination error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_sheet_is_destination_error() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path(meta_path()))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = uploader(&server).upload(SHEET_ID, &rows()).await.unwrap_err();
    assert!(matches!(err, ExportError::Destination(_)));
}

#[tokio::test]
async fn test_spreadsheet_without_sheets_is_destination_error() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_sheet_titles(&server, &[]).await;

    let err = uploader(&server).upload(SHEET_ID, &rows()).await.unwrap_err();
    assert!(matches!(err, ExportError::Destination(msg) if msg.contains("no sheets")));
}

#[tokio::test]
async fn test_server_error_is_http_error() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_sheet_titles(&server, &["Results"]).await;

    Mock::given(method("POST"))
        .and(path(clear_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path(write_path()))
        .respond_with(ResponseTemplate::new(503).set_body_string("backend unavailable"))
        .mount(&server)
        .await;

    let err = uploader(&server).upload(&sheet_url(), &rows()).await.unwrap_err();
    assert!(matches!(err, ExportError::Http(msg) if msg.contains("backend unavailable")));
}

#[tokio::test]
async fn test_rejected_token_is_credentials_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid JWT Signature."
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(clear_path()))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = uploader(&server).upload(&sheet_url(), &rows()).await.unwrap_err();
    assert!(matches!(err, ExportError::Credentials(msg) if msg.contains("invalid_grant")));
}

#[tokio::test]
async fn test_bad_sheet_url_sends_nothing() {
    let server = MockServer::start().await;

    let err = uploader(&server)
        .upload("https://example.com/not-a-sheet", &rows())
        .await
        .unwrap_err();

    assert!(matches!(err, ExportError::Destination(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[test]
fn test_missing_credentials_file() {
    let err = ServiceAccountKey::from_file(&fixture("does_not_exist.json")).unwrap_err();
    assert!(matches!(err, ExportError::Credentials(_)));
}
