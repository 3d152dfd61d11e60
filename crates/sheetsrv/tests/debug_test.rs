mod setup;

use axum::http::StatusCode;
use serde_json::json;
use sheets_http::Method;

use crate::setup::{MockHttpClient, fixture_credentials, get, send, test_config, test_router};

#[tokio::test]
async fn health_without_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("credentials.json");

    let mock = MockHttpClient::new();
    let router = test_router(test_config(path.clone()), &mock);
    let (status, resp) = send(router, get("/api/health")).await;

    assert_eq!(StatusCode::OK, status);
    assert_eq!("ERROR", resp["status"]);
    assert_eq!("Backend service is running", resp["message"]);
    assert_eq!(false, resp["credentialsFound"]);
    assert_eq!(path.display().to_string(), resp["credentialsPath"]);
    assert!(resp.get("credentialsInfo").is_none());
    assert_eq!(false, resp["sheetsApiInitialized"]);
    assert_eq!(
        format!("Credentials file not found at {}", path.display()),
        resp["initError"]
    );
    assert_eq!(json!({"environment": "test", "port": 4000}), resp["environment"]);
    assert_eq!(json!({"allowedOrigins": "*"}), resp["cors"]);
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn health_with_credentials() {
    let mock = MockHttpClient::new();
    let router = test_router(test_config(fixture_credentials()), &mock);
    let (status, resp) = send(router, get("/api/health")).await;

    assert_eq!(StatusCode::OK, status);
    assert_eq!("OK", resp["status"]);
    assert_eq!(true, resp["credentialsFound"]);
    assert_eq!(true, resp["sheetsApiInitialized"]);
    assert_eq!(serde_json::Value::Null, resp["initError"]);
    assert_eq!(
        json!({
            "type": "service_account",
            "project_id": "sheetsrv-test",
            "client_email": "sheetsrv-test@sheetsrv-test.iam.gserviceaccount.com",
            "has_private_key": true,
        }),
        resp["credentialsInfo"]
    );
    // Health never talks to google.
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn health_with_unusable_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("credentials.json");
    std::fs::write(
        &path,
        r#"{"type": "service_account", "project_id": "p", "client_email": "a@p.iam.gserviceaccount.com"}"#,
    )
    .unwrap();

    let mock = MockHttpClient::new();
    let router = test_router(test_config(path), &mock);
    let (status, resp) = send(router, get("/api/health")).await;

    assert_eq!(StatusCode::OK, status);
    assert_eq!("ERROR", resp["status"]);
    assert_eq!(true, resp["credentialsFound"]);
    assert_eq!(false, resp["credentialsInfo"]["has_private_key"]);
    assert_eq!(false, resp["sheetsApiInitialized"]);
    assert!(resp["initError"].as_str().is_some_and(|e| !e.is_empty()));
}

#[tokio::test]
async fn debug_sheets_lists_worksheets() {
    let mock = MockHttpClient::new();
    mock.with_spreadsheet("abc", "Budget", &[(0, "January"), (17, "February")]);
    let router = test_router(test_config(fixture_credentials()), &mock);

    let (status, resp) = send(router, get("/api/debug-sheets?spreadsheetId=abc")).await;

    assert_eq!(StatusCode::OK, status);
    assert_eq!(
        json!({
            "status": "OK",
            "message": "Google Sheets API connection successful",
            "spreadsheetTitle": "Budget",
            "sheets": [
                {"title": "January", "sheetId": 0},
                {"title": "February", "sheetId": 17},
            ],
        }),
        resp
    );

    let requests = mock.api_requests();
    assert_eq!(1, requests.len());
    assert_eq!(Method::GET, requests[0].method);
    assert_eq!("/v4/spreadsheets/abc", requests[0].url.path());
}

#[tokio::test]
async fn debug_sheets_uses_default_spreadsheet() {
    let mock = MockHttpClient::new();
    mock.with_spreadsheet("default-sheet", "Default", &[(0, "Sheet1")]);

    for uri in ["/api/debug-sheets", "/api/debug-sheets?spreadsheetId="] {
        let router = test_router(test_config(fixture_credentials()), &mock);
        let (status, resp) = send(router, get(uri)).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!("Default", resp["spreadsheetTitle"]);
    }

    assert!(
        mock.api_requests()
            .iter()
            .all(|r| r.url.path() == "/v4/spreadsheets/default-sheet")
    );
}

#[tokio::test]
async fn debug_sheets_missing_title() {
    let mock = MockHttpClient::new();
    mock.respond(
        Method::GET,
        "/v4/spreadsheets/untitled",
        StatusCode::OK,
        json!({"spreadsheetId": "untitled"}),
    );
    let router = test_router(test_config(fixture_credentials()), &mock);

    let (status, resp) = send(router, get("/api/debug-sheets?spreadsheetId=untitled")).await;

    assert_eq!(StatusCode::OK, status);
    assert_eq!("Unknown", resp["spreadsheetTitle"]);
    assert_eq!(json!([]), resp["sheets"]);
}

#[tokio::test]
async fn debug_sheets_unknown_spreadsheet() {
    let mock = MockHttpClient::new();
    let router = test_router(test_config(fixture_credentials()), &mock);

    let (status, resp) = send(router, get("/api/debug-sheets?spreadsheetId=nope")).await;

    assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, status);
    assert_eq!(
        json!({
            "status": "ERROR",
            "message": "Failed to connect to Google Sheets API",
            "error": "Requested entity was not found.",
        }),
        resp
    );
}

#[tokio::test]
async fn debug_sheets_invalid_query() {
    let mock = MockHttpClient::new();
    let router = test_router(test_config(fixture_credentials()), &mock);

    let (status, resp) = send(
        router,
        get("/api/debug-sheets?spreadsheetId=a&spreadsheetId=b"),
    )
    .await;

    assert_eq!(StatusCode::BAD_REQUEST, status);
    assert_eq!("ERROR", resp["status"]);
    assert_eq!("Invalid query string", resp["message"]);
    assert!(resp["error"].as_str().is_some_and(|e| !e.is_empty()));
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn debug_sheets_missing_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let mock = MockHttpClient::new();
    let router = test_router(test_config(dir.path().join("nope.json")), &mock);

    let (status, resp) = send(router, get("/api/debug-sheets")).await;

    assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, status);
    assert_eq!("ERROR", resp["status"]);
    assert!(
        resp["error"]
            .as_str()
            .unwrap()
            .starts_with("Credentials file not found at")
    );
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn cors_mirrors_origin() {
    let mock = MockHttpClient::new();
    let router = test_router(test_config(fixture_credentials()), &mock);

    let request = axum::http::Request::builder()
        .method("OPTIONS")
        .uri("/api/delete-transaction")
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .body(axum::body::Body::empty())
        .unwrap();
    let resp = tower::ServiceExt::oneshot(router, request).await.unwrap();

    let headers = resp.headers();
    assert_eq!(
        "http://localhost:3000",
        headers["access-control-allow-origin"]
    );
    assert_eq!("true", headers["access-control-allow-credentials"]);
    assert!(mock.requests().is_empty());
}
