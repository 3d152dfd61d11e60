#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use assert_cmd::cmd::Command;
use axum::Router;
use axum::body::Body;
use axum::http::{Request as HttpRequest, StatusCode as HttpStatusCode};
use bytes::Bytes;
use futures::future::{Ready, ready};
use futures::stream::{Iter, iter};
use parking_lot::Mutex;
use serde_json::{Value, json};
use sheets_http::client::{HttpClient, HttpResponse};
use sheets_http::errors::Result;
use sheets_http::{HeaderMap, Method, Request, StatusCode};
use sheetsrv::config::{ServerConfig, WorksheetSelector};
use sheetsrv::handlers::AppState;
use sheetsrv::server::build_router;
use tower::ServiceExt;
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

pub const SHEETS_BASE_URL: &str = "http://sheets.test/";

pub const TOKEN_PATH: &str = "/token";

pub fn make_cli() -> Command {
    Command::cargo_bin(env!("CARGO_PKG_NAME")).expect("Failed to find binary")
}

/// Service account key whose token uri points at `http://oauth.test/token`.
pub fn fixture_credentials() -> PathBuf {
    PathBuf::from(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../sheets_http/testdata/service_account.json"
    ))
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: Url,
    pub authorization: Option<String>,
    pub body: Option<Vec<u8>>,
}

impl RecordedRequest {
    pub fn json_body(&self) -> Value {
        serde_json::from_slice(self.body.as_deref().expect("request to have a body"))
            .expect("body to be json")
    }
}

#[derive(Debug, Default)]
struct MockState {
    requests: Vec<RecordedRequest>,
    /// (method, path) -> (status, body)
    routes: Vec<(Method, String, StatusCode, Value)>,
}

/// Http client that records requests and answers from canned responses.
///
/// Requests to unregistered paths get a google style 404.
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    state: Arc<Mutex<MockState>>,
}

impl MockHttpClient {
    /// Mock with the token endpoint already registered.
    pub fn new() -> Self {
        let mock = MockHttpClient::default();
        mock.respond(
            Method::POST,
            TOKEN_PATH,
            StatusCode::OK,
            json!({"access_token": "test-token", "expires_in": 3600, "token_type": "Bearer"}),
        );
        mock
    }

    /// Register a response, replacing any earlier one for the same route.
    pub fn respond(&self, method: Method, path: &str, status: StatusCode, body: Value) {
        let mut state = self.state.lock();
        state
            .routes
            .retain(|(m, p, _, _)| !(*m == method && p == path));
        state.routes.push((method, path.to_string(), status, body));
    }

    /// Register spreadsheet metadata for `spreadsheet_id`.
    pub fn with_spreadsheet(&self, spreadsheet_id: &str, title: &str, sheets: &[(i64, &str)]) {
        let sheets: Vec<_> = sheets
            .iter()
            .enumerate()
            .map(|(idx, (id, title))| {
                json!({"properties": {"sheetId": id, "title": title, "index": idx}})
            })
            .collect();
        self.respond(
            Method::GET,
            &format!("/v4/spreadsheets/{spreadsheet_id}"),
            StatusCode::OK,
            json!({
                "spreadsheetId": spreadsheet_id,
                "properties": {"title": title},
                "sheets": sheets,
            }),
        );
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }

    /// Recorded requests, excluding token exchanges.
    pub fn api_requests(&self) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.path() != TOKEN_PATH)
            .collect()
    }
}

#[derive(Debug)]
pub struct MockResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl HttpResponse for MockResponse {
    type BytesStream = Iter<std::vec::IntoIter<Result<Bytes>>>;

    fn status(&self) -> StatusCode {
        self.status
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn into_bytes_stream(self) -> Self::BytesStream {
        iter(vec![Ok(self.body)])
    }
}

impl HttpClient for MockHttpClient {
    type Response = MockResponse;
    type RequestFuture = Ready<Result<MockResponse>>;

    fn do_request(&self, request: Request) -> Self::RequestFuture {
        let body = request
            .body()
            .and_then(|b| b.as_bytes())
            .map(|b| b.to_vec());

        let mut state = self.state.lock();
        state.requests.push(RecordedRequest {
            method: request.method().clone(),
            url: request.url().clone(),
            authorization: request
                .headers()
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string()),
            body,
        });

        let (status, body) = state
            .routes
            .iter()
            .find(|(m, p, _, _)| m == request.method() && p == request.url().path())
            .map(|(_, _, status, body)| (*status, body.clone()))
            .unwrap_or_else(|| {
                (
                    StatusCode::NOT_FOUND,
                    json!({"error": {"code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND"}}),
                )
            });

        ready(Ok(MockResponse {
            status,
            headers: HeaderMap::new(),
            body: Bytes::from(serde_json::to_vec(&body).unwrap()),
        }))
    }
}

pub fn test_config(credentials_path: PathBuf) -> ServerConfig {
    ServerConfig {
        credentials_path,
        worksheet: WorksheetSelector::default(),
        debug_spreadsheet_id: "default-sheet".to_string(),
        environment: "test".to_string(),
        bind: "127.0.0.1".to_string(),
        port: 4000,
        sheets_api_url: Url::parse(SHEETS_BASE_URL).unwrap(),
        cache_clients: false,
        upstream_timeout: Duration::from_secs(5),
    }
}

pub fn test_router(config: ServerConfig, mock: &MockHttpClient) -> Router {
    build_router(Arc::new(AppState::new(config, mock.clone())))
}

/// Send a request through the router, returning the status and json body.
pub async fn send(router: Router, request: HttpRequest<Body>) -> (HttpStatusCode, Value) {
    let resp = router.oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

pub fn post_json(uri: &str, body: Value) -> HttpRequest<Body> {
    HttpRequest::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> HttpRequest<Body> {
    HttpRequest::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}
