//! Diagnostic endpoints for checking credentials and connectivity.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sheets_http::client::HttpClient;
use sheets_http::credentials::ServiceAccountSummary;
use tracing::{error, info, warn};

use super::AppState;
use crate::errors::{Result, internal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Ok,
    Error,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugSheetsQuery {
    pub spreadsheet_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugSheetsResponse {
    pub status: Status,
    pub message: &'static str,
    pub spreadsheet_title: String,
    pub sheets: Vec<SheetSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetSummary {
    pub title: String,
    pub sheet_id: i64,
}

/// GET /api/debug-sheets
///
/// Builds a client and fetches metadata for the requested spreadsheet, or the
/// configured default one.
pub async fn debug_sheets<C>(
    State(state): State<Arc<AppState<C>>>,
    query: Result<Query<DebugSheetsQuery>, QueryRejection>,
) -> Response
where
    C: HttpClient,
{
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            warn!(%rejection, "invalid debug sheets query");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "status": Status::Error,
                    "message": "Invalid query string",
                    "error": rejection.body_text(),
                })),
            )
                .into_response();
        }
    };

    let spreadsheet_id = query
        .spreadsheet_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| state.config.debug_spreadsheet_id.clone());

    match debug_sheets_inner(&state, &spreadsheet_id).await {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err(e) => {
            error!(error = ?e, %spreadsheet_id, "error testing google sheets api");
            (
                e.status_code(),
                Json(json!({
                    "status": Status::Error,
                    "message": "Failed to connect to Google Sheets API",
                    "error": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}

async fn debug_sheets_inner<C>(state: &AppState<C>, spreadsheet_id: &str) -> Result<DebugSheetsResponse>
where
    C: HttpClient,
{
    info!(%spreadsheet_id, "testing google sheets api connection");
    let client = state.factory.build(&state.config.credentials_path).await?;
    let spreadsheet = client.get_spreadsheet(spreadsheet_id).await?;

    Ok(DebugSheetsResponse {
        status: Status::Ok,
        message: "Google Sheets API connection successful",
        spreadsheet_title: spreadsheet.title().unwrap_or("Unknown").to_string(),
        sheets: spreadsheet
            .sheet_properties()
            .map(|props| SheetSummary {
                title: props.title.clone(),
                sheet_id: props.sheet_id,
            })
            .collect(),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: Status,
    pub message: &'static str,
    pub credentials_found: bool,
    pub credentials_path: String,
    /// Omitted when the key file is missing or can't be parsed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_info: Option<ServiceAccountSummary>,
    pub sheets_api_initialized: bool,
    pub init_error: Option<String>,
    pub environment: EnvironmentInfo,
    pub cors: CorsInfo,
}

#[derive(Debug, Serialize)]
pub struct EnvironmentInfo {
    pub environment: String,
    pub port: u16,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorsInfo {
    pub allowed_origins: &'static str,
}

/// GET /api/health
pub async fn health<C>(State(state): State<Arc<AppState<C>>>) -> Response
where
    C: HttpClient,
{
    match health_report(&state).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => {
            error!(error = ?e, "health check failed");
            (
                e.status_code(),
                Json(json!({ "status": Status::Error, "message": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn health_report<C>(state: &AppState<C>) -> Result<HealthReport>
where
    C: HttpClient,
{
    let path = &state.config.credentials_path;
    let credentials_found = tokio::fs::try_exists(path)
        .await
        .map_err(|e| internal!("Failed to check for credentials file: {e}"))?;

    let credentials_info = if credentials_found {
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => match ServiceAccountSummary::try_from_str(&contents) {
                Ok(summary) => Some(summary),
                Err(e) => {
                    warn!(%e, "error parsing credentials file");
                    None
                }
            },
            Err(e) => {
                warn!(%e, "error reading credentials file");
                None
            }
        }
    } else {
        None
    };

    let init_error = match state.factory.build(path).await {
        Ok(_) => None,
        Err(e) => Some(e.to_string()),
    };
    let sheets_api_initialized = init_error.is_none();

    Ok(HealthReport {
        status: if sheets_api_initialized {
            Status::Ok
        } else {
            Status::Error
        },
        message: "Backend service is running",
        credentials_found,
        credentials_path: path.display().to_string(),
        credentials_info,
        sheets_api_initialized,
        init_error,
        environment: EnvironmentInfo {
            environment: state.config.environment.clone(),
            port: state.config.port,
        },
        cors: CorsInfo {
            allowed_origins: "*",
        },
    })
}
