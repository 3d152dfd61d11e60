use std::path::PathBuf;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use sheets_http::errors::SheetsHttpError;
use tracing::error;

use crate::config::WorksheetSelector;

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request is missing fields or has fields of the wrong shape.
    #[error("{0}")]
    BadRequest(String),

    /// Request body could not be parsed as json.
    #[error("Invalid request body: {0}")]
    MalformedBody(String),

    #[error("Credentials file not found at {}", .0.display())]
    CredentialsNotFound(PathBuf),

    #[error("Failed to set up Google Sheets API: {0}")]
    SetupFailed(#[source] SheetsHttpError),

    #[error("No sheets found in the spreadsheet")]
    NoSheets,

    #[error("Worksheet {0} not found in the spreadsheet")]
    WorksheetNotFound(WorksheetSelector),

    #[error(transparent)]
    Upstream(#[from] SheetsHttpError),

    #[error("internal: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Build the response for a failed request.
    ///
    /// Client errors carry only their message. Everything else is logged
    /// with the full error and answered with `failure` plus the top level
    /// error message.
    pub fn into_failure_response(self, failure: &'static str) -> Response {
        match &self {
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "message": msg }))).into_response()
            }
            ApiError::MalformedBody(detail) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": "Invalid request body", "error": detail })),
            )
                .into_response(),
            _ => {
                error!(error = ?self, "{failure}");
                (
                    self.status_code(),
                    Json(json!({ "message": failure, "error": self.to_string() })),
                )
                    .into_response()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.into_failure_response("Request failed")
    }
}

/// Build an internal error with a formatted message.
macro_rules! internal {
    ($($arg:tt)*) => {
        crate::errors::ApiError::Internal(std::format!($($arg)*))
    };
}
pub(crate) use internal;
