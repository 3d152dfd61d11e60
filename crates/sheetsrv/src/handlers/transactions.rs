//! Row mutation endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value, json};
use sheets_http::client::HttpClient;
use tracing::info;

use super::AppState;
use crate::errors::{ApiError, Result};
use crate::rows::{self, RowIndex};

/// Body accepted by both mutation endpoints.
///
/// Fields are kept as raw json so that presence and shape can be validated
/// with useful messages. A field is present only if it's set to something
/// other than `null`, `false`, `0` or `""`.
#[derive(Debug, Default)]
pub struct TransactionBody {
    pub sheet_id: Option<Value>,
    pub row_index: Option<Value>,
    pub values: Option<Value>,
}

#[derive(Debug, PartialEq)]
pub struct DeleteTransaction {
    pub spreadsheet_id: String,
    pub row: RowIndex,
}

#[derive(Debug, PartialEq)]
pub struct EditTransaction {
    pub spreadsheet_id: String,
    pub row: RowIndex,
    pub values: Vec<Value>,
}

impl TransactionBody {
    /// Read the fields of a json body.
    ///
    /// Anything other than an object has no fields.
    pub fn from_json(body: Value) -> Self {
        let mut fields = match body {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };
        let mut take = |key: &str| fields.remove(key).filter(is_set);

        TransactionBody {
            sheet_id: take("sheetId"),
            row_index: take("rowIndex"),
            values: take("values"),
        }
    }

    fn spreadsheet_id(&self) -> Option<&str> {
        match &self.sheet_id {
            Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    fn row(&self) -> Result<RowIndex> {
        // Presence is checked by the caller.
        let value = self.row_index.as_ref().unwrap_or(&Value::Null);
        RowIndex::from_json(value).ok_or_else(|| {
            ApiError::BadRequest("Row index must be a positive integer".to_string())
        })
    }

    pub fn into_delete(self) -> Result<DeleteTransaction> {
        let spreadsheet_id = match (self.spreadsheet_id(), &self.row_index) {
            (Some(id), Some(_)) => id.to_string(),
            _ => {
                return Err(ApiError::BadRequest(
                    "Sheet ID and row index are required".to_string(),
                ));
            }
        };
        let row = self.row()?;
        Ok(DeleteTransaction {
            spreadsheet_id,
            row,
        })
    }

    pub fn into_edit(self) -> Result<EditTransaction> {
        let spreadsheet_id = match (self.spreadsheet_id(), &self.row_index, &self.values) {
            (Some(id), Some(_), Some(_)) => id.to_string(),
            _ => {
                return Err(ApiError::BadRequest(
                    "Sheet ID, row index, and values are required".to_string(),
                ));
            }
        };
        let row = self.row()?;

        let values = match self.values {
            Some(Value::Array(values)) => values,
            _ => return Err(ApiError::BadRequest("Values must be an array".to_string())),
        };
        if values
            .iter()
            .any(|v| matches!(v, Value::Array(_) | Value::Object(_)))
        {
            return Err(ApiError::BadRequest(
                "Values must only contain strings, numbers, booleans, or nulls".to_string(),
            ));
        }

        Ok(EditTransaction {
            spreadsheet_id,
            row,
            values,
        })
    }
}

fn is_set(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn parse_body(body: Result<Json<Value>, JsonRejection>) -> Result<TransactionBody> {
    match body {
        Ok(Json(body)) => Ok(TransactionBody::from_json(body)),
        Err(rejection) => Err(ApiError::MalformedBody(rejection.body_text())),
    }
}

/// POST /api/delete-transaction
pub async fn delete_transaction<C>(
    State(state): State<Arc<AppState<C>>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response
where
    C: HttpClient,
{
    match delete_transaction_inner(&state, body).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "Transaction deleted successfully" })),
        )
            .into_response(),
        Err(e) => e.into_failure_response("Failed to delete transaction"),
    }
}

async fn delete_transaction_inner<C>(
    state: &AppState<C>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<()>
where
    C: HttpClient,
{
    let txn = parse_body(body)?.into_delete()?;
    info!(row = txn.row.get(), spreadsheet_id = %txn.spreadsheet_id, "attempting to delete row");

    let client = state.factory.build(&state.config.credentials_path).await?;
    rows::delete_row(
        &client,
        &txn.spreadsheet_id,
        &state.config.worksheet,
        txn.row,
    )
    .await?;

    Ok(())
}

/// POST /api/edit-transaction
pub async fn edit_transaction<C>(
    State(state): State<Arc<AppState<C>>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response
where
    C: HttpClient,
{
    match edit_transaction_inner(&state, body).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "Transaction updated successfully" })),
        )
            .into_response(),
        Err(e) => e.into_failure_response("Failed to update transaction"),
    }
}

async fn edit_transaction_inner<C>(
    state: &AppState<C>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<()>
where
    C: HttpClient,
{
    let txn = parse_body(body)?.into_edit()?;
    let values = serde_json::to_string(&txn.values).unwrap_or_default();
    info!(
        row = txn.row.get(),
        spreadsheet_id = %txn.spreadsheet_id,
        %values,
        "attempting to edit row"
    );

    let client = state.factory.build(&state.config.credentials_path).await?;
    rows::update_row(
        &client,
        &txn.spreadsheet_id,
        &state.config.worksheet,
        txn.row,
        txn.values,
    )
    .await?;

    Ok(())
}
