//! Worksheet resolution and row edits.

use std::borrow::Cow;

use serde_json::Value;
use sheets_http::client::HttpClient;
use sheets_http::sheets::SheetsClient;
use sheets_http::types::{
    BatchUpdateRequest,
    BatchUpdateResponse,
    DeleteDimensionRequest,
    Dimension,
    DimensionRange,
    SheetRequest,
    Spreadsheet,
    UpdateValuesResponse,
    ValueInputOption,
    ValueRange,
};
use tracing::{debug, info};

use crate::config::WorksheetSelector;
use crate::errors::{ApiError, Result};

/// 1-based row position as seen by api callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RowIndex(u32);

impl RowIndex {
    pub fn new(row: u32) -> Option<Self> {
        if row == 0 { None } else { Some(RowIndex(row)) }
    }

    /// Parse a row index from a request value.
    ///
    /// Accepts positive json integers and strings of digits.
    pub fn from_json(value: &Value) -> Option<Self> {
        let row = match value {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok())?,
            Value::String(s) => s.trim().parse().ok()?,
            _ => return None,
        };
        RowIndex::new(row)
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    pub fn zero_based(&self) -> u32 {
        self.0 - 1
    }
}

/// The worksheet edits are applied to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorksheetRef {
    pub sheet_name: String,
    pub sheet_id: i64,
}

/// Pick a worksheet out of spreadsheet metadata.
pub fn select_worksheet(
    spreadsheet: &Spreadsheet,
    selector: &WorksheetSelector,
) -> Result<WorksheetRef> {
    if spreadsheet.sheets.is_empty() {
        return Err(ApiError::NoSheets);
    }

    let props = match selector {
        WorksheetSelector::Index(idx) => spreadsheet
            .sheets
            .get(*idx)
            .and_then(|sheet| sheet.properties.as_ref()),
        WorksheetSelector::Name(name) => spreadsheet
            .sheet_properties()
            .find(|props| &props.title == name),
    };

    match props {
        Some(props) => Ok(WorksheetRef {
            sheet_name: props.title.clone(),
            sheet_id: props.sheet_id,
        }),
        None => Err(ApiError::WorksheetNotFound(selector.clone())),
    }
}

/// Fetch metadata for a spreadsheet and resolve the selected worksheet.
pub async fn resolve_worksheet<C>(
    client: &SheetsClient<C>,
    spreadsheet_id: &str,
    selector: &WorksheetSelector,
) -> Result<WorksheetRef>
where
    C: HttpClient,
{
    let spreadsheet = client.get_spreadsheet(spreadsheet_id).await?;
    let worksheet = select_worksheet(&spreadsheet, selector)?;
    info!(sheet_name = %worksheet.sheet_name, sheet_id = worksheet.sheet_id, "using sheet");
    Ok(worksheet)
}

/// Batch request removing a single row, shifting the rows below it up.
pub fn delete_row_request(sheet_id: i64, row: RowIndex) -> BatchUpdateRequest {
    BatchUpdateRequest {
        requests: vec![SheetRequest::DeleteDimension(DeleteDimensionRequest {
            range: DimensionRange {
                sheet_id,
                dimension: Dimension::Rows,
                start_index: row.zero_based(),
                end_index: row.get(),
            },
        })],
    }
}

/// Quote a sheet name for use in A1 notation if needed.
///
/// Names made of only ascii alphanumerics and underscores are left as is.
pub fn quote_sheet_name(name: &str) -> Cow<'_, str> {
    let plain = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("'{}'", name.replace('\'', "''")))
    }
}

/// A1 range for the start of a row, e.g. `Sheet1!A5`.
pub fn row_range(sheet_name: &str, row: RowIndex) -> String {
    format!("{}!A{}", quote_sheet_name(sheet_name), row.get())
}

/// Delete a row from the selected worksheet.
pub async fn delete_row<C>(
    client: &SheetsClient<C>,
    spreadsheet_id: &str,
    selector: &WorksheetSelector,
    row: RowIndex,
) -> Result<BatchUpdateResponse>
where
    C: HttpClient,
{
    let worksheet = resolve_worksheet(client, spreadsheet_id, selector).await?;
    let request = delete_row_request(worksheet.sheet_id, row);

    let resp = client.batch_update(spreadsheet_id, &request).await?;
    debug!(?resp, "delete response");
    Ok(resp)
}

/// Overwrite a row of the selected worksheet starting at column A.
///
/// Exactly `values.len()` cells are written. Cells past the end of `values`
/// keep their current contents.
pub async fn update_row<C>(
    client: &SheetsClient<C>,
    spreadsheet_id: &str,
    selector: &WorksheetSelector,
    row: RowIndex,
    values: Vec<Value>,
) -> Result<UpdateValuesResponse>
where
    C: HttpClient,
{
    let worksheet = resolve_worksheet(client, spreadsheet_id, selector).await?;
    let range = row_range(&worksheet.sheet_name, row);
    info!(%spreadsheet_id, %range, columns = values.len(), "updating row");

    let body = ValueRange {
        range: Some(range.clone()),
        major_dimension: Some(Dimension::Rows),
        values: vec![values],
    };
    let resp = client
        .update_values(spreadsheet_id, &range, ValueInputOption::UserEntered, &body)
        .await?;
    debug!(?resp, "update response");
    Ok(resp)
}
