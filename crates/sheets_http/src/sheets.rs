use std::sync::Arc;

use reqwest::{Method, Request};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::client::{HttpClient, read_api_response, set_bearer_auth, set_json_body};
use crate::credentials::ServiceAccountAuth;
use crate::errors::{Result, ResultExt, SheetsHttpError};
use crate::types::{
    BatchUpdateRequest,
    BatchUpdateResponse,
    Spreadsheet,
    UpdateValuesResponse,
    ValueInputOption,
    ValueRange,
};

pub const DEFAULT_SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/";

/// Field mask used when fetching spreadsheet metadata.
const METADATA_FIELDS: &str = "spreadsheetId,properties.title,sheets.properties";

/// Authenticated handle to the Sheets v4 api.
///
/// Cheap to clone, clones share the cached access token.
#[derive(Debug, Clone)]
pub struct SheetsClient<C: HttpClient> {
    client: C,
    base_url: Url,
    auth: Arc<ServiceAccountAuth>,
}

impl<C> SheetsClient<C>
where
    C: HttpClient,
{
    pub fn new(client: C, base_url: Url, auth: Arc<ServiceAccountAuth>) -> Self {
        SheetsClient {
            client,
            base_url,
            auth,
        }
    }

    pub fn auth(&self) -> &ServiceAccountAuth {
        &self.auth
    }

    /// Fetch spreadsheet metadata (title and worksheet properties).
    pub async fn get_spreadsheet(&self, spreadsheet_id: &str) -> Result<Spreadsheet> {
        let mut url = self.spreadsheet_url(spreadsheet_id, &[])?;
        url.query_pairs_mut().append_pair("fields", METADATA_FIELDS);

        let request = Request::new(Method::GET, url);
        self.send(request).await
    }

    /// Apply structural updates to a spreadsheet.
    pub async fn batch_update(
        &self,
        spreadsheet_id: &str,
        body: &BatchUpdateRequest,
    ) -> Result<BatchUpdateResponse> {
        let endpoint = format!("{spreadsheet_id}:batchUpdate");
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SheetsHttpError::new("Sheets base url cannot be a base"))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", endpoint.as_str()]);

        let mut request = Request::new(Method::POST, url);
        set_json_body(&mut request, body)?;
        self.send(request).await
    }

    /// Write values into a range.
    ///
    /// `range` is in A1 notation and should not be percent encoded.
    pub async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        input: ValueInputOption,
        body: &ValueRange,
    ) -> Result<UpdateValuesResponse> {
        let mut url = self.spreadsheet_url(spreadsheet_id, &["values", range])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", input.as_str());

        let mut request = Request::new(Method::PUT, url);
        set_json_body(&mut request, body)?;
        self.send(request).await
    }

    fn spreadsheet_url(&self, spreadsheet_id: &str, rest: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SheetsHttpError::new("Sheets base url cannot be a base"))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", spreadsheet_id])
            .extend(rest);
        Ok(url)
    }

    async fn send<T>(&self, mut request: Request) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let token = self
            .auth
            .access_token(&self.client)
            .await
            .context("Failed to get access token")?;
        set_bearer_auth(&mut request, &token)?;

        debug!(method = %request.method(), url = %request.url(), "sheets api request");
        let resp = self.client.do_request(request).await?;
        read_api_response(resp).await
    }
}
