use std::fmt::Debug;

use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Request, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ResultExt, SheetsHttpError};

pub trait HttpClient: Sync + Send + Debug + Clone + 'static {
    type Response: HttpResponse;
    type RequestFuture: Future<Output = Result<Self::Response>> + Send + Unpin;

    /// Do the request.
    fn do_request(&self, request: Request) -> Self::RequestFuture;
}

pub trait HttpResponse: Send {
    type BytesStream: Stream<Item = Result<Bytes>> + Send + Unpin;

    fn status(&self) -> StatusCode;
    fn headers(&self) -> &HeaderMap;

    /// Convert the response body into a byte stream.
    fn into_bytes_stream(self) -> Self::BytesStream;
}

/// Helper to set a json body on this request.
///
/// Overwrites the existing body and 'Content-Type' of the request.
pub fn set_json_body<T>(request: &mut Request, body: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let body = serde_json::to_vec(body).context("Failed to serialize request body to json")?;
    *request.body_mut() = Some(body.into());
    request
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    Ok(())
}

/// Helper to set a form body on this request.
///
/// Overwrites the existing body and 'Content-Type' of the request.
pub fn set_form_body<T>(request: &mut Request, body: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let body = serde_urlencoded::to_string(body)
        .context("Failed to serialize request body to url encoded form")?;
    *request.body_mut() = Some(body.into());
    request.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/x-www-form-urlencoded"),
    );

    Ok(())
}

/// Set a bearer token 'Authorization' header on the request.
pub fn set_bearer_auth(request: &mut Request, token: &str) -> Result<()> {
    let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
        .context("Access token is not a valid header value")?;
    value.set_sensitive(true);
    request.headers_mut().insert(AUTHORIZATION, value);
    Ok(())
}

/// Helper to read the full body of a byte stream.
pub async fn read_body<S>(mut stream: S) -> Result<Vec<u8>>
where
    S: Stream<Item = Result<Bytes>> + Send + Unpin,
{
    let mut bytes = Vec::new();
    while let Some(resp) = stream.try_next().await? {
        bytes.extend_from_slice(resp.as_ref());
    }
    Ok(bytes)
}

/// Helper to read a json response from a byte stream.
///
/// This will collect the full response before trying to deserialize it.
pub async fn read_json_response<T, S>(stream: S) -> Result<T>
where
    T: DeserializeOwned,
    S: Stream<Item = Result<Bytes>> + Send + Unpin,
{
    let bytes = read_body(stream).await?;
    serde_json::from_slice(&bytes).context("Failed to deserialize response body as json")
}

/// Read a json response, turning non-success statuses into an api error.
pub async fn read_api_response<T, R>(response: R) -> Result<T>
where
    T: DeserializeOwned,
    R: HttpResponse,
{
    let status = response.status();
    if status.is_success() {
        return read_json_response(response.into_bytes_stream()).await;
    }

    let body = read_body(response.into_bytes_stream()).await?;
    Err(SheetsHttpError::Api {
        status,
        message: error_message(status, &body),
    })
}

/// Error bodies google apis may return.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    /// `{"error": {"code": 404, "message": "...", "status": "NOT_FOUND"}}`
    Api { error: ApiErrorDetail },
    /// `{"error": "invalid_grant", "error_description": "..."}`
    OAuth {
        error: String,
        error_description: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

fn error_message(status: StatusCode, body: &[u8]) -> String {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(ErrorBody::Api { error }) => error.message,
        Ok(ErrorBody::OAuth {
            error,
            error_description: Some(desc),
        }) => format!("{error}: {desc}"),
        Ok(ErrorBody::OAuth { error, .. }) => error,
        Err(_) => {
            let text = String::from_utf8_lossy(body);
            let text = text.trim();
            if text.is_empty() {
                format!(
                    "Request failed with status {}",
                    status.canonical_reason().unwrap_or(status.as_str())
                )
            } else {
                format!("Request failed with status {}: {text}", status.as_u16())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_from_api_body() {
        let body = br#"{"error":{"code":403,"message":"The caller does not have permission","status":"PERMISSION_DENIED"}}"#;
        assert_eq!(
            "The caller does not have permission",
            error_message(StatusCode::FORBIDDEN, body)
        );
    }

    #[test]
    fn error_message_from_oauth_body() {
        let body = br#"{"error":"invalid_grant","error_description":"Invalid JWT Signature."}"#;
        assert_eq!(
            "invalid_grant: Invalid JWT Signature.",
            error_message(StatusCode::BAD_REQUEST, body)
        );
    }

    #[test]
    fn error_message_from_plain_body() {
        assert_eq!(
            "Request failed with status 502: bad gateway",
            error_message(StatusCode::BAD_GATEWAY, b"bad gateway")
        );
        assert_eq!(
            "Request failed with status Service Unavailable",
            error_message(StatusCode::SERVICE_UNAVAILABLE, b"")
        );
    }

    #[tokio::test]
    async fn read_json_across_chunks() {
        let chunks = vec![
            Ok(Bytes::from_static(b"{\"a\":")),
            Ok(Bytes::from_static(b" 1}")),
        ];
        let value: serde_json::Value = read_json_response(futures::stream::iter(chunks))
            .await
            .unwrap();
        assert_eq!(serde_json::json!({"a": 1}), value);
    }
}
