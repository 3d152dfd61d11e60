use std::time::Duration;

use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use reqwest::header::HeaderMap;
use reqwest::{Request, StatusCode};

use crate::client::{HttpClient, HttpResponse};
use crate::errors::{Result, ResultExt, SheetsHttpError};

/// Http client backed by reqwest, used when talking to the real apis.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Create a client where every request is bounded by `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sheetsrv/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build http client")?;
        Ok(ReqwestClient { client })
    }
}

impl HttpClient for ReqwestClient {
    type Response = ReqwestResponse;
    type RequestFuture = BoxFuture<'static, Result<Self::Response>>;

    fn do_request(&self, request: Request) -> Self::RequestFuture {
        self.client
            .execute(request)
            .map(|result| match result {
                Ok(resp) => Ok(ReqwestResponse(resp)),
                Err(e) => Err(SheetsHttpError::with_source("Failed to make request", e)),
            })
            .boxed()
    }
}

#[derive(Debug)]
pub struct ReqwestResponse(reqwest::Response);

impl HttpResponse for ReqwestResponse {
    type BytesStream = BoxStream<'static, Result<Bytes>>;

    fn status(&self) -> StatusCode {
        self.0.status()
    }

    fn headers(&self) -> &HeaderMap {
        self.0.headers()
    }

    fn into_bytes_stream(self) -> Self::BytesStream {
        self.0
            .bytes_stream()
            .map_err(|e| SheetsHttpError::with_source("Failed to stream body", e))
            .boxed()
    }
}
