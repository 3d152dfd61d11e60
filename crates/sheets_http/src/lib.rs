//! Minimal client for the Google Sheets v4 api.
//!
//! Authentication uses a service account key: a signed jwt is exchanged for a
//! bearer token which is attached to every api request.

pub mod client;
pub mod credentials;
pub mod errors;
pub mod reqwest_client;
pub mod sheets;
pub mod types;

// Re-export some types to use with the http client.
pub use reqwest::header::HeaderMap;
pub use reqwest::{Method, Request, StatusCode};
