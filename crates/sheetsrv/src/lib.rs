//! HTTP backend for deleting and editing rows of a Google Sheets spreadsheet.

pub mod args;
pub mod config;
pub mod errors;
pub mod factory;
pub mod handlers;
pub mod rows;
pub mod server;

use std::sync::Arc;

use anyhow::Result;
use sheets_http::reqwest_client::ReqwestClient;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::handlers::AppState;

/// Bind to the configured address and serve until shutdown.
pub async fn run(mut config: ServerConfig) -> Result<()> {
    let http = ReqwestClient::with_timeout(config.upstream_timeout)?;

    let listener = TcpListener::bind((config.bind.as_str(), config.port)).await?;
    let addr = listener.local_addr()?;
    config.port = addr.port();

    info!(%addr, worksheet = %config.worksheet, cache_clients = config.cache_clients, "starting server");
    println!("Server is running on port {}", addr.port());
    println!(
        "Using credentials from: {}",
        config.credentials_path.display()
    );
    println!("CORS configured to allow all origins");

    let state = Arc::new(AppState::new(config, http));
    server::serve(listener, server::build_router(state)).await?;

    Ok(())
}
