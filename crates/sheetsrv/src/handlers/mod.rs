//! Request handlers for the `/api` routes.

pub mod debug;
pub mod transactions;

use sheets_http::client::HttpClient;

use crate::config::ServerConfig;
use crate::factory::SheetsClientFactory;

/// State that's passed to all handlers.
#[derive(Debug)]
pub struct AppState<C: HttpClient> {
    pub config: ServerConfig,
    /// Builds the client used for each request.
    pub factory: SheetsClientFactory<C>,
}

impl<C> AppState<C>
where
    C: HttpClient,
{
    pub fn new(config: ServerConfig, http: C) -> Self {
        let factory = SheetsClientFactory::new(http, config.sheets_api_url.clone())
            .with_cache(config.cache_clients);
        AppState { config, factory }
    }
}
