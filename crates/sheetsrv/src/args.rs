use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, anyhow};
use clap::{ArgAction, Parser, ValueEnum};
use sheets_http::sheets::DEFAULT_SHEETS_BASE_URL;
use url::Url;

use crate::config::{
    CREDENTIALS_ENV,
    DEFAULT_DEBUG_SPREADSHEET_ID,
    DEFAULT_ENVIRONMENT,
    DEFAULT_PORT,
    ServerConfig,
    WorksheetSelector,
    resolve_credentials_path,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Human,
    Json,
}

impl From<LogFormatArg> for logutil::LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Human => logutil::LogFormat::HumanReadable,
            LogFormatArg::Json => logutil::LogFormat::Json,
        }
    }
}

#[derive(Debug, Parser)]
#[clap(name = "sheetsrv", version, about = "HTTP backend for editing Google Sheets rows")]
pub struct ServerArgs {
    /// Path to the service account key file.
    ///
    /// Relative paths are resolved against the working directory. If unset,
    /// `credentials.json` in the working directory is used.
    #[arg(short, long, env = CREDENTIALS_ENV, value_parser)]
    pub credentials: Option<PathBuf>,

    /// Port to listen on.
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Host address to bind to.
    #[arg(short, long, default_value = "0.0.0.0")]
    pub bind: String,

    /// Deployment environment tag, reported by the health endpoint.
    #[arg(long, env = "APP_ENV", default_value = DEFAULT_ENVIRONMENT)]
    pub environment: String,

    /// Worksheet that rows are edited in.
    ///
    /// One of `index:<n>` (zero based), `name:<title>`, or a bare index or
    /// title.
    #[arg(long, env = "SHEETS_WORKSHEET", default_value_t = WorksheetSelector::default())]
    pub worksheet: WorksheetSelector,

    /// Spreadsheet probed by the debug endpoint when none is given.
    #[arg(long, env = "SHEETS_DEBUG_SPREADSHEET_ID", default_value = DEFAULT_DEBUG_SPREADSHEET_ID)]
    pub debug_spreadsheet_id: String,

    /// Reuse sheets clients between requests until the key file changes.
    #[arg(long, env = "SHEETS_CACHE_CLIENTS")]
    pub cache_clients: bool,

    /// Timeout in seconds for requests to google.
    #[arg(long, default_value_t = 30)]
    pub upstream_timeout_secs: u64,

    /// Base url of the sheets api.
    ///
    /// (Internal)
    #[arg(long, env = "SHEETS_API_BASE_URL", default_value = DEFAULT_SHEETS_BASE_URL, hide = true)]
    pub sheets_api_url: Url,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormatArg::Human)]
    pub log_format: LogFormatArg,

    /// Increase log verbosity, may be repeated.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl ServerArgs {
    /// Resolve args into the server configuration.
    pub fn into_config(self) -> Result<ServerConfig> {
        if self.upstream_timeout_secs == 0 {
            return Err(anyhow!("upstream timeout must be greater than zero"));
        }

        let cwd = env::current_dir()?;
        let credentials_path = resolve_credentials_path(self.credentials.as_deref(), &cwd);

        Ok(ServerConfig {
            credentials_path,
            worksheet: self.worksheet,
            debug_spreadsheet_id: self.debug_spreadsheet_id,
            environment: self.environment,
            bind: self.bind,
            port: self.port,
            sheets_api_url: self.sheets_api_url,
            cache_clients: self.cache_clients,
            upstream_timeout: Duration::from_secs(self.upstream_timeout_secs),
        })
    }
}
