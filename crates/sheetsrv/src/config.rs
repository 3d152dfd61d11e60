use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use url::Url;

/// Environment variable holding the path to the service account key.
pub const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Key file used when no path is configured, relative to the working
/// directory.
pub const DEFAULT_CREDENTIALS_FILE: &str = "credentials.json";

pub const DEFAULT_PORT: u16 = 4000;

pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Spreadsheet probed by the debug endpoint when the request doesn't name one.
pub const DEFAULT_DEBUG_SPREADSHEET_ID: &str = "1z_24OJndRjgGpV83iNDhUlx1WQMpHBVkcwvmAkizfjk";

pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Resolve the credentials path.
///
/// An absolute `configured` path is used verbatim, a relative one is resolved
/// against `cwd`. Without a configured path this falls back to
/// `<cwd>/credentials.json`. Whether the file exists is not checked.
pub fn resolve_credentials_path(configured: Option<&Path>, cwd: &Path) -> PathBuf {
    match configured {
        Some(path) if path.as_os_str().is_empty() => cwd.join(DEFAULT_CREDENTIALS_FILE),
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => cwd.join(path),
        None => cwd.join(DEFAULT_CREDENTIALS_FILE),
    }
}

/// Which worksheet of a spreadsheet rows are read from and written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorksheetSelector {
    /// Zero based position of the worksheet.
    Index(usize),
    /// Worksheet title, matched exactly.
    Name(String),
}

impl Default for WorksheetSelector {
    fn default() -> Self {
        WorksheetSelector::Index(0)
    }
}

impl fmt::Display for WorksheetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorksheetSelector::Index(idx) => write!(f, "index:{idx}"),
            WorksheetSelector::Name(name) => write!(f, "name:{name}"),
        }
    }
}

impl FromStr for WorksheetSelector {
    type Err = String;

    /// Accepts `index:<n>`, `name:<title>`, or a bare value where digits are
    /// treated as an index and anything else as a name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(idx) = s.strip_prefix("index:") {
            return idx
                .trim()
                .parse()
                .map(WorksheetSelector::Index)
                .map_err(|_| format!("invalid worksheet index: '{idx}'"));
        }
        if let Some(name) = s.strip_prefix("name:") {
            if name.is_empty() {
                return Err("worksheet name cannot be empty".to_string());
            }
            return Ok(WorksheetSelector::Name(name.to_string()));
        }

        if s.is_empty() {
            return Err("worksheet selector cannot be empty".to_string());
        }
        match s.parse() {
            Ok(idx) => Ok(WorksheetSelector::Index(idx)),
            Err(_) => Ok(WorksheetSelector::Name(s.to_string())),
        }
    }
}

/// Resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub credentials_path: PathBuf,
    pub worksheet: WorksheetSelector,
    pub debug_spreadsheet_id: String,
    /// Free form deployment tag reported by the health endpoint.
    pub environment: String,
    /// Host address to bind to.
    pub bind: String,
    pub port: u16,
    pub sheets_api_url: Url,
    /// Reuse client handles between requests until the key file changes.
    pub cache_clients: bool,
    pub upstream_timeout: Duration,
}
