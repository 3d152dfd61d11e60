//! Construction of authenticated sheets clients from a key file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::Mutex;
use sheets_http::client::HttpClient;
use sheets_http::credentials::{SPREADSHEETS_SCOPE, ServiceAccount, ServiceAccountAuth};
use sheets_http::errors::SheetsHttpError;
use sheets_http::sheets::SheetsClient;
use tracing::{debug, info};
use url::Url;

use crate::errors::{ApiError, Result};

/// Identity of a key file on disk, used to notice credential rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FileStamp {
    path: PathBuf,
    modified: Option<SystemTime>,
    len: u64,
}

#[derive(Debug)]
struct CachedClient<C: HttpClient> {
    stamp: FileStamp,
    client: SheetsClient<C>,
}

/// Builds sheets clients from a service account key path.
///
/// By default every call to `build` reads and parses the key file again. With
/// caching enabled, the last built client is reused for as long as the key
/// file's path, modification time and size stay the same.
#[derive(Debug)]
pub struct SheetsClientFactory<C: HttpClient> {
    http: C,
    base_url: Url,
    cache_enabled: bool,
    cached: Mutex<Option<CachedClient<C>>>,
}

impl<C> SheetsClientFactory<C>
where
    C: HttpClient,
{
    pub fn new(http: C, base_url: Url) -> Self {
        SheetsClientFactory {
            http,
            base_url,
            cache_enabled: false,
            cached: Mutex::new(None),
        }
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// Drop any cached client, the next build will read the key file.
    pub fn invalidate(&self) {
        *self.cached.lock() = None;
    }

    /// Build a client using the key file at `credentials_path`.
    ///
    /// Errors with `CredentialsNotFound` if there's no file at the path, and
    /// with `SetupFailed` if the file can't be read or isn't a usable service
    /// account key. No requests are made, the access token is fetched on
    /// first use.
    pub async fn build(&self, credentials_path: &Path) -> Result<SheetsClient<C>> {
        debug!(path = %credentials_path.display(), "looking for credentials");

        let metadata = match tokio::fs::metadata(credentials_path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ApiError::CredentialsNotFound(credentials_path.to_path_buf()));
            }
            Err(e) => {
                return Err(ApiError::SetupFailed(SheetsHttpError::with_source(
                    "Failed to stat credentials file",
                    e,
                )));
            }
        };
        let stamp = FileStamp {
            path: credentials_path.to_path_buf(),
            modified: metadata.modified().ok(),
            len: metadata.len(),
        };

        if self.cache_enabled {
            if let Some(client) = self.cached_client(&stamp) {
                return Ok(client);
            }
        }

        let contents = tokio::fs::read_to_string(credentials_path)
            .await
            .map_err(|e| {
                ApiError::SetupFailed(SheetsHttpError::with_source(
                    "Failed to read credentials file",
                    e,
                ))
            })?;
        let account = ServiceAccount::try_from_str(&contents).map_err(ApiError::SetupFailed)?;
        let auth = ServiceAccountAuth::try_new(&account, SPREADSHEETS_SCOPE)
            .map_err(ApiError::SetupFailed)?;

        let client = SheetsClient::new(self.http.clone(), self.base_url.clone(), Arc::new(auth));

        if self.cache_enabled {
            info!(path = %credentials_path.display(), client_email = %account.client_email, "caching sheets client");
            *self.cached.lock() = Some(CachedClient {
                stamp,
                client: client.clone(),
            });
        }

        Ok(client)
    }

    fn cached_client(&self, stamp: &FileStamp) -> Option<SheetsClient<C>> {
        let cached = self.cached.lock();
        match cached.as_ref() {
            Some(cached) if &cached.stamp == stamp => Some(cached.client.clone()),
            Some(_) => {
                debug!(path = %stamp.path.display(), "credentials changed, rebuilding client");
                None
            }
            None => None,
        }
    }
}
