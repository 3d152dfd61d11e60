use std::fmt;

use base64::Engine;
use base64::prelude::BASE64_URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use reqwest::{Method, Request};
use ring::signature::RsaKeyPair;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::client::{HttpClient, read_api_response, set_form_body};
use crate::errors::{Result, ResultExt, SheetsHttpError};

/// Read/write access to spreadsheets.
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Used when the key file doesn't specify a token uri.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens are refreshed this many seconds before they actually expire.
const EXPIRY_MARGIN_SECS: i64 = 60;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Json service account key as downloaded from the cloud console.
#[derive(Deserialize)]
pub struct ServiceAccount {
    #[serde(rename = "type")]
    pub account_type: Option<String>,
    pub project_id: Option<String>,
    pub private_key_id: Option<String>,
    private_key: String,
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("account_type", &self.account_type)
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccount {
    pub fn try_from_str(input: &str) -> Result<Self> {
        serde_json::from_str(input).context("Failed to deserialize json service account key")
    }
}

/// Redacted view of a key file, safe to return from diagnostics.
///
/// Every field is optional so that partially filled keys can still be
/// described.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAccountSummary {
    #[serde(rename = "type")]
    pub account_type: Option<String>,
    pub project_id: Option<String>,
    pub client_email: Option<String>,
    pub has_private_key: bool,
}

impl ServiceAccountSummary {
    pub fn try_from_str(input: &str) -> Result<Self> {
        #[derive(Deserialize)]
        struct Partial {
            #[serde(rename = "type")]
            account_type: Option<String>,
            project_id: Option<String>,
            client_email: Option<String>,
            private_key: Option<String>,
        }

        let partial: Partial =
            serde_json::from_str(input).context("Failed to deserialize json service account key")?;

        Ok(ServiceAccountSummary {
            account_type: partial.account_type,
            project_id: partial.project_id,
            client_email: partial.client_email,
            has_private_key: partial.private_key.is_some_and(|k| !k.is_empty()),
        })
    }
}

#[derive(Serialize)]
struct JwtHeader {
    alg: &'static str,
    typ: &'static str,
}

#[derive(Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    exp: i64,
    iat: i64,
}

#[derive(Debug, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Signs assertions with a service account key and exchanges them for access
/// tokens.
///
/// The most recent token is cached until shortly before it expires.
pub struct ServiceAccountAuth {
    client_email: String,
    token_uri: Url,
    scope: String,
    key_pair: RsaKeyPair,
    cached: Mutex<Option<CachedToken>>,
}

impl fmt::Debug for ServiceAccountAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountAuth")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri.as_str())
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountAuth {
    /// Parse the private key and token uri of the account.
    ///
    /// Does not make any requests.
    pub fn try_new(account: &ServiceAccount, scope: impl Into<String>) -> Result<Self> {
        let token_uri =
            Url::parse(&account.token_uri).context("Failed to parse token uri as url")?;
        let key_pair = parse_private_key(&account.private_key)?;

        Ok(ServiceAccountAuth {
            client_email: account.client_email.clone(),
            token_uri,
            scope: scope.into(),
            key_pair,
            cached: Mutex::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    /// Build a signed jwt assertion valid for one hour from `now`.
    pub fn jwt_assertion(&self, now: DateTime<Utc>) -> Result<String> {
        let iat = now.timestamp();
        let exp = (now + Duration::hours(1)).timestamp();

        let claims = JwtClaims {
            iss: &self.client_email,
            scope: &self.scope,
            aud: self.token_uri.as_str(),
            iat,
            exp,
        };
        let header = JwtHeader {
            alg: "RS256",
            typ: "JWT",
        };

        let header_b64 = BASE64_URL_SAFE_NO_PAD
            .encode(serde_json::to_string(&header).context("Failed to encode jwt header")?);
        let claims_b64 = BASE64_URL_SAFE_NO_PAD
            .encode(serde_json::to_string(&claims).context("Failed to encode jwt claims")?);
        let signing_input = format!("{}.{}", header_b64, claims_b64);

        // Sign with PKCS#1 v1.5 SHA-256 (RS256)
        let mut signature = vec![0; self.key_pair.public().modulus_len()];
        self.key_pair
            .sign(
                &ring::signature::RSA_PKCS1_SHA256,
                &ring::rand::SystemRandom::new(),
                signing_input.as_bytes(),
                &mut signature,
            )
            .map_err(|_| SheetsHttpError::new("Failed to sign payload"))?;

        let sig_b64 = BASE64_URL_SAFE_NO_PAD.encode(&signature);
        Ok(format!("{}.{}", signing_input, sig_b64))
    }

    /// Fetch a new access token, bypassing the cache.
    pub async fn fetch_access_token<C>(&self, client: &C) -> Result<AccessToken>
    where
        C: HttpClient,
    {
        let jwt = self.jwt_assertion(Utc::now())?;

        let params = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", &jwt),
        ];
        let mut request = Request::new(Method::POST, self.token_uri.clone());
        set_form_body(&mut request, &params)?;

        debug!(token_uri = %self.token_uri, client_email = %self.client_email, "fetching access token");
        let resp = client.do_request(request).await?;
        read_api_response(resp).await
    }

    /// Get an access token, reusing the cached one if it's still valid.
    pub async fn access_token<C>(&self, client: &C) -> Result<String>
    where
        C: HttpClient,
    {
        let now = Utc::now();
        let cached = self.cached.lock().clone();
        if let Some(cached) = cached {
            if cached.expires_at - Duration::seconds(EXPIRY_MARGIN_SECS) > now {
                return Ok(cached.token);
            }
        }

        let fetched = self.fetch_access_token(client).await?;
        let cached = CachedToken {
            token: fetched.access_token,
            expires_at: token_expiry(now, fetched.expires_in)?,
        };
        let token = cached.token.clone();
        *self.cached.lock() = Some(cached);

        Ok(token)
    }
}

/// Time at which a token issued at `now` with lifetime `expires_in` seconds
/// expires.
fn token_expiry(now: DateTime<Utc>, expires_in: i64) -> Result<DateTime<Utc>> {
    Duration::try_seconds(expires_in)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or_else(|| {
            SheetsHttpError::new(format!("Access token lifetime out of range: {expires_in}"))
        })
}

/// Parse a PEM encoded RSA private key, either PKCS#8 or PKCS#1.
fn parse_private_key(pem: &str) -> Result<RsaKeyPair> {
    let mut reader = std::io::Cursor::new(pem.as_bytes());
    let key = rustls_pemfile::read_one(&mut reader).context("invalid PEM private key")?;
    match key {
        Some(rustls_pemfile::Item::Pkcs8Key(der)) => RsaKeyPair::from_pkcs8(der.secret_pkcs8_der())
            .map_err(|_| SheetsHttpError::new("Failed to create rsa key pair from pkcs8 key")),
        Some(rustls_pemfile::Item::Pkcs1Key(der)) => RsaKeyPair::from_der(der.secret_pkcs1_der())
            .map_err(|_| SheetsHttpError::new("Failed to create rsa key pair from pkcs1 key")),
        _ => Err(SheetsHttpError::new("Missing private key")),
    }
}
