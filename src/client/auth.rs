//! Authentication
//!
//! Exchanges the configured username/password for a storage session at
//! the auth server.

use std::fmt;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode, Url};

use crate::config::SwiftStorageConfig;
use crate::error::{AuthErrorKind, Error, Result};

/// Request header carrying the username
pub const AUTH_USER_HEADER: &str = "X-Auth-User";
/// Request header carrying the password
pub const AUTH_KEY_HEADER: &str = "X-Auth-Key";
/// Response header with the storage endpoint
pub const STORAGE_URL_HEADER: &str = "X-Storage-Url";
/// Response header with the storage token
pub const STORAGE_TOKEN_HEADER: &str = "X-Storage-Token";

/// An authenticated storage session.
///
/// Sessions are never mutated; re-authentication replaces the whole value.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// Storage URL as issued by the auth server
    storage_url: Url,
    /// Storage URL with the container appended, always ending in '/'
    base_url: Url,
    /// Token sent as X-Auth-Token
    token: String,
}

impl Session {
    /// Build a session for `container` from an issued storage URL and token
    pub fn new(storage_url: &str, token: impl Into<String>, container: &str) -> Result<Self> {
        let storage_url = Url::parse(storage_url).map_err(|_| unknown_auth_failure())?;

        let mut base_url = storage_url.clone();
        {
            let mut segments = base_url
                .path_segments_mut()
                .map_err(|_| unknown_auth_failure())?;
            segments.pop_if_empty();
            if !container.is_empty() {
                segments.push(container);
            }
            segments.push("");
        }

        Ok(Self {
            storage_url,
            base_url,
            token: token.into(),
        })
    }

    /// Build a session from the auth server's response headers
    fn from_headers(headers: &HeaderMap, container: &str) -> Result<Self> {
        let storage_url = header_str(headers, STORAGE_URL_HEADER)?;
        let token = header_str(headers, STORAGE_TOKEN_HEADER)?;
        Self::new(storage_url, token, container)
    }

    /// Storage URL issued by the auth server
    pub fn storage_url(&self) -> &Url {
        &self.storage_url
    }

    /// Base URL all object paths are resolved against (`<storage>/<container>/`)
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Storage token
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Resolve an object path against the container base URL.
    ///
    /// Path segments are percent-encoded; a leading '/' is ignored.
    pub fn object_url(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(path.trim_start_matches('/').split('/'));
        }
        url
    }

    /// Header value for X-Auth-Token, marked sensitive so it stays out of logs
    pub(crate) fn token_header(&self) -> Result<HeaderValue> {
        let mut value = HeaderValue::from_str(&self.token).map_err(|_| unknown_auth_failure())?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("storage_url", &self.storage_url.as_str())
            .field("base_url", &self.base_url.as_str())
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Authenticate at the auth server and build a fresh session
pub(crate) async fn request_session(http: &Client, config: &SwiftStorageConfig) -> Result<Session> {
    let mut key = HeaderValue::from_str(&config.auth.password)
        .map_err(|_| Error::Config("auth.password is not a valid header value".into()))?;
    key.set_sensitive(true);

    tracing::debug!("Authenticating as {} at {}", config.auth.username, config.auth.url);

    let response = http
        .get(&config.auth.url)
        .timeout(config.auth_timeout())
        .header(AUTH_USER_HEADER, config.auth.username.as_str())
        .header(AUTH_KEY_HEADER, key)
        .send()
        .await
        .map_err(|e| Error::auth(AuthErrorKind::Unknown, e))?;

    let response = response.error_for_status().map_err(|e| {
        let kind = match e.status() {
            Some(StatusCode::FORBIDDEN) => AuthErrorKind::InvalidCredentials,
            Some(StatusCode::NOT_FOUND) => AuthErrorKind::InvalidAuthUrl,
            _ => AuthErrorKind::Unknown,
        };
        Error::auth(kind, e)
    })?;

    let session = Session::from_headers(response.headers(), &config.storage.container)?;
    tracing::info!("Authenticated at {}, storage endpoint {}", config.auth.url, session.storage_url);
    Ok(session)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str> {
    let value = headers.get(name).ok_or_else(|| {
        tracing::warn!("Auth response is missing {}", name);
        unknown_auth_failure()
    })?;
    value.to_str().map_err(|_| unknown_auth_failure())
}

fn unknown_auth_failure() -> Error {
    Error::Auth {
        kind: AuthErrorKind::Unknown,
        source: None,
    }
}
