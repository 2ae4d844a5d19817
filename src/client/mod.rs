//! Storage Client
//!
//! Authenticates lazily, dispatches object requests against the session's
//! container, and recovers from an expired token exactly once per request.

pub mod auth;
pub mod object;

pub use auth::Session;
pub use object::{ObjectHeaders, ObjectSource, ObjectStream};

use std::sync::Arc;

use reqwest::header::CONTENT_LENGTH;
use reqwest::{Client, Method, Response, StatusCode};
use tokio::sync::RwLock;

use crate::config::SwiftStorageConfig;
use crate::error::{Error, Result};
use self::object::{flatten_headers, Upload};

/// Request header carrying the storage token
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Client for a single container of a Swift-style object store
pub struct StorageClient {
    /// Immutable client configuration
    config: SwiftStorageConfig,
    /// Shared HTTP client for auth and storage requests
    http: Client,
    /// Current session, `None` until the first authentication
    session: RwLock<Option<Arc<Session>>>,
}

impl StorageClient {
    /// Create a client without contacting the auth server
    pub fn new(config: SwiftStorageConfig) -> Result<Self> {
        config.validate()?;

        let http = Client::builder()
            .user_agent(concat!("swiftstorage/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http,
            session: RwLock::new(None),
        })
    }

    /// Create a client and authenticate immediately
    pub async fn connect(config: SwiftStorageConfig) -> Result<Self> {
        let client = Self::new(config)?;
        client.authenticate().await?;
        Ok(client)
    }

    /// Client configuration
    pub fn config(&self) -> &SwiftStorageConfig {
        &self.config
    }

    /// Current session, if authenticated
    pub async fn session(&self) -> Option<Arc<Session>> {
        self.session.read().await.clone()
    }

    /// Check whether a session has been established
    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.is_some()
    }

    /// Drop the current session; the next request authenticates again
    pub async fn reset(&self) {
        *self.session.write().await = None;
    }

    /// Authenticate at the auth server and replace the current session
    pub async fn authenticate(&self) -> Result<Arc<Session>> {
        let session = Arc::new(auth::request_session(&self.http, &self.config).await?);
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    /// Authenticate only if no session exists yet
    pub async fn ensure_authenticated(&self) -> Result<Arc<Session>> {
        if let Some(session) = self.session().await {
            return Ok(session);
        }

        let mut slot = self.session.write().await;
        if let Some(session) = slot.as_ref() {
            return Ok(session.clone());
        }

        let session = Arc::new(auth::request_session(&self.http, &self.config).await?);
        *slot = Some(session.clone());
        Ok(session)
    }

    /// Upload an object, returning true iff the store answered 201 Created.
    ///
    /// A borrowed handle is read from its current position and left at that
    /// same position when the call returns.
    pub async fn put<'a>(&self, dst_path: &str, source: impl Into<ObjectSource<'a>>) -> Result<bool> {
        let mut upload = Upload::open(&source.into()).await?;
        let result = self
            .send(Method::PUT, dst_path, Some(&upload), "put")
            .await;

        if let Err(e) = upload.restore_position().await {
            tracing::warn!("Failed to restore source position after PUT {}: {}", dst_path, e);
        }
        let response = result?;

        let created = response.status() == StatusCode::CREATED;
        if !created {
            tracing::debug!("PUT {} answered {}, not created", dst_path, response.status());
        }
        Ok(created)
    }

    /// Fetch an object body as a lazy stream
    pub async fn get(&self, path: &str) -> Result<ObjectStream> {
        let response = self.send(Method::GET, path, None, "get").await?;
        Ok(ObjectStream::new(response))
    }

    /// Fetch an object body as a string
    pub async fn get_as_string(&self, path: &str) -> Result<String> {
        self.get(path).await?.into_string().await
    }

    /// Fetch object headers
    pub async fn headers(&self, path: &str) -> Result<ObjectHeaders> {
        let response = self.send(Method::HEAD, path, None, "headers").await?;
        Ok(flatten_headers(response.headers()))
    }

    /// Check whether an object exists
    pub async fn exists(&self, path: &str) -> Result<bool> {
        match self.send(Method::HEAD, path, None, "exists").await {
            Ok(response) => Ok(response.status() == StatusCode::OK),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Dispatch a storage request, re-authenticating once on 401
    async fn send(
        &self,
        method: Method,
        path: &str,
        upload: Option<&Upload>,
        operation: &'static str,
    ) -> Result<Response> {
        let session = self.ensure_authenticated().await?;
        let response = self
            .send_once(&session, method.clone(), path, upload, operation)
            .await?;

        let response = if response.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!("{} {} answered 401, re-authenticating", method, path);
            let session = self.authenticate().await?;
            self.send_once(&session, method, path, upload, operation)
                .await?
        } else {
            response
        };

        response
            .error_for_status()
            .map_err(|e| Error::storage(operation, e))
    }

    /// Build and send one request against `session`
    async fn send_once(
        &self,
        session: &Session,
        method: Method,
        path: &str,
        upload: Option<&Upload>,
        operation: &'static str,
    ) -> Result<Response> {
        let url = session.object_url(path);
        tracing::debug!("{} {}", method, url);

        let mut request = self
            .http
            .request(method, url)
            .timeout(self.config.storage_timeout())
            .header(AUTH_TOKEN_HEADER, session.token_header()?);

        if let Some(upload) = upload {
            request = request
                .header(CONTENT_LENGTH, upload.len())
                .body(upload.body().await.map_err(|e| Error::storage(operation, e))?);
        }

        request
            .send()
            .await
            .map_err(|e| Error::storage(operation, e))
    }
}

impl std::fmt::Debug for StorageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
