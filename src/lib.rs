//! SwiftStorage - Client for OpenStack Swift-style object storage
//!
//! Authenticates against a Swift auth endpoint (`X-Auth-User` /
//! `X-Auth-Key`), then reads and writes objects in one container of the
//! storage endpoint using the issued token.
//!
//! # Features
//!
//! - Lazy authentication on first use, or eager via [`StorageClient::connect`]
//! - Automatic re-authentication and single retry when a token expires
//! - Streamed uploads from a path or an open file
//! - Streamed downloads
//! - TOML configuration with per-endpoint timeouts
//!
//! ```no_run
//! use swiftstorage::{StorageClient, SwiftStorageConfig};
//!
//! # async fn run() -> swiftstorage::Result<()> {
//! let config = SwiftStorageConfig::new("https://auth.example.com/auth/v1.0", "acct:user", "secret")
//!     .with_container("media");
//! let client = StorageClient::new(config)?;
//!
//! client.put("reports/q1.pdf", "/tmp/q1.pdf").await?;
//! if client.exists("reports/q1.pdf").await? {
//!     let headers = client.headers("reports/q1.pdf").await?;
//!     println!("etag: {:?}", headers.get("etag"));
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;

pub use client::{ObjectHeaders, ObjectSource, ObjectStream, Session, StorageClient};
pub use config::SwiftStorageConfig;
pub use error::{AuthErrorKind, Error, Result, StorageCause};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::client::{ObjectHeaders, ObjectSource, ObjectStream, Session, StorageClient};
    pub use crate::config::SwiftStorageConfig;
    pub use crate::error::{AuthErrorKind, Error, Result};
}
