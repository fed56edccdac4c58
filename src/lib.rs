//! S3 Browser
//!
//! REST facade over an S3-compatible object store: bucket management,
//! folder-style browsing with per-file metadata, uploads, conditional
//! downloads, zip bundles, copies and deletes.
//!
//! # Layers
//!
//! - [`api`]: axum router and handlers
//! - [`operations`]: request semantics over any [`ObjectStore`]
//! - [`client`]: [`S3Client`], a SigV4-signed REST client for the store
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use s3_browser::{api, AppConfig, AppState, S3Client};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::from_env()?;
//!     let client = S3Client::builder().config(config.s3.clone()).build()?;
//!
//!     let state = AppState::new(Arc::new(client))
//!         .with_default_bucket(config.default_bucket.clone());
//!     let app = api::router(state, &config.server);
//!
//!     let listener = tokio::net::TcpListener::bind(config.server.bind).await?;
//!     api::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod api;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod mocks;
pub mod observability;
pub mod operations;
pub mod services;
pub mod signing;
pub mod transport;
pub mod types;
pub mod xml;

// Re-export main types at crate root
pub use api::{router, AppState};
pub use client::{ObjectStore, S3Client, S3ClientBuilder};
pub use config::{AppConfig, S3Config, ServerConfig};
pub use credentials::{
    AwsCredentials, CredentialsProvider, EnvCredentialsProvider, StaticCredentialsProvider,
};
pub use error::{
    AccessError, ApiError, BucketError, ConfigurationError, CredentialsError, NetworkError,
    ObjectError, RequestError, ResponseError, S3Error, ServerError, SigningError,
};
pub use observability::{LogFormat, LogLevel, LoggingConfig};
pub use operations::{Entry, ListingResult};
pub use services::{BucketsService, ObjectsService};
pub use signing::{AwsSigner, AwsSignerV4};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
pub use types::{
    // Request types
    CopyObjectRequest,
    CreateBucketRequest,
    DeleteBucketRequest,
    DeleteObjectRequest,
    GetObjectRequest,
    HeadObjectRequest,
    ListObjectsV2Request,
    PutObjectRequest,
    // Response types
    CopyObjectOutput,
    CreateBucketOutput,
    DeleteObjectOutput,
    GetObjectOutput,
    HeadObjectOutput,
    ListBucketsOutput,
    ListObjectsV2Output,
    ObjectAttributes,
    PutObjectOutput,
    // Common types
    Bucket,
    S3Object,
};

/// Create a store client from environment variables.
///
/// Reads `AWS_REGION`, `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`,
/// `AWS_SESSION_TOKEN` and `AWS_ENDPOINT_URL_S3` / `AWS_ENDPOINT_URL`.
pub fn create_client_from_env() -> Result<S3Client> {
    S3ClientBuilder::new().from_env().build()
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, S3Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_exports() {
        let _ = std::any::type_name::<S3Error>();
        let _ = std::any::type_name::<ApiError>();
        let _ = std::any::type_name::<AppState>();
        let _ = std::any::type_name::<Entry>();
        let _ = std::any::type_name::<PutObjectRequest>();
    }
}
