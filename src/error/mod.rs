//! Error types for the S3 browser.
//!
//! Two layers live here. [`S3Error`] describes what went wrong while talking
//! to the object store, grouped by where it went wrong. [`ApiError`] is the
//! small taxonomy the REST surface speaks; every store failure is folded into
//! it exactly once through `From<S3Error>`.

mod api;
mod mapping;

pub use api::ApiError;
pub use mapping::{map_http_status, map_s3_error_code, S3ErrorResponse};

use std::time::Duration;
use thiserror::Error;

/// Failure while talking to the object store.
#[derive(Debug, Error)]
pub enum S3Error {
    /// The client was configured wrongly.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// No usable credentials.
    #[error("Credentials error: {0}")]
    Credentials(#[from] CredentialsError),

    /// The request could not be signed.
    #[error("Signing error: {0}")]
    Signing(#[from] SigningError),

    /// The store refused the request as malformed.
    #[error("Request rejected: {0}")]
    Request(#[from] RequestError),

    /// Bucket-level failure.
    #[error("{0}")]
    Bucket(#[from] BucketError),

    /// Object-level failure.
    #[error("{0}")]
    Object(#[from] ObjectError),

    /// The store denied access.
    #[error("{0}")]
    Access(#[from] AccessError),

    /// The store could not be reached.
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// The store failed or is overloaded.
    #[error("Store error: {0}")]
    Server(#[from] ServerError),

    /// The store answered with something unreadable.
    #[error("Response error: {0}")]
    Response(#[from] ResponseError),
}

impl S3Error {
    /// HTTP status the store answered with, where the error implies one.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            S3Error::Request(_) => Some(400),
            S3Error::Access(_) => Some(403),
            S3Error::Bucket(BucketError::NotFound { .. })
            | S3Error::Object(ObjectError::NotFound { .. }) => Some(404),
            S3Error::Bucket(_) => Some(409),
            S3Error::Object(ObjectError::NotModified { .. }) => Some(304),
            S3Error::Object(ObjectError::PreconditionFailed { .. }) => Some(412),
            S3Error::Server(ServerError::InternalError { .. }) => Some(500),
            S3Error::Server(ServerError::Unavailable { .. }) => Some(503),
            _ => None,
        }
    }

    /// Request id reported by the store, if any.
    pub fn request_id(&self) -> Option<&str> {
        let id = match self {
            S3Error::Bucket(
                BucketError::NotFound { request_id, .. }
                | BucketError::AlreadyExists { request_id, .. }
                | BucketError::AlreadyOwnedByYou { request_id, .. }
                | BucketError::NotEmpty { request_id, .. },
            ) => request_id,
            S3Error::Object(
                ObjectError::NotFound { request_id, .. }
                | ObjectError::NotModified { request_id, .. }
                | ObjectError::PreconditionFailed { request_id, .. },
            ) => request_id,
            S3Error::Access(AccessError::Denied { request_id, .. }) => request_id,
            S3Error::Server(
                ServerError::InternalError { request_id, .. }
                | ServerError::Unavailable { request_id, .. },
            ) => request_id,
            _ => return None,
        };
        id.as_deref()
    }

    /// True when the store reported a missing bucket or key.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            S3Error::Bucket(BucketError::NotFound { .. })
                | S3Error::Object(ObjectError::NotFound { .. })
        )
    }

    /// True when the store could not be reached at all.
    pub fn is_network(&self) -> bool {
        matches!(self, S3Error::Network(_))
    }
}

/// Invalid client configuration.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Region is empty.
    #[error("Missing region: set AWS_REGION or configure one explicitly")]
    MissingRegion,

    /// Endpoint is not an http(s) URL with a host.
    #[error("Invalid endpoint URL '{url}': {details}")]
    InvalidEndpoint {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        details: String,
    },

    /// Any other bad setting.
    #[error("Invalid configuration for {field}: {message}")]
    InvalidConfiguration {
        /// Setting name.
        field: String,
        /// Why it was rejected.
        message: String,
    },
}

/// Credential loading failures.
#[derive(Debug, Error)]
pub enum CredentialsError {
    /// No source produced credentials.
    #[error("No credentials found")]
    NotFound,

    /// Credentials were found but are unusable.
    #[error("Invalid credentials: {message}")]
    Invalid {
        /// What is wrong with them.
        message: String,
    },
}

/// Signature V4 failures.
#[derive(Debug, Error)]
pub enum SigningError {
    /// HMAC setup failed.
    #[error("Signature calculation failed: {message}")]
    CalculationFailed {
        /// Underlying failure.
        message: String,
    },

    /// The URL has no host to sign.
    #[error("Invalid request URL: {message}")]
    InvalidUrl {
        /// What is wrong with the URL.
        message: String,
    },
}

/// Requests the store turned down as malformed or out of limits.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The store's own error code and message.
    #[error("{code}: {message}")]
    Rejected {
        /// Store error code, e.g. `InvalidBucketName`.
        code: String,
        /// Store message.
        message: String,
    },
}

/// Bucket failures.
#[derive(Debug, Error)]
pub enum BucketError {
    /// No such bucket.
    #[error("Bucket not found: '{bucket}'")]
    NotFound {
        /// Bucket name.
        bucket: String,
        /// Store request id.
        request_id: Option<String>,
    },

    /// Name is taken by another account.
    #[error("Bucket already exists: '{bucket}'")]
    AlreadyExists {
        /// Bucket name.
        bucket: String,
        /// Store request id.
        request_id: Option<String>,
    },

    /// Name is already ours.
    #[error("Bucket already owned by you: '{bucket}'")]
    AlreadyOwnedByYou {
        /// Bucket name.
        bucket: String,
        /// Store request id.
        request_id: Option<String>,
    },

    /// Bucket still holds objects.
    #[error("Bucket not empty: '{bucket}'")]
    NotEmpty {
        /// Bucket name.
        bucket: String,
        /// Store request id.
        request_id: Option<String>,
    },
}

/// Object failures.
#[derive(Debug, Error)]
pub enum ObjectError {
    /// No such key.
    #[error("Object not found: '{bucket}/{key}'")]
    NotFound {
        /// Bucket name.
        bucket: String,
        /// Object key.
        key: String,
        /// Store request id.
        request_id: Option<String>,
    },

    /// `If-None-Match` matched the current ETag.
    #[error("Object not modified: '{bucket}/{key}'")]
    NotModified {
        /// Bucket name.
        bucket: String,
        /// Object key.
        key: String,
        /// ETag reported alongside the 304, if any.
        e_tag: Option<String>,
        /// Store request id.
        request_id: Option<String>,
    },

    /// Some other precondition did not hold.
    #[error("Precondition failed for '{bucket}/{key}'")]
    PreconditionFailed {
        /// Bucket name.
        bucket: String,
        /// Object key.
        key: String,
        /// Store request id.
        request_id: Option<String>,
    },
}

/// Authorization failures.
#[derive(Debug, Error)]
pub enum AccessError {
    /// Denied, with the store's reason code (`AccessDenied`,
    /// `SignatureDoesNotMatch`, `InvalidAccessKeyId`, ...).
    #[error("Access denied ({code}){}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Denied {
        /// Store error code.
        code: String,
        /// Store message, if any.
        message: Option<String>,
        /// Store request id.
        request_id: Option<String>,
    },
}

/// Transport failures before any response arrived.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Could not connect or the connection broke.
    #[error("Connection failed: {message}")]
    ConnectionFailed {
        /// Underlying failure.
        message: String,
    },

    /// No complete response within the timeout.
    #[error("Request timed out after {duration:?}")]
    Timeout {
        /// Configured timeout.
        duration: Duration,
    },

    /// TLS setup failed.
    #[error("TLS error: {message}")]
    TlsError {
        /// Underlying failure.
        message: String,
    },
}

/// Store-side failures.
#[derive(Debug, Error)]
pub enum ServerError {
    /// 500 or an unrecognised error code.
    #[error("Internal error{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    InternalError {
        /// Store message, if any.
        message: Option<String>,
        /// Store request id.
        request_id: Option<String>,
    },

    /// Overloaded or temporarily down (`SlowDown`, 502, 503).
    #[error("Service unavailable ({code})")]
    Unavailable {
        /// Store error code or HTTP status.
        code: String,
        /// Store request id.
        request_id: Option<String>,
    },
}

/// Unreadable store responses.
#[derive(Debug, Error)]
pub enum ResponseError {
    /// Body is not well-formed XML.
    #[error("XML parse error: {message}")]
    XmlParseError {
        /// Parser message.
        message: String,
    },

    /// Body is XML but not what was expected.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// What was wrong.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status() {
        let err = S3Error::Bucket(BucketError::NotEmpty {
            bucket: "b".into(),
            request_id: None,
        });
        assert_eq!(err.http_status(), Some(409));

        let err = S3Error::Object(ObjectError::NotModified {
            bucket: "b".into(),
            key: "k".into(),
            e_tag: None,
            request_id: None,
        });
        assert_eq!(err.http_status(), Some(304));

        let err = S3Error::Network(NetworkError::ConnectionFailed {
            message: "refused".into(),
        });
        assert_eq!(err.http_status(), None);
    }

    #[test]
    fn test_not_found_detection() {
        let bucket = S3Error::Bucket(BucketError::NotFound {
            bucket: "b".into(),
            request_id: Some("req-1".into()),
        });
        assert!(bucket.is_not_found());
        assert_eq!(bucket.request_id(), Some("req-1"));

        let access = S3Error::Access(AccessError::Denied {
            code: "AccessDenied".into(),
            message: None,
            request_id: None,
        });
        assert!(!access.is_not_found());
        assert_eq!(access.request_id(), None);
    }

    #[test]
    fn test_optional_messages_in_display() {
        let err = ServerError::InternalError {
            message: Some("disk on fire".into()),
            request_id: None,
        };
        assert_eq!(err.to_string(), "Internal error: disk on fire");

        let err = AccessError::Denied {
            code: "SignatureDoesNotMatch".into(),
            message: None,
            request_id: None,
        };
        assert_eq!(err.to_string(), "Access denied (SignatureDoesNotMatch)");
    }
}
