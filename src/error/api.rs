//! Error taxonomy exposed by the REST surface.

use super::{BucketError, ObjectError, S3Error};
use thiserror::Error;

/// Failure kinds reported to HTTP callers.
///
/// Handlers return this type; the HTTP layer owns the status code and body
/// shape for each variant.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing bucket or key.
    #[error("{message}")]
    NotFound {
        /// Human-readable message.
        message: String,
    },

    /// Bucket already exists, or is not empty on delete.
    #[error("{message}")]
    Conflict {
        /// Human-readable message.
        message: String,
    },

    /// Conditional get matched the current ETag.
    #[error("Not modified")]
    NotModified {
        /// Current ETag of the object, echoed back to the caller.
        e_tag: Option<String>,
    },

    /// Malformed or missing request parameters.
    #[error("{message}")]
    Validation {
        /// Human-readable message.
        message: String,
    },

    /// Writing an uploaded file to the store failed.
    #[error("Failed to upload file: {source}")]
    Upload {
        /// Underlying store failure.
        #[source]
        source: S3Error,
    },

    /// Building a zip archive failed.
    #[error("Failed to build archive: {message}")]
    Archive {
        /// Human-readable message.
        message: String,
    },

    /// Any other failure from the object store.
    #[error("{source}")]
    Store {
        /// Underlying store failure.
        #[source]
        source: S3Error,
    },
}

impl ApiError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
        }
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict {
            message: message.into(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound {
            message: message.into(),
        }
    }

    /// Wrap a failed upload. Missing buckets stay `NotFound`.
    pub fn upload(source: S3Error) -> Self {
        if source.is_not_found() {
            return ApiError::from(source);
        }
        ApiError::Upload { source }
    }

    /// Stable machine-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::NotFound { .. } => "NotFound",
            ApiError::Conflict { .. } => "Conflict",
            ApiError::NotModified { .. } => "NotModified",
            ApiError::Validation { .. } => "ValidationError",
            ApiError::Upload { .. } => "UploadError",
            ApiError::Archive { .. } => "ArchiveError",
            ApiError::Store { .. } => "StoreError",
        }
    }

    /// HTTP status for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound { .. } => 404,
            ApiError::Conflict { .. } => 409,
            ApiError::NotModified { .. } => 304,
            ApiError::Validation { .. } => 400,
            ApiError::Upload { .. } | ApiError::Archive { .. } => 500,
            ApiError::Store { source } if source.is_network() => 502,
            ApiError::Store { .. } => 500,
        }
    }
}

impl From<S3Error> for ApiError {
    fn from(err: S3Error) -> Self {
        match err {
            S3Error::Bucket(BucketError::NotFound { bucket, .. }) => ApiError::NotFound {
                message: format!("Bucket not found: {}", bucket),
            },
            S3Error::Object(ObjectError::NotFound { bucket, key, .. }) => ApiError::NotFound {
                message: format!("File not found: {}/{}", bucket, key),
            },
            S3Error::Object(ObjectError::NotModified { e_tag, .. }) => {
                ApiError::NotModified { e_tag }
            }
            S3Error::Bucket(BucketError::AlreadyExists { bucket, .. })
            | S3Error::Bucket(BucketError::AlreadyOwnedByYou { bucket, .. }) => {
                ApiError::Conflict {
                    message: format!("Bucket already exists: {}", bucket),
                }
            }
            S3Error::Bucket(BucketError::NotEmpty { .. }) => ApiError::Conflict {
                message: "Bucket is not empty. Delete all files before deleting the bucket."
                    .to_string(),
            },
            source => ApiError::Store { source },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AccessError, NetworkError};

    #[test]
    fn test_missing_key_maps_to_not_found() {
        let err: ApiError = S3Error::Object(ObjectError::NotFound {
            bucket: "docs".into(),
            key: "a/b.txt".into(),
            request_id: None,
        })
        .into();

        assert_eq!(err.status_code(), 404);
        assert_eq!(err.to_string(), "File not found: docs/a/b.txt");
    }

    #[test]
    fn test_not_modified_keeps_etag() {
        let err: ApiError = S3Error::Object(ObjectError::NotModified {
            bucket: "docs".into(),
            key: "a".into(),
            e_tag: Some("\"abc\"".into()),
            request_id: None,
        })
        .into();

        match err {
            ApiError::NotModified { e_tag } => assert_eq!(e_tag.as_deref(), Some("\"abc\"")),
            other => panic!("Expected NotModified, got {other:?}"),
        }
    }

    #[test]
    fn test_store_status_depends_on_cause() {
        let unreachable: ApiError = S3Error::Network(NetworkError::ConnectionFailed {
            message: "refused".into(),
        })
        .into();
        assert_eq!(unreachable.status_code(), 502);
        assert_eq!(unreachable.kind(), "StoreError");

        let denied: ApiError = S3Error::Access(AccessError::Denied {
            code: "AccessDenied".into(),
            message: None,
            request_id: None,
        })
        .into();
        assert_eq!(denied.status_code(), 500);
    }

    #[test]
    fn test_upload_wraps_store_failures() {
        let err = ApiError::upload(S3Error::Access(AccessError::Denied {
            code: "AccessDenied".into(),
            message: None,
            request_id: None,
        }));
        assert_eq!(err.kind(), "UploadError");
        assert!(err.to_string().starts_with("Failed to upload file"));

        let missing = ApiError::upload(S3Error::Bucket(BucketError::NotFound {
            bucket: "gone".into(),
            request_id: None,
        }));
        assert_eq!(missing.status_code(), 404);
    }
}
