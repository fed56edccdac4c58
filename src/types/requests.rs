//! Inputs to the object store calls.

use bytes::Bytes;
use std::collections::HashMap;

macro_rules! bucket_request {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name {
            /// Bucket name.
            pub bucket: String,
        }

        impl $name {
            /// Request for `bucket`.
            pub fn new(bucket: impl Into<String>) -> Self {
                Self { bucket: bucket.into() }
            }
        }
    };
}

macro_rules! object_request {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name {
            /// Bucket name.
            pub bucket: String,
            /// Object key.
            pub key: String,
        }

        impl $name {
            /// Request for `bucket/key`.
            pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
                Self {
                    bucket: bucket.into(),
                    key: key.into(),
                }
            }
        }
    };
}

bucket_request!(
    /// `PUT /{bucket}`. The region comes from the client configuration.
    CreateBucketRequest
);

bucket_request!(
    /// `DELETE /{bucket}`. Fails on a non-empty bucket.
    DeleteBucketRequest
);

object_request!(
    /// `HEAD /{bucket}/{key}`.
    HeadObjectRequest
);

object_request!(
    /// `DELETE /{bucket}/{key}`. Missing keys are not an error.
    DeleteObjectRequest
);

/// `PUT /{bucket}/{key}` with a body.
#[derive(Debug, Clone, Default)]
pub struct PutObjectRequest {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Object bytes.
    pub body: Bytes,
    /// Sent as `Content-Type` when set.
    pub content_type: Option<String>,
    /// Sent as one `x-amz-meta-<name>` header per entry.
    pub metadata: HashMap<String, String>,
}

impl PutObjectRequest {
    /// Empty object at `bucket/key`.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            ..Default::default()
        }
    }

    /// Sets the object bytes.
    pub fn with_body(self, body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            ..self
        }
    }

    /// Sets `Content-Type`.
    pub fn with_content_type(self, content_type: impl Into<String>) -> Self {
        Self {
            content_type: Some(content_type.into()),
            ..self
        }
    }

    /// Adds one metadata entry, replacing any earlier value for `name`.
    pub fn with_metadata(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(name.into(), value.into());
        self
    }

    /// Replaces all metadata.
    pub fn with_metadata_map(self, metadata: HashMap<String, String>) -> Self {
        Self { metadata, ..self }
    }
}

/// `GET /{bucket}/{key}`, optionally conditional.
#[derive(Debug, Clone, Default)]
pub struct GetObjectRequest {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// When this matches the current ETag the store answers 304.
    pub if_none_match: Option<String>,
}

impl GetObjectRequest {
    /// Unconditional get of `bucket/key`.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            if_none_match: None,
        }
    }

    /// Makes the get conditional on the ETag differing.
    pub fn with_if_none_match(self, e_tag: impl Into<String>) -> Self {
        Self {
            if_none_match: Some(e_tag.into()),
            ..self
        }
    }
}

/// Server-side copy between two locations, possibly across buckets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyObjectRequest {
    /// Bucket to copy from.
    pub source_bucket: String,
    /// Key to copy from.
    pub source_key: String,
    /// Bucket to copy into.
    pub dest_bucket: String,
    /// Key to copy into.
    pub dest_key: String,
}

impl CopyObjectRequest {
    /// Copy `source_bucket/source_key` to `dest_bucket/dest_key`.
    pub fn new(
        source_bucket: impl Into<String>,
        source_key: impl Into<String>,
        dest_bucket: impl Into<String>,
        dest_key: impl Into<String>,
    ) -> Self {
        Self {
            source_bucket: source_bucket.into(),
            source_key: source_key.into(),
            dest_bucket: dest_bucket.into(),
            dest_key: dest_key.into(),
        }
    }
}

/// One page of `GET /{bucket}?list-type=2`.
#[derive(Debug, Clone, Default)]
pub struct ListObjectsV2Request {
    /// Bucket name.
    pub bucket: String,
    /// Only keys starting with this.
    pub prefix: Option<String>,
    /// Keys past the prefix containing this are rolled up into common prefixes.
    pub delimiter: Option<String>,
    /// Page size cap.
    pub max_keys: Option<u32>,
    /// Token from the previous page.
    pub continuation_token: Option<String>,
}

impl ListObjectsV2Request {
    /// First page of `bucket`, no filters.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    /// Sets the prefix filter.
    pub fn with_prefix(self, prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            ..self
        }
    }

    /// Sets the delimiter.
    pub fn with_delimiter(self, delimiter: impl Into<String>) -> Self {
        Self {
            delimiter: Some(delimiter.into()),
            ..self
        }
    }

    /// Caps the page size.
    pub fn with_max_keys(self, max_keys: u32) -> Self {
        Self {
            max_keys: Some(max_keys),
            ..self
        }
    }

    /// Continue from the page that returned `token`.
    pub fn with_continuation_token(self, token: impl Into<String>) -> Self {
        Self {
            continuation_token: Some(token.into()),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_overrides() {
        let request = PutObjectRequest::new("docs", "a.txt")
            .with_metadata("author", "alice")
            .with_metadata("author", "bob");
        assert_eq!(request.metadata.len(), 1);
        assert_eq!(request.metadata["author"], "bob");
    }
}
