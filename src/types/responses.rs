//! What the object store calls hand back.
//!
//! Every output carries the store's `x-amz-request-id` when it sent one.

use super::common::*;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Headers describing a stored object, shared by GET and HEAD.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectAttributes {
    /// Quoted, as the store sends it.
    pub e_tag: Option<String>,
    /// Body size in bytes.
    pub content_length: Option<u64>,
    /// `Content-Type` stored with the object.
    pub content_type: Option<String>,
    /// Parsed from the RFC 7231 `Last-Modified` header.
    pub last_modified: Option<DateTime<Utc>>,
    /// `x-amz-meta-*` entries, prefix stripped, names lowercased.
    pub metadata: HashMap<String, String>,
}

/// Result of a HEAD.
#[derive(Debug, Clone, Default)]
pub struct HeadObjectOutput {
    /// Object headers.
    pub attributes: ObjectAttributes,
    /// Store request id.
    pub request_id: Option<String>,
}

/// Result of a GET: the body plus the same attributes a HEAD returns.
#[derive(Debug, Clone, Default)]
pub struct GetObjectOutput {
    /// Whole object, buffered.
    pub body: Bytes,
    /// Object headers.
    pub attributes: ObjectAttributes,
    /// Store request id.
    pub request_id: Option<String>,
}

/// Result of a PUT.
#[derive(Debug, Clone, Default)]
pub struct PutObjectOutput {
    /// ETag of the stored object.
    pub e_tag: Option<String>,
    /// Store request id.
    pub request_id: Option<String>,
}

/// Result of a DELETE. Also returned when the key did not exist.
#[derive(Debug, Clone, Default)]
pub struct DeleteObjectOutput {
    /// Store request id.
    pub request_id: Option<String>,
}

/// Result of a server-side copy, read from the `CopyObjectResult` body.
#[derive(Debug, Clone, Default)]
pub struct CopyObjectOutput {
    /// ETag of the new object.
    pub e_tag: Option<String>,
    /// Modification time of the new object.
    pub last_modified: Option<DateTime<Utc>>,
    /// Store request id.
    pub request_id: Option<String>,
}

/// One page of a ListObjectsV2 call.
///
/// With a delimiter set, keys below the next delimiter are folded into
/// `common_prefixes` instead of showing up in `contents`.
#[derive(Debug, Clone, Default)]
pub struct ListObjectsV2Output {
    /// Bucket the page belongs to.
    pub name: Option<String>,
    /// Echo of the request prefix.
    pub prefix: Option<String>,
    /// Echo of the request delimiter.
    pub delimiter: Option<String>,
    /// Echo of the request page cap.
    pub max_keys: Option<u32>,
    /// Keys plus prefixes on this page.
    pub key_count: Option<u32>,
    /// True when another page follows.
    pub is_truncated: bool,
    /// Pass to the next request when truncated.
    pub next_continuation_token: Option<String>,
    /// Echo of the token this page was fetched with.
    pub continuation_token: Option<String>,
    /// Objects directly under the prefix.
    pub contents: Vec<S3Object>,
    /// Sub-folder prefixes, each ending in the delimiter.
    pub common_prefixes: Vec<String>,
    /// Store request id.
    pub request_id: Option<String>,
}

/// Result of a bucket create.
#[derive(Debug, Clone, Default)]
pub struct CreateBucketOutput {
    /// `Location` header, e.g. `/docs`.
    pub location: Option<String>,
    /// Store request id.
    pub request_id: Option<String>,
}

/// Every bucket visible to the credentials.
#[derive(Debug, Clone, Default)]
pub struct ListBucketsOutput {
    /// In the order the store listed them.
    pub buckets: Vec<Bucket>,
    /// Store request id.
    pub request_id: Option<String>,
}
