//! Data types shared by several operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Delimiter used to group keys into folders.
pub const FOLDER_DELIMITER: &str = "/";

/// Bucket information from a bucket listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    /// Bucket name.
    pub name: String,
    /// Creation date.
    pub creation_date: Option<DateTime<Utc>>,
}

impl Bucket {
    /// Create a bucket record with no creation date.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            creation_date: None,
        }
    }
}

/// Object information from an object listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Object {
    /// Object key.
    pub key: String,
    /// Last modified date.
    pub last_modified: Option<DateTime<Utc>>,
    /// ETag as reported by the listing.
    pub e_tag: Option<String>,
    /// Size in bytes.
    pub size: u64,
    /// Storage class.
    pub storage_class: Option<String>,
}
