//! Bucket listing, creation and deletion.
//!
//! Create and delete check state first and then act. The two steps are not
//! atomic, so a concurrent writer can slip in between them; the store's own
//! error for that case still maps to the same conflict.

use crate::client::ObjectStore;
use crate::error::ApiError;
use crate::types::{CreateBucketRequest, DeleteBucketRequest, ListObjectsV2Request};
use tracing::{info, warn};

/// Message returned when deleting a bucket that still holds objects.
pub const BUCKET_NOT_EMPTY: &str =
    "Bucket is not empty. Delete all files before deleting the bucket.";

/// Names of all visible buckets, in store order.
pub async fn list(store: &dyn ObjectStore) -> Result<Vec<String>, ApiError> {
    let output = store.list_buckets().await?;
    Ok(output.buckets.into_iter().map(|b| b.name).collect())
}

/// Create a bucket unless one with the same name exists.
pub async fn create(store: &dyn ObjectStore, name: &str) -> Result<String, ApiError> {
    let existing = store.list_buckets().await?;
    if existing.buckets.iter().any(|b| b.name == name) {
        warn!(bucket = name, "bucket already exists");
        return Err(ApiError::conflict(format!("Bucket already exists: {}", name)));
    }

    store.create_bucket(CreateBucketRequest::new(name)).await?;
    info!(bucket = name, "bucket created");
    Ok(format!("Bucket created successfully: {}", name))
}

/// Delete a bucket after checking that it holds no objects.
pub async fn delete(store: &dyn ObjectStore, name: &str) -> Result<String, ApiError> {
    let sample = store
        .list_objects(ListObjectsV2Request::new(name).with_max_keys(1))
        .await?;
    if !sample.contents.is_empty() {
        warn!(bucket = name, "refusing to delete non-empty bucket");
        return Err(ApiError::conflict(BUCKET_NOT_EMPTY));
    }

    store.delete_bucket(DeleteBucketRequest::new(name)).await?;
    info!(bucket = name, "bucket deleted");
    Ok(format!("Bucket deleted successfully: {}", name))
}
