//! Folder/file listing.
//!
//! A delimited listing gives folders (common prefixes) and files (objects)
//! for one level of the key hierarchy. Files are enriched with a head call
//! each, since the listing does not return user metadata.

use crate::client::ObjectStore;
use crate::config::has_dot_segment;
use crate::error::{ApiError, S3Error};
use crate::types::{HeadObjectRequest, ListObjectsV2Request, S3Object, FOLDER_DELIMITER};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// A file or folder, named relative to the listed prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Key with the listed prefix removed.
    pub name: String,
    /// Size in bytes. Zero for folders.
    pub size: u64,
    /// Last modification time. Absent for folders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    /// Whether this entry is a common prefix.
    pub is_folder: bool,
    /// Content version token. Absent for folders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e_tag: Option<String>,
    /// User metadata. Empty for folders.
    pub metadata: BTreeMap<String, String>,
}

impl Entry {
    /// A folder entry.
    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: 0,
            last_modified: None,
            is_folder: true,
            e_tag: None,
            metadata: BTreeMap::new(),
        }
    }
}

/// Files and folders at one level, each in store order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingResult {
    /// Object entries.
    pub files: Vec<Entry>,
    /// Common-prefix entries.
    pub folders: Vec<Entry>,
}

/// Strip the listed prefix from a key.
///
/// Keys returned for a prefixed listing always start with that prefix;
/// anything else is returned unchanged.
pub fn relative_name(key: &str, prefix: &str) -> String {
    key.strip_prefix(prefix).unwrap_or(key).to_string()
}

/// List the folders and files directly under `prefix`.
///
/// Every page is fetched. Head calls run with at most `head_concurrency`
/// in flight and results keep listing order.
pub async fn list_entries(
    store: &dyn ObjectStore,
    bucket: &str,
    prefix: &str,
    head_concurrency: usize,
) -> Result<ListingResult, ApiError> {
    let mut objects: Vec<S3Object> = Vec::new();
    let mut folders = Vec::new();
    let mut continuation_token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let mut request = ListObjectsV2Request::new(bucket).with_delimiter(FOLDER_DELIMITER);
        if !prefix.is_empty() {
            request = request.with_prefix(prefix);
        }
        if let Some(token) = continuation_token.take() {
            request = request.with_continuation_token(token);
        }

        let page = store.list_objects(request).await?;
        pages += 1;

        folders.extend(
            page.common_prefixes
                .iter()
                .map(|cp| Entry::folder(relative_name(cp, prefix))),
        );
        objects.extend(page.contents.into_iter().filter(|o| o.key != prefix));

        match page.next_continuation_token {
            Some(token) if page.is_truncated => continuation_token = Some(token),
            _ => break,
        }
    }

    debug!(
        bucket,
        prefix,
        pages,
        files = objects.len(),
        folders = folders.len(),
        "listing fetched"
    );

    let files = stream::iter(objects)
        .map(|object| describe(store, bucket, prefix, object))
        .buffered(head_concurrency.max(1))
        .try_collect::<Vec<_>>()
        .await?;

    Ok(ListingResult { files, folders })
}

async fn describe(
    store: &dyn ObjectStore,
    bucket: &str,
    prefix: &str,
    object: S3Object,
) -> Result<Entry, S3Error> {
    let name = relative_name(&object.key, prefix);

    if has_dot_segment(&object.key) {
        warn!(bucket, key = %object.key, "key not addressable by URL, skipping head");
        return Ok(Entry {
            name,
            size: object.size,
            last_modified: object.last_modified,
            is_folder: false,
            e_tag: object.e_tag,
            metadata: BTreeMap::new(),
        });
    }

    let (e_tag, metadata) = match store
        .head_object(HeadObjectRequest::new(bucket, &object.key))
        .await
    {
        Ok(head) => (
            head.attributes.e_tag.or(object.e_tag),
            head.attributes.metadata.into_iter().collect(),
        ),
        // Deleted between the listing and the head call.
        Err(err) if err.is_not_found() => {
            warn!(bucket, key = %object.key, "object vanished during listing");
            (object.e_tag, BTreeMap::new())
        }
        Err(err) => return Err(err),
    };

    Ok(Entry {
        name,
        size: object.size,
        last_modified: object.last_modified,
        is_folder: false,
        e_tag,
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::InMemoryStore;
    use crate::types::PutObjectRequest;
    use proptest::prelude::*;

    async fn store_with(keys: &[&str]) -> InMemoryStore {
        let store = InMemoryStore::with_buckets(["docs"]);
        for key in keys {
            store
                .put_object(
                    PutObjectRequest::new("docs", *key)
                        .with_body(key.as_bytes().to_vec())
                        .with_metadata("origin", "test"),
                )
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_lists_one_level() {
        let store = store_with(&["a/", "a/b/c.txt", "a/d.txt", "a/e.txt", "top.txt"]).await;

        let listing = list_entries(&store, "docs", "a/", 4).await.unwrap();

        let files: Vec<_> = listing.files.iter().map(|e| e.name.as_str()).collect();
        let folders: Vec<_> = listing.folders.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(files, vec!["d.txt", "e.txt"]);
        assert_eq!(folders, vec!["b/"]);
        assert!(listing.folders.iter().all(|f| f.is_folder && f.size == 0));

        let d = &listing.files[0];
        assert_eq!(d.size, "a/d.txt".len() as u64);
        assert!(d.e_tag.is_some());
        assert!(d.last_modified.is_some());
        assert_eq!(d.metadata.get("origin").map(String::as_str), Some("test"));
    }

    #[tokio::test]
    async fn test_dot_segment_key_is_listed_without_head() {
        let store = store_with(&["..", "b.txt"]).await;

        let listing = list_entries(&store, "docs", "", 2).await.unwrap();

        let files: Vec<_> = listing.files.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(files, vec!["..", "b.txt"]);
        assert!(listing.files[0].metadata.is_empty());
        assert!(listing.files[0].e_tag.is_some());
        assert_eq!(store.head_calls(), 1);
    }

    #[tokio::test]
    async fn test_excludes_directory_marker() {
        let store = store_with(&["a/", "a/x.txt"]).await;

        let listing = list_entries(&store, "docs", "a/", 1).await.unwrap();

        assert_eq!(listing.files.len(), 1);
        assert_eq!(listing.files[0].name, "x.txt");
    }

    #[tokio::test]
    async fn test_root_listing() {
        let store = store_with(&["a/x.txt", "b.txt"]).await;

        let listing = list_entries(&store, "docs", "", 8).await.unwrap();

        assert_eq!(listing.files.len(), 1);
        assert_eq!(listing.files[0].name, "b.txt");
        assert_eq!(listing.folders[0].name, "a/");
        assert_eq!(store.head_calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_bucket_is_not_found() {
        let store = InMemoryStore::new();

        let err = list_entries(&store, "nope", "", 8).await.unwrap_err();

        assert!(matches!(err, ApiError::NotFound { .. }));
    }

    #[test]
    fn test_entry_json_shape() {
        let json = serde_json::to_value(Entry::folder("b/")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "b/",
                "size": 0,
                "isFolder": true,
                "metadata": {}
            })
        );
    }

    proptest! {
        #[test]
        fn prop_relative_name_strips_prefix(
            prefix in "[a-z]{0,4}(/[a-z]{1,4}){0,2}/?",
            rest in "[a-z./]{0,12}",
        ) {
            let key = format!("{}{}", prefix, rest);
            prop_assert_eq!(relative_name(&key, &prefix), rest);
        }
    }
}
