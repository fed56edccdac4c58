//! In-memory object store.

use crate::client::ObjectStore;
use crate::error::{BucketError, ObjectError, S3Error, ServerError};
use crate::types::*;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

const DEFAULT_MAX_KEYS: usize = 1000;

#[derive(Debug, Clone)]
struct StoredObject {
    body: Bytes,
    content_type: Option<String>,
    metadata: HashMap<String, String>,
    e_tag: String,
    last_modified: DateTime<Utc>,
}

impl StoredObject {
    fn attributes(&self) -> ObjectAttributes {
        ObjectAttributes {
            e_tag: Some(self.e_tag.clone()),
            content_length: Some(self.body.len() as u64),
            content_type: self.content_type.clone(),
            last_modified: Some(self.last_modified),
            metadata: self.metadata.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct BucketState {
    creation_date: Option<DateTime<Utc>>,
    objects: BTreeMap<String, StoredObject>,
}

/// [`ObjectStore`] backed by ordered maps, with S3 listing semantics.
///
/// ETags are quoted hex MD5 digests of the body, as S3 computes them for
/// single-part uploads. Metadata names are lowercased on write.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    buckets: RwLock<BTreeMap<String, BucketState>>,
    fail_puts: AtomicBool,
    head_calls: AtomicUsize,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with the given buckets already present.
    pub fn with_buckets<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::new();
        {
            let mut buckets = store.buckets.write();
            for name in names {
                buckets.insert(
                    name.into(),
                    BucketState {
                        creation_date: Some(Utc::now()),
                        ..Default::default()
                    },
                );
            }
        }
        store
    }

    /// Make every subsequent put fail with an internal error.
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Number of head-object calls served.
    pub fn head_calls(&self) -> usize {
        self.head_calls.load(Ordering::SeqCst)
    }

    /// Keys in `bucket`, in order. Empty when the bucket is missing.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.buckets
            .read()
            .get(bucket)
            .map(|b| b.objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Raw body of an object, if present.
    pub fn object_body(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.buckets
            .read()
            .get(bucket)
            .and_then(|b| b.objects.get(key))
            .map(|o| o.body.clone())
    }
}

fn bucket_not_found(bucket: &str) -> S3Error {
    S3Error::Bucket(BucketError::NotFound {
        bucket: bucket.to_string(),
        request_id: None,
    })
}

fn object_not_found(bucket: &str, key: &str) -> S3Error {
    S3Error::Object(ObjectError::NotFound {
        bucket: bucket.to_string(),
        key: key.to_string(),
        request_id: None,
    })
}

fn compute_etag(body: &[u8]) -> String {
    format!("\"{}\"", hex::encode(Md5::digest(body)))
}

fn etags_match(a: &str, b: &str) -> bool {
    a.trim_matches('"') == b.trim_matches('"')
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn list_buckets(&self) -> Result<ListBucketsOutput, S3Error> {
        let buckets = self
            .buckets
            .read()
            .iter()
            .map(|(name, state)| Bucket {
                name: name.clone(),
                creation_date: state.creation_date,
            })
            .collect();
        Ok(ListBucketsOutput {
            buckets,
            request_id: None,
        })
    }

    async fn create_bucket(
        &self,
        request: CreateBucketRequest,
    ) -> Result<CreateBucketOutput, S3Error> {
        let mut buckets = self.buckets.write();
        if buckets.contains_key(&request.bucket) {
            return Err(S3Error::Bucket(BucketError::AlreadyOwnedByYou {
                bucket: request.bucket,
                request_id: None,
            }));
        }
        let location = format!("/{}", request.bucket);
        buckets.insert(
            request.bucket,
            BucketState {
                creation_date: Some(Utc::now()),
                ..Default::default()
            },
        );
        Ok(CreateBucketOutput {
            location: Some(location),
            request_id: None,
        })
    }

    async fn delete_bucket(&self, request: DeleteBucketRequest) -> Result<(), S3Error> {
        let mut buckets = self.buckets.write();
        let state = buckets
            .get(&request.bucket)
            .ok_or_else(|| bucket_not_found(&request.bucket))?;
        if !state.objects.is_empty() {
            return Err(S3Error::Bucket(BucketError::NotEmpty {
                bucket: request.bucket,
                request_id: None,
            }));
        }
        buckets.remove(&request.bucket);
        Ok(())
    }

    async fn list_objects(
        &self,
        request: ListObjectsV2Request,
    ) -> Result<ListObjectsV2Output, S3Error> {
        let buckets = self.buckets.read();
        let state = buckets
            .get(&request.bucket)
            .ok_or_else(|| bucket_not_found(&request.bucket))?;

        let prefix = request.prefix.clone().unwrap_or_default();
        let delimiter = request.delimiter.clone().filter(|d| !d.is_empty());
        let max_keys = request
            .max_keys
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_MAX_KEYS);
        let token = request.continuation_token.clone();

        let mut output = ListObjectsV2Output {
            name: Some(request.bucket.clone()),
            prefix: request.prefix.clone(),
            delimiter: delimiter.clone(),
            max_keys: request.max_keys,
            continuation_token: token.clone(),
            ..Default::default()
        };

        let mut seen_prefixes = BTreeSet::new();
        let mut returned = 0usize;
        let mut last_entry: Option<String> = None;

        for (key, object) in state.objects.range(prefix.clone()..) {
            if !key.starts_with(&prefix) {
                break;
            }
            if let Some(token) = &token {
                let skipped = key.as_str() <= token.as_str()
                    || (delimiter
                        .as_deref()
                        .is_some_and(|d| token.ends_with(d))
                        && key.starts_with(token.as_str()));
                if skipped {
                    continue;
                }
            }

            let common_prefix = delimiter.as_deref().and_then(|d| {
                key[prefix.len()..]
                    .find(d)
                    .map(|idx| key[..prefix.len() + idx + d.len()].to_string())
            });

            if let Some(cp) = &common_prefix {
                if seen_prefixes.contains(cp) {
                    continue;
                }
            }

            if returned == max_keys {
                output.is_truncated = true;
                output.next_continuation_token = last_entry.clone();
                break;
            }

            match common_prefix {
                Some(cp) => {
                    seen_prefixes.insert(cp.clone());
                    output.common_prefixes.push(cp.clone());
                    last_entry = Some(cp);
                }
                None => {
                    output.contents.push(S3Object {
                        key: key.clone(),
                        last_modified: Some(object.last_modified),
                        e_tag: Some(object.e_tag.clone()),
                        size: object.body.len() as u64,
                        storage_class: Some("STANDARD".to_string()),
                    });
                    last_entry = Some(key.clone());
                }
            }
            returned += 1;
        }

        output.key_count = Some(returned as u32);
        Ok(output)
    }

    async fn head_object(&self, request: HeadObjectRequest) -> Result<HeadObjectOutput, S3Error> {
        self.head_calls.fetch_add(1, Ordering::SeqCst);
        let buckets = self.buckets.read();
        let object = buckets
            .get(&request.bucket)
            .and_then(|b| b.objects.get(&request.key))
            .ok_or_else(|| object_not_found(&request.bucket, &request.key))?;

        Ok(HeadObjectOutput {
            attributes: object.attributes(),
            request_id: None,
        })
    }

    async fn get_object(&self, request: GetObjectRequest) -> Result<GetObjectOutput, S3Error> {
        let buckets = self.buckets.read();
        let state = buckets
            .get(&request.bucket)
            .ok_or_else(|| bucket_not_found(&request.bucket))?;
        let object = state
            .objects
            .get(&request.key)
            .ok_or_else(|| object_not_found(&request.bucket, &request.key))?;

        if let Some(expected) = &request.if_none_match {
            if etags_match(expected, &object.e_tag) {
                return Err(S3Error::Object(ObjectError::NotModified {
                    bucket: request.bucket,
                    key: request.key,
                    e_tag: Some(object.e_tag.clone()),
                    request_id: None,
                }));
            }
        }

        Ok(GetObjectOutput {
            body: object.body.clone(),
            attributes: object.attributes(),
            request_id: None,
        })
    }

    async fn put_object(&self, request: PutObjectRequest) -> Result<PutObjectOutput, S3Error> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(S3Error::Server(ServerError::InternalError {
                message: Some("injected put failure".to_string()),
                request_id: None,
            }));
        }

        let mut buckets = self.buckets.write();
        let state = buckets
            .get_mut(&request.bucket)
            .ok_or_else(|| bucket_not_found(&request.bucket))?;

        let e_tag = compute_etag(&request.body);
        state.objects.insert(
            request.key,
            StoredObject {
                e_tag: e_tag.clone(),
                content_type: request.content_type,
                metadata: request
                    .metadata
                    .into_iter()
                    .map(|(k, v)| (k.to_ascii_lowercase(), v))
                    .collect(),
                body: request.body,
                last_modified: Utc::now(),
            },
        );

        Ok(PutObjectOutput {
            e_tag: Some(e_tag),
            ..Default::default()
        })
    }

    async fn delete_object(
        &self,
        request: DeleteObjectRequest,
    ) -> Result<DeleteObjectOutput, S3Error> {
        let mut buckets = self.buckets.write();
        let state = buckets
            .get_mut(&request.bucket)
            .ok_or_else(|| bucket_not_found(&request.bucket))?;
        state.objects.remove(&request.key);
        Ok(DeleteObjectOutput::default())
    }

    async fn copy_object(&self, request: CopyObjectRequest) -> Result<CopyObjectOutput, S3Error> {
        let mut buckets = self.buckets.write();
        let source = buckets
            .get(&request.source_bucket)
            .ok_or_else(|| bucket_not_found(&request.source_bucket))?
            .objects
            .get(&request.source_key)
            .cloned()
            .ok_or_else(|| object_not_found(&request.source_bucket, &request.source_key))?;

        let dest = buckets
            .get_mut(&request.dest_bucket)
            .ok_or_else(|| bucket_not_found(&request.dest_bucket))?;

        let copied = StoredObject {
            last_modified: Utc::now(),
            ..source
        };
        let output = CopyObjectOutput {
            e_tag: Some(copied.e_tag.clone()),
            last_modified: Some(copied.last_modified),
            request_id: None,
        };
        dest.objects.insert(request.dest_key, copied);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> InMemoryStore {
        let store = InMemoryStore::with_buckets(["docs"]);
        for key in ["a.txt", "reports/q1.pdf", "reports/q2.pdf", "reports/2024/x.csv", "z.txt"] {
            store
                .put_object(PutObjectRequest::new("docs", key).with_body(key.as_bytes().to_vec()))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_list_groups_by_delimiter() {
        let store = seeded().await;

        let root = store
            .list_objects(ListObjectsV2Request::new("docs").with_delimiter("/"))
            .await
            .unwrap();
        let keys: Vec<_> = root.contents.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["a.txt", "z.txt"]);
        assert_eq!(root.common_prefixes, vec!["reports/"]);

        let reports = store
            .list_objects(
                ListObjectsV2Request::new("docs")
                    .with_prefix("reports/")
                    .with_delimiter("/"),
            )
            .await
            .unwrap();
        let keys: Vec<_> = reports.contents.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["reports/q1.pdf", "reports/q2.pdf"]);
        assert_eq!(reports.common_prefixes, vec!["reports/2024/"]);
    }

    #[tokio::test]
    async fn test_list_paginates() {
        let store = seeded().await;

        let mut token = None;
        let mut seen = Vec::new();
        loop {
            let mut request = ListObjectsV2Request::new("docs")
                .with_delimiter("/")
                .with_max_keys(1);
            if let Some(t) = token.take() {
                request = request.with_continuation_token(t);
            }
            let page = store.list_objects(request).await.unwrap();
            seen.extend(page.contents.iter().map(|o| o.key.clone()));
            seen.extend(page.common_prefixes.iter().cloned());
            if !page.is_truncated {
                break;
            }
            token = page.next_continuation_token;
        }

        assert_eq!(seen, vec!["a.txt", "reports/", "z.txt"]);
    }

    #[tokio::test]
    async fn test_etag_is_quoted_md5() {
        let store = InMemoryStore::with_buckets(["docs"]);
        let put = store
            .put_object(PutObjectRequest::new("docs", "a.txt").with_body(&b"hello"[..]))
            .await
            .unwrap();
        assert_eq!(
            put.e_tag.as_deref(),
            Some("\"5d41402abc4b2a76b9719d911017c592\"")
        );
    }

    #[tokio::test]
    async fn test_get_not_modified() {
        let store = seeded().await;
        let head = store
            .head_object(HeadObjectRequest::new("docs", "a.txt"))
            .await
            .unwrap();
        let etag = head.attributes.e_tag.unwrap();

        let err = store
            .get_object(GetObjectRequest::new("docs", "a.txt").with_if_none_match(etag))
            .await
            .unwrap_err();
        assert!(matches!(err, S3Error::Object(ObjectError::NotModified { .. })));
    }

    #[tokio::test]
    async fn test_delete_bucket_rules() {
        let store = seeded().await;

        let err = store
            .delete_bucket(DeleteBucketRequest::new("docs"))
            .await
            .unwrap_err();
        assert!(matches!(err, S3Error::Bucket(BucketError::NotEmpty { .. })));

        let err = store
            .delete_bucket(DeleteBucketRequest::new("missing"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_copy_keeps_metadata() {
        let store = InMemoryStore::with_buckets(["src", "dst"]);
        store
            .put_object(
                PutObjectRequest::new("src", "a.txt")
                    .with_body(&b"a"[..])
                    .with_metadata("Owner", "ops"),
            )
            .await
            .unwrap();

        store
            .copy_object(CopyObjectRequest::new("src", "a.txt", "dst", "b.txt"))
            .await
            .unwrap();

        let head = store
            .head_object(HeadObjectRequest::new("dst", "b.txt"))
            .await
            .unwrap();
        assert_eq!(head.attributes.metadata.get("owner").map(String::as_str), Some("ops"));
        assert_eq!(store.keys("src"), vec!["a.txt"]);
    }
}
