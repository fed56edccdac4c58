//! Upload, download, zip, copy, delete and folder creation.

use crate::client::ObjectStore;
use crate::config::has_dot_segment;
use crate::error::ApiError;
use crate::types::*;
use bytes::Bytes;
use std::collections::HashMap;
use std::io::{Cursor, Write};
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Content type stored when the upload does not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Suffix of the zero-byte object that makes a folder visible.
pub const FOLDER_MARKER: &str = ".keep";

/// A file received for upload.
#[derive(Debug, Clone, Default)]
pub struct UploadInput {
    /// Target bucket.
    pub bucket: String,
    /// Destination prefix, prepended verbatim to the filename.
    pub path: String,
    /// Original filename of the uploaded part.
    pub filename: String,
    /// Declared content type of the part.
    pub content_type: Option<String>,
    /// File contents.
    pub body: Bytes,
    /// User metadata.
    pub metadata: HashMap<String, String>,
}

/// Result of a successful upload.
#[derive(Debug, Clone)]
pub struct Uploaded {
    /// Key the file was stored under.
    pub key: String,
    /// ETag reported by the store.
    pub e_tag: Option<String>,
}

impl Uploaded {
    /// Human-readable confirmation.
    pub fn message(&self) -> String {
        format!(
            "File uploaded successfully: {}, ETag: {}",
            self.key,
            self.e_tag.as_deref().unwrap_or("")
        )
    }
}

/// A downloaded object.
#[derive(Debug, Clone)]
pub struct Download {
    /// Basename of the key, for `Content-Disposition`.
    pub file_name: String,
    /// Object contents.
    pub body: Bytes,
    /// Current ETag.
    pub e_tag: Option<String>,
    /// Stored content type.
    pub content_type: Option<String>,
    /// User metadata.
    pub metadata: HashMap<String, String>,
}

/// A zip archive built from several objects.
#[derive(Debug, Clone)]
pub struct ZipArchive {
    /// Suggested download filename.
    pub file_name: String,
    /// Archive bytes.
    pub bytes: Vec<u8>,
}

/// Last path segment of a key. A trailing `/` is ignored.
pub fn basename(key: &str) -> &str {
    key.trim_end_matches('/').rsplit('/').next().unwrap_or(key)
}

/// Drop the final `.ext` from a filename, if it has a non-empty one.
fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx + 1 < name.len() => &name[..idx],
        _ => name,
    }
}

/// Archive name for a set of keys.
///
/// One key gives its basename with the extension swapped for `.zip`;
/// several keys give `files-<now_millis>.zip`.
pub fn archive_name(keys: &[String], now_millis: i64) -> String {
    match keys {
        [only] => format!("{}.zip", strip_extension(basename(only))),
        _ => format!("files-{}.zip", now_millis),
    }
}

/// Rejects keys the store URL cannot address as written.
pub fn check_key(key: &str) -> Result<(), ApiError> {
    if has_dot_segment(key) {
        return Err(ApiError::validation(format!(
            "Key must not contain '.' or '..' segments: {}",
            key
        )));
    }
    Ok(())
}

/// Store an uploaded file at `path + filename`.
pub async fn upload(store: &dyn ObjectStore, input: UploadInput) -> Result<Uploaded, ApiError> {
    if input.filename.trim().is_empty() {
        return Err(ApiError::validation("Uploaded file has no filename"));
    }

    let key = format!("{}{}", input.path, input.filename);
    check_key(&key)?;
    let content_type = input
        .content_type
        .filter(|ct| !ct.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

    let mut metadata = input.metadata;
    metadata.insert("Content-Type".to_string(), content_type.clone());

    let output = store
        .put_object(
            PutObjectRequest::new(&input.bucket, &key)
                .with_body(input.body)
                .with_content_type(content_type)
                .with_metadata_map(metadata),
        )
        .await
        .map_err(ApiError::upload)?;

    info!(bucket = %input.bucket, key = %key, "file uploaded");

    Ok(Uploaded {
        key,
        e_tag: output.e_tag,
    })
}

/// Fetch an object, honouring an `If-None-Match` precondition.
pub async fn download(
    store: &dyn ObjectStore,
    bucket: &str,
    key: &str,
    if_none_match: Option<String>,
) -> Result<Download, ApiError> {
    check_key(key)?;
    let mut request = GetObjectRequest::new(bucket, key);
    if let Some(etag) = if_none_match {
        request = request.with_if_none_match(etag);
    }

    let output = store.get_object(request).await?;

    Ok(Download {
        file_name: basename(key).to_string(),
        body: output.body,
        e_tag: output.attributes.e_tag,
        content_type: output.attributes.content_type,
        metadata: output.attributes.metadata,
    })
}

/// Fetch `keys` one after another and pack them into a deflated zip.
///
/// The archive is assembled in memory, so a failed fetch aborts before
/// anything is sent. Entries are named by basename; a later key with the
/// same basename replaces the earlier entry.
pub async fn zip_download(
    store: &dyn ObjectStore,
    bucket: &str,
    keys: &[String],
    now_millis: i64,
) -> Result<ZipArchive, ApiError> {
    if keys.is_empty() {
        return Err(ApiError::validation("At least one key is required"));
    }
    if keys.iter().any(|k| k.trim().is_empty()) {
        return Err(ApiError::validation("Keys must not be empty"));
    }
    keys.iter().try_for_each(|k| check_key(k))?;

    let mut entries: Vec<(String, Bytes)> = Vec::with_capacity(keys.len());
    for key in keys {
        let object = store.get_object(GetObjectRequest::new(bucket, key)).await?;
        let name = basename(key).to_string();
        entries.retain(|(existing, _)| existing != &name);
        entries.push((name, object.body));
    }

    let bytes = write_zip(&entries)?;
    let file_name = archive_name(keys, now_millis);

    debug!(bucket, entries = entries.len(), size = bytes.len(), "zip archive built");

    Ok(ZipArchive { file_name, bytes })
}

fn archive_error(e: impl std::fmt::Display) -> ApiError {
    ApiError::Archive {
        message: e.to_string(),
    }
}

fn write_zip(entries: &[(String, Bytes)]) -> Result<Vec<u8>, ApiError> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    for (name, body) in entries {
        zip.start_file(name.as_str(), options)
            .map_err(archive_error)?;
        zip.write_all(body).map_err(archive_error)?;
    }

    let cursor = zip.finish().map_err(archive_error)?;
    Ok(cursor.into_inner())
}

/// Copy an object server-side.
pub async fn copy(
    store: &dyn ObjectStore,
    request: CopyObjectRequest,
) -> Result<String, ApiError> {
    check_key(&request.source_key)?;
    check_key(&request.dest_key)?;
    let message = format!(
        "File copied successfully from {}/{} to {}/{}",
        request.source_bucket, request.source_key, request.dest_bucket, request.dest_key
    );
    store.copy_object(request).await?;
    Ok(message)
}

/// Delete an object. Deleting a missing key succeeds.
pub async fn delete(store: &dyn ObjectStore, bucket: &str, key: &str) -> Result<String, ApiError> {
    check_key(key)?;
    store
        .delete_object(DeleteObjectRequest::new(bucket, key))
        .await?;
    info!(bucket, key, "file deleted");
    Ok(format!("File deleted successfully: {}", key))
}

/// Write the zero-byte marker that makes `key` show up as a folder.
pub async fn create_folder(
    store: &dyn ObjectStore,
    bucket: &str,
    key: &str,
) -> Result<String, ApiError> {
    let marker = format!("{}{}", key, FOLDER_MARKER);
    check_key(&marker)?;
    store
        .put_object(PutObjectRequest::new(bucket, &marker))
        .await?;
    Ok(format!("Folder created successfully: {}", key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::InMemoryStore;
    use std::io::Read;
    use test_case::test_case;

    fn keys(list: &[&str]) -> Vec<String> {
        list.iter().map(|k| k.to_string()).collect()
    }

    async fn put(store: &InMemoryStore, key: &str, body: &str) {
        store
            .put_object(PutObjectRequest::new("docs", key).with_body(body.to_string()))
            .await
            .unwrap();
    }

    fn read_zip(bytes: Vec<u8>) -> Vec<(String, String)> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut file = archive.by_index(i).unwrap();
                let mut content = String::new();
                file.read_to_string(&mut content).unwrap();
                (file.name().to_string(), content)
            })
            .collect()
    }

    #[test_case(&["dir/a.txt"], "a.zip" ; "single key drops extension")]
    #[test_case(&["archive.tar.gz"], "archive.tar.zip" ; "only last extension")]
    #[test_case(&["dir/README"], "README.zip" ; "no extension")]
    #[test_case(&["dir/a.txt", "dir/b.txt"], "files-1700000000000.zip" ; "several keys")]
    fn test_archive_name(input: &[&str], expected: &str) {
        assert_eq!(archive_name(&keys(input), 1_700_000_000_000), expected);
    }

    #[test]
    fn test_basename() {
        assert_eq!(basename("a/b/c.txt"), "c.txt");
        assert_eq!(basename("c.txt"), "c.txt");
        assert_eq!(basename("a/b/"), "b");
    }

    #[tokio::test]
    async fn test_upload_sets_key_and_content_type() {
        let store = InMemoryStore::with_buckets(["docs"]);

        let uploaded = upload(
            &store,
            UploadInput {
                bucket: "docs".into(),
                path: "reports/".into(),
                filename: "q1.pdf".into(),
                content_type: Some("application/pdf".into()),
                body: Bytes::from_static(b"%PDF"),
                metadata: HashMap::from([("owner".to_string(), "ops".to_string())]),
            },
        )
        .await
        .unwrap();

        assert_eq!(uploaded.key, "reports/q1.pdf");
        assert!(uploaded
            .message()
            .starts_with("File uploaded successfully: reports/q1.pdf, ETag: \""));

        let head = store
            .head_object(HeadObjectRequest::new("docs", "reports/q1.pdf"))
            .await
            .unwrap();
        assert_eq!(head.attributes.content_type.as_deref(), Some("application/pdf"));
        assert_eq!(
            head.attributes.metadata.get("content-type").map(String::as_str),
            Some("application/pdf")
        );
        assert_eq!(head.attributes.metadata.get("owner").map(String::as_str), Some("ops"));
    }

    #[tokio::test]
    async fn test_upload_without_filename_is_rejected() {
        let store = InMemoryStore::with_buckets(["docs"]);
        let err = upload(
            &store,
            UploadInput {
                bucket: "docs".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_upload_failure_is_upload_error() {
        let store = InMemoryStore::with_buckets(["docs"]);
        store.fail_puts(true);

        let err = upload(
            &store,
            UploadInput {
                bucket: "docs".into(),
                filename: "a.txt".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "UploadError");
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn test_download_conditional() {
        let store = InMemoryStore::with_buckets(["docs"]);
        put(&store, "dir/a.txt", "hello").await;

        let fresh = download(&store, "docs", "dir/a.txt", None).await.unwrap();
        assert_eq!(fresh.file_name, "a.txt");
        assert_eq!(&fresh.body[..], b"hello");

        let err = download(&store, "docs", "dir/a.txt", fresh.e_tag.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotModified { .. }));

        let stale = download(&store, "docs", "dir/a.txt", Some("\"stale\"".into()))
            .await
            .unwrap();
        assert_eq!(&stale.body[..], b"hello");
    }

    #[tokio::test]
    async fn test_zip_single_and_multiple() {
        let store = InMemoryStore::with_buckets(["docs"]);
        put(&store, "dir/a.txt", "alpha").await;
        put(&store, "dir/b.txt", "beta").await;

        let single = zip_download(&store, "docs", &keys(&["dir/a.txt"]), 42)
            .await
            .unwrap();
        assert_eq!(single.file_name, "a.zip");
        assert_eq!(
            read_zip(single.bytes),
            vec![("a.txt".to_string(), "alpha".to_string())]
        );

        let both = zip_download(&store, "docs", &keys(&["dir/a.txt", "dir/b.txt"]), 42)
            .await
            .unwrap();
        assert_eq!(both.file_name, "files-42.zip");
        let names: Vec<_> = read_zip(both.bytes).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[tokio::test]
    async fn test_zip_duplicate_basename_last_wins() {
        let store = InMemoryStore::with_buckets(["docs"]);
        put(&store, "one/a.txt", "first").await;
        put(&store, "two/a.txt", "second").await;

        let archive = zip_download(&store, "docs", &keys(&["one/a.txt", "two/a.txt"]), 1)
            .await
            .unwrap();

        assert_eq!(
            read_zip(archive.bytes),
            vec![("a.txt".to_string(), "second".to_string())]
        );
    }

    #[tokio::test]
    async fn test_zip_missing_key_aborts() {
        let store = InMemoryStore::with_buckets(["docs"]);
        put(&store, "dir/a.txt", "alpha").await;

        let err = zip_download(&store, "docs", &keys(&["dir/a.txt", "dir/missing.txt"]), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));

        let err = zip_download(&store, "docs", &[], 1).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = InMemoryStore::with_buckets(["docs"]);
        put(&store, "a.txt", "a").await;

        assert_eq!(
            delete(&store, "docs", "a.txt").await.unwrap(),
            "File deleted successfully: a.txt"
        );
        assert!(delete(&store, "docs", "a.txt").await.is_ok());
        assert!(store.keys("docs").is_empty());
    }

    #[tokio::test]
    async fn test_dot_segment_keys_are_rejected() {
        let store = InMemoryStore::with_buckets(["docs"]);
        put(&store, "b.txt", "keep me").await;

        let bad = "a/../b.txt";
        let results = [
            delete(&store, "docs", bad).await.map(|_| ()),
            download(&store, "docs", bad, None).await.map(|_| ()),
            zip_download(&store, "docs", &keys(&["b.txt", bad]), 0)
                .await
                .map(|_| ()),
            copy(&store, CopyObjectRequest::new("docs", "b.txt", "docs", bad))
                .await
                .map(|_| ()),
            copy(&store, CopyObjectRequest::new("docs", bad, "docs", "c.txt"))
                .await
                .map(|_| ()),
            create_folder(&store, "docs", "x/../").await.map(|_| ()),
            upload(
                &store,
                UploadInput {
                    bucket: "docs".into(),
                    path: "x/./".into(),
                    filename: "b.txt".into(),
                    ..Default::default()
                },
            )
            .await
            .map(|_| ()),
        ];

        for result in results {
            assert!(matches!(result, Err(ApiError::Validation { .. })), "{result:?}");
        }
        assert_eq!(store.keys("docs"), vec!["b.txt"]);
        assert_eq!(&store.object_body("docs", "b.txt").unwrap()[..], b"keep me");
    }

    #[tokio::test]
    async fn test_create_folder_writes_marker() {
        let store = InMemoryStore::with_buckets(["docs"]);

        let message = create_folder(&store, "docs", "photos/").await.unwrap();

        assert_eq!(message, "Folder created successfully: photos/");
        assert_eq!(store.keys("docs"), vec!["photos/.keep"]);
        assert_eq!(store.object_body("docs", "photos/.keep").unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_copy_message() {
        let store = InMemoryStore::with_buckets(["docs", "backup"]);
        put(&store, "a.txt", "a").await;

        let message = copy(&store, CopyObjectRequest::new("docs", "a.txt", "backup", "b.txt"))
            .await
            .unwrap();

        assert_eq!(message, "File copied successfully from docs/a.txt to backup/b.txt");
        assert_eq!(store.keys("backup"), vec!["b.txt"]);
    }
}
