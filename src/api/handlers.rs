//! Route handlers.

use super::params::QueryParams;
use super::response::MessageResponse;
use super::AppState;
use crate::error::ApiError;
use crate::operations::{self, buckets, transfer, Download, ListingResult, UploadInput, ZipArchive};
use crate::types::CopyObjectRequest;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, RawQuery, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use bytes::Bytes;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::debug;

type ApiResult<T> = Result<T, ApiError>;

pub(crate) async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn list_buckets(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    let names = buckets::list(state.store.as_ref()).await?;
    Ok(Json(names))
}

pub(crate) async fn create_bucket(
    State(state): State<AppState>,
    Path(bucket_name): Path<String>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let message = buckets::create(state.store.as_ref(), &bucket_name).await?;
    Ok((StatusCode::CREATED, Json(MessageResponse::new(message))))
}

pub(crate) async fn delete_bucket(
    State(state): State<AppState>,
    Path(bucket_name): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let message = buckets::delete(state.store.as_ref(), &bucket_name).await?;
    Ok(Json(MessageResponse::new(message)))
}

pub(crate) async fn list_files(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<ListingResult>> {
    let params = QueryParams::parse(query.as_deref());
    let bucket = params.bucket("bucket", state.default_bucket())?;
    let path = params.get_raw("path").unwrap_or_default();

    let listing =
        operations::list_entries(state.store.as_ref(), &bucket, path, state.head_concurrency)
            .await?;
    Ok(Json(listing))
}

pub(crate) async fn upload_file(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    mut multipart: Multipart,
) -> ApiResult<Json<MessageResponse>> {
    let params = QueryParams::parse(query.as_deref());

    let mut file: Option<(String, Option<String>, Bytes)> = None;
    let mut form: HashMap<String, String> = HashMap::new();
    let mut metadata: HashMap<String, String> = HashMap::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let filename = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(String::from);
            let body = field.bytes().await.map_err(multipart_error)?;
            file = Some((filename, content_type, body));
        } else {
            let value = field.text().await.map_err(multipart_error)?;
            match metadata_field(&name) {
                Some(meta_key) => {
                    metadata.insert(meta_key.to_string(), value);
                }
                None => {
                    form.insert(name, value);
                }
            }
        }
    }

    let (filename, content_type, body) =
        file.ok_or_else(|| ApiError::validation("Missing required part: file"))?;

    let bucket = match params.get("bucket") {
        Some(bucket) => bucket.to_string(),
        None => form
            .get("bucket")
            .filter(|b| !b.trim().is_empty())
            .cloned()
            .or_else(|| state.default_bucket.clone())
            .ok_or_else(|| ApiError::validation("Missing required parameter: bucket"))?,
    };
    let path = params
        .get_raw("path")
        .map(String::from)
        .or_else(|| form.get("path").cloned())
        .unwrap_or_default();

    debug!(bucket = %bucket, path = %path, filename = %filename, size = body.len(), "upload received");

    let uploaded = transfer::upload(
        state.store.as_ref(),
        UploadInput {
            bucket,
            path,
            filename,
            content_type,
            body,
            metadata,
        },
    )
    .await?;
    Ok(Json(MessageResponse::new(uploaded.message())))
}

/// `metadata[name]` or `metadata.name` form fields carry user metadata.
fn metadata_field(name: &str) -> Option<&str> {
    name.strip_prefix("metadata[")
        .and_then(|rest| rest.strip_suffix(']'))
        .or_else(|| name.strip_prefix("metadata."))
        .filter(|key| !key.is_empty())
}

fn multipart_error(err: MultipartError) -> ApiError {
    ApiError::validation(format!("Invalid multipart body: {}", err))
}

pub(crate) async fn create_folder(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<MessageResponse>> {
    let params = QueryParams::parse(query.as_deref());
    let bucket = params.bucket("bucket", state.default_bucket())?;
    let key = params.required("key")?;

    let message = transfer::create_folder(state.store.as_ref(), &bucket, key).await?;
    Ok(Json(MessageResponse::new(message)))
}

pub(crate) async fn copy_file(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<MessageResponse>> {
    let params = QueryParams::parse(query.as_deref());
    let request = CopyObjectRequest::new(
        params.bucket("sourceBucket", state.default_bucket())?,
        params.required("sourceKey")?,
        params.bucket("destinationBucket", state.default_bucket())?,
        params.required("destinationKey")?,
    );

    let message = transfer::copy(state.store.as_ref(), request).await?;
    Ok(Json(MessageResponse::new(message)))
}

pub(crate) async fn download_file(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> ApiResult<Download> {
    let params = QueryParams::parse(query.as_deref());
    let bucket = params.bucket("bucket", state.default_bucket())?;
    let key = params.required("key")?;

    let if_none_match = params.get("ifNoneMatch").map(String::from).or_else(|| {
        headers
            .get(header::IF_NONE_MATCH)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    });

    transfer::download(state.store.as_ref(), &bucket, key, if_none_match).await
}

pub(crate) async fn download_zip(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> ApiResult<ZipArchive> {
    let params = QueryParams::parse(query.as_deref());
    let bucket = params.bucket("bucket", state.default_bucket())?;
    let keys = params.all("keys");

    let now_millis = chrono::Utc::now().timestamp_millis();
    transfer::zip_download(state.store.as_ref(), &bucket, &keys, now_millis).await
}

pub(crate) async fn delete_file(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<MessageResponse>> {
    let params = QueryParams::parse(query.as_deref());
    let bucket = params.bucket("bucket", state.default_bucket())?;
    let key = params.required("key")?;

    let message = transfer::delete(state.store.as_ref(), &bucket, key).await?;
    Ok(Json(MessageResponse::new(message)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_field_forms() {
        assert_eq!(metadata_field("metadata[author]"), Some("author"));
        assert_eq!(metadata_field("metadata.project"), Some("project"));
        assert_eq!(metadata_field("metadata[]"), None);
        assert_eq!(metadata_field("bucket"), None);
    }
}
