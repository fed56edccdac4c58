//! Objects service for object store operations.

use super::{invocation_id, parse_error, INVOCATION_ID_HEADER};
use crate::config::S3Config;
use crate::error::{ObjectError, S3Error};
use crate::signing::{uri_encode_path, AwsSigner};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, METADATA_HEADER_PREFIX};
use crate::types::*;
use crate::xml;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Service for object operations.
pub struct ObjectsService {
    config: Arc<S3Config>,
    transport: Arc<dyn HttpTransport>,
    signer: Arc<dyn AwsSigner>,
}

impl ObjectsService {
    /// Create a new objects service.
    pub fn new(
        config: Arc<S3Config>,
        transport: Arc<dyn HttpTransport>,
        signer: Arc<dyn AwsSigner>,
    ) -> Self {
        Self {
            config,
            transport,
            signer,
        }
    }

    /// Put an object into a bucket.
    pub async fn put(&self, request: PutObjectRequest) -> Result<PutObjectOutput, S3Error> {
        let url = self
            .config
            .build_url(Some(&request.bucket), Some(&request.key), &[])?;

        let mut headers = HashMap::new();
        if let Some(content_type) = &request.content_type {
            headers.insert("content-type".to_string(), content_type.clone());
        }
        for (name, value) in &request.metadata {
            headers.insert(
                format!("{}{}", METADATA_HEADER_PREFIX, name.to_ascii_lowercase()),
                value.clone(),
            );
        }

        debug!(
            bucket = %request.bucket,
            key = %request.key,
            size = request.body.len(),
            "put object"
        );

        let response = self
            .dispatch("PUT", &url, headers, Some(request.body))
            .await?;

        if !response.is_success() {
            return Err(parse_error(
                &response,
                Some(&request.bucket),
                Some(&request.key),
            ));
        }

        Ok(PutObjectOutput {
            e_tag: response.etag().map(String::from),
            request_id: response.request_id().map(String::from),
        })
    }

    /// Get an object.
    ///
    /// A matching `If-None-Match` comes back as [`ObjectError::NotModified`].
    pub async fn get(&self, request: GetObjectRequest) -> Result<GetObjectOutput, S3Error> {
        let url = self
            .config
            .build_url(Some(&request.bucket), Some(&request.key), &[])?;

        let mut headers = HashMap::new();
        if let Some(if_none_match) = &request.if_none_match {
            headers.insert("if-none-match".to_string(), if_none_match.clone());
        }

        debug!(bucket = %request.bucket, key = %request.key, "get object");

        let response = self.dispatch("GET", &url, headers, None).await?;

        if response.status == 304 {
            return Err(S3Error::Object(ObjectError::NotModified {
                bucket: request.bucket.clone(),
                key: request.key.clone(),
                e_tag: response
                    .etag()
                    .map(String::from)
                    .or_else(|| request.if_none_match.clone()),
                request_id: response.request_id().map(String::from),
            }));
        }

        if !response.is_success() {
            return Err(parse_error(
                &response,
                Some(&request.bucket),
                Some(&request.key),
            ));
        }

        Ok(GetObjectOutput {
            attributes: attributes(&response),
            request_id: response.request_id().map(String::from),
            body: response.body,
        })
    }

    /// Get object metadata (HEAD).
    pub async fn head(&self, request: HeadObjectRequest) -> Result<HeadObjectOutput, S3Error> {
        let url = self
            .config
            .build_url(Some(&request.bucket), Some(&request.key), &[])?;

        let response = self.dispatch("HEAD", &url, HashMap::new(), None).await?;

        if response.status == 404 {
            return Err(S3Error::Object(ObjectError::NotFound {
                bucket: request.bucket.clone(),
                key: request.key.clone(),
                request_id: response.request_id().map(String::from),
            }));
        }

        if !response.is_success() {
            return Err(parse_error(
                &response,
                Some(&request.bucket),
                Some(&request.key),
            ));
        }

        Ok(HeadObjectOutput {
            attributes: attributes(&response),
            request_id: response.request_id().map(String::from),
        })
    }

    /// Delete an object.
    ///
    /// Deleting a key that does not exist succeeds.
    pub async fn delete(
        &self,
        request: DeleteObjectRequest,
    ) -> Result<DeleteObjectOutput, S3Error> {
        let url = self
            .config
            .build_url(Some(&request.bucket), Some(&request.key), &[])?;

        debug!(bucket = %request.bucket, key = %request.key, "delete object");

        let response = self.dispatch("DELETE", &url, HashMap::new(), None).await?;

        if !response.is_success() {
            let err = parse_error(&response, Some(&request.bucket), Some(&request.key));
            if matches!(err, S3Error::Object(ObjectError::NotFound { .. })) {
                return Ok(DeleteObjectOutput {
                    request_id: response.request_id().map(String::from),
                });
            }
            return Err(err);
        }

        Ok(DeleteObjectOutput {
            request_id: response.request_id().map(String::from),
        })
    }

    /// Copy an object server-side, keeping its metadata.
    pub async fn copy(&self, request: CopyObjectRequest) -> Result<CopyObjectOutput, S3Error> {
        let url = self
            .config
            .build_url(Some(&request.dest_bucket), Some(&request.dest_key), &[])?;

        let mut headers = HashMap::new();
        headers.insert(
            "x-amz-copy-source".to_string(),
            format!(
                "/{}/{}",
                request.source_bucket,
                uri_encode_path(&request.source_key)
            ),
        );
        headers.insert("x-amz-metadata-directive".to_string(), "COPY".to_string());

        debug!(
            source_bucket = %request.source_bucket,
            source_key = %request.source_key,
            dest_bucket = %request.dest_bucket,
            dest_key = %request.dest_key,
            "copy object"
        );

        let response = self.dispatch("PUT", &url, headers, None).await?;

        // A copy can fail after the 200 status line has been sent, in which
        // case the body holds an <Error> document.
        let body_str = String::from_utf8_lossy(&response.body);
        if !response.is_success() || body_str.contains("<Error>") {
            return Err(parse_error(
                &response,
                Some(&request.source_bucket),
                Some(&request.source_key),
            ));
        }

        let mut output = xml::parse_copy_object_result(&body_str)?;
        if output.e_tag.is_none() {
            output.e_tag = response.etag().map(String::from);
        }
        output.request_id = response.request_id().map(String::from);
        Ok(output)
    }

    /// List one page of objects (v2).
    pub async fn list(
        &self,
        request: ListObjectsV2Request,
    ) -> Result<ListObjectsV2Output, S3Error> {
        let max_keys = request.max_keys.map(|n| n.to_string());

        let mut query: Vec<(&str, &str)> = vec![("list-type", "2")];
        if let Some(prefix) = &request.prefix {
            query.push(("prefix", prefix));
        }
        if let Some(delimiter) = &request.delimiter {
            query.push(("delimiter", delimiter));
        }
        if let Some(max_keys) = &max_keys {
            query.push(("max-keys", max_keys));
        }
        if let Some(token) = &request.continuation_token {
            query.push(("continuation-token", token));
        }

        let url = self.config.build_url(Some(&request.bucket), None, &query)?;

        let response = self.dispatch("GET", &url, HashMap::new(), None).await?;

        if !response.is_success() {
            return Err(parse_error(&response, Some(&request.bucket), None));
        }

        let body_str = String::from_utf8_lossy(&response.body);
        let mut output = xml::parse_list_objects_v2(&body_str)?;
        output.request_id = response.request_id().map(String::from);

        debug!(
            bucket = %request.bucket,
            prefix = request.prefix.as_deref().unwrap_or(""),
            objects = output.contents.len(),
            prefixes = output.common_prefixes.len(),
            truncated = output.is_truncated,
            "listed objects"
        );

        Ok(output)
    }

    async fn dispatch(
        &self,
        method: &str,
        url: &Url,
        mut headers: HashMap<String, String>,
        body: Option<Bytes>,
    ) -> Result<HttpResponse, S3Error> {
        headers.insert(INVOCATION_ID_HEADER.to_string(), invocation_id());

        let signed = self
            .signer
            .sign(method, url, &headers, body.as_deref())
            .await?;

        let mut http_request =
            HttpRequest::new(method, signed.url.as_str()).with_headers(signed.headers);
        if let Some(body) = body {
            http_request = http_request.with_body(body);
        }

        self.transport.send(http_request).await
    }
}

fn attributes(response: &HttpResponse) -> ObjectAttributes {
    ObjectAttributes {
        e_tag: response.etag().map(String::from),
        content_length: response.content_length(),
        content_type: response.content_type().map(String::from),
        last_modified: parse_http_date(response.last_modified()),
        metadata: response.user_metadata(),
    }
}

/// Parse an HTTP-date such as `Mon, 12 Oct 2009 17:50:00 GMT`.
fn parse_http_date(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|v| DateTime::parse_from_rfc2822(v).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

impl std::fmt::Debug for ObjectsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectsService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
