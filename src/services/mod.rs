//! Object store service implementations.
//!
//! - Objects: put, get, head, delete, copy and list
//! - Buckets: create, delete and list

mod buckets;
mod objects;

pub use buckets::BucketsService;
pub use objects::ObjectsService;

use crate::error::{map_http_status, map_s3_error_code, ResponseError, S3Error};
use crate::transport::HttpResponse;
use crate::xml;

/// Header carrying a per-request invocation id.
pub(crate) const INVOCATION_ID_HEADER: &str = "amz-sdk-invocation-id";

pub(crate) fn invocation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Turn a non-success response into a typed error.
///
/// `bucket` and `key` fill in what the error body leaves out. Bodiless
/// responses (HEAD, some proxies) fall back to the status code.
pub(crate) fn parse_error(
    response: &HttpResponse,
    bucket: Option<&str>,
    key: Option<&str>,
) -> S3Error {
    let request_id = response.request_id().map(String::from);

    if response.body.is_empty() {
        return map_http_status(response.status, bucket, key, request_id);
    }

    let body_str = String::from_utf8_lossy(&response.body);
    match xml::parse_error_response(&body_str) {
        Ok(mut error_response) if !error_response.code.is_empty() => {
            if error_response.bucket.is_none() {
                error_response.bucket = bucket.map(String::from);
            }
            if error_response.key.is_none() {
                error_response.key = key.map(String::from);
            }
            if error_response.request_id.is_none() {
                error_response.request_id = request_id;
            }
            let code = error_response.code.clone();
            map_s3_error_code(&code, Some(error_response))
        }
        Ok(_) => map_http_status(response.status, bucket, key, request_id),
        Err(_) => S3Error::Response(ResponseError::InvalidResponse {
            message: format!(
                "Failed to parse error response ({}): {}",
                response.status,
                body_str.chars().take(100).collect::<String>()
            ),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BucketError, ObjectError, ServerError};
    use bytes::Bytes;
    use std::collections::HashMap;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::from([("x-amz-request-id".to_string(), "REQ1".to_string())]),
            body: Bytes::from(body.to_string()),
        }
    }

    #[test]
    fn test_parse_error_fills_missing_key() {
        let err = parse_error(
            &response(404, "<Error><Code>NoSuchKey</Code><Message>gone</Message></Error>"),
            Some("docs"),
            Some("a.txt"),
        );

        match err {
            S3Error::Object(ObjectError::NotFound {
                bucket,
                key,
                request_id,
            }) => {
                assert_eq!(bucket, "docs");
                assert_eq!(key, "a.txt");
                assert_eq!(request_id.as_deref(), Some("REQ1"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_error_empty_body_uses_status() {
        let err = parse_error(&response(404, ""), Some("docs"), None);
        assert!(matches!(err, S3Error::Bucket(BucketError::NotFound { .. })));

        let err = parse_error(&response(503, ""), Some("docs"), None);
        assert!(matches!(
            err,
            S3Error::Server(ServerError::Unavailable { .. })
        ));
    }

    #[test]
    fn test_parse_error_plain_text_body_uses_status() {
        let err = parse_error(&response(500, "upstream exploded"), None, None);
        assert!(matches!(
            err,
            S3Error::Server(ServerError::InternalError { .. })
        ));
    }
}
