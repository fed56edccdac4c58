//! Turning store error documents and bare statuses into [`S3Error`].

use super::*;

/// Fields of an `<Error>` document returned by the store.
#[derive(Debug, Clone, Default)]
pub struct S3ErrorResponse {
    /// Error code, e.g. `NoSuchKey`.
    pub code: String,
    /// Store message.
    pub message: String,
    /// `BucketName` element, if present.
    pub bucket: Option<String>,
    /// `Key` element, if present.
    pub key: Option<String>,
    /// `RequestId` element.
    pub request_id: Option<String>,
    /// `HostId` element.
    pub host_id: Option<String>,
}

const ACCESS_CODES: &[&str] = &[
    "AccessDenied",
    "AllAccessDisabled",
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
    "ExpiredToken",
    "TokenRefreshRequired",
];

const REJECTED_CODES: &[&str] = &[
    "InvalidBucketName",
    "KeyTooLongError",
    "InvalidRequest",
    "InvalidArgument",
    "MalformedXML",
    "EntityTooLarge",
    "TooManyBuckets",
    "InvalidObjectState",
];

const UNAVAILABLE_CODES: &[&str] = &["ServiceUnavailable", "SlowDown"];

/// Build the typed error for a store error code.
///
/// Not every S3-compatible store fills `BucketName` and `Key`, so callers put
/// the names they already know into `response` before calling.
pub fn map_s3_error_code(code: &str, response: Option<S3ErrorResponse>) -> S3Error {
    let resp = response.unwrap_or_default();
    let bucket = resp.bucket.unwrap_or_default();
    let key = resp.key.unwrap_or_default();
    let request_id = resp.request_id;
    let message = Some(resp.message).filter(|m| !m.is_empty());

    match code {
        "NoSuchBucket" => BucketError::NotFound { bucket, request_id }.into(),
        "BucketAlreadyExists" => BucketError::AlreadyExists { bucket, request_id }.into(),
        "BucketAlreadyOwnedByYou" => BucketError::AlreadyOwnedByYou { bucket, request_id }.into(),
        "BucketNotEmpty" => BucketError::NotEmpty { bucket, request_id }.into(),
        "NoSuchKey" => ObjectError::NotFound {
            bucket,
            key,
            request_id,
        }
        .into(),
        "NotModified" => ObjectError::NotModified {
            bucket,
            key,
            e_tag: None,
            request_id,
        }
        .into(),
        "PreconditionFailed" => ObjectError::PreconditionFailed {
            bucket,
            key,
            request_id,
        }
        .into(),
        "InternalError" => ServerError::InternalError {
            message,
            request_id,
        }
        .into(),
        c if ACCESS_CODES.contains(&c) => AccessError::Denied {
            code: c.to_string(),
            message,
            request_id,
        }
        .into(),
        c if REJECTED_CODES.contains(&c) => RequestError::Rejected {
            code: c.to_string(),
            message: message.unwrap_or_default(),
        }
        .into(),
        c if UNAVAILABLE_CODES.contains(&c) => ServerError::Unavailable {
            code: c.to_string(),
            request_id,
        }
        .into(),
        other => ServerError::InternalError {
            message: Some(match message {
                Some(m) => format!("{other}: {m}"),
                None => other.to_string(),
            }),
            request_id,
        }
        .into(),
    }
}

/// Build an error from the status alone, for responses with no error body.
///
/// HEAD responses are the usual case: a 404 there means the key when one was
/// asked for, otherwise the bucket. A 404 on a call naming no bucket is a
/// store failure.
pub fn map_http_status(
    status: u16,
    bucket: Option<&str>,
    key: Option<&str>,
    request_id: Option<String>,
) -> S3Error {
    if status == 404 && bucket.is_none() {
        return ServerError::InternalError {
            message: Some("HTTP status 404 without a bucket".to_string()),
            request_id,
        }
        .into();
    }
    let bucket = bucket.unwrap_or_default().to_string();
    match (status, key) {
        (400, _) => RequestError::Rejected {
            code: "BadRequest".to_string(),
            message: "Bad request".to_string(),
        }
        .into(),
        (403, _) => AccessError::Denied {
            code: "AccessDenied".to_string(),
            message: None,
            request_id,
        }
        .into(),
        (404, Some(key)) => ObjectError::NotFound {
            bucket,
            key: key.to_string(),
            request_id,
        }
        .into(),
        (404, None) => BucketError::NotFound { bucket, request_id }.into(),
        (409, _) => BucketError::AlreadyExists { bucket, request_id }.into(),
        (412, key) => ObjectError::PreconditionFailed {
            bucket,
            key: key.unwrap_or_default().to_string(),
            request_id,
        }
        .into(),
        (502 | 503, _) => ServerError::Unavailable {
            code: status.to_string(),
            request_id,
        }
        .into(),
        (500, _) => ServerError::InternalError {
            message: None,
            request_id,
        }
        .into(),
        _ => ServerError::InternalError {
            message: Some(format!("HTTP status {status}")),
            request_id,
        }
        .into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_no_such_bucket_keeps_names() {
        let error = map_s3_error_code(
            "NoSuchBucket",
            Some(S3ErrorResponse {
                code: "NoSuchBucket".into(),
                message: "The specified bucket does not exist".into(),
                bucket: Some("my-bucket".into()),
                request_id: Some("ABC123".into()),
                ..Default::default()
            }),
        );

        match error {
            S3Error::Bucket(BucketError::NotFound { bucket, request_id }) => {
                assert_eq!(bucket, "my-bucket");
                assert_eq!(request_id.as_deref(), Some("ABC123"));
            }
            other => panic!("Expected BucketError::NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_no_such_key_keeps_names() {
        let error = map_s3_error_code(
            "NoSuchKey",
            Some(S3ErrorResponse {
                bucket: Some("my-bucket".into()),
                key: Some("docs/a.txt".into()),
                ..Default::default()
            }),
        );

        assert!(error.is_not_found());
        assert_eq!(error.to_string(), "Object not found: 'my-bucket/docs/a.txt'");
    }

    #[test_case("BucketAlreadyExists", Some(409) ; "bucket exists")]
    #[test_case("BucketAlreadyOwnedByYou", Some(409) ; "bucket owned")]
    #[test_case("BucketNotEmpty", Some(409) ; "bucket not empty")]
    #[test_case("AccessDenied", Some(403) ; "access denied")]
    #[test_case("SignatureDoesNotMatch", Some(403) ; "bad signature")]
    #[test_case("SlowDown", Some(503) ; "slow down")]
    #[test_case("InvalidArgument", Some(400) ; "invalid argument")]
    #[test_case("TooManyBuckets", Some(400) ; "bucket limit")]
    #[test_case("SomethingNew", Some(500) ; "unknown code")]
    fn test_code_status(code: &str, status: Option<u16>) {
        assert_eq!(map_s3_error_code(code, None).http_status(), status);
    }

    #[test]
    fn test_denied_keeps_code() {
        match map_s3_error_code("InvalidAccessKeyId", None) {
            S3Error::Access(AccessError::Denied { code, .. }) => {
                assert_eq!(code, "InvalidAccessKeyId")
            }
            other => panic!("Expected AccessError::Denied, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_code_keeps_code_in_message() {
        let error = map_s3_error_code("SomeUnknownError", None);
        assert!(error.to_string().contains("SomeUnknownError"));
    }

    #[test]
    fn test_404_depends_on_key() {
        assert!(matches!(
            map_http_status(404, Some("b"), Some("k"), None),
            S3Error::Object(ObjectError::NotFound { .. })
        ));
        assert!(matches!(
            map_http_status(404, Some("b"), None, None),
            S3Error::Bucket(BucketError::NotFound { .. })
        ));
    }

    #[test]
    fn test_404_without_bucket_is_store_failure() {
        let err = map_http_status(404, None, None, Some("r".into()));
        assert!(!err.is_not_found());
        assert!(matches!(err, S3Error::Server(ServerError::InternalError { .. })));
        assert_eq!(err.request_id(), Some("r"));
    }

    #[test_case(403, Some(403) ; "forbidden")]
    #[test_case(500, Some(500) ; "internal")]
    #[test_case(502, Some(503) ; "bad gateway")]
    #[test_case(503, Some(503) ; "unavailable")]
    #[test_case(418, Some(500) ; "unexpected")]
    fn test_bare_status(status: u16, expected: Option<u16>) {
        assert_eq!(
            map_http_status(status, None, None, Some("r".into())).http_status(),
            expected
        );
    }
}
