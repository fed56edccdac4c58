//! Response shaping.

use crate::error::ApiError;
use crate::operations::{Download, ZipArchive};
use crate::transport::METADATA_HEADER_PREFIX;
use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

/// `{"message": "..."}` body for operations without a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable outcome.
    pub message: String,
}

impl MessageResponse {
    /// Wrap a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `{"error": "...", "message": "..."}` body for failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error kind, e.g. `NotFound`.
    pub error: String,
    /// Human-readable description.
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if let ApiError::NotModified { e_tag } = &self {
            let mut headers = HeaderMap::new();
            if let Some(value) = e_tag.as_deref().and_then(|v| HeaderValue::from_str(v).ok()) {
                headers.insert(header::ETAG, value);
            }
            return (status, headers).into_response();
        }

        if status.is_server_error() {
            error!(kind = self.kind(), error = %self, "request failed");
        } else if status == StatusCode::CONFLICT {
            warn!(kind = self.kind(), error = %self, "request rejected");
        } else {
            debug!(kind = self.kind(), error = %self, "request rejected");
        }

        let body = ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// `attachment; filename="<name>"`, with quotes in the name escaped.
pub fn content_disposition(file_name: &str) -> Option<HeaderValue> {
    let escaped = file_name.replace('\\', "\\\\").replace('"', "\\\"");
    HeaderValue::from_bytes(format!("attachment; filename=\"{}\"", escaped).as_bytes()).ok()
}

impl IntoResponse for Download {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();

        let content_type = self
            .content_type
            .as_deref()
            .and_then(|ct| HeaderValue::from_str(ct).ok())
            .unwrap_or(HeaderValue::from_static("application/octet-stream"));
        headers.insert(header::CONTENT_TYPE, content_type);

        if let Some(value) = content_disposition(&self.file_name) {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
        if let Some(value) = self.e_tag.as_deref().and_then(|v| HeaderValue::from_str(v).ok()) {
            headers.insert(header::ETAG, value);
        }

        for (name, value) in &self.metadata {
            let header_name =
                HeaderName::try_from(format!("{}{}", METADATA_HEADER_PREFIX, name));
            match (header_name, HeaderValue::from_bytes(value.as_bytes())) {
                (Ok(header_name), Ok(value)) => {
                    headers.insert(header_name, value);
                }
                _ => warn!(metadata = %name, "skipping metadata that is not a valid header"),
            }
        }

        (StatusCode::OK, headers, Body::from(self.body)).into_response()
    }
}

impl IntoResponse for ZipArchive {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        );
        if let Some(value) = content_disposition(&self.file_name) {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
        (StatusCode::OK, headers, Body::from(self.bytes)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_modified_has_no_body() {
        let response = ApiError::NotModified {
            e_tag: Some("\"abc\"".into()),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(response.headers().get(header::ETAG).unwrap(), "\"abc\"");
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_validation_error_status() {
        let response = ApiError::validation("Missing required parameter: key").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_content_disposition_escapes_quotes() {
        let value = content_disposition("say \"hi\".txt").unwrap();
        assert_eq!(value, "attachment; filename=\"say \\\"hi\\\".txt\"");
    }
}
