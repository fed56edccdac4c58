//! HTTP plumbing between the services and the object store.
//!
//! Services build an [`HttpRequest`], sign it, and hand it to an
//! [`HttpTransport`]. Tests swap in `mocks::MockTransport`.

use crate::config::S3Config;
use crate::error::{NetworkError, S3Error};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::time::Duration;

/// Prefix carried by user-defined metadata headers.
pub const METADATA_HEADER_PREFIX: &str = "x-amz-meta-";

fn find_header<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find_map(|(k, v)| k.eq_ignore_ascii_case(name).then_some(v.as_str()))
}

/// Outgoing request. Header names are matched case-insensitively.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// `GET`, `PUT`, `HEAD`, `DELETE`...
    pub method: String,
    /// Absolute URL.
    pub url: String,
    /// Header map, sent as-is.
    pub headers: HashMap<String, String>,
    /// Body bytes, if any.
    pub body: Option<Bytes>,
}

impl HttpRequest {
    /// Bodiless request with no headers.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Sets the body.
    pub fn with_body(self, body: impl Into<Bytes>) -> Self {
        Self {
            body: Some(body.into()),
            ..self
        }
    }

    /// Sets one header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Merges `headers` in, overwriting same-named entries.
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Case-insensitive header lookup.
    pub fn get_header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// Fully buffered response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Names as sent by the store; use [`HttpResponse::get_header`] to look up.
    pub headers: HashMap<String, String>,
    /// Whole body.
    pub body: Bytes,
}

impl HttpResponse {
    /// Any 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup.
    pub fn get_header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// `x-amz-request-id`.
    pub fn request_id(&self) -> Option<&str> {
        self.get_header("x-amz-request-id")
    }

    /// `Content-Length`, if present and numeric.
    pub fn content_length(&self) -> Option<u64> {
        self.get_header("content-length")?.parse().ok()
    }

    /// `Content-Type`.
    pub fn content_type(&self) -> Option<&str> {
        self.get_header("content-type")
    }

    /// `ETag`, quotes included.
    pub fn etag(&self) -> Option<&str> {
        self.get_header("etag")
    }

    /// `Last-Modified`, unparsed.
    pub fn last_modified(&self) -> Option<&str> {
        self.get_header("last-modified")
    }

    /// `x-amz-meta-*` headers with the prefix stripped and names lowercased.
    pub fn user_metadata(&self) -> HashMap<String, String> {
        self.headers
            .iter()
            .filter_map(|(name, value)| {
                name.to_ascii_lowercase()
                    .strip_prefix(METADATA_HEADER_PREFIX)
                    .map(|key| (key.to_string(), value.clone()))
            })
            .collect()
    }
}

/// Sends one request and buffers the whole response.
///
/// Non-2xx statuses are returned as responses; only failures to get a
/// response at all are errors.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends `request`.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, S3Error>;
}

/// [`HttpTransport`] over a pooled `reqwest::Client`.
#[derive(Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    read_timeout: Duration,
}

impl ReqwestTransport {
    /// Builds the pool from the timeout, pool and TLS settings in `config`.
    pub fn from_config(config: &S3Config) -> Result<Self, S3Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .pool_max_idle_per_host(config.max_idle_connections)
            .pool_idle_timeout(config.idle_timeout)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .user_agent(concat!("s3-browser/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NetworkError::TlsError {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            read_timeout: config.read_timeout,
        })
    }

    fn network_error(&self, e: reqwest::Error, context: &str) -> S3Error {
        let err = if e.is_timeout() {
            NetworkError::Timeout {
                duration: self.read_timeout,
            }
        } else {
            NetworkError::ConnectionFailed {
                message: format!("{context}: {e}"),
            }
        };
        err.into()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, S3Error> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes()).map_err(|e| {
            NetworkError::ConnectionFailed {
                message: format!("invalid method {}: {e}", request.method),
            }
        })?;

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| self.network_error(e, "request failed"))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.to_string(), v.to_str().ok()?.to_string())))
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.network_error(e, "reading body failed"))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with(headers: &[(&str, &str)]) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: Bytes::new(),
        }
    }

    #[test]
    fn test_request_header_lookup_ignores_case() {
        let request = HttpRequest::new("PUT", "http://localhost:4566/docs/a.txt")
            .with_header("Content-Type", "text/plain")
            .with_body(&b"body"[..]);

        assert_eq!(request.get_header("content-type"), Some("text/plain"));
        assert_eq!(request.get_header("CONTENT-TYPE"), Some("text/plain"));
        assert_eq!(request.body.as_deref(), Some(&b"body"[..]));
    }

    #[test]
    fn test_response_accessors() {
        let response = response_with(&[
            ("x-amz-request-id", "ABC123"),
            ("ETag", "\"abc123\""),
            ("Content-Length", "1024"),
        ]);

        assert!(response.is_success());
        assert_eq!(response.request_id(), Some("ABC123"));
        assert_eq!(response.etag(), Some("\"abc123\""));
        assert_eq!(response.content_length(), Some(1024));
        assert_eq!(response.content_type(), None);
    }

    #[test]
    fn test_bad_content_length_is_none() {
        let response = response_with(&[("content-length", "lots")]);
        assert_eq!(response.content_length(), None);
    }

    #[test]
    fn test_user_metadata_strips_prefix() {
        let response = response_with(&[
            ("x-amz-meta-owner", "ops"),
            ("X-Amz-Meta-Content-Type", "text/plain"),
            ("x-amz-request-id", "ABC"),
        ]);

        let metadata = response.user_metadata();
        assert_eq!(metadata.len(), 2);
        assert_eq!(metadata["owner"], "ops");
        assert_eq!(metadata["content-type"], "text/plain");
    }

    #[test]
    fn test_transport_from_default_config() {
        assert!(ReqwestTransport::from_config(&S3Config::default()).is_ok());
    }
}
