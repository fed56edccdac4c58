//! Configuration.
//!
//! [`S3Config`] describes how to reach the object store. [`AppConfig`]
//! wraps it together with the HTTP surface settings the binary needs.

mod app;

pub use app::{
    parse_bind, parse_origins, AppConfig, ServerConfig, DEFAULT_BIND, DEFAULT_CORS_ORIGIN,
    DEFAULT_HEAD_CONCURRENCY, DEFAULT_MAX_UPLOAD_BYTES,
};

use crate::credentials::{AwsCredentials, CredentialsProvider, EnvCredentialsProvider};
use crate::error::{ConfigurationError, RequestError, S3Error};
use crate::signing::{uri_encode_path, uri_encode_query};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Endpoint used when none is configured: a local S3 emulator.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:4566";

/// Region used when none is configured.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Configuration for the S3 client.
#[derive(Clone)]
pub struct S3Config {
    /// AWS region (e.g., "us-east-1").
    pub region: String,

    /// Credentials provider.
    pub credentials_provider: Arc<dyn CredentialsProvider>,

    /// Custom endpoint URL (for S3-compatible services). `None` targets AWS.
    pub endpoint: Option<Url>,

    /// Use path-style addressing instead of virtual-hosted style.
    ///
    /// Path-style: `http://host/bucket/key`
    /// Virtual-hosted: `http://bucket.host/key`
    pub path_style: bool,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Timeout for a whole request, body included.
    pub read_timeout: Duration,

    /// Maximum idle connections kept per host.
    pub max_idle_connections: usize,

    /// Idle connection timeout.
    pub idle_timeout: Duration,

    /// Verify TLS certificates.
    pub verify_ssl: bool,
}

impl std::fmt::Debug for S3Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Config")
            .field("region", &self.region)
            .field("credentials_provider", &self.credentials_provider.name())
            .field("endpoint", &self.endpoint.as_ref().map(Url::as_str))
            .field("path_style", &self.path_style)
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("max_idle_connections", &self.max_idle_connections)
            .field("verify_ssl", &self.verify_ssl)
            .finish_non_exhaustive()
    }
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            credentials_provider: Arc::new(
                EnvCredentialsProvider::new().with_fallback(AwsCredentials::new("test", "test")),
            ),
            endpoint: None,
            path_style: false,
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
            max_idle_connections: 32,
            idle_timeout: Duration::from_secs(90),
            verify_ssl: true,
        }
    }
}

impl S3Config {
    /// Create a new configuration builder.
    pub fn builder() -> S3ConfigBuilder {
        S3ConfigBuilder::default()
    }

    /// Base URL requests are sent to, before bucket addressing is applied.
    fn base_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.as_str().trim_end_matches('/').to_string(),
            None => format!("https://s3.{}.amazonaws.com", self.region),
        }
    }

    /// Build the full request URL for a bucket/key with query parameters.
    ///
    /// The key is percent-encoded once here; the signer reuses that
    /// encoding. Query parameters keep the given order.
    pub fn build_url(
        &self,
        bucket: Option<&str>,
        key: Option<&str>,
        query: &[(&str, &str)],
    ) -> Result<Url, S3Error> {
        let base = self.base_url();

        let mut url = match bucket {
            Some(bucket) if !self.path_style => {
                let (scheme, rest) = base.split_once("://").ok_or_else(|| {
                    S3Error::Configuration(ConfigurationError::InvalidEndpoint {
                        url: base.clone(),
                        details: "missing scheme".to_string(),
                    })
                })?;
                format!("{}://{}.{}/", scheme, bucket, rest)
            }
            Some(bucket) => format!("{}/{}/", base, uri_encode_path(bucket)),
            None => format!("{}/", base),
        };

        if let Some(key) = key {
            if has_dot_segment(key) {
                return Err(RequestError::Rejected {
                    code: "InvalidObjectKey".to_string(),
                    message: format!("key has a '.' or '..' segment: {key}"),
                }
                .into());
            }
            url.push_str(&uri_encode_path(key));
        } else if bucket.is_some() && self.path_style {
            url.pop();
        }

        if !query.is_empty() {
            let query_string = query
                .iter()
                .map(|(k, v)| format!("{}={}", uri_encode_query(k), uri_encode_query(v)))
                .collect::<Vec<_>>()
                .join("&");
            url.push('?');
            url.push_str(&query_string);
        }

        Url::parse(&url).map_err(|e| {
            S3Error::Configuration(ConfigurationError::InvalidEndpoint {
                url,
                details: e.to_string(),
            })
        })
    }
}

/// True when a `/`-separated segment of `key` is `.` or `..`.
///
/// URL parsing folds such segments (even percent-encoded), so the request
/// would address a different key.
pub fn has_dot_segment(key: &str) -> bool {
    key.split('/').any(|segment| segment == "." || segment == "..")
}

/// Builder for S3 configuration.
#[derive(Default)]
pub struct S3ConfigBuilder {
    region: Option<String>,
    credentials_provider: Option<Arc<dyn CredentialsProvider>>,
    endpoint: Option<String>,
    path_style: Option<bool>,
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
    max_idle_connections: Option<usize>,
    idle_timeout: Option<Duration>,
    verify_ssl: Option<bool>,
}

impl S3ConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the AWS region.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set the credentials provider.
    pub fn credentials_provider(mut self, provider: Arc<dyn CredentialsProvider>) -> Self {
        self.credentials_provider = Some(provider);
        self
    }

    /// Set a custom endpoint URL. Validated in [`build`](Self::build).
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Enable path-style addressing.
    pub fn path_style(mut self, enabled: bool) -> Self {
        self.path_style = Some(enabled);
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the whole-request timeout.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    pub fn max_idle_connections(mut self, connections: usize) -> Self {
        self.max_idle_connections = Some(connections);
        self
    }

    /// Set the idle connection timeout.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Enable or disable TLS verification.
    pub fn verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = Some(verify);
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Without an endpoint variable the local emulator endpoint is used with
    /// path-style addressing, matching how the browser is usually run.
    pub fn from_env(mut self) -> Self {
        if let Some(region) = env_non_empty("AWS_REGION").or_else(|| env_non_empty("AWS_DEFAULT_REGION")) {
            self.region = Some(region);
        }

        self.endpoint = env_non_empty("AWS_ENDPOINT_URL_S3")
            .or_else(|| env_non_empty("AWS_ENDPOINT_URL"))
            .or(self.endpoint)
            .or_else(|| Some(DEFAULT_ENDPOINT.to_string()));

        self.path_style = match env_non_empty("S3_BROWSER_PATH_STYLE") {
            Some(val) => Some(parse_bool(&val)),
            None => self.path_style.or(Some(true)),
        };

        if let Some(ms) = env_non_empty("S3_BROWSER_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.read_timeout = Some(Duration::from_millis(ms));
        }

        if let Some(val) = env_non_empty("S3_BROWSER_VERIFY_SSL") {
            self.verify_ssl = Some(parse_bool(&val));
        }

        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<S3Config, S3Error> {
        let defaults = S3Config::default();

        let region = self.region.unwrap_or(defaults.region);
        if region.trim().is_empty() {
            return Err(S3Error::Configuration(ConfigurationError::MissingRegion));
        }

        let endpoint = match self.endpoint {
            Some(raw) => {
                let url = Url::parse(&raw).map_err(|e| {
                    S3Error::Configuration(ConfigurationError::InvalidEndpoint {
                        url: raw.clone(),
                        details: e.to_string(),
                    })
                })?;
                if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
                    return Err(S3Error::Configuration(ConfigurationError::InvalidEndpoint {
                        url: raw,
                        details: "expected an http(s) URL with a host".to_string(),
                    }));
                }
                Some(url)
            }
            None => None,
        };

        let read_timeout = self.read_timeout.unwrap_or(defaults.read_timeout);
        if read_timeout.is_zero() {
            return Err(S3Error::Configuration(
                ConfigurationError::InvalidConfiguration {
                    field: "read_timeout".to_string(),
                    message: "must be greater than zero".to_string(),
                },
            ));
        }

        Ok(S3Config {
            region,
            credentials_provider: self
                .credentials_provider
                .unwrap_or(defaults.credentials_provider),
            endpoint,
            path_style: self.path_style.unwrap_or(defaults.path_style),
            connect_timeout: self.connect_timeout.unwrap_or(defaults.connect_timeout),
            read_timeout,
            max_idle_connections: self
                .max_idle_connections
                .unwrap_or(defaults.max_idle_connections),
            idle_timeout: self.idle_timeout.unwrap_or(defaults.idle_timeout),
            verify_ssl: self.verify_ssl.unwrap_or(defaults.verify_ssl),
        })
    }
}

pub(crate) fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

pub(crate) fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}
