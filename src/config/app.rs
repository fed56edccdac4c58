//! Application-level configuration for the HTTP service.

use super::{env_non_empty, S3Config};
use crate::error::{ConfigurationError, S3Error};
use crate::observability::{LogFormat, LoggingConfig};
use std::net::SocketAddr;

/// Default listen address.
pub const DEFAULT_BIND: &str = "0.0.0.0:8080";

/// Default CORS origin (the browser front-end dev server).
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

/// Default upload limit: 100 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Default number of concurrent head-object calls while listing.
pub const DEFAULT_HEAD_CONCURRENCY: usize = 8;

/// HTTP listener settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind: SocketAddr,
    /// Origins allowed by CORS.
    pub cors_origins: Vec<String>,
    /// Largest accepted request body, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            cors_origins: vec![DEFAULT_CORS_ORIGIN.to_string()],
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Everything the service needs at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Object store connection.
    pub s3: S3Config,
    /// HTTP listener.
    pub server: ServerConfig,
    /// Bucket used when a request omits one.
    pub default_bucket: Option<String>,
    /// Concurrent head-object calls per listing.
    pub head_concurrency: usize,
    /// Log output.
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Build the configuration from environment variables.
    pub fn from_env() -> Result<Self, S3Error> {
        let s3 = S3Config::builder().from_env().build()?;

        let mut server = ServerConfig::default();
        if let Some(bind) = env_non_empty("S3_BROWSER_BIND") {
            server.bind = parse_bind(&bind)?;
        }
        if let Some(origins) = env_non_empty("S3_BROWSER_CORS_ORIGINS") {
            server.cors_origins = parse_origins(&origins);
        }
        if let Some(limit) = env_non_empty("S3_BROWSER_MAX_UPLOAD_BYTES") {
            server.max_upload_bytes = parse_number("S3_BROWSER_MAX_UPLOAD_BYTES", &limit)?;
        }

        let head_concurrency = match env_non_empty("S3_BROWSER_HEAD_CONCURRENCY") {
            Some(value) => parse_number("S3_BROWSER_HEAD_CONCURRENCY", &value)?,
            None => DEFAULT_HEAD_CONCURRENCY,
        };

        let mut logging = LoggingConfig::default();
        if let Some(format) = env_non_empty("S3_BROWSER_LOG_FORMAT") {
            logging.format = format.parse::<LogFormat>().map_err(|message| {
                S3Error::Configuration(ConfigurationError::InvalidConfiguration {
                    field: "S3_BROWSER_LOG_FORMAT".to_string(),
                    message,
                })
            })?;
        }

        let config = Self {
            s3,
            server,
            default_bucket: env_non_empty("S3_BROWSER_BUCKET"),
            head_concurrency,
            logging,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), S3Error> {
        if self.head_concurrency == 0 {
            return Err(invalid("head_concurrency", "must be at least 1"));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(invalid("max_upload_bytes", "must be greater than zero"));
        }
        if self.server.cors_origins.is_empty() {
            return Err(invalid("cors_origins", "at least one origin is required"));
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            s3: S3Config::default(),
            server: ServerConfig::default(),
            default_bucket: None,
            head_concurrency: DEFAULT_HEAD_CONCURRENCY,
            logging: LoggingConfig::default(),
        }
    }
}

fn invalid(field: &str, message: &str) -> S3Error {
    S3Error::Configuration(ConfigurationError::InvalidConfiguration {
        field: field.to_string(),
        message: message.to_string(),
    })
}

/// Parse a listen address.
pub fn parse_bind(value: &str) -> Result<SocketAddr, S3Error> {
    value
        .trim()
        .parse()
        .map_err(|e: std::net::AddrParseError| invalid("bind", &e.to_string()))
}

/// Split a comma-separated origin list.
pub fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|o| o.trim().trim_end_matches('/').to_string())
        .filter(|o| !o.is_empty())
        .collect()
}

fn parse_number(field: &str, value: &str) -> Result<usize, S3Error> {
    value
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| invalid(field, &e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind.to_string(), DEFAULT_BIND);
        assert_eq!(config.server.cors_origins, vec![DEFAULT_CORS_ORIGIN]);
        assert_eq!(config.head_concurrency, 8);
        assert!(config.default_bucket.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = AppConfig {
            head_concurrency: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(S3Error::Configuration(ConfigurationError::InvalidConfiguration { .. }))
        ));
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins("http://localhost:3000/, https://files.example.com ,,"),
            vec!["http://localhost:3000", "https://files.example.com"]
        );
    }

    #[test]
    fn test_parse_bind() {
        assert_eq!(parse_bind("127.0.0.1:9000").unwrap().port(), 9000);
        assert!(parse_bind("localhost").is_err());
    }
}
