//! Signing keys and where they come from.
//!
//! Keys are either fixed at startup or read from the `AWS_*` environment
//! variables on each request. Emulators such as LocalStack accept any pair,
//! so the environment source can fall back to a fixed one.

mod env;

pub use env::{EnvCredentialsProvider, AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY, AWS_SESSION_TOKEN};

use crate::error::S3Error;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// Access key pair, plus a session token for temporary keys.
///
/// The secret parts are held in [`SecretString`] and never printed by `Debug`.
#[derive(Clone)]
pub struct AwsCredentials {
    access_key_id: String,
    secret_access_key: SecretString,
    session_token: Option<SecretString>,
}

impl AwsCredentials {
    /// Long-term key pair.
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: SecretString::new(secret_access_key.into()),
            session_token: None,
        }
    }

    /// Marks the pair as temporary; the token is sent as `x-amz-security-token`.
    pub fn with_session_token(self, token: impl Into<String>) -> Self {
        Self {
            session_token: Some(SecretString::new(token.into())),
            ..self
        }
    }

    /// Public half of the pair, safe to log.
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// Only the signer should call this.
    pub fn secret_access_key(&self) -> &str {
        self.secret_access_key.expose_secret()
    }

    /// Token for temporary keys.
    pub fn session_token(&self) -> Option<&str> {
        self.session_token
            .as_ref()
            .map(|token| token.expose_secret().as_str())
    }
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = "[REDACTED]";
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &redacted)
            .field("session_token", &self.session_token.as_ref().map(|_| redacted))
            .finish()
    }
}

/// Something that can hand the signer a key pair.
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    /// Called once per signed request.
    async fn get_credentials(&self) -> Result<AwsCredentials, S3Error>;

    /// Short label used in `Debug` output and logs.
    fn name(&self) -> &'static str;
}

/// Always returns the pair it was built with.
#[derive(Debug, Clone)]
pub struct StaticCredentialsProvider(AwsCredentials);

impl StaticCredentialsProvider {
    /// Wraps a fixed pair.
    pub fn new(credentials: AwsCredentials) -> Self {
        Self(credentials)
    }
}

#[async_trait]
impl CredentialsProvider for StaticCredentialsProvider {
    async fn get_credentials(&self) -> Result<AwsCredentials, S3Error> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
