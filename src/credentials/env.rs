//! Environment variable credentials provider.

use super::{AwsCredentials, CredentialsProvider};
use crate::error::{CredentialsError, S3Error};
use async_trait::async_trait;
use std::env;

/// Access key ID variable.
pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
/// Secret access key variable.
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
/// Optional session token variable.
pub const AWS_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";

/// Credentials provider that reads from environment variables.
///
/// Variables are read on every call, so rotating them does not need a
/// restart. When they are absent and a fallback is configured, the fallback
/// is returned instead of an error.
#[derive(Debug, Clone, Default)]
pub struct EnvCredentialsProvider {
    access_key_var: Option<String>,
    secret_key_var: Option<String>,
    session_token_var: Option<String>,
    fallback: Option<AwsCredentials>,
}

impl EnvCredentialsProvider {
    /// Create a provider reading the standard `AWS_*` variables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider with custom variable names.
    pub fn with_vars(
        access_key_var: impl Into<String>,
        secret_key_var: impl Into<String>,
        session_token_var: Option<String>,
    ) -> Self {
        Self {
            access_key_var: Some(access_key_var.into()),
            secret_key_var: Some(secret_key_var.into()),
            session_token_var,
            fallback: None,
        }
    }

    /// Credentials to use when the access key variable is not set.
    pub fn with_fallback(mut self, credentials: AwsCredentials) -> Self {
        self.fallback = Some(credentials);
        self
    }

    fn access_key_var(&self) -> &str {
        self.access_key_var.as_deref().unwrap_or(AWS_ACCESS_KEY_ID)
    }

    fn secret_key_var(&self) -> &str {
        self.secret_key_var
            .as_deref()
            .unwrap_or(AWS_SECRET_ACCESS_KEY)
    }

    fn session_token_var(&self) -> &str {
        self.session_token_var
            .as_deref()
            .unwrap_or(AWS_SESSION_TOKEN)
    }

    fn read(&self) -> Result<AwsCredentials, S3Error> {
        let access_key_id = match env::var(self.access_key_var()) {
            Ok(value) => value,
            Err(_) => {
                return self
                    .fallback
                    .clone()
                    .ok_or_else(|| S3Error::Credentials(CredentialsError::NotFound))
            }
        };

        if access_key_id.is_empty() {
            return Err(S3Error::Credentials(CredentialsError::Invalid {
                message: format!("{} is empty", self.access_key_var()),
            }));
        }

        let secret_access_key = env::var(self.secret_key_var())
            .map_err(|_| S3Error::Credentials(CredentialsError::NotFound))?;

        if secret_access_key.is_empty() {
            return Err(S3Error::Credentials(CredentialsError::Invalid {
                message: format!("{} is empty", self.secret_key_var()),
            }));
        }

        let session_token = env::var(self.session_token_var())
            .ok()
            .filter(|s| !s.is_empty());

        let credentials = AwsCredentials::new(access_key_id, secret_access_key);
        Ok(match session_token {
            Some(token) => credentials.with_session_token(token),
            None => credentials,
        })
    }
}

#[async_trait]
impl CredentialsProvider for EnvCredentialsProvider {
    async fn get_credentials(&self) -> Result<AwsCredentials, S3Error> {
        self.read()
    }

    fn name(&self) -> &'static str {
        "environment"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test uses its own variable names so parallel tests do not race.
    fn provider(prefix: &str) -> EnvCredentialsProvider {
        EnvCredentialsProvider::with_vars(
            format!("{prefix}_ACCESS"),
            format!("{prefix}_SECRET"),
            Some(format!("{prefix}_TOKEN")),
        )
    }

    #[test]
    fn test_env_provider_success() {
        env::set_var("S3B_CRED_OK_ACCESS", "AKID");
        env::set_var("S3B_CRED_OK_SECRET", "SECRET");

        let creds = provider("S3B_CRED_OK").read().unwrap();
        assert_eq!(creds.access_key_id(), "AKID");
        assert_eq!(creds.secret_access_key(), "SECRET");
        assert!(creds.session_token().is_none());
    }

    #[test]
    fn test_env_provider_with_session_token() {
        env::set_var("S3B_CRED_TOK_ACCESS", "AKID");
        env::set_var("S3B_CRED_TOK_SECRET", "SECRET");
        env::set_var("S3B_CRED_TOK_TOKEN", "TOKEN");

        let creds = provider("S3B_CRED_TOK").read().unwrap();
        assert_eq!(creds.session_token(), Some("TOKEN"));
    }

    #[test]
    fn test_env_provider_missing_without_fallback() {
        let result = provider("S3B_CRED_NONE").read();
        assert!(matches!(
            result,
            Err(S3Error::Credentials(CredentialsError::NotFound))
        ));
    }

    #[test]
    fn test_env_provider_missing_uses_fallback() {
        let creds = provider("S3B_CRED_FALLBACK")
            .with_fallback(AwsCredentials::new("test", "test"))
            .read()
            .unwrap();
        assert_eq!(creds.access_key_id(), "test");
    }

    #[test]
    fn test_env_provider_empty_access_key() {
        env::set_var("S3B_CRED_EMPTY_ACCESS", "");
        env::set_var("S3B_CRED_EMPTY_SECRET", "SECRET");

        let result = provider("S3B_CRED_EMPTY")
            .with_fallback(AwsCredentials::new("test", "test"))
            .read();
        assert!(matches!(
            result,
            Err(S3Error::Credentials(CredentialsError::Invalid { .. }))
        ));
    }

    #[tokio::test]
    async fn test_env_provider_trait() {
        let provider =
            provider("S3B_CRED_TRAIT").with_fallback(AwsCredentials::new("local", "local"));
        let creds = provider.get_credentials().await.unwrap();
        assert_eq!(creds.access_key_id(), "local");
        assert_eq!(provider.name(), "environment");
    }
}
