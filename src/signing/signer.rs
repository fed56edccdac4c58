//! Request signer.

use super::*;
use crate::credentials::CredentialsProvider;
use crate::error::S3Error;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

/// Headers produced by signing, ready to attach to the outgoing request.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    /// HTTP method.
    pub method: String,
    /// Full URL including query string.
    pub url: Url,
    /// Caller headers merged with the signing headers.
    pub headers: HashMap<String, String>,
}

/// Signs outgoing store requests.
#[async_trait]
pub trait AwsSigner: Send + Sync {
    /// Sign a request with AWS Signature V4.
    async fn sign(
        &self,
        method: &str,
        url: &Url,
        headers: &HashMap<String, String>,
        body: Option<&[u8]>,
    ) -> Result<SignedRequest, S3Error>;
}

/// AWS Signature V4 signer.
pub struct AwsSignerV4 {
    credentials_provider: Arc<dyn CredentialsProvider>,
    region: String,
    service: String,
}

impl AwsSignerV4 {
    /// Create a signer for S3 in `region`.
    pub fn new(credentials_provider: Arc<dyn CredentialsProvider>, region: impl Into<String>) -> Self {
        Self {
            credentials_provider,
            region: region.into(),
            service: S3_SERVICE.to_string(),
        }
    }

    fn host_header(url: &Url) -> Result<String, SigningError> {
        let host = url.host_str().ok_or_else(|| SigningError::InvalidUrl {
            message: format!("URL has no host: {}", url),
        })?;
        Ok(match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        })
    }
}

#[async_trait]
impl AwsSigner for AwsSignerV4 {
    async fn sign(
        &self,
        method: &str,
        url: &Url,
        headers: &HashMap<String, String>,
        body: Option<&[u8]>,
    ) -> Result<SignedRequest, S3Error> {
        let credentials = self.credentials_provider.get_credentials().await?;
        let timestamp = Utc::now();
        let payload_hash = sha256_hex(body.unwrap_or_default());

        let mut final_headers: HashMap<String, String> = headers
            .iter()
            .filter(|(name, _)| {
                !matches!(
                    name.to_ascii_lowercase().as_str(),
                    "host" | "x-amz-date" | "x-amz-content-sha256" | "authorization"
                )
            })
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        final_headers.insert("host".to_string(), Self::host_header(url)?);
        final_headers.insert("x-amz-date".to_string(), format_datetime(&timestamp));
        final_headers.insert("x-amz-content-sha256".to_string(), payload_hash.clone());
        if let Some(token) = credentials.session_token() {
            final_headers.insert("x-amz-security-token".to_string(), token.to_string());
        }

        let signing_headers: Vec<(String, String)> = final_headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        let authorization = sign_request(
            &SigningParams {
                method,
                path: url.path(),
                query: url.query().unwrap_or(""),
                headers: &signing_headers,
                payload_hash: &payload_hash,
                region: &self.region,
                service: &self.service,
                timestamp: &timestamp,
            },
            &credentials,
        )?;

        final_headers.insert("authorization".to_string(), authorization);

        Ok(SignedRequest {
            method: method.to_string(),
            url: url.clone(),
            headers: final_headers,
        })
    }
}

impl std::fmt::Debug for AwsSignerV4 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsSignerV4")
            .field("credentials_provider", &self.credentials_provider.name())
            .field("region", &self.region)
            .field("service", &self.service)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{AwsCredentials, StaticCredentialsProvider};

    fn signer(credentials: AwsCredentials) -> AwsSignerV4 {
        AwsSignerV4::new(
            Arc::new(StaticCredentialsProvider::new(credentials)),
            "us-east-1",
        )
    }

    #[tokio::test]
    async fn test_sign_adds_required_headers() {
        let signer = signer(AwsCredentials::new("AKID", "SECRET"));
        let url = Url::parse("http://localhost:4566/docs/a%20b.txt").unwrap();

        let signed = signer
            .sign("PUT", &url, &HashMap::new(), Some(b"hello"))
            .await
            .unwrap();

        assert_eq!(signed.headers.get("host").unwrap(), "localhost:4566");
        assert_eq!(
            signed.headers.get("x-amz-content-sha256").unwrap(),
            &sha256_hex(b"hello")
        );
        assert!(signed.headers.contains_key("x-amz-date"));
        let auth = signed.headers.get("authorization").unwrap();
        assert!(auth.starts_with("AWS4-HMAC-SHA256 Credential=AKID/"));
        assert!(auth.contains("/us-east-1/s3/aws4_request"));
    }

    #[tokio::test]
    async fn test_sign_includes_session_token_in_signed_headers() {
        let signer = signer(AwsCredentials::new("AKID", "SECRET").with_session_token("TOKEN"));
        let url = Url::parse("https://s3.amazonaws.com/bucket").unwrap();

        let signed = signer.sign("GET", &url, &HashMap::new(), None).await.unwrap();

        assert_eq!(signed.headers.get("x-amz-security-token").unwrap(), "TOKEN");
        assert!(signed
            .headers
            .get("authorization")
            .unwrap()
            .contains("x-amz-security-token"));
    }

    #[tokio::test]
    async fn test_sign_keeps_caller_headers() {
        let signer = signer(AwsCredentials::new("AKID", "SECRET"));
        let url = Url::parse("http://localhost:4566/docs/report.pdf").unwrap();
        let mut headers = HashMap::new();
        headers.insert("x-amz-meta-owner".to_string(), "ops".to_string());
        headers.insert("Host".to_string(), "spoofed".to_string());

        let signed = signer.sign("PUT", &url, &headers, Some(b"")).await.unwrap();

        assert_eq!(signed.headers.get("x-amz-meta-owner").unwrap(), "ops");
        assert!(!signed.headers.contains_key("Host"));
        assert!(signed
            .headers
            .get("authorization")
            .unwrap()
            .contains("x-amz-meta-owner"));
    }
}
