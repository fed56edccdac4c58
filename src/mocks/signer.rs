//! Signer stand-in for transport-level tests.

use crate::error::S3Error;
use crate::signing::{AwsSigner, SignedRequest};
use async_trait::async_trait;
use std::collections::HashMap;
use url::Url;

/// Fixed `x-amz-date` stamped on every request.
pub const MOCK_AMZ_DATE: &str = "20240115T100000Z";

/// Adds placeholder auth headers so requests look signed.
///
/// Lets tests assert on exact header sets without a clock or real keys.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockSigner;

impl MockSigner {
    /// Same as `MockSigner`.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AwsSigner for MockSigner {
    async fn sign(
        &self,
        method: &str,
        url: &Url,
        headers: &HashMap<String, String>,
        _body: Option<&[u8]>,
    ) -> Result<SignedRequest, S3Error> {
        let stamped = [
            ("authorization", "AWS4-HMAC-SHA256 Credential=mock"),
            ("x-amz-date", MOCK_AMZ_DATE),
            ("x-amz-content-sha256", "UNSIGNED-PAYLOAD"),
        ];
        let mut headers = headers.clone();
        headers.extend(
            stamped
                .into_iter()
                .map(|(name, value)| (name.to_string(), value.to_string())),
        );

        Ok(SignedRequest {
            method: method.to_string(),
            url: url.clone(),
            headers,
        })
    }
}
