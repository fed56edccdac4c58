//! AWS Signature Version 4.
//!
//! S3-compatible stores (AWS, MinIO, LocalStack, Ceph) all authenticate
//! with SigV4. Only header-based signing with a hashed payload is
//! implemented; presigned URLs and chunked payload signing are not needed
//! by the browser.

mod canonical;
mod signer;

pub use canonical::{uri_encode_path, uri_encode_query};
pub use signer::{AwsSigner, AwsSignerV4, SignedRequest};

use crate::credentials::AwsCredentials;
use crate::error::SigningError;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// AWS Signature V4 algorithm identifier.
pub const AWS_ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Service name for S3.
pub const S3_SERVICE: &str = "s3";

/// Calculate SHA-256 hash of data as lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Calculate HMAC-SHA256.
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, SigningError> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| SigningError::CalculationFailed {
            message: e.to_string(),
        })?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Derive the signing key.
///
/// kDate = HMAC("AWS4" + SecretKey, Date)
/// kRegion = HMAC(kDate, Region)
/// kService = HMAC(kRegion, Service)
/// kSigning = HMAC(kService, "aws4_request")
pub fn derive_signing_key(
    secret_key: &str,
    date_stamp: &str,
    region: &str,
    service: &str,
) -> Result<Vec<u8>, SigningError> {
    let k_secret = format!("AWS4{}", secret_key);
    let k_date = hmac_sha256(k_secret.as_bytes(), date_stamp.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

/// Build the credential scope string: `{date}/{region}/{service}/aws4_request`.
pub fn build_credential_scope(date_stamp: &str, region: &str, service: &str) -> String {
    format!("{}/{}/{}/aws4_request", date_stamp, region, service)
}

/// Format a timestamp as `YYYYMMDD'T'HHMMSS'Z'`.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Format a date stamp as `YYYYMMDD`.
pub fn format_date_stamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%d").to_string()
}

/// Check if a header takes part in the signature.
pub fn should_sign_header(header_name: &str) -> bool {
    let name = header_name.to_ascii_lowercase();
    name == "host"
        || name.starts_with("x-amz-")
        || name == "content-type"
        || name == "content-md5"
        || name == "if-none-match"
}

/// Inputs for one signature computation.
#[derive(Debug)]
pub struct SigningParams<'a> {
    /// HTTP method.
    pub method: &'a str,
    /// Already-encoded absolute path.
    pub path: &'a str,
    /// Raw query string without the leading `?`.
    pub query: &'a str,
    /// Headers to consider for signing.
    pub headers: &'a [(String, String)],
    /// Hex SHA-256 of the body.
    pub payload_hash: &'a str,
    /// Region the request is scoped to.
    pub region: &'a str,
    /// Service the request is scoped to.
    pub service: &'a str,
    /// Signing time.
    pub timestamp: &'a DateTime<Utc>,
}

/// Sign a request and return the Authorization header value.
pub fn sign_request(
    params: &SigningParams<'_>,
    credentials: &AwsCredentials,
) -> Result<String, SigningError> {
    let date_stamp = format_date_stamp(params.timestamp);
    let amz_date = format_datetime(params.timestamp);

    let canonical_request = canonical::build_canonical_request(
        params.method,
        params.path,
        params.query,
        params.headers,
        params.payload_hash,
    );

    let credential_scope = build_credential_scope(&date_stamp, params.region, params.service);

    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        AWS_ALGORITHM,
        amz_date,
        credential_scope,
        sha256_hex(canonical_request.as_bytes())
    );

    let signing_key = derive_signing_key(
        credentials.secret_access_key(),
        &date_stamp,
        params.region,
        params.service,
    )?;
    let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes())?);

    Ok(format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        AWS_ALGORITHM,
        credentials.access_key_id(),
        credential_scope,
        canonical::build_signed_headers(params.headers),
        signature
    ))
}
