//! Buckets service for bucket operations.

use super::{invocation_id, parse_error, INVOCATION_ID_HEADER};
use crate::config::{S3Config, DEFAULT_REGION};
use crate::error::S3Error;
use crate::signing::AwsSigner;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};
use crate::types::*;
use crate::xml;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Service for bucket operations.
pub struct BucketsService {
    config: Arc<S3Config>,
    transport: Arc<dyn HttpTransport>,
    signer: Arc<dyn AwsSigner>,
}

impl BucketsService {
    /// Create a new buckets service.
    pub fn new(
        config: Arc<S3Config>,
        transport: Arc<dyn HttpTransport>,
        signer: Arc<dyn AwsSigner>,
    ) -> Self {
        Self {
            config,
            transport,
            signer,
        }
    }

    /// Create a new bucket.
    pub async fn create(
        &self,
        request: CreateBucketRequest,
    ) -> Result<CreateBucketOutput, S3Error> {
        let url = self.config.build_url(Some(&request.bucket), None, &[])?;

        let region = self.config.region.as_str();

        let mut headers = HashMap::new();
        let body = if region != DEFAULT_REGION {
            headers.insert("content-type".to_string(), "application/xml".to_string());
            Some(Bytes::from(xml::build_create_bucket_xml(region)))
        } else {
            None
        };

        debug!(bucket = %request.bucket, region, "create bucket");

        let response = self.dispatch("PUT", &url, headers, body).await?;

        if !response.is_success() {
            return Err(parse_error(&response, Some(&request.bucket), None));
        }

        Ok(CreateBucketOutput {
            location: response.get_header("location").map(String::from),
            request_id: response.request_id().map(String::from),
        })
    }

    /// Delete an empty bucket.
    pub async fn delete(&self, request: DeleteBucketRequest) -> Result<(), S3Error> {
        let url = self.config.build_url(Some(&request.bucket), None, &[])?;

        debug!(bucket = %request.bucket, "delete bucket");

        let response = self.dispatch("DELETE", &url, HashMap::new(), None).await?;

        if !response.is_success() {
            return Err(parse_error(&response, Some(&request.bucket), None));
        }

        Ok(())
    }

    /// List all buckets owned by the caller.
    pub async fn list(&self) -> Result<ListBucketsOutput, S3Error> {
        let url = self.config.build_url(None, None, &[])?;

        let response = self.dispatch("GET", &url, HashMap::new(), None).await?;

        if !response.is_success() {
            return Err(parse_error(&response, None, None));
        }

        let body_str = String::from_utf8_lossy(&response.body);
        let mut output = xml::parse_list_buckets(&body_str)?;
        output.request_id = response.request_id().map(String::from);
        Ok(output)
    }

    async fn dispatch(
        &self,
        method: &str,
        url: &Url,
        mut headers: HashMap<String, String>,
        body: Option<Bytes>,
    ) -> Result<HttpResponse, S3Error> {
        headers.insert(INVOCATION_ID_HEADER.to_string(), invocation_id());

        let signed = self
            .signer
            .sign(method, url, &headers, body.as_deref())
            .await?;

        let mut http_request =
            HttpRequest::new(method, signed.url.as_str()).with_headers(signed.headers);
        if let Some(body) = body {
            http_request = http_request.with_body(body);
        }

        self.transport.send(http_request).await
    }
}

impl std::fmt::Debug for BucketsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BucketsService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BucketError;
    use crate::mocks::{MockResponse, MockSigner, MockTransport};

    fn service(region: &str, transport: Arc<MockTransport>) -> BucketsService {
        let config = S3Config::builder()
            .region(region)
            .endpoint("http://localhost:4566")
            .path_style(true)
            .build()
            .unwrap();
        BucketsService::new(Arc::new(config), transport, Arc::new(MockSigner::new()))
    }

    #[tokio::test]
    async fn test_create_in_default_region_has_no_body() {
        let transport = Arc::new(MockTransport::new());
        transport.queue_response(MockResponse::ok());
        let buckets = service("us-east-1", transport.clone());

        buckets.create(CreateBucketRequest::new("docs")).await.unwrap();

        let sent = transport.last_request().unwrap();
        assert_eq!(sent.method, "PUT");
        assert_eq!(sent.url, "http://localhost:4566/docs");
        assert!(sent.body.is_none());
    }

    #[tokio::test]
    async fn test_create_outside_default_region_sends_constraint() {
        let transport = Arc::new(MockTransport::new());
        transport.queue_response(MockResponse::ok());
        let buckets = service("eu-west-1", transport.clone());

        buckets.create(CreateBucketRequest::new("docs")).await.unwrap();

        let sent = transport.last_request().unwrap();
        let body = String::from_utf8(sent.body.clone().unwrap().to_vec()).unwrap();
        assert!(body.contains("<LocationConstraint>eu-west-1</LocationConstraint>"));
        assert_eq!(sent.get_header("content-type"), Some("application/xml"));
    }

    #[tokio::test]
    async fn test_create_existing_bucket() {
        let transport = Arc::new(MockTransport::new());
        transport.queue_response(MockResponse::status(409).with_body(
            "<Error><Code>BucketAlreadyOwnedByYou</Code><Message>x</Message></Error>",
        ));
        let buckets = service("us-east-1", transport);

        let err = buckets
            .create(CreateBucketRequest::new("docs"))
            .await
            .unwrap_err();
        match err {
            S3Error::Bucket(BucketError::AlreadyOwnedByYou { bucket, .. }) => {
                assert_eq!(bucket, "docs");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delete_non_empty_bucket() {
        let transport = Arc::new(MockTransport::new());
        transport.queue_response(MockResponse::status(409).with_body(
            "<Error><Code>BucketNotEmpty</Code><Message>x</Message></Error>",
        ));
        let buckets = service("us-east-1", transport);

        let err = buckets
            .delete(DeleteBucketRequest::new("docs"))
            .await
            .unwrap_err();
        assert!(matches!(err, S3Error::Bucket(BucketError::NotEmpty { .. })));
    }

    #[tokio::test]
    async fn test_list_buckets() {
        let transport = Arc::new(MockTransport::new());
        transport.queue_response(MockResponse::ok().with_body(
            "<ListAllMyBucketsResult><Buckets>\
             <Bucket><Name>docs</Name><CreationDate>2024-01-01T00:00:00.000Z</CreationDate></Bucket>\
             <Bucket><Name>media</Name><CreationDate>2024-02-01T00:00:00.000Z</CreationDate></Bucket>\
             </Buckets></ListAllMyBucketsResult>",
        ));
        let buckets = service("us-east-1", transport.clone());

        let output = buckets.list().await.unwrap();

        let names: Vec<_> = output.buckets.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["docs", "media"]);
        assert_eq!(transport.last_request().unwrap().url, "http://localhost:4566/");
    }
}
