//! Object store client.
//!
//! [`ObjectStore`] is the seam the operations layer talks through.
//! [`S3Client`] implements it against a real S3-compatible endpoint;
//! `mocks::InMemoryStore` implements it for tests.

use crate::config::S3Config;
use crate::error::S3Error;
use crate::services::{BucketsService, ObjectsService};
use crate::signing::{AwsSigner, AwsSignerV4};
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::types::*;
use async_trait::async_trait;
use std::sync::Arc;

/// The store operations the browser needs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List all buckets.
    async fn list_buckets(&self) -> Result<ListBucketsOutput, S3Error>;

    /// Create a bucket.
    async fn create_bucket(
        &self,
        request: CreateBucketRequest,
    ) -> Result<CreateBucketOutput, S3Error>;

    /// Delete an empty bucket.
    async fn delete_bucket(&self, request: DeleteBucketRequest) -> Result<(), S3Error>;

    /// List one page of objects.
    async fn list_objects(
        &self,
        request: ListObjectsV2Request,
    ) -> Result<ListObjectsV2Output, S3Error>;

    /// Fetch object metadata.
    async fn head_object(&self, request: HeadObjectRequest) -> Result<HeadObjectOutput, S3Error>;

    /// Fetch an object.
    async fn get_object(&self, request: GetObjectRequest) -> Result<GetObjectOutput, S3Error>;

    /// Store an object.
    async fn put_object(&self, request: PutObjectRequest) -> Result<PutObjectOutput, S3Error>;

    /// Delete an object. Missing keys are not an error.
    async fn delete_object(
        &self,
        request: DeleteObjectRequest,
    ) -> Result<DeleteObjectOutput, S3Error>;

    /// Copy an object server-side.
    async fn copy_object(&self, request: CopyObjectRequest) -> Result<CopyObjectOutput, S3Error>;
}

/// Client for an S3-compatible endpoint.
pub struct S3Client {
    config: Arc<S3Config>,
    objects: ObjectsService,
    buckets: BucketsService,
}

impl S3Client {
    /// Create a client that signs with SigV4 and sends through `transport`.
    pub fn new(config: S3Config, transport: Arc<dyn HttpTransport>) -> Self {
        let signer: Arc<dyn AwsSigner> = Arc::new(AwsSignerV4::new(
            config.credentials_provider.clone(),
            config.region.clone(),
        ));
        Self::with_signer(config, transport, signer)
    }

    /// Create a client with an explicit signer.
    pub fn with_signer(
        config: S3Config,
        transport: Arc<dyn HttpTransport>,
        signer: Arc<dyn AwsSigner>,
    ) -> Self {
        let config = Arc::new(config);
        Self {
            objects: ObjectsService::new(config.clone(), transport.clone(), signer.clone()),
            buckets: BucketsService::new(config.clone(), transport, signer),
            config,
        }
    }

    /// Create a client builder.
    pub fn builder() -> S3ClientBuilder {
        S3ClientBuilder::new()
    }

    /// Object operations.
    pub fn objects(&self) -> &ObjectsService {
        &self.objects
    }

    /// Bucket operations.
    pub fn buckets(&self) -> &BucketsService {
        &self.buckets
    }

    /// Client configuration.
    pub fn config(&self) -> &S3Config {
        &self.config
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn list_buckets(&self) -> Result<ListBucketsOutput, S3Error> {
        self.buckets.list().await
    }

    async fn create_bucket(
        &self,
        request: CreateBucketRequest,
    ) -> Result<CreateBucketOutput, S3Error> {
        self.buckets.create(request).await
    }

    async fn delete_bucket(&self, request: DeleteBucketRequest) -> Result<(), S3Error> {
        self.buckets.delete(request).await
    }

    async fn list_objects(
        &self,
        request: ListObjectsV2Request,
    ) -> Result<ListObjectsV2Output, S3Error> {
        self.objects.list(request).await
    }

    async fn head_object(&self, request: HeadObjectRequest) -> Result<HeadObjectOutput, S3Error> {
        self.objects.head(request).await
    }

    async fn get_object(&self, request: GetObjectRequest) -> Result<GetObjectOutput, S3Error> {
        self.objects.get(request).await
    }

    async fn put_object(&self, request: PutObjectRequest) -> Result<PutObjectOutput, S3Error> {
        self.objects.put(request).await
    }

    async fn delete_object(
        &self,
        request: DeleteObjectRequest,
    ) -> Result<DeleteObjectOutput, S3Error> {
        self.objects.delete(request).await
    }

    async fn copy_object(&self, request: CopyObjectRequest) -> Result<CopyObjectOutput, S3Error> {
        self.objects.copy(request).await
    }
}

impl std::fmt::Debug for S3Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Client")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`S3Client`].
#[derive(Default)]
pub struct S3ClientBuilder {
    config: Option<S3Config>,
    from_env: bool,
    transport: Option<Arc<dyn HttpTransport>>,
    signer: Option<Arc<dyn AwsSigner>>,
}

impl S3ClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the provided configuration.
    pub fn config(mut self, config: S3Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Load configuration from environment variables.
    pub fn from_env(mut self) -> Self {
        self.from_env = true;
        self
    }

    /// Use a custom HTTP transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a custom signer.
    pub fn signer(mut self, signer: Arc<dyn AwsSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<S3Client, S3Error> {
        let config = match self.config {
            Some(config) => config,
            None if self.from_env => S3Config::builder().from_env().build()?,
            None => S3Config::default(),
        };

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::from_config(&config)?),
        };

        Ok(match self.signer {
            Some(signer) => S3Client::with_signer(config, transport, signer),
            None => S3Client::new(config, transport),
        })
    }
}

impl std::fmt::Debug for S3ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ClientBuilder")
            .field("config", &self.config)
            .field("from_env", &self.from_env)
            .finish_non_exhaustive()
    }
}
