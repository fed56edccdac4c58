//! Test doubles.
//!
//! [`MockTransport`] and [`MockSigner`] sit under the real client;
//! [`InMemoryStore`] replaces the client entirely.

mod signer;
mod store;
mod transport;

pub use signer::{MockSigner, MOCK_AMZ_DATE};
pub use store::InMemoryStore;
pub use transport::{MockResponse, MockTransport};

/// Canned S3 response bodies.
pub struct TestFixtures;

impl TestFixtures {
    /// A one-page ListObjectsV2 body under `reports/`, with one sub-folder.
    pub fn list_objects_xml() -> &'static str {
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
    <Name>docs</Name>
    <Prefix>reports/</Prefix>
    <Delimiter>/</Delimiter>
    <KeyCount>3</KeyCount>
    <MaxKeys>1000</MaxKeys>
    <IsTruncated>false</IsTruncated>
    <Contents>
        <Key>reports/q1.pdf</Key>
        <LastModified>2024-01-15T10:30:00.000Z</LastModified>
        <ETag>"abc123"</ETag>
        <Size>1024</Size>
        <StorageClass>STANDARD</StorageClass>
    </Contents>
    <Contents>
        <Key>reports/q2.pdf</Key>
        <LastModified>2024-04-15T10:30:00.000Z</LastModified>
        <ETag>"def456"</ETag>
        <Size>2048</Size>
        <StorageClass>STANDARD</StorageClass>
    </Contents>
    <CommonPrefixes>
        <Prefix>reports/2024/</Prefix>
    </CommonPrefixes>
</ListBucketResult>"#
    }

    /// A ListBuckets body with two buckets.
    pub fn list_buckets_xml() -> &'static str {
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ListAllMyBucketsResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
    <Owner>
        <ID>owner-id</ID>
        <DisplayName>Owner Name</DisplayName>
    </Owner>
    <Buckets>
        <Bucket>
            <Name>docs</Name>
            <CreationDate>2024-01-01T00:00:00.000Z</CreationDate>
        </Bucket>
        <Bucket>
            <Name>media</Name>
            <CreationDate>2024-01-02T00:00:00.000Z</CreationDate>
        </Bucket>
    </Buckets>
</ListAllMyBucketsResult>"#
    }

    /// An S3 error document.
    pub fn error_xml(code: &str, message: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<Error>
    <Code>{}</Code>
    <Message>{}</Message>
    <RequestId>test-request-id</RequestId>
</Error>"#,
            code, message
        )
    }
}
