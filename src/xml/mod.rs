//! XML bodies exchanged with the store.
//!
//! Every parser is a visitor over [`walk`], which reports each element and
//! text node together with the path of element names leading to it.
//! Elements a parser does not name are ignored, so the extra fields some
//! S3-compatible stores add are harmless. Text is kept verbatim: keys may
//! start or end with spaces, and indentation between elements only reaches
//! paths no parser matches.

use crate::error::{ResponseError, S3Error, S3ErrorResponse};
use crate::types::*;
use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;

enum Node<'a> {
    Open(&'a [&'a str]),
    Text(&'a [&'a str], String),
    Close(&'a [&'a str]),
}

fn xml_error(e: impl std::fmt::Display) -> S3Error {
    ResponseError::XmlParseError {
        message: e.to_string(),
    }
    .into()
}

fn walk(xml: &str, mut visit: impl FnMut(Node<'_>)) -> Result<(), S3Error> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<String> = Vec::new();

    loop {
        let event = reader.read_event().map_err(xml_error)?;
        match event {
            Event::Start(e) => {
                stack.push(String::from_utf8_lossy(e.name().as_ref()).into_owned());
                let path: Vec<&str> = stack.iter().map(String::as_str).collect();
                visit(Node::Open(&path));
            }
            Event::Text(e) => {
                let text = e.unescape().map_err(xml_error)?.into_owned();
                let path: Vec<&str> = stack.iter().map(String::as_str).collect();
                visit(Node::Text(&path, text));
            }
            Event::End(_) => {
                let path: Vec<&str> = stack.iter().map(String::as_str).collect();
                visit(Node::Close(&path));
                stack.pop();
            }
            Event::Eof => return Ok(()),
            _ => {}
        }
    }
}

/// Parse an ISO 8601 timestamp as used in listing bodies.
pub fn parse_iso8601(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Read an `<Error>` document.
pub fn parse_error_response(xml: &str) -> Result<S3ErrorResponse, S3Error> {
    let mut out = S3ErrorResponse::default();
    walk(xml, |node| {
        if let Node::Text([_, field], text) = node {
            match *field {
                "Code" => out.code = text,
                "Message" => out.message = text,
                "BucketName" | "Bucket" => out.bucket = Some(text),
                "Key" => out.key = Some(text),
                "RequestId" => out.request_id = Some(text),
                "HostId" => out.host_id = Some(text),
                _ => {}
            }
        }
    })?;
    Ok(out)
}

/// Read one `<ListBucketResult>` page.
pub fn parse_list_objects_v2(xml: &str) -> Result<ListObjectsV2Output, S3Error> {
    let mut out = ListObjectsV2Output::default();
    let mut object: Option<S3Object> = None;

    walk(xml, |node| match node {
        Node::Open([_, "Contents"]) => {
            object = Some(S3Object {
                key: String::new(),
                last_modified: None,
                e_tag: None,
                size: 0,
                storage_class: None,
            })
        }
        Node::Close([_, "Contents"]) => out.contents.extend(object.take()),
        Node::Text([_, "Contents", field], text) => {
            let Some(obj) = object.as_mut() else { return };
            match *field {
                "Key" => obj.key = text,
                "LastModified" => obj.last_modified = parse_iso8601(&text),
                "ETag" => obj.e_tag = Some(text),
                "Size" => obj.size = text.parse().unwrap_or_default(),
                "StorageClass" => obj.storage_class = Some(text),
                _ => {}
            }
        }
        Node::Text([_, "CommonPrefixes", "Prefix"], text) => out.common_prefixes.push(text),
        Node::Text([_, field], text) => match *field {
            "Name" => out.name = Some(text),
            "Prefix" => out.prefix = Some(text),
            "Delimiter" => out.delimiter = Some(text),
            "MaxKeys" => out.max_keys = text.parse().ok(),
            "KeyCount" => out.key_count = text.parse().ok(),
            "IsTruncated" => out.is_truncated = text == "true",
            "NextContinuationToken" => out.next_continuation_token = Some(text),
            "ContinuationToken" => out.continuation_token = Some(text),
            _ => {}
        },
        _ => {}
    })?;
    Ok(out)
}

/// Read a `<ListAllMyBucketsResult>`.
pub fn parse_list_buckets(xml: &str) -> Result<ListBucketsOutput, S3Error> {
    let mut out = ListBucketsOutput::default();
    let mut bucket: Option<Bucket> = None;

    walk(xml, |node| match node {
        Node::Open([_, "Buckets", "Bucket"]) => bucket = Some(Bucket::new(String::new())),
        Node::Close([_, "Buckets", "Bucket"]) => out.buckets.extend(bucket.take()),
        Node::Text([_, "Buckets", "Bucket", field], text) => {
            if let Some(b) = bucket.as_mut() {
                match *field {
                    "Name" => b.name = text,
                    "CreationDate" => b.creation_date = parse_iso8601(&text),
                    _ => {}
                }
            }
        }
        _ => {}
    })?;
    Ok(out)
}

/// Read a `<CopyObjectResult>`.
pub fn parse_copy_object_result(xml: &str) -> Result<CopyObjectOutput, S3Error> {
    let mut out = CopyObjectOutput::default();
    walk(xml, |node| match node {
        Node::Text([_, "ETag"], text) => out.e_tag = Some(text),
        Node::Text([_, "LastModified"], text) => out.last_modified = parse_iso8601(&text),
        _ => {}
    })?;
    Ok(out)
}

/// `CreateBucketConfiguration` body, needed outside `us-east-1`.
pub fn build_create_bucket_xml(region: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<CreateBucketConfiguration xmlns="http://s3.amazonaws.com/doc/2006-03-01/">"#,
            "<LocationConstraint>{}</LocationConstraint>",
            "</CreateBucketConfiguration>",
        ),
        escape_xml(region)
    )
}

fn escape_xml(s: &str) -> String {
    s.chars().fold(String::with_capacity(s.len()), |mut out, c| {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
        out
    })
}
