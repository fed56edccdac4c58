//! Canonical request building for AWS Signature V4.
//!
//! Paths are encoded once, when the request URL is built, and the canonical
//! request reuses that encoding verbatim. S3 does not double-encode paths.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::{BTreeMap, BTreeSet};

/// Unreserved characters plus `/`, left alone in object key paths.
const URI_PATH_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Unreserved characters, left alone in query keys and values.
const QUERY_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// URI-encode an object key for use in a request path. `/` is preserved.
pub fn uri_encode_path(path: &str) -> String {
    utf8_percent_encode(path, URI_PATH_SET).to_string()
}

/// URI-encode a query parameter name or value.
pub fn uri_encode_query(value: &str) -> String {
    utf8_percent_encode(value, QUERY_SET).to_string()
}

/// Build the canonical URI from an already-encoded path.
pub fn build_canonical_uri(path: &str) -> String {
    if path.is_empty() {
        "/".to_string()
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// Build the canonical query string.
///
/// Each pair is decoded and re-encoded with the strict unreserved set, then
/// sorted by name and value.
pub fn build_canonical_query_string(query_string: &str) -> String {
    let mut params: Vec<(String, String)> = query_string
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (reencode(key), reencode(value))
        })
        .collect();

    params.sort();

    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

fn reencode(component: &str) -> String {
    let decoded = percent_decode_str(component).decode_utf8_lossy();
    uri_encode_query(&decoded)
}

/// Build the canonical headers block.
///
/// Names are lowercased and sorted, values trimmed with inner whitespace
/// collapsed, repeated headers comma-joined.
pub fn build_canonical_headers(headers: &[(String, String)]) -> String {
    let mut header_map: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for (name, value) in headers {
        let name_lower = name.to_ascii_lowercase();
        if !super::should_sign_header(&name_lower) {
            continue;
        }

        let trimmed = value.split_whitespace().collect::<Vec<_>>().join(" ");
        header_map.entry(name_lower).or_default().push(trimmed);
    }

    header_map
        .iter()
        .map(|(name, values)| format!("{}:{}\n", name, values.join(",")))
        .collect()
}

/// Semicolon-separated, sorted list of signed header names.
pub fn build_signed_headers(headers: &[(String, String)]) -> String {
    headers
        .iter()
        .map(|(name, _)| name.to_ascii_lowercase())
        .filter(|name| super::should_sign_header(name))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>()
        .join(";")
}

/// Build the canonical request string.
///
/// ```text
/// HTTPMethod\n
/// CanonicalURI\n
/// CanonicalQueryString\n
/// CanonicalHeaders\n
/// SignedHeaders\n
/// HashedPayload
/// ```
pub fn build_canonical_request(
    method: &str,
    path: &str,
    query_string: &str,
    headers: &[(String, String)],
    payload_hash: &str,
) -> String {
    format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        method.to_ascii_uppercase(),
        build_canonical_uri(path),
        build_canonical_query_string(query_string),
        build_canonical_headers(headers),
        build_signed_headers(headers),
        payload_hash
    )
}
