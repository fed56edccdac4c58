//! Query string access.
//!
//! Parameters are read from the raw query so repeated keys (`keys=a&keys=b`)
//! survive and missing values turn into JSON validation errors instead of
//! extractor rejections.

use crate::error::ApiError;

/// Decoded query parameters in request order.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Decode a raw query string. `None` gives an empty set.
    pub fn parse(raw: Option<&str>) -> Self {
        let pairs = raw
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default();
        Self { pairs }
    }

    /// First value of `name`, if present and not blank.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, v)| k == name && !v.trim().is_empty())
            .map(|(_, v)| v.as_str())
    }

    /// First value of `name`, kept even when empty.
    pub fn get_raw(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every value of `name`, in order.
    pub fn all(&self, name: &str) -> Vec<String> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
            .collect()
    }

    /// First value of `name`, or a validation error.
    pub fn required(&self, name: &str) -> Result<&str, ApiError> {
        self.get(name)
            .ok_or_else(|| ApiError::validation(format!("Missing required parameter: {}", name)))
    }

    /// Bucket named by `name`, falling back to `default`.
    pub fn bucket(&self, name: &str, default: Option<&str>) -> Result<String, ApiError> {
        self.get(name)
            .or(default)
            .map(String::from)
            .ok_or_else(|| ApiError::validation(format!("Missing required parameter: {}", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_keys_keep_order() {
        let params = QueryParams::parse(Some("bucket=docs&keys=dir%2Fa.txt&keys=b+c.txt"));
        assert_eq!(params.get("bucket"), Some("docs"));
        assert_eq!(params.all("keys"), vec!["dir/a.txt", "b c.txt"]);
    }

    #[test]
    fn test_blank_values_are_missing() {
        let params = QueryParams::parse(Some("bucket=&path="));
        assert!(params.get("bucket").is_none());
        assert_eq!(params.get_raw("path"), Some(""));
        assert!(matches!(
            params.required("bucket"),
            Err(ApiError::Validation { .. })
        ));
    }

    #[test]
    fn test_bucket_falls_back_to_default() {
        let params = QueryParams::parse(None);
        assert_eq!(params.bucket("bucket", Some("main")).unwrap(), "main");
        assert!(params.bucket("bucket", None).is_err());
    }
}
