//! Header sanitation for inbound events.
//!
//! Gateway events carry headers as a plain JSON object. Before they reach the
//! function they are validated and normalized into an [`http::HeaderMap`].
//! Values must be visible ASCII, space or horizontal tab; anything else
//! (non-ASCII text, control characters) fails the whole invocation with
//! [`AdapterError::MalformedHeader`].

use crate::error::AdapterError;
use http::{HeaderMap, HeaderName, HeaderValue};
use std::collections::{BTreeMap, HashMap};

/// Validates raw event headers and converts them into a [`HeaderMap`].
///
/// Header names are lower-cased. Nothing about the offending header is
/// reported beyond the error itself.
pub fn sanitize_headers(raw: &HashMap<String, String>) -> Result<HeaderMap, AdapterError> {
    let mut headers = HeaderMap::with_capacity(raw.len());

    for (name, value) in raw {
        let name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|_| AdapterError::MalformedHeader)?;
        headers.append(name, sanitize_value(value)?);
    }

    Ok(headers)
}

/// Validates a single header value.
pub fn sanitize_value(value: &str) -> Result<HeaderValue, AdapterError> {
    if !value.bytes().all(is_clean_value_byte) {
        return Err(AdapterError::MalformedHeader);
    }
    HeaderValue::from_str(value).map_err(|_| AdapterError::MalformedHeader)
}

/// Renders a header map as a stable plain mapping.
///
/// Repeated headers are joined with `", "`. Values that are not valid
/// UTF-8 are converted lossily.
pub fn plain_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut plain: BTreeMap<String, String> = BTreeMap::new();

    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        plain
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }

    plain
}

/// Replaces every character that may not appear in a header value with a
/// space, so arbitrary messages can be reported in `x-error`.
pub fn cleanup_header_value(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii() && is_clean_value_byte(c as u8) {
                c
            } else {
                ' '
            }
        })
        .collect()
}

fn is_clean_value_byte(b: u8) -> bool {
    b == b'\t' || (0x20..0x7f).contains(&b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_sanitize_lowercases_names() {
        let headers = sanitize_headers(&raw(&[
            ("Content-Type", "application/json"),
            ("X-Forwarded-Proto", "https"),
        ]))
        .unwrap();

        assert_eq!(headers.get("content-type").unwrap(), "application/json");
        assert!(headers.keys().all(|k| k.as_str() == k.as_str().to_lowercase()));
    }

    #[test]
    fn test_sanitize_rejects_non_ascii_value() {
        let result = sanitize_headers(&raw(&[
            ("host", "kvvyh7ikcb.execute-api.us-east-1.amazonaws.com"),
            ("accept", "жsome value"),
        ]));

        assert!(matches!(result, Err(AdapterError::MalformedHeader)));
    }

    #[test]
    fn test_sanitize_rejects_control_characters() {
        let result = sanitize_headers(&raw(&[("x-custom", "line\r\nbreak")]));
        assert!(matches!(result, Err(AdapterError::MalformedHeader)));
    }

    #[test]
    fn test_sanitize_rejects_invalid_name() {
        let result = sanitize_headers(&raw(&[("bad header", "value")]));
        assert!(matches!(result, Err(AdapterError::MalformedHeader)));
    }

    #[test]
    fn test_sanitize_allows_tabs_and_spaces() {
        let headers = sanitize_headers(&raw(&[("x-list", "a,\tb, c")])).unwrap();
        assert_eq!(headers.get("x-list").unwrap(), "a,\tb, c");
    }

    #[test]
    fn test_plain_headers_joins_repeated_values() {
        let mut headers = HeaderMap::new();
        headers.append("accept", HeaderValue::from_static("text/html"));
        headers.append("accept", HeaderValue::from_static("application/json"));
        headers.append("host", HeaderValue::from_static("example.com"));

        let plain = plain_headers(&headers);

        assert_eq!(plain["accept"], "text/html, application/json");
        assert_eq!(plain["host"], "example.com");
    }

    #[test]
    fn test_cleanup_header_value() {
        assert_eq!(cleanup_header_value("function kaput"), "function kaput");
        assert_eq!(cleanup_header_value("line\nbreak"), "line break");
        assert_eq!(cleanup_header_value("naïve"), "na ve");
    }
}
