//! Encoding of function responses into the platform output envelope.

use crate::config::ResponseConfig;
use crate::headers::{cleanup_header_value, plain_headers};
use aws_lambda_events::encodings::Body;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Normalized response returned by the function.
pub type Response = http::Response<Body>;

const DEFAULT_TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
const ERROR_CONTENT_TYPE: &str = "text/plain";
const ERROR_HEADER: &str = "x-error";

/// The wire shape returned to the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputEnvelope {
    /// HTTP status code.
    pub status_code: u16,
    /// Response headers with lower-cased names.
    pub headers: BTreeMap<String, String>,
    /// Body as text, or base64 when `is_base64_encoded` is set.
    pub body: String,
    /// Whether `body` holds base64-encoded bytes.
    pub is_base64_encoded: bool,
}

/// Encodes a function response.
///
/// Header names come out lower-cased and the invocation header is always
/// set, replacing any value the function supplied.
pub fn encode(response: Response, invocation_id: &str, config: &ResponseConfig) -> OutputEnvelope {
    let (parts, body) = response.into_parts();
    let mut headers = plain_headers(&parts.headers);

    let (body, is_base64_encoded) = match body {
        Body::Empty => (String::new(), false),
        Body::Text(text) => {
            headers
                .entry(CONTENT_TYPE.as_str().to_string())
                .or_insert_with(|| DEFAULT_TEXT_CONTENT_TYPE.to_string());
            (text, false)
        }
        Body::Binary(bytes) => {
            let content_type = headers.get(CONTENT_TYPE.as_str()).map(String::as_str);
            if is_textual(content_type) {
                match String::from_utf8(bytes) {
                    Ok(text) => (text, false),
                    Err(e) => (STANDARD.encode(e.into_bytes()), true),
                }
            } else {
                (STANDARD.encode(bytes), true)
            }
        }
    };

    headers.insert(config.invocation_header.clone(), invocation_id.to_string());

    OutputEnvelope {
        status_code: parts.status.as_u16(),
        headers,
        body,
        is_base64_encoded,
    }
}

/// Envelope for a defect in the inbound event.
pub fn client_error_envelope(
    message: &str,
    invocation_id: &str,
    config: &ResponseConfig,
) -> OutputEnvelope {
    error_envelope(400, message, None, invocation_id, config)
}

/// Envelope for a setup or function failure. The message is also reported
/// in the `x-error` header.
pub fn failure_envelope(
    message: &str,
    invocation_id: &str,
    config: &ResponseConfig,
) -> OutputEnvelope {
    error_envelope(
        500,
        message,
        Some(cleanup_header_value(message)),
        invocation_id,
        config,
    )
}

fn error_envelope(
    status_code: u16,
    message: &str,
    error_header: Option<String>,
    invocation_id: &str,
    config: &ResponseConfig,
) -> OutputEnvelope {
    let mut headers = BTreeMap::from([(
        CONTENT_TYPE.as_str().to_string(),
        ERROR_CONTENT_TYPE.to_string(),
    )]);
    if let Some(value) = error_header {
        headers.insert(ERROR_HEADER.to_string(), value);
    }
    headers.insert(config.invocation_header.clone(), invocation_id.to_string());

    OutputEnvelope {
        status_code,
        headers,
        body: message.to_string(),
        is_base64_encoded: false,
    }
}

/// Whether a body with this content type is emitted as text.
fn is_textual(content_type: Option<&str>) -> bool {
    let Some(content_type) = content_type else {
        return true;
    };
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence.starts_with("text/")
        || essence.ends_with("/json")
        || essence.ends_with("/xml")
        || essence.ends_with("+json")
        || essence.ends_with("+xml")
        || essence == "application/javascript"
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    const ID: &str = "535f0399-9c90-4042-880e-620cfec6af55";

    fn response(content_type: Option<&str>, body: Body) -> Response {
        let mut builder = http::Response::builder().status(StatusCode::OK);
        if let Some(ct) = content_type {
            builder = builder.header(CONTENT_TYPE, ct);
        }
        builder.body(body).unwrap()
    }

    fn encode_default(response: Response) -> OutputEnvelope {
        encode(response, ID, &ResponseConfig::default())
    }

    #[test]
    fn test_text_body_gets_default_content_type() {
        let envelope = encode_default(response(None, Body::Text("ok".into())));

        assert_eq!(envelope.status_code, 200);
        assert_eq!(envelope.body, "ok");
        assert!(!envelope.is_base64_encoded);
        assert_eq!(
            envelope.headers,
            BTreeMap::from([
                ("content-type".to_string(), DEFAULT_TEXT_CONTENT_TYPE.to_string()),
                ("x-invocation-id".to_string(), ID.to_string()),
            ])
        );
    }

    #[test]
    fn test_text_body_keeps_function_content_type() {
        let envelope = encode_default(response(
            Some("application/json"),
            Body::Text("{}".into()),
        ));
        assert_eq!(envelope.headers["content-type"], "application/json");
    }

    #[test]
    fn test_json_bytes_are_text() {
        let envelope = encode_default(response(
            Some("application/json; charset=utf-8"),
            Body::Binary(b"{\"a\":1}".to_vec()),
        ));

        assert_eq!(envelope.body, "{\"a\":1}");
        assert!(!envelope.is_base64_encoded);
    }

    #[test]
    fn test_binary_round_trip() {
        let bytes: Vec<u8> = (0u8..=255).collect();
        let envelope = encode_default(response(
            Some("application/octet-stream"),
            Body::Binary(bytes.clone()),
        ));

        assert!(envelope.is_base64_encoded);
        assert_eq!(STANDARD.decode(&envelope.body).unwrap(), bytes);
    }

    #[test]
    fn test_invalid_utf8_with_text_type_is_base64() {
        let envelope = encode_default(response(
            Some("text/plain"),
            Body::Binary(vec![0xff, 0xfe, 0x00]),
        ));

        assert!(envelope.is_base64_encoded);
        assert_eq!(STANDARD.decode(&envelope.body).unwrap(), vec![0xff, 0xfe, 0x00]);
    }

    #[test]
    fn test_empty_body() {
        let envelope = encode_default(response(Some("image/png"), Body::Empty));
        assert_eq!(envelope.body, "");
        assert!(!envelope.is_base64_encoded);
    }

    #[test]
    fn test_invocation_header_overwrites_function_value() {
        let response = http::Response::builder()
            .header("X-Invocation-Id", "spoofed")
            .header("X-Custom", "1")
            .body(Body::Empty)
            .unwrap();

        let envelope = encode_default(response);

        assert_eq!(envelope.headers["x-invocation-id"], ID);
        assert_eq!(envelope.headers["x-custom"], "1");
    }

    #[test]
    fn test_client_error_envelope_headers() {
        let envelope = client_error_envelope("invalid header", ID, &ResponseConfig::default());

        assert_eq!(envelope.status_code, 400);
        assert_eq!(
            envelope.headers,
            BTreeMap::from([
                ("content-type".to_string(), "text/plain".to_string()),
                ("x-invocation-id".to_string(), ID.to_string()),
            ])
        );
    }

    #[test]
    fn test_failure_envelope_reports_message() {
        let envelope = failure_envelope("function kaput", ID, &ResponseConfig::default());

        assert_eq!(envelope.status_code, 500);
        assert_eq!(envelope.headers["x-error"], "function kaput");
        assert_eq!(envelope.headers["content-type"], "text/plain");
        assert_eq!(envelope.headers["x-invocation-id"], ID);
        assert_eq!(envelope.body, "function kaput");
    }

    #[test]
    fn test_failure_envelope_cleans_header_value() {
        let envelope = failure_envelope("line\nbreak", ID, &ResponseConfig::default());
        assert_eq!(envelope.headers["x-error"], "line break");
        assert_eq!(envelope.body, "line\nbreak");
    }

    #[test]
    fn test_envelope_wire_format() {
        let envelope = failure_envelope("kaput", ID, &ResponseConfig::default());
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["statusCode"], 500);
        assert_eq!(json["isBase64Encoded"], false);
        assert_eq!(json["headers"]["x-error"], "kaput");
    }

    #[test]
    fn test_is_textual() {
        assert!(is_textual(None));
        assert!(is_textual(Some("text/html; charset=utf-8")));
        assert!(is_textual(Some("application/problem+json")));
        assert!(is_textual(Some("application/xml")));
        assert!(is_textual(Some("application/javascript")));
        assert!(!is_textual(Some("application/octet-stream")));
        assert!(!is_textual(Some("image/png")));
    }
}
