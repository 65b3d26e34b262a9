//! Construction of the normalized request handed to the function.

use crate::config::RequestConfig;
use crate::error::AdapterError;
use crate::event::{GatewayEvent, InvocationEvent};
use crate::headers::{sanitize_headers, sanitize_value};
use aws_lambda_events::encodings::Body;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::header::{COOKIE, HOST};
use http::{Method, Uri, Version};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// Normalized request passed to the function.
pub type Request = http::Request<Body>;

/// Builds the normalized request for a classified event.
///
/// Gateway events become a full HTTP request. Trigger and bare-payload
/// events become an empty-bodied `GET` whose query string carries the
/// payload's scalar top-level values; trigger functions read
/// `context.records` instead.
///
/// # Errors
///
/// Returns [`AdapterError::MalformedHeader`] for headers that fail
/// sanitation and [`AdapterError::MalformedRequest`] for an unparsable
/// method, URL or base64 body.
pub fn build_request(
    event: &InvocationEvent,
    config: &RequestConfig,
) -> Result<Request, AdapterError> {
    match event {
        InvocationEvent::Gateway(gateway) => gateway_request(gateway, config),
        InvocationEvent::Trigger { payload, .. } | InvocationEvent::Payload(payload) => {
            payload_request(payload, config)
        }
    }
}

fn gateway_request(event: &GatewayEvent, config: &RequestConfig) -> Result<Request, AdapterError> {
    let mut headers = match &event.headers {
        Some(raw) => sanitize_headers(raw)?,
        None => sanitize_headers(&HashMap::new())?,
    };

    // An explicit cookie header always wins over the split-out list.
    if let Some(cookies) = &event.cookies
        && !cookies.is_empty()
        && !headers.contains_key(COOKIE)
    {
        headers.insert(COOKIE, sanitize_value(&cookies.join(";"))?);
    }

    let host = headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or_else(|| event.request_context.domain_name.clone())
        .unwrap_or_else(|| config.default_host.clone());

    let query = match event.raw_query_string.as_deref() {
        Some(qs) if !qs.is_empty() => qs.to_string(),
        _ => event
            .query_string_parameters
            .as_ref()
            .map(|params| {
                let sorted: BTreeMap<_, _> = params.iter().collect();
                url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(sorted)
                    .finish()
            })
            .unwrap_or_default(),
    };

    let method = Method::from_bytes(event.method().as_bytes())
        .map_err(|_| AdapterError::MalformedRequest(format!("method {:?}", event.method())))?;
    let uri = build_uri(&host, event.path(), &query)?;
    let body = decode_body(event.body.as_deref(), event.is_base64_encoded)?;

    let mut request = Request::new(body);
    *request.method_mut() = method;
    *request.uri_mut() = uri;
    *request.headers_mut() = headers;
    if let Some(version) = event.protocol().and_then(http_version) {
        *request.version_mut() = version;
    }

    Ok(request)
}

fn payload_request(
    payload: &Map<String, Value>,
    config: &RequestConfig,
) -> Result<Request, AdapterError> {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in payload {
        match value {
            Value::String(s) => {
                query.append_pair(key, s);
            }
            Value::Number(n) => {
                query.append_pair(key, &n.to_string());
            }
            Value::Bool(b) => {
                query.append_pair(key, if *b { "true" } else { "false" });
            }
            Value::Null | Value::Array(_) | Value::Object(_) => {}
        }
    }

    let mut request = Request::new(Body::Empty);
    *request.uri_mut() = build_uri(&config.default_host, "", &query.finish())?;
    Ok(request)
}

fn build_uri(host: &str, path: &str, query: &str) -> Result<Uri, AdapterError> {
    let slash = if path.is_empty() || path.starts_with('/') {
        ""
    } else {
        "/"
    };
    let separator = if query.is_empty() { "" } else { "?" };
    let url = format!("https://{host}{slash}{path}{separator}{query}");

    url.parse::<Uri>()
        .map_err(|e| AdapterError::MalformedRequest(format!("url {url:?}: {e}")))
}

fn decode_body(body: Option<&str>, is_base64_encoded: bool) -> Result<Body, AdapterError> {
    match body {
        None => Ok(Body::Empty),
        Some(encoded) if is_base64_encoded => STANDARD
            .decode(encoded.as_bytes())
            .map(Body::Binary)
            .map_err(|e| AdapterError::MalformedRequest(format!("base64 body: {e}"))),
        Some(text) => Ok(Body::Text(text.to_string())),
    }
}

/// Maps a protocol string such as `HTTP/1.1` or `HTTP/2.0` to a version.
fn http_version(protocol: &str) -> Option<Version> {
    match protocol
        .strip_prefix("HTTP/")
        .map(|v| v.trim_end_matches(".0"))?
    {
        "0.9" => Some(Version::HTTP_09),
        "1" => Some(Version::HTTP_10),
        "1.1" => Some(Version::HTTP_11),
        "2" => Some(Version::HTTP_2),
        "3" => Some(Version::HTTP_3),
        _ => None,
    }
}
