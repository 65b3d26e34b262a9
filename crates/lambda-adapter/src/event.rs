//! Structural classification of inbound invocation events.
//!
//! Lambda delivers every invocation as untagged JSON. The adapter inspects
//! the payload once, up front, and decodes it into one of three shapes:
//!
//! - [`InvocationEvent::Gateway`]: an object with a `requestContext`
//!   (API Gateway HTTP API v2, with REST API v1 fallbacks)
//! - [`InvocationEvent::Trigger`]: an object with a `Records` batch (SQS, SNS, ...)
//! - [`InvocationEvent::Payload`]: anything else, a direct invocation
//!
//! The shape also decides the [`FailureMode`] of the pipeline.

use crate::error::AdapterError;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// How failures are reported back to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Convert failures into a well-formed HTTP envelope.
    Envelope,
    /// Propagate failures as invocation errors.
    Propagate,
}

/// The shape of an event, detected without decoding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventShape {
    /// HTTP-fronted event.
    Gateway,
    /// Batched trigger records.
    Trigger,
    /// Bare key-value payload.
    Payload,
}

impl EventShape {
    /// Detects the shape of a raw event.
    pub fn detect(event: &Value) -> Self {
        let Some(object) = event.as_object() else {
            return EventShape::Payload;
        };

        if object
            .get("requestContext")
            .is_some_and(|ctx| !ctx.is_null())
        {
            EventShape::Gateway
        } else if object.get("Records").is_some_and(Value::is_array) {
            EventShape::Trigger
        } else {
            EventShape::Payload
        }
    }

    /// HTTP-fronted invocations always answer with an envelope.
    pub fn failure_mode(self) -> FailureMode {
        match self {
            EventShape::Gateway => FailureMode::Envelope,
            EventShape::Trigger | EventShape::Payload => FailureMode::Propagate,
        }
    }

    /// FaaS trigger type for semantic conventions.
    pub fn trigger_type(self) -> &'static str {
        match self {
            EventShape::Gateway => "http",
            EventShape::Trigger => "pubsub",
            EventShape::Payload => "other",
        }
    }
}

/// A classified invocation event.
#[derive(Debug, Clone)]
pub enum InvocationEvent {
    /// HTTP-fronted event.
    Gateway(Box<GatewayEvent>),
    /// Batched trigger records, with the rest of the payload.
    Trigger {
        /// The `Records` batch, passed through unchanged.
        records: Vec<Value>,
        /// All top-level fields of the event.
        payload: Map<String, Value>,
    },
    /// Bare key-value payload.
    Payload(Map<String, Value>),
}

impl InvocationEvent {
    /// Decodes a raw event according to its detected shape.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::MalformedRequest`] when a gateway event's
    /// fields have the wrong types.
    pub fn decode(shape: EventShape, event: Value) -> Result<Self, AdapterError> {
        match (shape, event) {
            (EventShape::Gateway, event) => serde_json::from_value(event)
                .map(|gateway| InvocationEvent::Gateway(Box::new(gateway)))
                .map_err(|e| AdapterError::MalformedRequest(e.to_string())),
            (EventShape::Trigger, Value::Object(payload)) => {
                let records = payload
                    .get("Records")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default();
                Ok(InvocationEvent::Trigger { records, payload })
            }
            (_, Value::Object(payload)) => Ok(InvocationEvent::Payload(payload)),
            (_, _) => Ok(InvocationEvent::Payload(Map::new())),
        }
    }

    /// The gateway event, if this invocation is HTTP-fronted.
    pub fn as_gateway(&self) -> Option<&GatewayEvent> {
        match self {
            InvocationEvent::Gateway(gateway) => Some(gateway),
            _ => None,
        }
    }

    /// The trigger records, if any.
    pub fn records(&self) -> Option<&[Value]> {
        match self {
            InvocationEvent::Trigger { records, .. } => Some(records),
            _ => None,
        }
    }
}

/// API Gateway event, HTTP API (v2) shape with REST API (v1) fallbacks.
///
/// Every field is optional so that partial or hand-written events decode.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewayEvent {
    /// Raw request path (v2).
    pub raw_path: Option<String>,
    /// Raw query string without the leading `?` (v2).
    pub raw_query_string: Option<String>,
    /// Request path (v1).
    pub path: Option<String>,
    /// HTTP method (v1).
    pub http_method: Option<String>,
    /// Decoded query parameters (v1), used when no raw query string exists.
    pub query_string_parameters: Option<HashMap<String, String>>,
    /// Request headers as sent by the gateway.
    pub headers: Option<HashMap<String, String>>,
    /// Cookies split out of the `cookie` header (v2).
    pub cookies: Option<Vec<String>>,
    /// Request body, base64-encoded when `is_base64_encoded` is set.
    pub body: Option<String>,
    /// Whether `body` is base64-encoded.
    pub is_base64_encoded: bool,
    /// Route path parameters.
    pub path_parameters: Option<HashMap<String, String>>,
    /// Gateway request context.
    pub request_context: GatewayRequestContext,
}

/// Gateway request context.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewayRequestContext {
    /// API identifier.
    pub api_id: Option<String>,
    /// Gateway request id.
    pub request_id: Option<String>,
    /// Custom or default domain name.
    pub domain_name: Option<String>,
    /// Protocol (v1).
    pub protocol: Option<String>,
    /// HTTP description (v2).
    pub http: Option<GatewayHttp>,
}

/// HTTP description of a v2 request context.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewayHttp {
    /// HTTP method.
    pub method: Option<String>,
    /// Request path.
    pub path: Option<String>,
    /// Protocol, e.g. `HTTP/1.1`.
    pub protocol: Option<String>,
    /// Client address.
    pub source_ip: Option<String>,
}

impl GatewayEvent {
    /// HTTP method, falling back to the v1 field and finally `GET`.
    pub fn method(&self) -> &str {
        self.request_context
            .http
            .as_ref()
            .and_then(|http| http.method.as_deref())
            .or(self.http_method.as_deref())
            .unwrap_or("GET")
    }

    /// Request path, falling back to the v2 context and the v1 field.
    pub fn path(&self) -> &str {
        self.raw_path
            .as_deref()
            .or_else(|| {
                self.request_context
                    .http
                    .as_ref()
                    .and_then(|http| http.path.as_deref())
            })
            .or(self.path.as_deref())
            .unwrap_or_default()
    }

    /// Protocol string from either context shape.
    pub fn protocol(&self) -> Option<&str> {
        self.request_context
            .http
            .as_ref()
            .and_then(|http| http.protocol.as_deref())
            .or(self.request_context.protocol.as_deref())
    }
}
