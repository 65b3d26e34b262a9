//! Example "dump" function running on AWS Lambda through `lambda-adapter`.
//!
//! The function echoes what it was given: the normalized request, the
//! execution context and, for queue triggers, the decoded record bodies.
//! It is useful for checking how each invocation surface is translated.
//!
//! ## Options
//!
//! Read from the query string, so they work for gateway requests and for
//! direct invocations alike:
//!
//! - `simulate_error=true` makes the function fail
//! - `delay_ms=<n>` simulates work before answering
//!
//! ## Example
//!
//! ```ignore
//! use lambda_adapter::AdapterConfig;
//! use lambda_adapter_example::{create_service, init_tracing};
//! use lambda_runtime::Runtime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     init_tracing()?;
//!     let service = create_service(AdapterConfig::load()?);
//!     Runtime::new(service).run().await.map_err(|e| anyhow::anyhow!(e))
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::header::CONTENT_TYPE;
use lambda_adapter::{
    AdapterConfig, AdapterLayer, AdapterService, Body, ExecutionContext, FileParams, Request,
    Response, plain_headers,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use thiserror::Error;
use tower::{Layer, Service};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Options controlling the dump function, read from the query string.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DumpOptions {
    /// Fail the invocation instead of answering.
    pub simulate_error: bool,

    /// Optional delay in milliseconds to simulate work.
    pub delay_ms: Option<u64>,
}

impl DumpOptions {
    /// Parses options from a query string, ignoring unknown or malformed values.
    pub fn from_query(query: Option<&str>) -> Self {
        let mut options = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            match key.as_ref() {
                "simulate_error" => options.simulate_error = value == "true",
                "delay_ms" => options.delay_ms = value.parse().ok(),
                _ => {}
            }
        }
        options
    }
}

/// The JSON document returned by the dump function.
#[derive(Debug, Serialize)]
pub struct Dump {
    /// Request method.
    pub method: String,
    /// Full request URL.
    pub url: String,
    /// Request headers as a plain mapping.
    pub headers: BTreeMap<String, String>,
    /// Request body: JSON when it parses, text when it is UTF-8, else base64.
    pub body: Value,
    /// The execution context, with environment values reduced to their keys.
    pub context: Value,
    /// Decoded bodies of trigger records, in order.
    pub records: Vec<Value>,
}

/// Errors returned by the dump function.
#[derive(Debug, Error)]
pub enum DumpError {
    /// Failure requested through `simulate_error`.
    #[error("simulated failure")]
    Simulated,

    /// The response document could not be encoded.
    #[error("failed to encode dump: {0}")]
    Encode(#[from] serde_json::Error),

    /// The response could not be built.
    #[error("failed to build response: {0}")]
    Http(#[from] http::Error),
}

/// The dump function as a tower service.
#[derive(Debug, Clone, Copy, Default)]
pub struct DumpFunction;

impl Service<(Request, ExecutionContext)> for DumpFunction {
    type Response = Response;
    type Error = DumpError;
    type Future = Pin<Box<dyn Future<Output = Result<Response, DumpError>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, (request, context): (Request, ExecutionContext)) -> Self::Future {
        Box::pin(dump(request, context))
    }
}

/// Initialises the tracing subscriber.
///
/// Log levels come from `RUST_LOG`, defaulting to `info` with debug output
/// for the adapter.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,lambda_adapter=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).without_time())
        .with(filter)
        .try_init()?;

    Ok(())
}

/// Creates the adapted dump service.
///
/// Provider parameters are read from `config.params.file` when set.
///
/// # Example
///
/// ```ignore
/// let service = create_service(AdapterConfig::load()?);
/// lambda_runtime::Runtime::new(service).run().await?;
/// ```
pub fn create_service(config: AdapterConfig) -> AdapterService<DumpFunction> {
    let mut builder = AdapterLayer::builder();

    if let Some(path) = &config.params.file {
        builder = builder.params(Arc::new(FileParams::new(path)));
    }

    builder.config(config).build().layer(DumpFunction)
}

/// The dump function.
///
/// # Errors
///
/// Returns [`DumpError::Simulated`] when asked to fail.
pub async fn dump(request: Request, context: ExecutionContext) -> Result<Response, DumpError> {
    let options = DumpOptions::from_query(request.uri().query());

    context.log.info(format!(
        "dumping {} {}",
        request.method(),
        request.uri()
    ));
    tracing::info!(
        invocation_id = %context.invocation.id,
        method = %request.method(),
        uri = %request.uri(),
        "Processing request"
    );

    if let Some(delay) = options.delay_ms {
        tracing::debug!(delay_ms = delay, "Simulating work");
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    if options.simulate_error {
        context.log.error("simulated failure requested");
        return Err(DumpError::Simulated);
    }

    let records = context
        .records
        .iter()
        .flatten()
        .map(|record| match record.get("body").and_then(Value::as_str) {
            Some(body) => body_value(body.as_bytes()),
            None => Value::Null,
        })
        .collect();

    let document = Dump {
        method: request.method().to_string(),
        url: request.uri().to_string(),
        headers: plain_headers(request.headers()),
        body: body_value(request.body()),
        context: context_value(&context)?,
        records,
    };

    let response = http::Response::builder()
        .status(200)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::Text(serde_json::to_string(&document)?))?;

    Ok(response)
}

fn body_value(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    if let Ok(json) = serde_json::from_slice(bytes) {
        return json;
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => Value::String(text.to_string()),
        Err(_) => Value::String(STANDARD.encode(bytes)),
    }
}

fn context_value(context: &ExecutionContext) -> Result<Value, serde_json::Error> {
    let mut value = serde_json::to_value(context)?;

    if let Some(env) = &context.env {
        let mut keys: Vec<&String> = env.keys().collect();
        keys.sort();
        value["env"] = serde_json::to_value(keys)?;
    }

    Ok(value)
}
