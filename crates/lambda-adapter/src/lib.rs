//! Tower adapter that runs one HTTP-shaped function on AWS Lambda.
//!
//! A function written against the [`http`] crate's request and response
//! types can be invoked unmodified from three Lambda surfaces:
//!
//! - **API Gateway** (HTTP API v2, with REST API v1 fallbacks): the event is
//!   turned into a full request; every failure becomes an HTTP envelope
//! - **Queue triggers** (`Records` batches such as SQS): the function gets an
//!   empty request and reads `context.records`; failures propagate
//! - **Direct invocations**: scalar top-level payload values become query
//!   parameters; failures propagate
//!
//! Alongside the request the function receives an [`ExecutionContext`]
//! describing the deployed function, the invocation, the merged environment
//! and a per-invocation log that is flushed before the envelope is returned.
//!
//! # Usage
//!
//! ```no_run
//! use lambda_adapter::{AdapterLayer, Body, ExecutionContext, Request, Response};
//! use lambda_runtime::Runtime;
//! use tower::{ServiceBuilder, service_fn};
//!
//! async fn hello(
//!     (request, context): (Request, ExecutionContext),
//! ) -> Result<Response, std::convert::Infallible> {
//!     context.log.info(format!("{} {}", request.method(), request.uri()));
//!     Ok(Response::new(Body::Text(format!("hello from {}", context.func.name))))
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), lambda_runtime::Error> {
//!     let service = ServiceBuilder::new()
//!         .layer(AdapterLayer::new())
//!         .service(service_fn(hello));
//!
//!     Runtime::new(service).run().await
//! }
//! ```
//!
//! # Entry points
//!
//! The decorated entry point ([`AdapterLayer::new`], [`AdapterService::invoke`])
//! resolves provider parameters through a [`ParamsProvider`] and exposes them,
//! overlaid by the process environment, as `context.env`. The raw entry point
//! ([`AdapterLayer::raw`], [`AdapterService::invoke_raw`]) skips the lookup.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod context;
mod env;
mod error;
mod event;
mod headers;
mod identity;
mod layer;
mod log;
mod platform;
mod request;
mod response;
mod service;

pub mod config;

pub use aws_lambda_events::encodings::Body;
pub use config::{AdapterConfig, AdapterConfigBuilder};
pub use context::ExecutionContext;
pub use env::{
    FileParams, FnParams, NoParams, ParamsFuture, ParamsProvider, ProcessEnv, StaticParams,
    compose_env, params_fn,
};
pub use error::{AdapterError, ConfigError, FlushError, ParamsError, Result};
pub use event::{
    EventShape, FailureMode, GatewayEvent, GatewayHttp, GatewayRequestContext, InvocationEvent,
};
pub use headers::{cleanup_header_value, plain_headers, sanitize_headers};
pub use identity::{FunctionIdentity, InvocationIdentity, PathInfo, RUNTIME_NAME, RuntimeInfo};
pub use layer::{AdapterLayer, AdapterLayerBuilder, EntryPoint};
pub use log::{FlushFuture, InvocationLog, Level, LogSink, TracingSink};
pub use platform::PlatformContext;
pub use request::{Request, build_request};
pub use response::{OutputEnvelope, Response, client_error_envelope, encode, failure_envelope};
pub use service::AdapterService;
