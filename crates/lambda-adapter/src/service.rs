//! Tower Service implementation driving one invocation end to end.

use crate::context::ExecutionContext;
use crate::env::compose_env;
use crate::error::AdapterError;
use crate::event::{EventShape, FailureMode, InvocationEvent};
use crate::identity::{FunctionIdentity, InvocationIdentity, PathInfo, RuntimeInfo};
use crate::layer::{AdapterSettings, EntryPoint};
use crate::log::InvocationLog;
use crate::platform::{PlatformContext, take_cold_start};
use crate::request::{Request, build_request};
use crate::response::{
    OutputEnvelope, Response, client_error_envelope, encode, failure_envelope,
};
use lambda_runtime::{Context as LambdaContext, LambdaEvent};
use opentelemetry_semantic_conventions::attribute::{
    CLOUD_ACCOUNT_ID, CLOUD_REGION, ERROR_MESSAGE, FAAS_NAME, FAAS_VERSION, OTEL_STATUS_CODE,
};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Service, ServiceExt};
use tracing::field::Empty;
use tracing::{Instrument, Span};

/// Tower service that adapts Lambda events for an inner HTTP-shaped function.
///
/// For each invocation it:
/// 1. Classifies the event and opens a per-invocation log
/// 2. Resolves provider parameters (decorated entry point only)
/// 3. Builds the normalized request and execution context
/// 4. Calls the inner service
/// 5. Encodes the response, or converts the failure for gateway events
/// 6. Flushes the invocation log before returning the envelope
///
/// Built by [`AdapterLayer`](crate::AdapterLayer).
#[derive(Clone)]
pub struct AdapterService<S> {
    inner: S,
    settings: Arc<AdapterSettings>,
}

impl<S> AdapterService<S> {
    pub(crate) fn new(inner: S, settings: Arc<AdapterSettings>) -> Self {
        Self { inner, settings }
    }
}

impl<S> AdapterService<S>
where
    S: Service<(Request, ExecutionContext), Response = Response> + Clone + Send + 'static,
    S::Error: Display,
    S::Future: Send,
{
    /// Runs the decorated pipeline: `context.env` carries provider parameters
    /// overlaid by the process environment.
    ///
    /// # Errors
    ///
    /// Gateway events always yield an envelope unless flushing the log fails.
    /// Trigger and payload events propagate every failure.
    pub async fn invoke(
        &self,
        event: Value,
        lambda_ctx: LambdaContext,
    ) -> Result<OutputEnvelope, AdapterError> {
        drive(
            self.inner.clone(),
            Arc::clone(&self.settings),
            EntryPoint::Decorated,
            event,
            lambda_ctx,
        )
        .await
    }

    /// Runs the raw pipeline: provider parameters are never looked up and
    /// `context.env` is absent.
    ///
    /// # Errors
    ///
    /// Same as [`invoke`](Self::invoke).
    pub async fn invoke_raw(
        &self,
        event: Value,
        lambda_ctx: LambdaContext,
    ) -> Result<OutputEnvelope, AdapterError> {
        drive(
            self.inner.clone(),
            Arc::clone(&self.settings),
            EntryPoint::Raw,
            event,
            lambda_ctx,
        )
        .await
    }
}

impl<S> Service<LambdaEvent<Value>> for AdapterService<S>
where
    S: Service<(Request, ExecutionContext), Response = Response> + Clone + Send + 'static,
    S::Error: Display,
    S::Future: Send,
{
    type Response = OutputEnvelope;
    type Error = lambda_runtime::Error;
    type Future = Pin<Box<dyn Future<Output = Result<OutputEnvelope, lambda_runtime::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // Each call drives a clone of the inner service with `oneshot`, which
        // waits for that clone's readiness itself.
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, event: LambdaEvent<Value>) -> Self::Future {
        let (payload, lambda_ctx) = event.into_parts();
        let inner = self.inner.clone();
        let settings = Arc::clone(&self.settings);
        let entry_point = settings.entry_point;

        Box::pin(async move {
            drive(inner, settings, entry_point, payload, lambda_ctx)
                .await
                .map_err(Into::into)
        })
    }
}

async fn drive<S>(
    inner: S,
    settings: Arc<AdapterSettings>,
    entry_point: EntryPoint,
    event: Value,
    lambda_ctx: LambdaContext,
) -> Result<OutputEnvelope, AdapterError>
where
    S: Service<(Request, ExecutionContext), Response = Response> + Send + 'static,
    S::Error: Display,
    S::Future: Send,
{
    let platform = PlatformContext::from(&lambda_ctx);
    let shape = EventShape::detect(&event);
    let process_env = settings.process_env.snapshot();
    let log = InvocationLog::new(platform.request_id.as_str(), Arc::clone(&settings.log_sink));

    let span = tracing::info_span!(
        "lambda.invoke",
        otel.name = %platform.function_name,
        otel.kind = "server",
        otel.status_code = Empty,
        faas.trigger = shape.trigger_type(),
        faas.invocation_id = %platform.request_id,
        faas.coldstart = take_cold_start(&process_env),
        faas.name = Empty,
        faas.version = Empty,
        cloud.provider = "aws",
        cloud.region = Empty,
        cloud.account.id = Empty,
        error.message = Empty,
    );

    let envelope = async {
        tracing::debug!(?shape, ?entry_point, "Adapting invocation");

        let outcome = execute(
            inner,
            &settings,
            entry_point,
            shape,
            event,
            &platform,
            &process_env,
            log.clone(),
        )
        .await;

        let span = Span::current();
        match (outcome, shape.failure_mode()) {
            (Ok(envelope), _) => {
                span.record(OTEL_STATUS_CODE, "OK");
                Ok(envelope)
            }
            (Err(err), FailureMode::Envelope) => {
                span.record(OTEL_STATUS_CODE, "ERROR");
                span.record(ERROR_MESSAGE, err.to_string().as_str());
                tracing::warn!(error = %err, "Converting failure into response envelope");

                let message = err.to_string();
                let response = &settings.config.response;
                Ok(if err.is_client_error() {
                    client_error_envelope(&message, &platform.request_id, response)
                } else {
                    failure_envelope(&message, &platform.request_id, response)
                })
            }
            (Err(err), FailureMode::Propagate) => {
                span.record(OTEL_STATUS_CODE, "ERROR");
                span.record(ERROR_MESSAGE, err.to_string().as_str());
                tracing::error!(error = %err, "Invocation failed");
                Err(err)
            }
        }
    }
    .instrument(span)
    .await?;

    // The invocation span must be closed before flushing or it misses this export.
    log.flush().await?;
    Ok(envelope)
}

#[allow(clippy::too_many_arguments)]
async fn execute<S>(
    inner: S,
    settings: &AdapterSettings,
    entry_point: EntryPoint,
    shape: EventShape,
    event: Value,
    platform: &PlatformContext,
    process_env: &HashMap<String, String>,
    log: InvocationLog,
) -> Result<OutputEnvelope, AdapterError>
where
    S: Service<(Request, ExecutionContext), Response = Response>,
    S::Error: Display,
{
    let config = &settings.config;

    let env = match entry_point {
        EntryPoint::Decorated => {
            let params = settings.params.load().await?;
            Some(compose_env(process_env, &params))
        }
        EntryPoint::Raw => None,
    };

    let event = InvocationEvent::decode(shape, event)?;
    let request = build_request(&event, &config.request)?;

    let gateway = event.as_gateway();
    let api_id = gateway.and_then(|g| g.request_context.api_id.as_deref());
    let func = FunctionIdentity::resolve(
        &platform.invoked_function_arn,
        &platform.function_name,
        api_id,
        &config.identity.latest_version,
    );
    let invocation = InvocationIdentity::resolve(
        &platform.request_id,
        gateway.and_then(|g| g.request_context.request_id.as_deref()),
        request.headers(),
        platform.remaining_time(),
        &config.identity,
    );
    let runtime = RuntimeInfo::resolve(&platform.invoked_function_arn, process_env);
    let path_info = PathInfo::from_path_parameters(gateway.and_then(|g| g.path_parameters.as_ref()));

    let span = Span::current();
    span.record(FAAS_NAME, func.name.as_str());
    span.record(FAAS_VERSION, func.version.as_str());
    if let Some(region) = &runtime.region {
        span.record(CLOUD_REGION, region.as_str());
    }
    if let Some(account_id) = &runtime.account_id {
        span.record(CLOUD_ACCOUNT_ID, account_id.as_str());
    }

    let context = ExecutionContext::assemble(
        func,
        invocation,
        env,
        event.records(),
        runtime,
        path_info,
        log,
    );

    tracing::debug!(method = %request.method(), uri = %request.uri(), "Calling function");
    let response = inner
        .oneshot((request, context))
        .await
        .map_err(|e| AdapterError::Function(e.to_string()))?;

    Ok(encode(response, &platform.request_id, &config.response))
}
