//! Tower Layer implementation for the event adapter.

use crate::config::AdapterConfig;
use crate::env::{NoParams, ParamsProvider, ProcessEnv};
use crate::log::{LogSink, TracingSink};
use crate::service::AdapterService;
use std::sync::Arc;
use tower::Layer;

/// Which entry point a tower call goes through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntryPoint {
    /// Full pipeline, including provider parameters in `context.env`.
    #[default]
    Decorated,
    /// Same pipeline without parameter resolution; `context.env` is absent.
    Raw,
}

/// Collaborators and settings shared by every invocation of a service.
pub(crate) struct AdapterSettings {
    pub(crate) config: AdapterConfig,
    pub(crate) params: Arc<dyn ParamsProvider>,
    pub(crate) log_sink: Arc<dyn LogSink>,
    pub(crate) process_env: ProcessEnv,
    pub(crate) entry_point: EntryPoint,
}

/// Tower layer that adapts Lambda events for an HTTP-shaped function.
///
/// The wrapped service receives a normalized `(Request, ExecutionContext)`
/// pair and returns a normalized `Response`; the resulting service accepts
/// `LambdaEvent<serde_json::Value>` and returns the platform output envelope.
///
/// # Example
///
/// ```ignore
/// use lambda_adapter::AdapterLayer;
/// use tower::ServiceBuilder;
///
/// let service = ServiceBuilder::new()
///     .layer(AdapterLayer::new())
///     .service(my_function);
///
/// lambda_runtime::Runtime::new(service).run().await
/// ```
#[derive(Clone)]
pub struct AdapterLayer {
    settings: Arc<AdapterSettings>,
}

impl AdapterLayer {
    /// Creates a decorated layer with default collaborators: no provider
    /// parameters, the inherited process environment and a [`TracingSink`].
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a raw layer. Provider parameters are never looked up.
    pub fn raw() -> Self {
        Self::builder().entry_point(EntryPoint::Raw).build()
    }

    /// Creates a builder for more detailed configuration.
    pub fn builder() -> AdapterLayerBuilder {
        AdapterLayerBuilder::new()
    }
}

impl Default for AdapterLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Layer<S> for AdapterLayer {
    type Service = AdapterService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AdapterService::new(inner, Arc::clone(&self.settings))
    }
}

/// Builder for configuring an [`AdapterLayer`].
///
/// # Example
///
/// ```
/// use lambda_adapter::{AdapterConfig, AdapterLayer, StaticParams};
/// use std::sync::Arc;
///
/// let layer = AdapterLayer::builder()
///     .config(AdapterConfig::builder().default_host("example.com").build())
///     .params(Arc::new(StaticParams::from_iter([("SOME_SECRET", "pssst")])))
///     .build();
/// # let _ = layer;
/// ```
#[must_use = "builders do nothing unless .build() is called"]
pub struct AdapterLayerBuilder {
    config: AdapterConfig,
    params: Arc<dyn ParamsProvider>,
    log_sink: Arc<dyn LogSink>,
    process_env: ProcessEnv,
    entry_point: EntryPoint,
}

impl AdapterLayerBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            config: AdapterConfig::default(),
            params: Arc::new(NoParams),
            log_sink: Arc::new(TracingSink::new()),
            process_env: ProcessEnv::Inherit,
            entry_point: EntryPoint::Decorated,
        }
    }

    /// Sets the adapter configuration.
    pub fn config(mut self, config: AdapterConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the provider-parameter source used by decorated invocations.
    pub fn params(mut self, params: Arc<dyn ParamsProvider>) -> Self {
        self.params = params;
        self
    }

    /// Sets the sink behind `context.log`.
    ///
    /// The sink is flushed once per invocation that produces an envelope.
    pub fn log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.log_sink = sink;
        self
    }

    /// Sets where the local process environment is read from.
    ///
    /// Default: [`ProcessEnv::Inherit`]
    pub fn process_env(mut self, process_env: ProcessEnv) -> Self {
        self.process_env = process_env;
        self
    }

    /// Sets the entry point used by tower calls.
    ///
    /// Default: [`EntryPoint::Decorated`]
    pub fn entry_point(mut self, entry_point: EntryPoint) -> Self {
        self.entry_point = entry_point;
        self
    }

    /// Builds the configured layer.
    pub fn build(self) -> AdapterLayer {
        AdapterLayer {
            settings: Arc::new(AdapterSettings {
                config: self.config,
                params: self.params,
                log_sink: self.log_sink,
                process_env: self.process_env,
                entry_point: self.entry_point,
            }),
        }
    }
}

impl Default for AdapterLayerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
