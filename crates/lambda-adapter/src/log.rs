//! Per-invocation logging.
//!
//! Every invocation gets an [`InvocationLog`] tagged with the platform
//! request id. The function reaches it through `context.log`; the adapter
//! uses the same handle and flushes it exactly once after the output
//! envelope is produced, before the platform may freeze the environment.

use crate::error::FlushError;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// Future returned by [`LogSink::flush`].
pub type FlushFuture<'a> = Pin<Box<dyn Future<Output = Result<(), FlushError>> + Send + 'a>>;

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Diagnostic detail.
    Debug,
    /// Normal operation.
    Info,
    /// Something unexpected that did not fail the invocation.
    Warn,
    /// A failure.
    Error,
}

/// Destination for invocation log entries.
pub trait LogSink: Send + Sync + 'static {
    /// Records one entry.
    fn emit(&self, level: Level, invocation_id: &str, message: &str);

    /// Pushes buffered entries out. The default does nothing.
    fn flush(&self) -> FlushFuture<'_> {
        Box::pin(async { Ok(()) })
    }
}

/// Log handle scoped to a single invocation.
#[derive(Clone)]
pub struct InvocationLog {
    invocation_id: Arc<str>,
    sink: Arc<dyn LogSink>,
}

impl InvocationLog {
    /// Creates a log for `invocation_id` writing to `sink`.
    pub fn new(invocation_id: impl Into<Arc<str>>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            sink,
        }
    }

    /// The invocation this log belongs to.
    pub fn invocation_id(&self) -> &str {
        &self.invocation_id
    }

    /// Emits a diagnostic entry.
    pub fn debug(&self, message: impl AsRef<str>) {
        self.sink
            .emit(Level::Debug, &self.invocation_id, message.as_ref());
    }

    /// Emits an informational entry.
    pub fn info(&self, message: impl AsRef<str>) {
        self.sink
            .emit(Level::Info, &self.invocation_id, message.as_ref());
    }

    /// Emits a warning.
    pub fn warn(&self, message: impl AsRef<str>) {
        self.sink
            .emit(Level::Warn, &self.invocation_id, message.as_ref());
    }

    /// Emits an error entry.
    pub fn error(&self, message: impl AsRef<str>) {
        self.sink
            .emit(Level::Error, &self.invocation_id, message.as_ref());
    }

    /// Flushes the underlying sink.
    pub async fn flush(&self) -> Result<(), FlushError> {
        self.sink.flush().await
    }
}

impl fmt::Debug for InvocationLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationLog")
            .field("invocation_id", &self.invocation_id)
            .finish_non_exhaustive()
    }
}

/// Sink forwarding entries to `tracing` events.
///
/// When OpenTelemetry providers are attached, flushing force-flushes them
/// so spans and logs are exported before the environment freezes.
#[derive(Clone)]
pub struct TracingSink {
    tracer_provider: Option<Arc<SdkTracerProvider>>,
    logger_provider: Option<Arc<SdkLoggerProvider>>,
    flush_timeout: Duration,
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl TracingSink {
    /// Creates a sink without providers; flushing is a no-op.
    pub fn new() -> Self {
        Self {
            tracer_provider: None,
            logger_provider: None,
            flush_timeout: Duration::from_secs(5),
        }
    }

    /// Attaches a tracer provider to flush after each invocation.
    #[must_use]
    pub fn with_tracer_provider(mut self, provider: Arc<SdkTracerProvider>) -> Self {
        self.tracer_provider = Some(provider);
        self
    }

    /// Attaches a logger provider to flush after each invocation.
    #[must_use]
    pub fn with_logger_provider(mut self, provider: Arc<SdkLoggerProvider>) -> Self {
        self.logger_provider = Some(provider);
        self
    }

    /// Sets the flush timeout. Default: 5 seconds.
    #[must_use]
    pub fn with_flush_timeout(mut self, timeout: Duration) -> Self {
        self.flush_timeout = timeout;
        self
    }
}

impl LogSink for TracingSink {
    fn emit(&self, level: Level, invocation_id: &str, message: &str) {
        match level {
            Level::Debug => tracing::debug!(target: "lambda_adapter::function", invocation_id, "{message}"),
            Level::Info => tracing::info!(target: "lambda_adapter::function", invocation_id, "{message}"),
            Level::Warn => tracing::warn!(target: "lambda_adapter::function", invocation_id, "{message}"),
            Level::Error => tracing::error!(target: "lambda_adapter::function", invocation_id, "{message}"),
        }
    }

    fn flush(&self) -> FlushFuture<'_> {
        Box::pin(async move {
            if self.tracer_provider.is_none() && self.logger_provider.is_none() {
                return Ok(());
            }

            let tracer_provider = self.tracer_provider.clone();
            let logger_provider = self.logger_provider.clone();
            let flushed = tokio::time::timeout(self.flush_timeout, async move {
                if let Some(provider) = tracer_provider {
                    provider
                        .force_flush()
                        .map_err(|e| FlushError(format!("tracer provider: {e:?}")))?;
                }
                if let Some(provider) = logger_provider {
                    provider
                        .force_flush()
                        .map_err(|e| FlushError(format!("logger provider: {e:?}")))?;
                }
                Ok(())
            })
            .await;

            flushed.unwrap_or_else(|_| Err(FlushError("timed out".to_string())))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingSink {
        entries: Mutex<Vec<(Level, String, String)>>,
        flushes: AtomicUsize,
    }

    impl LogSink for RecordingSink {
        fn emit(&self, level: Level, invocation_id: &str, message: &str) {
            self.entries
                .lock()
                .unwrap()
                .push((level, invocation_id.to_string(), message.to_string()));
        }

        fn flush(&self) -> FlushFuture<'_> {
            self.flushes.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(()) })
        }
    }

    #[tokio::test]
    async fn test_entries_are_tagged_with_invocation_id() {
        let sink = Arc::new(RecordingSink::default());
        let log = InvocationLog::new("req-1", sink.clone());

        log.info("hello");
        log.clone().error("boom");
        log.flush().await.unwrap();

        let entries = sink.entries.lock().unwrap();
        assert_eq!(
            *entries,
            vec![
                (Level::Info, "req-1".to_string(), "hello".to_string()),
                (Level::Error, "req-1".to_string(), "boom".to_string()),
            ]
        );
        assert_eq!(sink.flushes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_default_flush_is_noop() {
        struct Silent;
        impl LogSink for Silent {
            fn emit(&self, _: Level, _: &str, _: &str) {}
        }

        let log = InvocationLog::new("req-2", Arc::new(Silent));
        assert!(log.flush().await.is_ok());
        assert_eq!(log.invocation_id(), "req-2");
    }

    #[tokio::test]
    async fn test_tracing_sink_without_providers() {
        let sink = TracingSink::new();
        sink.emit(Level::Warn, "req-3", "careful");
        assert!(sink.flush().await.is_ok());
    }

    #[tokio::test]
    async fn test_tracing_sink_flushes_providers() {
        let sink = TracingSink::new()
            .with_tracer_provider(Arc::new(SdkTracerProvider::builder().build()))
            .with_logger_provider(Arc::new(SdkLoggerProvider::builder().build()))
            .with_flush_timeout(Duration::from_secs(1));

        assert!(sink.flush().await.is_ok());
    }
}
