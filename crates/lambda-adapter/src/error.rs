//! Error types for the event adapter.

use thiserror::Error;

/// A specialised Result type for adapter operations.
pub type Result<T> = std::result::Result<T, AdapterError>;

/// Failures that can occur while adapting a single invocation.
///
/// Client errors ([`MalformedHeader`](Self::MalformedHeader) and
/// [`MalformedRequest`](Self::MalformedRequest)) become `400` envelopes for
/// gateway events; setup and function failures become `500` envelopes.
/// Events without gateway context propagate every variant to the platform.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AdapterError {
    /// A header name or value in the event is not representable on the wire.
    #[error("invalid header")]
    MalformedHeader,

    /// The event could not be turned into a request (bad method, URL or body).
    #[error("invalid request: {0}")]
    MalformedRequest(String),

    /// The provider-parameter lookup failed before the function ran.
    #[error("{0}")]
    Setup(String),

    /// The downstream function returned an error.
    #[error("{0}")]
    Function(String),

    /// Flushing the invocation log failed.
    #[error(transparent)]
    Flush(#[from] FlushError),
}

impl AdapterError {
    /// Returns `true` for defects in the inbound event (mapped to `400`).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::MalformedHeader | Self::MalformedRequest(_))
    }
}

impl From<ParamsError> for AdapterError {
    fn from(err: ParamsError) -> Self {
        AdapterError::Setup(err.to_string())
    }
}

/// Errors raised by a provider-parameter lookup.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ParamsError {
    /// The provider rejected or could not complete the lookup.
    #[error("{0}")]
    Lookup(String),

    /// A parameters file could not be read or parsed.
    #[error("failed to load parameters")]
    File(#[source] Box<figment::Error>),
}

impl From<figment::Error> for ParamsError {
    fn from(err: figment::Error) -> Self {
        ParamsError::File(Box::new(err))
    }
}

/// Error returned when a log sink fails to flush.
#[derive(Debug, Error)]
#[error("failed to flush invocation log: {0}")]
pub struct FlushError(pub String);

/// Configuration loading error.
#[derive(Debug, Error)]
#[error("configuration error")]
pub struct ConfigError(#[source] pub Box<figment::Error>);

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(AdapterError::MalformedHeader.is_client_error());
        assert!(AdapterError::MalformedRequest("bad".into()).is_client_error());
        assert!(!AdapterError::Setup("kaput".into()).is_client_error());
        assert!(!AdapterError::Function("kaput".into()).is_client_error());
    }

    #[test]
    fn test_messages_are_passed_through() {
        assert_eq!(AdapterError::MalformedHeader.to_string(), "invalid header");
        assert_eq!(
            AdapterError::Function("function kaput".into()).to_string(),
            "function kaput"
        );
        let setup: AdapterError = ParamsError::Lookup("params kaput".into()).into();
        assert_eq!(setup.to_string(), "params kaput");
    }
}
