//! Configuration loading and management.
//!
//! The adapter is configured in layers using figment. Later sources win:
//! 1. Default values (compiled in)
//! 2. Config file: `/var/task/lambda-adapter.toml` (optional)
//! 3. Environment variables with the `LAMBDA_ADAPTER_` prefix
//!
//! Nested keys in environment variables are separated by a double
//! underscore, so `LAMBDA_ADAPTER_IDENTITY__TRANSACTION_HEADER` sets
//! `identity.transaction_header`.

use crate::error::ConfigError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_PATH: &str = "/var/task/lambda-adapter.toml";
const ENV_PREFIX: &str = "LAMBDA_ADAPTER_";

/// Main configuration struct for the adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Request construction settings.
    pub request: RequestConfig,
    /// Function and invocation identity settings.
    pub identity: IdentityConfig,
    /// Output envelope settings.
    pub response: ResponseConfig,
    /// Provider parameter settings.
    pub params: ParamsConfig,
}

impl AdapterConfig {
    /// Loads configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if a source is present but cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Loads configuration using a custom config file path.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(AdapterConfig::default()));

        if config_path.as_ref().exists() {
            figment = figment.merge(Toml::file(config_path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        Ok(figment.extract()?)
    }

    /// Creates a new config builder.
    pub fn builder() -> AdapterConfigBuilder {
        AdapterConfigBuilder::new()
    }
}

/// Request construction settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    /// Host used in synthesized URLs when the event carries none.
    pub default_host: String,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            default_host: "localhost".to_string(),
        }
    }
}

/// Identity resolution settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Inbound header carrying an explicit transaction id.
    pub transaction_header: String,
    /// Distributed-tracing header used when no transaction id is sent.
    pub trace_header: String,
    /// Version reported when the function ARN has no numeric qualifier.
    pub latest_version: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            transaction_header: "x-transaction-id".to_string(),
            trace_header: "x-amzn-trace-id".to_string(),
            latest_version: "$LATEST".to_string(),
        }
    }
}

/// Output envelope settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseConfig {
    /// Header that always carries the platform request id.
    pub invocation_header: String,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            invocation_header: "x-invocation-id".to_string(),
        }
    }
}

/// Provider parameter settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamsConfig {
    /// TOML file of string parameters merged under the process environment.
    pub file: Option<PathBuf>,
}

/// Builder for constructing configuration programmatically.
#[must_use = "builders do nothing unless .build() is called"]
pub struct AdapterConfigBuilder {
    config: AdapterConfig,
}

impl AdapterConfigBuilder {
    /// Creates a new config builder with default values.
    pub fn new() -> Self {
        Self {
            config: AdapterConfig::default(),
        }
    }

    /// Sets the host used for events without a host header.
    pub fn default_host(mut self, host: impl Into<String>) -> Self {
        self.config.request.default_host = host.into();
        self
    }

    /// Sets the transaction id header name.
    pub fn transaction_header(mut self, name: impl Into<String>) -> Self {
        self.config.identity.transaction_header = name.into();
        self
    }

    /// Sets the tracing header name.
    pub fn trace_header(mut self, name: impl Into<String>) -> Self {
        self.config.identity.trace_header = name.into();
        self
    }

    /// Sets the version sentinel for unqualified ARNs.
    pub fn latest_version(mut self, version: impl Into<String>) -> Self {
        self.config.identity.latest_version = version.into();
        self
    }

    /// Sets the invocation id response header name.
    pub fn invocation_header(mut self, name: impl Into<String>) -> Self {
        self.config.response.invocation_header = name.into();
        self
    }

    /// Sets the provider parameters file.
    pub fn params_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.params.file = Some(path.into());
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> AdapterConfig {
        self.config
    }
}

impl Default for AdapterConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
