//! Lambda runtime for the dump function.
//!
//! Configuration is loaded from (in order of priority):
//! 1. Default values
//! 2. Config file: `/var/task/lambda-adapter.toml`
//! 3. Environment variables with `LAMBDA_ADAPTER_` prefix
//!
//! Environment variables:
//! - `AWS_LAMBDA_RUNTIME_API` - Required, set by the Lambda service
//! - `LAMBDA_ADAPTER_PARAMS__FILE` - Optional TOML file of provider parameters
//! - `RUST_LOG` - Log filter (default: `info,lambda_adapter=debug`)

use anyhow::{Context, Result};
use lambda_adapter::AdapterConfig;
use lambda_adapter_example::{create_service, init_tracing};
use lambda_runtime::Runtime;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing().context("failed to initialise tracing subscriber")?;

    let config = AdapterConfig::load().context("failed to load configuration")?;
    tracing::debug!(?config, "Configuration loaded");

    // Runtime::new instead of run() keeps the adapter's span as the root
    // span of each invocation.
    Runtime::new(create_service(config))
        .run()
        .await
        .map_err(|e| anyhow::anyhow!(e))
        .context("lambda runtime failed")?;

    Ok(())
}
