//! The adapter's view of the Lambda execution context.

use lambda_runtime::Context as LambdaContext;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

static FIRST_INVOCATION: AtomicBool = AtomicBool::new(true);

/// Platform-supplied metadata for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformContext {
    /// Platform request id (`awsRequestId`).
    pub request_id: String,
    /// Function name as configured on the platform.
    pub function_name: String,
    /// Function reference string (the invoked function ARN).
    pub invoked_function_arn: String,
    /// Absolute deadline in milliseconds since the Unix epoch.
    pub deadline_ms: u64,
}

impl PlatformContext {
    /// Time left before the platform aborts the invocation.
    pub fn remaining_time(&self) -> Duration {
        Duration::from_millis(self.deadline_ms.saturating_sub(now_millis()))
    }
}

impl From<&LambdaContext> for PlatformContext {
    fn from(ctx: &LambdaContext) -> Self {
        Self {
            request_id: ctx.request_id.clone(),
            function_name: ctx.env_config.function_name.clone(),
            invoked_function_arn: ctx.invoked_function_arn.clone(),
            deadline_ms: ctx.deadline,
        }
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Returns `true` for the first invocation in this execution environment.
///
/// Environments pre-warmed by provisioned concurrency never report a cold
/// start, but still consume the flag.
pub(crate) fn take_cold_start(process_env: &HashMap<String, String>) -> bool {
    let first = FIRST_INVOCATION.swap(false, Ordering::SeqCst);
    let provisioned = process_env
        .get("AWS_LAMBDA_INITIALIZATION_TYPE")
        .is_some_and(|t| t == "provisioned-concurrency");
    first && !provisioned
}

#[cfg(test)]
pub(crate) fn reset_cold_start() {
    FIRST_INVOCATION.store(true, Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::sync::Arc;

    #[test]
    fn test_from_lambda_context() {
        let mut config = lambda_runtime::Config::default();
        config.function_name = "dump".to_string();

        let mut ctx = LambdaContext::default();
        ctx.request_id = "535f0399-9c90-4042-880e-620cfec6af55".to_string();
        ctx.invoked_function_arn =
            "arn:aws:lambda:us-east-1:118435662149:function:helix-pages--dump:4_3_1".to_string();
        ctx.deadline = 1_700_000_000_000;
        ctx.env_config = Arc::new(config);

        let platform = PlatformContext::from(&ctx);

        assert_eq!(platform.request_id, "535f0399-9c90-4042-880e-620cfec6af55");
        assert_eq!(platform.function_name, "dump");
        assert_eq!(platform.deadline_ms, 1_700_000_000_000);
    }

    #[test]
    fn test_remaining_time_saturates() {
        let platform = PlatformContext {
            request_id: "id".to_string(),
            function_name: "dump".to_string(),
            invoked_function_arn: String::new(),
            deadline_ms: 0,
        };
        assert_eq!(platform.remaining_time(), Duration::ZERO);
    }

    #[test]
    fn test_remaining_time_counts_down() {
        let platform = PlatformContext {
            request_id: "id".to_string(),
            function_name: "dump".to_string(),
            invoked_function_arn: String::new(),
            deadline_ms: now_millis() + 30_000,
        };
        let remaining = platform.remaining_time();
        assert!(remaining <= Duration::from_secs(30));
        assert!(remaining > Duration::from_secs(25));
    }

    #[test]
    #[serial(cold_start)]
    fn test_cold_start_reported_once() {
        reset_cold_start();
        let env = HashMap::new();

        assert!(take_cold_start(&env));
        assert!(!take_cold_start(&env));
    }

    #[test]
    #[serial(cold_start)]
    fn test_provisioned_concurrency_is_never_cold() {
        reset_cold_start();
        let env = HashMap::from([(
            "AWS_LAMBDA_INITIALIZATION_TYPE".to_string(),
            "provisioned-concurrency".to_string(),
        )]);

        assert!(!take_cold_start(&env));
        assert!(!take_cold_start(&HashMap::new()));
    }
}
