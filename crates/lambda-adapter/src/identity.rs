//! Function and invocation identity resolution.
//!
//! Function identity is derived from the invoked function ARN:
//!
//! ```text
//! arn:aws:lambda:us-east-1:118435662149:function:helix-pages--dump:4_3_1
//!                          ^ account             ^ package   ^ name ^ version
//! ```
//!
//! A trailing qualifier made of `_`-separated numeric tokens is the version
//! (`4_3_1` becomes `4.3.1`). A function segment following the
//! `<package>--<name>` convention yields the package.

use crate::config::IdentityConfig;
use crate::platform::now_millis;
use http::HeaderMap;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// Runtime name reported in [`RuntimeInfo`].
pub const RUNTIME_NAME: &str = "aws-lambda";

/// Identity of the deployed function revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionIdentity {
    /// Function name.
    pub name: String,
    /// Owning package, when the function follows the `package--name` convention.
    pub package: Option<String>,
    /// Dotted version, or the configured latest sentinel.
    pub version: String,
    /// Fully-qualified name: the invoked function ARN exactly as received.
    pub fqn: String,
    /// Gateway API id; absent when the invocation has no gateway context.
    pub app: Option<String>,
}

impl FunctionIdentity {
    /// Resolves function identity from the platform's function reference.
    pub fn resolve(
        reference: &str,
        function_name: &str,
        api_id: Option<&str>,
        latest_version: &str,
    ) -> Self {
        let parts: Vec<&str> = reference.split(':').collect();

        let (segment, version) = match parts.split_last() {
            Some((last, rest)) if !rest.is_empty() && is_numeric_qualifier(last) => {
                (rest.last().copied().unwrap_or_default(), last.replace('_', "."))
            }
            Some((last, _)) => (*last, latest_version.to_string()),
            None => ("", latest_version.to_string()),
        };

        let (package, name) = match segment.split_once("--") {
            Some((package, name)) if !package.is_empty() && !name.is_empty() => {
                (Some(package.to_string()), name.to_string())
            }
            _ => (None, function_name.to_string()),
        };

        Self {
            name,
            package,
            version,
            fqn: reference.to_string(),
            app: api_id.map(str::to_string),
        }
    }
}

/// Returns `true` for qualifiers like `4`, `4_3_1`.
fn is_numeric_qualifier(qualifier: &str) -> bool {
    !qualifier.is_empty()
        && qualifier
            .split('_')
            .all(|token| !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()))
}

/// Identity of a single invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationIdentity {
    /// Platform request id. Always present.
    pub id: String,
    /// Upstream gateway request id, when routed through a gateway.
    pub request_id: Option<String>,
    /// Correlation id for the whole transaction.
    pub transaction_id: String,
    /// Deadline in milliseconds since the Unix epoch.
    pub deadline: u64,
}

impl InvocationIdentity {
    /// Resolves invocation identity.
    ///
    /// The transaction id is taken from the explicit transaction header, then
    /// the tracing header, then the platform request id.
    pub fn resolve(
        platform_request_id: &str,
        gateway_request_id: Option<&str>,
        headers: &HeaderMap,
        remaining: Duration,
        config: &IdentityConfig,
    ) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
        };

        let transaction_id = header(&config.transaction_header)
            .or_else(|| header(&config.trace_header))
            .unwrap_or(platform_request_id)
            .to_string();

        Self {
            id: platform_request_id.to_string(),
            request_id: gateway_request_id.map(str::to_string),
            transaction_id,
            deadline: now_millis().saturating_add(remaining.as_millis() as u64),
        }
    }
}

/// Information about the hosting runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeInfo {
    /// Runtime name, always [`RUNTIME_NAME`].
    pub name: &'static str,
    /// Region from `AWS_REGION`.
    pub region: Option<String>,
    /// Account id from the function ARN.
    pub account_id: Option<String>,
}

impl RuntimeInfo {
    /// Resolves runtime information from the function ARN and process environment.
    pub fn resolve(reference: &str, process_env: &HashMap<String, String>) -> Self {
        let account_id = reference
            .split(':')
            .nth(4)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Self {
            name: RUNTIME_NAME,
            region: process_env.get("AWS_REGION").cloned(),
            account_id,
        }
    }
}

/// Path information for routes with a greedy path parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PathInfo {
    /// `/<path>` from the `path` path parameter, or empty.
    pub suffix: String,
}

impl PathInfo {
    /// Builds path info from gateway path parameters.
    pub fn from_path_parameters(params: Option<&HashMap<String, String>>) -> Self {
        let suffix = params
            .and_then(|p| p.get("path"))
            .filter(|p| !p.is_empty())
            .map(|p| format!("/{}", p.trim_start_matches('/')))
            .unwrap_or_default();
        Self { suffix }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    const ARN: &str = "arn:aws:lambda:us-east-1:118435662149:function:helix-pages--dump:4_3_1";
    const REQUEST_ID: &str = "535f0399-9c90-4042-880e-620cfec6af55";
    const TRACE: &str = "Root=1-603df0bb-05e846307a6221f72030fe68";

    #[test]
    fn test_resolve_versioned_arn() {
        let func = FunctionIdentity::resolve(ARN, "dump", Some("kvvyh7ikcb"), "$LATEST");

        assert_eq!(
            func,
            FunctionIdentity {
                name: "dump".to_string(),
                package: Some("helix-pages".to_string()),
                version: "4.3.1".to_string(),
                fqn: ARN.to_string(),
                app: Some("kvvyh7ikcb".to_string()),
            }
        );
    }

    #[test]
    fn test_resolve_unversioned_arn_uses_latest() {
        let arn = "arn:aws:lambda:us-east-1:118435662149:function:helix-pages--dump";
        let func = FunctionIdentity::resolve(arn, "dump", Some("kvvyh7ikcb"), "$LATEST");

        assert_eq!(func.version, "$LATEST");
        assert_eq!(func.fqn, arn);
        assert_eq!(func.package.as_deref(), Some("helix-pages"));
        assert_eq!(func.name, "dump");
    }

    #[test]
    fn test_resolve_alias_is_not_a_version() {
        let arn = "arn:aws:lambda:us-east-1:118435662149:function:helix-pages--dump:prod";
        let func = FunctionIdentity::resolve(arn, "dump", None, "$LATEST");
        assert_eq!(func.version, "$LATEST");
    }

    #[test]
    fn test_resolve_single_numeric_version() {
        let arn = "arn:aws:lambda:us-east-1:118435662149:function:my-fn:7";
        let func = FunctionIdentity::resolve(arn, "my-fn", None, "$LATEST");

        assert_eq!(func.version, "7");
        assert_eq!(func.package, None);
        assert_eq!(func.name, "my-fn");
    }

    #[test]
    fn test_resolve_without_package_uses_function_name() {
        let arn = "arn:aws:lambda:us-east-1:118435662149:function:simple";
        let func = FunctionIdentity::resolve(arn, "simple", None, "$LATEST");

        assert_eq!(func.package, None);
        assert_eq!(func.name, "simple");
        assert_eq!(func.app, None);
    }

    #[test]
    fn test_resolve_empty_reference() {
        let func = FunctionIdentity::resolve("", "dump", None, "$LATEST");
        assert_eq!(func.name, "dump");
        assert_eq!(func.version, "$LATEST");
        assert_eq!(func.fqn, "");
    }

    #[test]
    fn test_numeric_qualifier() {
        assert!(is_numeric_qualifier("4_3_1"));
        assert!(is_numeric_qualifier("12"));
        assert!(!is_numeric_qualifier("4__1"));
        assert!(!is_numeric_qualifier("$LATEST"));
        assert!(!is_numeric_qualifier(""));
    }

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn test_transaction_id_prefers_explicit_header() {
        let headers = headers(&[("x-transaction-id", "my-tx-id"), ("x-amzn-trace-id", TRACE)]);
        let invocation = InvocationIdentity::resolve(
            REQUEST_ID,
            Some("bjKNYhHcoAMEJIw="),
            &headers,
            Duration::from_secs(30),
            &IdentityConfig::default(),
        );

        assert_eq!(invocation.id, REQUEST_ID);
        assert_eq!(invocation.request_id.as_deref(), Some("bjKNYhHcoAMEJIw="));
        assert_eq!(invocation.transaction_id, "my-tx-id");
    }

    #[test]
    fn test_transaction_id_falls_back_to_trace_header() {
        let headers = headers(&[("x-amzn-trace-id", TRACE)]);
        let invocation = InvocationIdentity::resolve(
            REQUEST_ID,
            None,
            &headers,
            Duration::from_secs(30),
            &IdentityConfig::default(),
        );

        assert_eq!(invocation.transaction_id, TRACE);
    }

    #[test]
    fn test_transaction_id_falls_back_to_request_id() {
        let invocation = InvocationIdentity::resolve(
            REQUEST_ID,
            None,
            &HeaderMap::new(),
            Duration::from_secs(30),
            &IdentityConfig::default(),
        );

        assert_eq!(invocation.transaction_id, REQUEST_ID);
        assert_eq!(invocation.request_id, None);
    }

    #[test]
    fn test_deadline_adds_remaining_time() {
        let before = now_millis();
        let invocation = InvocationIdentity::resolve(
            REQUEST_ID,
            None,
            &HeaderMap::new(),
            Duration::from_millis(30_000),
            &IdentityConfig::default(),
        );
        let after = now_millis();

        assert!(invocation.deadline >= before + 30_000);
        assert!(invocation.deadline <= after + 30_000);
    }

    #[test]
    fn test_runtime_info() {
        let env = HashMap::from([("AWS_REGION".to_string(), "us-east-1".to_string())]);
        let runtime = RuntimeInfo::resolve(ARN, &env);

        assert_eq!(runtime.name, "aws-lambda");
        assert_eq!(runtime.region.as_deref(), Some("us-east-1"));
        assert_eq!(runtime.account_id.as_deref(), Some("118435662149"));
    }

    #[test]
    fn test_path_info_suffix() {
        let params = HashMap::from([("path".to_string(), "docs/index.md".to_string())]);
        assert_eq!(
            PathInfo::from_path_parameters(Some(&params)).suffix,
            "/docs/index.md"
        );
        assert_eq!(PathInfo::from_path_parameters(None).suffix, "");
    }
}
