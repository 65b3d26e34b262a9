//! The execution context handed to the function alongside the request.

use crate::identity::{FunctionIdentity, InvocationIdentity, PathInfo, RuntimeInfo};
use crate::log::InvocationLog;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Everything the function knows about its invocation besides the request.
///
/// A fresh context is assembled for every invocation; nothing in it is
/// shared with other invocations except the log sink behind `log`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContext {
    /// Identity of the deployed function.
    pub func: FunctionIdentity,
    /// Identity of this invocation.
    pub invocation: InvocationIdentity,
    /// Provider parameters overlaid by the process environment.
    /// Absent for raw invocations.
    pub env: Option<HashMap<String, String>>,
    /// Trigger records, present only for trigger invocations.
    pub records: Option<Vec<Value>>,
    /// Hosting runtime information.
    pub runtime: RuntimeInfo,
    /// Greedy path parameter information.
    pub path_info: PathInfo,
    /// Logging handle for this invocation.
    #[serde(skip)]
    pub log: InvocationLog,
}

impl ExecutionContext {
    /// Composes a context from already-resolved parts.
    pub fn assemble(
        func: FunctionIdentity,
        invocation: InvocationIdentity,
        env: Option<HashMap<String, String>>,
        records: Option<&[Value]>,
        runtime: RuntimeInfo,
        path_info: PathInfo,
        log: InvocationLog,
    ) -> Self {
        Self {
            func,
            invocation,
            env,
            records: records.map(<[Value]>::to_vec),
            runtime,
            path_info,
            log,
        }
    }
}
