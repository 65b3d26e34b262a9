//! Fuzz target for function reference parsing.
//!
//! Run with: `cargo +nightly fuzz run fuzz_function_identity`

#![no_main]

use lambda_adapter::{FunctionIdentity, RuntimeInfo};
use libfuzzer_sys::fuzz_target;
use std::collections::HashMap;

fuzz_target!(|reference: &str| {
    let func = FunctionIdentity::resolve(reference, "fallback", None, "$LATEST");
    assert_eq!(func.fqn, reference);
    assert!(!func.version.is_empty());

    let _ = RuntimeInfo::resolve(reference, &HashMap::new());
});
