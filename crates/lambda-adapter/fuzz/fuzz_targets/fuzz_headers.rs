//! Fuzz target for inbound header sanitation.
//!
//! Run with: `cargo +nightly fuzz run fuzz_headers`

#![no_main]

use lambda_adapter::{cleanup_header_value, sanitize_headers};
use libfuzzer_sys::fuzz_target;
use std::collections::HashMap;

fuzz_target!(|pairs: Vec<(String, String)>| {
    let raw: HashMap<String, String> = pairs.into_iter().collect();

    if let Ok(headers) = sanitize_headers(&raw) {
        assert!(headers.len() <= raw.len());
        for (name, value) in &headers {
            assert_eq!(name.as_str(), name.as_str().to_ascii_lowercase());
            assert!(value.to_str().is_ok());
        }
    }

    for value in raw.values() {
        let cleaned = cleanup_header_value(value);
        assert!(http::HeaderValue::from_str(&cleaned).is_ok());
    }
});
