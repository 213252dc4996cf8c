#![no_main]

//! Fuzz target for event payload parsing.
//!
//! Ingestion must reject any malformed body with an invalid-payload error
//! and never panic.

use libfuzzer_sys::fuzz_target;
use rowgate_core::{EventRow, RowgateError};

fuzz_target!(|data: &[u8]| {
    match EventRow::from_payload(data) {
        Ok(row) => {
            // Accepted payloads are valid UTF-8 and re-encode to the same row.
            assert!(std::str::from_utf8(data).is_ok());
            let encoded = serde_json::to_string(&row).expect("row always serializes");
            assert_eq!(EventRow::parse(&encoded).expect("re-encoded row parses"), row);
        },
        Err(RowgateError::InvalidPayload(_)) => {},
        Err(other) => panic!("unexpected error kind: {other:?}"),
    }
});
