//! Fuzz target for the JSON annotation source.
//!
//! Arbitrary bytes go through parsing and record validation; any panic is a
//! bug.

#![no_main]

use libfuzzer_sys::fuzz_target;
use citypersons2voc::ir::io_source_json::from_source_json_slice;

fuzz_target!(|data: &[u8]| {
    // Cap input size to avoid excessive memory usage.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = from_source_json_slice(data);
});
