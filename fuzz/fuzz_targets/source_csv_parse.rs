//! Fuzz target for the CSV annotation source.

#![no_main]

use libfuzzer_sys::fuzz_target;
use citypersons2voc::ir::io_source_csv::from_source_csv_slice;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = from_source_csv_slice(data);
});
