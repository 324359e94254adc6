//! Fuzz target for annotation XML parsing.
//!
//! This fuzzer feeds arbitrary byte sequences to the annotation parser,
//! checking for panics, crashes, or hangs.

#![no_main]

use gtdraw::annotation::from_annotation_xml_slice;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Cap input size to avoid excessive memory usage.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = from_annotation_xml_slice(data);
});
