//! Fuzz target for TextGrid parsing.
//!
//! This fuzzer feeds arbitrary byte sequences to the TextGrid reader,
//! which also exercises encoding detection. Anything that parses is
//! written back out and parsed again.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tiercheck::ir::io_textgrid::{from_textgrid_slice, from_textgrid_str, to_textgrid_string};

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    if let Ok(annotation) = from_textgrid_slice(data, true) {
        let _ = from_textgrid_str(&to_textgrid_string(&annotation), true);
    }
});
