//! Fuzz target for orthography TSV parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tiercheck::reference::Orthography;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = Orthography::from_reader(data);
});
