//! Fuzz target: urlencoded form decoder
//!
//! - No panics on arbitrary (including non-UTF-8) bytes
//! - No decoded key or value contains `&` or `+`
//!
//! cargo fuzz run fuzz_form_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use weatherstation::portal::form;

fuzz_target!(|data: &[u8]| {
    let fields = form::decode(data);
    for (k, v) in &fields {
        assert!(!k.contains('&') && !v.contains('&'));
        assert!(!k.contains('+') && !v.contains('+'));
    }
});
