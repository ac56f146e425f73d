//! Fuzz target: `RequestReader`
//!
//! Splits the input at a fuzz-chosen offset and feeds both halves,
//! verifying:
//! - No panics under arbitrary bytes
//! - A parsed body never exceeds the configured cap
//! - The reader stops accumulating once it reports an error
//!
//! cargo fuzz run fuzz_request_reader

#![no_main]

use libfuzzer_sys::fuzz_target;
use weatherstation::portal::request::{RequestLimits, RequestReader};

const LIMITS: RequestLimits = RequestLimits {
    max_header_bytes: 512,
    max_body_bytes: 256,
};

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }
    let split = data[0] as usize % data.len();
    let (first, second) = data[1..].split_at(split.min(data.len() - 1));

    let mut reader = RequestReader::new(LIMITS);
    for chunk in [first, second] {
        match reader.feed(chunk) {
            Ok(Some(req)) => {
                assert!(req.body.len() <= LIMITS.max_body_bytes);
                return;
            }
            Ok(None) => {}
            Err(e) => {
                assert_eq!(reader.buffered(), 0);
                assert_eq!(reader.feed(data), Err(e));
                assert_eq!(reader.buffered(), 0);
                return;
            }
        }
    }
    let _ = reader.finish();
});
