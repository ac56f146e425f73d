//! Fuzz target: OpenWeatherMap payload parsing
//!
//! Arbitrary bodies must yield `Ok` or a `WeatherError`, never a panic.
//!
//! cargo fuzz run fuzz_owm_payload

#![no_main]

use libfuzzer_sys::fuzz_target;
use weatherstation::weather::owm;

fuzz_target!(|data: &[u8]| {
    let _ = owm::parse_current(data);
    if let Ok(samples) = owm::parse_forecast(data) {
        let _ = weatherstation::forecast::aggregate(
            &samples,
            chrono::NaiveDate::from_ymd_opt(2025, 1, 9).unwrap(),
            chrono::Weekday::Thu,
        );
    }
});
