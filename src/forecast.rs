//! Daily forecast aggregation.
//!
//! Reduces the 3-hour feed to at most [`MAX_DAYS`] daily summaries, one
//! per calendar day after today, using the 12:00 bucket as the day's
//! representative. Days whose feed has no exact 12:00 bucket are skipped,
//! not substituted.

use chrono::{NaiveDate, NaiveTime, Timelike, Weekday};
use heapless::Vec;

use crate::weather::{ForecastSample, WeatherIcon};

/// Upper bound on emitted days.
pub const MAX_DAYS: usize = 5;

/// Hour of the representative bucket.
const MIDDAY_HOUR: u32 = 12;

/// One day of the forecast, as shown in a forecast column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyForecast {
    pub date: NaiveDate,
    /// Rolling day label; see [`aggregate`].
    pub weekday: Weekday,
    pub temperature: f32,
    pub condition_code: u16,
    pub humidity: u8,
    pub wind_speed: f32,
}

impl DailyForecast {
    /// Three-letter day name ("Mon").
    pub fn label(&self) -> &'static str {
        weekday_short(self.weekday)
    }

    pub fn icon(&self) -> WeatherIcon {
        WeatherIcon::from_condition(self.condition_code)
    }
}

pub type DailyForecasts = Vec<DailyForecast, MAX_DAYS>;

pub fn weekday_short(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

fn is_midday(time: NaiveTime) -> bool {
    time.hour() == MIDDAY_HOUR && time.minute() == 0 && time.second() == 0
}

/// Pick one 12:00 sample per calendar day, skipping `today`.
///
/// Samples are walked in feed order. The label starts at the weekday after
/// `today_weekday` and advances by one per emitted entry, so a skipped day
/// shifts the labels of the days after it (the feed normally has no gaps).
pub fn aggregate(samples: &[ForecastSample], today: NaiveDate, today_weekday: Weekday) -> DailyForecasts {
    let mut days = DailyForecasts::new();
    let mut label = today_weekday.succ();

    for sample in samples {
        let date = sample.timestamp.date();
        if date == today || days.iter().any(|d| d.date == date) {
            continue;
        }
        if !is_midday(sample.timestamp.time()) {
            continue;
        }

        let day = DailyForecast {
            date,
            weekday: label,
            temperature: sample.temperature,
            condition_code: sample.condition_code,
            humidity: sample.humidity,
            wind_speed: sample.wind_speed,
        };
        if days.push(day).is_err() {
            break;
        }
        label = label.succ();
        if days.is_full() {
            break;
        }
    }

    days
}


#[cfg(test)]
mod proptests {
    use super::*;
    use chrono::NaiveDateTime;
    use proptest::prelude::*;

    fn arb_sample() -> impl Strategy<Value = ForecastSample> {
        (0i64..10, 0u32..8, -20.0f32..40.0).prop_map(|(day, bucket, temp)| {
            let base: NaiveDateTime = NaiveDate::from_ymd_opt(2025, 1, 9)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap();
            ForecastSample {
                timestamp: base
                    + chrono::Duration::days(day)
                    + chrono::Duration::hours(i64::from(bucket) * 3),
                temperature: temp,
                condition_code: 800,
                humidity: 40,
                wind_speed: 1.0,
            }
        })
    }

    proptest! {
        #[test]
        fn aggregate_invariants(samples in proptest::collection::vec(arb_sample(), 0..80)) {
            let today = NaiveDate::from_ymd_opt(2025, 1, 9).unwrap();
            let days = aggregate(&samples, today, Weekday::Thu);

            prop_assert!(days.len() <= MAX_DAYS);
            for (i, d) in days.iter().enumerate() {
                prop_assert!(d.date != today);
                prop_assert!(days.iter().skip(i + 1).all(|o| o.date != d.date));
            }
        }

        #[test]
        fn chronological_feed_yields_increasing_dates(n in 0usize..80) {
            let today = NaiveDate::from_ymd_opt(2025, 1, 9).unwrap();
            let start = today.and_hms_opt(0, 0, 0).unwrap();
            let samples: std::vec::Vec<_> = (0..n)
                .map(|i| ForecastSample {
                    timestamp: start + chrono::Duration::hours(3 * i as i64),
                    temperature: 0.0,
                    condition_code: 800,
                    humidity: 0,
                    wind_speed: 0.0,
                })
                .collect();
            let days = aggregate(&samples, today, Weekday::Thu);
            prop_assert!(days.windows(2).all(|w| w[0].date < w[1].date));
        }
    }
}
