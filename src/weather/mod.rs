//! Weather domain model.
//!
//! Payloads arrive from the fetch collaborator ([`WeatherPort`]) already
//! parsed into these types; [`owm`] holds the OpenWeatherMap decoding.
//!
//! [`WeatherPort`]: crate::app::ports::WeatherPort

pub mod icons;
pub mod owm;

use chrono::NaiveDateTime;

pub use icons::WeatherIcon;

/// Current conditions at the configured location.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    pub temperature: f32,
    pub feels_like: f32,
    pub humidity: u8,
    pub condition_code: u16,
    pub description: String,
    pub wind_speed: f32,
    pub place_name: String,
    pub place_country: String,
}

impl CurrentConditions {
    pub fn icon(&self) -> WeatherIcon {
        WeatherIcon::from_condition(self.condition_code)
    }
}

/// One 3-hour bucket of the forecast feed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastSample {
    /// Bucket start on the feed's own calendar.
    pub timestamp: NaiveDateTime,
    pub temperature: f32,
    pub condition_code: u16,
    pub humidity: u8,
    pub wind_speed: f32,
}
