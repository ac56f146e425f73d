//! OpenWeatherMap JSON decoding (`/weather` and `/forecast`, metric units).
//!
//! Every field in the wire structs is optional so a partially populated
//! response degrades into a typed [`WeatherError`] instead of a serde
//! failure deep in a nested struct.

use chrono::{DateTime, NaiveDateTime};
use log::{debug, warn};
use serde::Deserialize;

use super::{CurrentConditions, ForecastSample};
use crate::config::StationConfig;
use crate::error::WeatherError;

// ── OWM JSON structures ─────────────────────────────────────────────

#[derive(Deserialize)]
struct OwmCurrentRoot {
    main: Option<OwmMain>,
    weather: Option<Vec<OwmWeather>>,
    wind: Option<OwmWind>,
    name: Option<String>,
    sys: Option<OwmSys>,
}

#[derive(Deserialize)]
struct OwmMain {
    temp: Option<f32>,
    feels_like: Option<f32>,
    humidity: Option<u8>,
}

#[derive(Deserialize)]
struct OwmWeather {
    id: Option<u16>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct OwmWind {
    speed: Option<f32>,
}

#[derive(Deserialize)]
struct OwmSys {
    country: Option<String>,
}

#[derive(Deserialize)]
struct OwmForecastRoot {
    list: Option<Vec<OwmForecastEntry>>,
}

#[derive(Deserialize)]
struct OwmForecastEntry {
    dt: Option<i64>,
    dt_txt: Option<String>,
    main: Option<OwmMain>,
    weather: Option<Vec<OwmWeather>>,
    wind: Option<OwmWind>,
}

// ── URLs ────────────────────────────────────────────────────────────

fn endpoint(config: &StationConfig, resource: &str) -> String {
    format!(
        "{}/{}?lat={}&lon={}&appid={}&units={}",
        config.weather_api_base.trim_end_matches('/'),
        resource,
        config.latitude,
        config.longitude,
        config.weather_api_key,
        config.units,
    )
}

pub fn current_url(config: &StationConfig) -> String {
    endpoint(config, "weather")
}

pub fn forecast_url(config: &StationConfig) -> String {
    endpoint(config, "forecast")
}

// ── Parsing ─────────────────────────────────────────────────────────

pub fn parse_current(body: &[u8]) -> Result<CurrentConditions, WeatherError> {
    let root: OwmCurrentRoot = serde_json::from_slice(body).map_err(|e| {
        warn!("weather: current payload rejected ({})", e);
        WeatherError::Parse
    })?;

    let main = root.main.ok_or(WeatherError::MissingField("main"))?;
    let temperature = main.temp.ok_or(WeatherError::MissingField("main.temp"))?;
    let humidity = main.humidity.ok_or(WeatherError::MissingField("main.humidity"))?;
    let first = root
        .weather
        .and_then(|w| w.into_iter().next())
        .ok_or(WeatherError::MissingField("weather"))?;
    let condition_code = first.id.ok_or(WeatherError::MissingField("weather.id"))?;

    Ok(CurrentConditions {
        temperature,
        feels_like: main.feels_like.unwrap_or(temperature),
        humidity,
        condition_code,
        description: first.description.unwrap_or_default(),
        wind_speed: root.wind.and_then(|w| w.speed).unwrap_or(0.0),
        place_name: root.name.unwrap_or_else(|| "?".to_string()),
        place_country: root.sys.and_then(|s| s.country).unwrap_or_default(),
    })
}

/// Decode the 3-hour feed in feed order. Entries without a timestamp,
/// `main` block or condition are dropped.
pub fn parse_forecast(body: &[u8]) -> Result<Vec<ForecastSample>, WeatherError> {
    let root: OwmForecastRoot = serde_json::from_slice(body).map_err(|e| {
        warn!("weather: forecast payload rejected ({})", e);
        WeatherError::Parse
    })?;
    let list = root.list.ok_or(WeatherError::MissingField("list"))?;

    let mut samples = Vec::with_capacity(list.len());
    for entry in list {
        let Some(timestamp) = entry_timestamp(entry.dt_txt.as_deref(), entry.dt) else {
            debug!("weather: forecast entry without timestamp skipped");
            continue;
        };
        let Some(main) = entry.main else { continue };
        let Some(temperature) = main.temp else { continue };
        let Some(condition_code) = entry
            .weather
            .and_then(|w| w.into_iter().next())
            .and_then(|w| w.id)
        else {
            continue;
        };

        samples.push(ForecastSample {
            timestamp,
            temperature,
            condition_code,
            humidity: main.humidity.unwrap_or(0),
            wind_speed: entry.wind.and_then(|w| w.speed).unwrap_or(0.0),
        });
    }
    Ok(samples)
}

/// `dt_txt` ("2025-01-10 12:00:00") is the feed's own clock; `dt` is the
/// fallback, read on the same (UTC) calendar.
fn entry_timestamp(dt_txt: Option<&str>, dt: Option<i64>) -> Option<NaiveDateTime> {
    if let Some(text) = dt_txt {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
            return Some(ts);
        }
    }
    dt.and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|utc| utc.naive_utc())
}
