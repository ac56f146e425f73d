//! Fixed text screens handed to the render port.
//!
//! The display is 250×122 with an 8 px font, so every line stays short.
//! Each constructor returns a finished [`Screen`]; the adapter only lays
//! the lines out top to bottom and draws the icons in order.

use chrono::NaiveDateTime;

use crate::forecast::DailyForecast;
use crate::weather::{CurrentConditions, WeatherIcon};

/// One full-refresh frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Screen {
    pub lines: Vec<String>,
    /// Icons left to right: current conditions first, then forecast days.
    pub icons: Vec<WeatherIcon>,
}

impl Screen {
    pub fn text<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            icons: Vec::new(),
        }
    }
}

pub fn initializing() -> Screen {
    Screen::text(["Weather Station", "Initializing..."])
}

pub fn connecting() -> Screen {
    Screen::text(["Weather Station", "Connecting to WiFi..."])
}

pub fn attempt_failed(attempt: u8) -> Screen {
    Screen::text([
        "WiFi Connection".to_string(),
        format!("Attempt {attempt} failed"),
        "Retrying...".to_string(),
    ])
}

pub fn connect_exhausted() -> Screen {
    Screen::text(["WiFi Connection", "Failed!", "Check credentials", "and restart."])
}

pub fn setup_mode(ap_name: &str, ap_secret: &str, url: &str) -> Screen {
    Screen::text([
        "Wi-Fi Setup Mode".to_string(),
        "Connect to Wi-Fi:".to_string(),
        format!("SSID: {ap_name}"),
        format!("Password: {ap_secret}"),
        "Then visit in browser:".to_string(),
        url.to_string(),
    ])
}

pub fn setup_saved(network: &str) -> Screen {
    Screen::text([
        "Wi-Fi Config Saved!".to_string(),
        format!("SSID: {network}"),
        "Restarting...".to_string(),
    ])
}

pub fn setup_timeout() -> Screen {
    Screen::text(["Setup mode timeout", "Exiting..."])
}

pub fn setup_unavailable() -> Screen {
    Screen::text(["Setup mode failed", "Restarting..."])
}

pub fn synchronizing() -> Screen {
    Screen::text(["Weather Station", "Synchronizing time..."])
}

pub fn time_synchronized(now: NaiveDateTime) -> Screen {
    Screen::text([
        "Time synchronized".to_string(),
        format!("Date: {}", now.format("%d/%m/%Y")),
        format!("Time: {}", now.format("%H:%M")),
    ])
}

pub fn fetch_error() -> Screen {
    Screen::text(["Weather Station", "Error fetching data", "Will retry..."])
}

pub fn too_many_errors() -> Screen {
    Screen::text(["Too many errors", "Resetting device..."])
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Current conditions on top, up to five forecast columns below.
pub fn weather(current: &CurrentConditions, forecast: Option<&[DailyForecast]>, now: Option<NaiveDateTime>) -> Screen {
    let clock = now.map(|t| t.format("%H:%M").to_string()).unwrap_or_else(|| "--:--".into());
    let mut lines = vec![
        format!("Weather: {}, {}", current.place_name, clock),
        format!("Curr: {:.1} C", current.temperature),
        format!("Feel: {:.1} C", current.feels_like),
        format!("Humm: {}%", current.humidity),
        capitalize(&current.description),
    ];
    let mut icons = vec![current.icon()];

    match forecast {
        Some(days) if !days.is_empty() => {
            for day in days {
                lines.push(format!("{} {:.1}C", day.label(), day.temperature));
                icons.push(day.icon());
            }
        }
        _ => lines.push("Forecast unavailable".to_string()),
    }

    if let Some(t) = now {
        lines.push(t.format("%d/%m").to_string());
    }

    Screen { lines, icons }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Weekday};

    fn conditions() -> CurrentConditions {
        CurrentConditions {
            temperature: 21.44,
            feels_like: 20.0,
            humidity: 64,
            condition_code: 800,
            description: "clear sky".into(),
            wind_speed: 1.0,
            place_name: "Athens".into(),
            place_country: "GR".into(),
        }
    }

    #[test]
    fn weather_screen_without_forecast() {
        let s = weather(&conditions(), None, None);
        assert_eq!(s.lines[0], "Weather: Athens, --:--");
        assert_eq!(s.lines[1], "Curr: 21.4 C");
        assert_eq!(s.lines[4], "Clear sky");
        assert_eq!(s.lines.last().unwrap(), "Forecast unavailable");
        assert_eq!(s.icons, vec![WeatherIcon::Clear]);
    }

    #[test]
    fn weather_screen_lists_forecast_days() {
        let day = DailyForecast {
            date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            weekday: Weekday::Fri,
            temperature: 12.0,
            condition_code: 500,
            humidity: 80,
            wind_speed: 3.0,
        };
        let now = NaiveDate::from_ymd_opt(2025, 1, 9).unwrap().and_hms_opt(8, 5, 0).unwrap();
        let s = weather(&conditions(), Some(&[day]), Some(now));
        assert_eq!(s.lines[0], "Weather: Athens, 08:05");
        assert!(s.lines.contains(&"Fri 12.0C".to_string()));
        assert_eq!(s.lines.last().unwrap(), "09/01");
        assert_eq!(s.icons, vec![WeatherIcon::Clear, WeatherIcon::Rain]);
    }

    #[test]
    fn setup_screen_shows_access_point() {
        let s = setup_mode("WeatherStation", "setupmode", "http://192.168.4.1");
        assert!(s.lines.contains(&"SSID: WeatherStation".to_string()));
        assert!(s.lines.contains(&"Password: setupmode".to_string()));
    }
}
