//! Icon selection for OpenWeatherMap condition codes.
//!
//! The render collaborator draws the glyph; the core only picks which one.
//! Codes: <https://openweathermap.org/weather-conditions>.

/// Closed set of glyphs the display knows how to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum WeatherIcon {
    Thunderstorm = 0,
    Drizzle = 1,
    Rain = 2,
    Snow = 3,
    /// Mist, smoke, haze, fog, dust.
    Atmosphere = 4,
    Clear = 5,
    #[default]
    Clouds = 6,
}

impl WeatherIcon {
    pub fn from_condition(code: u16) -> Self {
        match code {
            0..=299 => Self::Thunderstorm,
            300..=399 => Self::Drizzle,
            400..=599 => Self::Rain,
            600..=699 => Self::Snow,
            700..=799 => Self::Atmosphere,
            800 => Self::Clear,
            _ => Self::Clouds,
        }
    }

    /// Short text label for text-only renderers.
    pub fn label(self) -> &'static str {
        match self {
            Self::Thunderstorm => "Storm",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::Snow => "Snow",
            Self::Atmosphere => "Mist",
            Self::Clear => "Clear",
            Self::Clouds => "Cloudy",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_groups_map_to_icons() {
        assert_eq!(WeatherIcon::from_condition(211), WeatherIcon::Thunderstorm);
        assert_eq!(WeatherIcon::from_condition(301), WeatherIcon::Drizzle);
        assert_eq!(WeatherIcon::from_condition(502), WeatherIcon::Rain);
        assert_eq!(WeatherIcon::from_condition(601), WeatherIcon::Snow);
        assert_eq!(WeatherIcon::from_condition(741), WeatherIcon::Atmosphere);
        assert_eq!(WeatherIcon::from_condition(800), WeatherIcon::Clear);
        assert_eq!(WeatherIcon::from_condition(804), WeatherIcon::Clouds);
    }

    #[test]
    fn unknown_codes_fall_back_to_clouds() {
        assert_eq!(WeatherIcon::from_condition(900), WeatherIcon::Clouds);
    }
}
