//! OpenWeatherMap HTTP client adapter.
//!
//! Implements [`WeatherPort`] by GETting the `/weather` and `/forecast`
//! endpoints and handing the body to [`owm`](crate::weather::owm).
//!
//! - **`target_os = "espidf"`**: `EspHttpConnection` wrapped in the
//!   `embedded_svc` blocking client.
//! - **all other targets**: `reqwest`'s blocking client.
//!
//! Both paths accept only `200 OK` and cap the body at
//! [`MAX_RESPONSE_BYTES`].

use log::{info, warn};

use crate::app::ports::WeatherPort;
use crate::config::StationConfig;
use crate::error::WeatherError;
use crate::weather::{owm, CurrentConditions, ForecastSample};

/// The 5-day / 3-hour feed is ~16 KB; leave headroom.
pub const MAX_RESPONSE_BYTES: usize = 48 * 1024;

const TIMEOUT_MS: u64 = 15_000;

pub struct OwmClient {
    current_url: String,
    forecast_url: String,
}

impl OwmClient {
    pub fn new(config: &StationConfig) -> Self {
        Self {
            current_url: owm::current_url(config),
            forecast_url: owm::forecast_url(config),
        }
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>, WeatherError> {
        let body = http_get(url)?;
        info!("Weather: GET {} -> {} bytes", redact(url), body.len());
        Ok(body)
    }
}

/// Hide the API key in logged URLs.
fn redact(url: &str) -> String {
    match url.find("appid=") {
        Some(start) => {
            let rest = &url[start + 6..];
            let end = rest.find('&').map_or(url.len(), |i| start + 6 + i);
            format!("{}***{}", &url[..start + 6], &url[end..])
        }
        None => url.to_string(),
    }
}

impl WeatherPort for OwmClient {
    fn fetch_current(&mut self) -> Result<CurrentConditions, WeatherError> {
        let body = self.fetch(&self.current_url)?;
        owm::parse_current(&body)
    }

    fn fetch_forecast(&mut self) -> Result<Vec<ForecastSample>, WeatherError> {
        let body = self.fetch(&self.forecast_url)?;
        owm::parse_forecast(&body)
    }
}

// ── Platform: ESP-IDF ───────────────────────────────────────────────

#[cfg(target_os = "espidf")]
fn http_get(url: &str) -> Result<Vec<u8>, WeatherError> {
    use embedded_svc::http::client::Client;
    use embedded_svc::http::Method;
    use embedded_svc::io::Read;
    use esp_idf_svc::http::client::{Configuration, EspHttpConnection};

    let config = Configuration {
        timeout: Some(std::time::Duration::from_millis(TIMEOUT_MS)),
        use_global_ca_store: true,
        crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
        ..Default::default()
    };
    let connection = EspHttpConnection::new(&config).map_err(|e| {
        warn!("Weather: HTTP connection failed: {}", e);
        WeatherError::Network
    })?;
    let mut client = Client::wrap(connection);

    let mut response = client
        .request(Method::Get, url, &[("accept", "application/json")])
        .and_then(|r| r.submit())
        .map_err(|e| {
            warn!("Weather: request failed: {}", e);
            WeatherError::Network
        })?;

    let status = response.status();
    if status != 200 {
        return Err(WeatherError::Http(status));
    }

    let mut body = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        let n = response.read(&mut buf).map_err(|_| WeatherError::Network)?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&buf[..n]);
        if body.len() > MAX_RESPONSE_BYTES {
            return Err(WeatherError::TooLarge);
        }
    }
    Ok(body)
}

// ── Platform: host ──────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
fn http_get(url: &str) -> Result<Vec<u8>, WeatherError> {
    use std::io::Read;
    use std::time::Duration;

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_millis(TIMEOUT_MS))
        .build()
        .map_err(|e| {
            warn!("Weather: HTTP client setup failed: {}", e);
            WeatherError::Network
        })?;

    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .map_err(|e| {
            warn!("Weather: request failed: {}", e.without_url());
            WeatherError::Network
        })?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(WeatherError::Http(status.as_u16()));
    }

    let mut body = Vec::new();
    response
        .take(MAX_RESPONSE_BYTES as u64 + 1)
        .read_to_end(&mut body)
        .map_err(|_| WeatherError::Network)?;
    if body.len() > MAX_RESPONSE_BYTES {
        return Err(WeatherError::TooLarge);
    }
    Ok(body)
}
