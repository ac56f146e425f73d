//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                  |
//! |----------------|--------------------|------------------------------|
//! | `credentials`  | CredentialStore    | JSON file on SPIFFS / host fs|
//! | `display`      | RenderPort         | Serial log (panel stand-in)  |
//! | `log_sink`     | EventSink          | Serial log output            |
//! | `system`       | SystemPort         | `esp_restart()`              |
//! | `time`         | ClockPort          | ESP32 timer + SNTP           |
//! | `weather_http` | WeatherPort        | OpenWeatherMap over HTTP     |
//! | `wifi`         | ConnectivityPort   | ESP-IDF WiFi STA + soft-AP   |
//!
//! The provisioning port lives in [`crate::portal`].

pub mod credentials;
pub mod display;
pub mod log_sink;
pub mod system;
pub mod time;
pub mod weather_http;
pub mod wifi;
