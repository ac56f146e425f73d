//! Station configuration parameters
//!
//! All tunable parameters for the weather station. Defaults match the
//! shipped device; the binary may override the weather fields at build
//! time (see `main.rs`).

use core::fmt;
use core::time::Duration;

use serde::{Deserialize, Serialize};

/// Core station configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationConfig {
    // --- Setup portal ---
    /// Access point name advertised while in setup mode
    pub ap_name: String,
    /// WPA2 secret of the setup access point (8-64 bytes)
    pub ap_secret: String,
    /// Address the provisioning server binds to
    pub portal_bind_addr: String,
    /// URL shown on the display for the setup page
    pub portal_url: String,
    /// How long setup mode waits for a submission (seconds)
    pub provisioning_window_secs: u32,
    /// Sleep between non-blocking accept polls (milliseconds)
    pub accept_poll_ms: u32,
    /// Per-client socket read timeout (milliseconds)
    pub client_read_timeout_ms: u32,
    /// Largest request body the portal will buffer (bytes)
    pub max_body_bytes: usize,
    /// Largest header block the portal will buffer (bytes)
    pub max_header_bytes: usize,

    // --- Connectivity ---
    /// Boot-time connect attempts before a forced restart
    pub connect_attempts: u8,
    /// Association wait of the first cycle in one attempt (seconds)
    pub connect_wait_secs: u32,
    /// Association wait of the retry cycle in one attempt (seconds)
    pub retry_wait_secs: u32,
    /// Radio settle time before reconfiguring the interface (seconds)
    pub radio_settle_secs: u32,
    /// Pause between boot connect attempts (seconds)
    pub attempt_pause_secs: u32,
    /// Clear stored credentials when every attempt failed terminally
    pub reprovision_on_terminal_failure: bool,

    // --- Restart delays ---
    pub restart_after_save_secs: u32,
    pub restart_after_connect_failure_secs: u32,
    pub restart_after_errors_secs: u32,
    pub restart_after_setup_timeout_secs: u32,

    // --- Polling ---
    /// Minutes between weather refreshes
    pub poll_interval_mins: u32,
    /// Check the link every N minutes of the wait
    pub link_check_every_mins: u32,
    /// Re-fetch the forecast after this many seconds
    pub forecast_refresh_secs: u64,
    /// Consecutive failed polls that force a restart
    pub error_threshold: u8,
    /// Back-off after a failed cycle (seconds)
    pub failure_backoff_secs: u32,

    // --- Weather API ---
    pub weather_api_base: String,
    pub weather_api_key: String,
    pub latitude: String,
    pub longitude: String,
    pub units: String,

    // --- Clock ---
    /// Offset of local time from UTC (seconds)
    pub utc_offset_secs: i32,

    // --- Storage ---
    /// Path of the persisted credential file
    pub credentials_path: String,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            // Setup portal
            ap_name: "WeatherStation".into(),
            ap_secret: "setupmode".into(),
            portal_bind_addr: "0.0.0.0:80".into(),
            portal_url: "http://192.168.4.1".into(),
            provisioning_window_secs: 300,
            accept_poll_ms: 100,
            client_read_timeout_ms: 5_000,
            max_body_bytes: 4096,
            max_header_bytes: 4096,

            // Connectivity
            connect_attempts: 3,
            connect_wait_secs: 30,
            retry_wait_secs: 15,
            radio_settle_secs: 3,
            attempt_pause_secs: 5,
            reprovision_on_terminal_failure: true,

            // Restart delays
            restart_after_save_secs: 3,
            restart_after_connect_failure_secs: 60,
            restart_after_errors_secs: 5,
            restart_after_setup_timeout_secs: 3,

            // Polling
            poll_interval_mins: 60,
            link_check_every_mins: 15,
            forecast_refresh_secs: 3 * 3600,
            error_threshold: 5,
            failure_backoff_secs: 60,

            // Weather API
            weather_api_base: "http://api.openweathermap.org/data/2.5".into(),
            weather_api_key: String::new(),
            latitude: "0.0".into(),
            longitude: "0.0".into(),
            units: "metric".into(),

            // Clock
            utc_offset_secs: 3 * 3600,

            // Storage
            credentials_path: "/storage/wifi.json".into(),
        }
    }
}

/// Why a [`StationConfig`] was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A field failed range validation; names the field.
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl StationConfig {
    /// Range-check every field that would wedge the device if wrong.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ap_name.is_empty() || self.ap_name.len() > 32 {
            return Err(ConfigError::Invalid("ap_name must be 1-32 bytes"));
        }
        if !(8..=64).contains(&self.ap_secret.len()) {
            return Err(ConfigError::Invalid("ap_secret must be 8-64 bytes"));
        }
        if self.connect_attempts == 0 {
            return Err(ConfigError::Invalid("connect_attempts must be >= 1"));
        }
        if self.connect_wait_secs == 0 {
            return Err(ConfigError::Invalid("connect_wait_secs must be >= 1"));
        }
        if self.error_threshold == 0 {
            return Err(ConfigError::Invalid("error_threshold must be >= 1"));
        }
        if self.poll_interval_mins == 0 {
            return Err(ConfigError::Invalid("poll_interval_mins must be >= 1"));
        }
        if self.link_check_every_mins == 0 {
            return Err(ConfigError::Invalid("link_check_every_mins must be >= 1"));
        }
        if self.max_body_bytes == 0 || self.max_header_bytes == 0 {
            return Err(ConfigError::Invalid("request limits must be non-zero"));
        }
        if self.provisioning_window_secs == 0 {
            return Err(ConfigError::Invalid("provisioning_window_secs must be >= 1"));
        }
        Ok(())
    }

    pub fn provisioning_window(&self) -> Duration {
        Duration::from_secs(u64::from(self.provisioning_window_secs))
    }

    /// Limits handed to the provisioning server.
    pub fn portal_settings(&self) -> crate::portal::server::PortalSettings {
        crate::portal::server::PortalSettings {
            accept_poll: Duration::from_millis(u64::from(self.accept_poll_ms)),
            read_timeout: Duration::from_millis(u64::from(self.client_read_timeout_ms)),
            limits: crate::portal::request::RequestLimits {
                max_header_bytes: self.max_header_bytes,
                max_body_bytes: self.max_body_bytes,
            },
        }
    }

    /// Pause shown on the display before the restart primitive fires.
    pub fn restart_delay(&self, reason: crate::fsm::RestartReason) -> Duration {
        use crate::fsm::RestartReason;
        let secs = match reason {
            RestartReason::Reconfigured => self.restart_after_save_secs,
            RestartReason::ConnectExhausted => self.restart_after_connect_failure_secs,
            RestartReason::ErrorThreshold => self.restart_after_errors_secs,
            RestartReason::ProvisioningTimedOut | RestartReason::PortalUnavailable => {
                self.restart_after_setup_timeout_secs
            }
        };
        Duration::from_secs(u64::from(secs))
    }

    /// Association timing handed to the Wi-Fi adapter.
    pub fn link_timing(&self) -> crate::adapters::wifi::LinkTiming {
        crate::adapters::wifi::LinkTiming {
            settle: Duration::from_secs(u64::from(self.radio_settle_secs)),
            first_wait_secs: self.connect_wait_secs,
            retry_wait_secs: self.retry_wait_secs,
        }
    }
}
