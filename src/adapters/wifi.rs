//! WiFi station / access-point adapter.
//!
//! Implements [`ConnectivityPort`] on top of a small [`Radio`] trait so
//! the association algorithm runs unchanged against the ESP-IDF driver
//! and against [`SimRadio`] on the host.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: [`EspRadio`] drives `esp_idf_svc::wifi::EspWifi`
//!   and captures the station disconnect reason from the system event loop.
//! - **all other targets**: [`SimRadio`], an in-memory network table.
//!
//! ## Association algorithm
//!
//! ```text
//!  settle ─▶ stop ─▶ start ─▶ associate ─▶ poll 1 s × first_wait
//!                                             │ GotIp         ─▶ Connected
//!                                             │ WrongPassword ─▶ Failed(WrongSecret)    (immediate)
//!                                             │ NoApFound     ─▶ Failed(NetworkNotFound)(immediate)
//!                                             │ ConnectFail   ─▶ Failed(GenericFailure) (immediate)
//!                                             ▼ timeout
//!                      disassociate ─▶ associate ─▶ poll 1 s × retry_wait ─▶ Connected | Failed(Timeout)
//! ```

use core::fmt;
use core::time::Duration;

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::app::ports::{ConnectFailure, ConnectOutcome, ConnectivityPort};
use crate::credentials::Credentials;
use crate::error::ConnectivityError;

// ───────────────────────────────────────────────────────────────
// Radio abstraction
// ───────────────────────────────────────────────────────────────

/// Station link status as reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkStatus {
    #[default]
    Idle,
    Connecting,
    WrongPassword,
    NoApFound,
    ConnectFail,
    GotIp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// The driver refused the configuration (name/secret too long, bad mode).
    Config,
    /// Start, stop or connect failed inside the driver.
    Driver,
}

impl fmt::Display for RadioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config => write!(f, "radio configuration rejected"),
            Self::Driver => write!(f, "radio driver error"),
        }
    }
}

impl From<RadioError> for ConnectivityError {
    fn from(e: RadioError) -> Self {
        match e {
            RadioError::Config => ConnectivityError::ConfigRejected,
            RadioError::Driver => ConnectivityError::DriverFailed,
        }
    }
}

/// The handful of driver operations the association algorithm needs.
pub trait Radio {
    fn set_active(&mut self, active: bool) -> Result<(), RadioError>;
    /// Configure station mode and issue an association request.
    fn associate(&mut self, name: &str, secret: &str) -> Result<(), RadioError>;
    fn disassociate(&mut self);
    fn status(&self) -> LinkStatus;
    fn start_access_point(&mut self, name: &str, secret: &str) -> Result<(), RadioError>;
    fn stop_access_point(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Timing
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkTiming {
    /// Wait before touching the interface.
    pub settle: Duration,
    /// Status polls (1 s apart) in the first cycle.
    pub first_wait_secs: u32,
    /// Status polls in the single retry cycle.
    pub retry_wait_secs: u32,
}

impl Default for LinkTiming {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(3),
            first_wait_secs: 30,
            retry_wait_secs: 15,
        }
    }
}

const POLL_INTERVAL_MS: u32 = 1_000;
const TOGGLE_PAUSE_MS: u32 = 1_000;
const RETRY_PAUSE_MS: u32 = 2_000;

fn failure_for(status: LinkStatus) -> Option<ConnectFailure> {
    match status {
        LinkStatus::WrongPassword => Some(ConnectFailure::WrongSecret),
        LinkStatus::NoApFound => Some(ConnectFailure::NetworkNotFound),
        LinkStatus::ConnectFail => Some(ConnectFailure::GenericFailure),
        _ => None,
    }
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter<R, D> {
    radio: R,
    delay: D,
    timing: LinkTiming,
    ap_active: bool,
}

impl<R: Radio, D: DelayNs> WifiAdapter<R, D> {
    pub fn new(radio: R, delay: D, timing: LinkTiming) -> Self {
        Self {
            radio,
            delay,
            timing,
            ap_active: false,
        }
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    pub fn delay(&self) -> &D {
        &self.delay
    }

    /// Poll status once per second. `None` means the wait ran out.
    fn await_link(&mut self, polls: u32) -> Option<ConnectOutcome> {
        for _ in 0..polls {
            let status = self.radio.status();
            if status == LinkStatus::GotIp {
                return Some(ConnectOutcome::Connected);
            }
            if let Some(reason) = failure_for(status) {
                return Some(ConnectOutcome::Failed(reason));
            }
            self.delay.delay_ms(POLL_INTERVAL_MS);
        }
        (self.radio.status() == LinkStatus::GotIp).then_some(ConnectOutcome::Connected)
    }

    fn reset_interface(&mut self) -> Result<(), RadioError> {
        self.delay.delay_ms(duration_ms(self.timing.settle));
        self.radio.disassociate();
        self.radio.set_active(false)?;
        self.delay.delay_ms(TOGGLE_PAUSE_MS);
        self.radio.set_active(true)?;
        self.delay.delay_ms(TOGGLE_PAUSE_MS);
        Ok(())
    }
}

fn duration_ms(d: Duration) -> u32 {
    u32::try_from(d.as_millis()).unwrap_or(u32::MAX)
}

impl<R: Radio, D: DelayNs> ConnectivityPort for WifiAdapter<R, D> {
    fn connect(&mut self, credentials: &Credentials) -> ConnectOutcome {
        info!("WiFi: connecting to '{}'", credentials.name);

        if let Err(e) = self.reset_interface() {
            warn!("WiFi: interface reset failed: {}", e);
            return ConnectOutcome::Failed(ConnectFailure::GenericFailure);
        }
        if let Err(e) = self.radio.associate(&credentials.name, &credentials.secret) {
            warn!("WiFi: association request failed: {}", e);
            return ConnectOutcome::Failed(ConnectFailure::GenericFailure);
        }

        if let Some(outcome) = self.await_link(self.timing.first_wait_secs) {
            match outcome {
                ConnectOutcome::Connected => info!("WiFi: connected"),
                ConnectOutcome::Failed(reason) => warn!("WiFi: {}", reason),
            }
            return outcome;
        }

        info!("WiFi: no link after {}s, retrying once", self.timing.first_wait_secs);
        self.radio.disassociate();
        self.delay.delay_ms(RETRY_PAUSE_MS);
        if let Err(e) = self.radio.associate(&credentials.name, &credentials.secret) {
            warn!("WiFi: association request failed: {}", e);
            return ConnectOutcome::Failed(ConnectFailure::GenericFailure);
        }

        match self.await_link(self.timing.retry_wait_secs) {
            Some(ConnectOutcome::Connected) => {
                info!("WiFi: connected on retry");
                ConnectOutcome::Connected
            }
            Some(failed) => failed,
            None => {
                warn!("WiFi: connection failed after retry");
                ConnectOutcome::Failed(ConnectFailure::Timeout)
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.radio.status() == LinkStatus::GotIp
    }

    fn start_access_point(&mut self, name: &str, secret: &str) -> Result<(), ConnectivityError> {
        if name.is_empty() || name.len() > 32 || !(8..=64).contains(&secret.len()) {
            return Err(ConnectivityError::InvalidAccessPoint);
        }
        self.radio.start_access_point(name, secret)?;
        self.ap_active = true;
        info!("WiFi: access point '{}' up", name);
        Ok(())
    }

    fn stop_access_point(&mut self) {
        if self.ap_active {
            self.radio.stop_access_point();
            self.ap_active = false;
            info!("WiFi: access point down");
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Host simulation radio
// ───────────────────────────────────────────────────────────────

/// In-memory radio: a table of reachable networks.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
pub struct SimRadio {
    networks: Vec<(String, String)>,
    active: bool,
    status: LinkStatus,
    ap: Option<String>,
    /// Association requests never complete.
    pub stall: bool,
    /// Association requests issued so far.
    pub associations: u32,
}

#[cfg(not(target_os = "espidf"))]
impl SimRadio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a network reachable.
    pub fn with_network(mut self, name: &str, secret: &str) -> Self {
        self.networks.push((name.into(), secret.into()));
        self
    }

    /// Drop the current link, as if the access point went away.
    pub fn drop_link(&mut self) {
        self.status = LinkStatus::Idle;
    }

    pub fn access_point(&self) -> Option<&str> {
        self.ap.as_deref()
    }
}

#[cfg(not(target_os = "espidf"))]
impl Radio for SimRadio {
    fn set_active(&mut self, active: bool) -> Result<(), RadioError> {
        self.active = active;
        if !active {
            self.status = LinkStatus::Idle;
        }
        Ok(())
    }

    fn associate(&mut self, name: &str, secret: &str) -> Result<(), RadioError> {
        if !self.active {
            return Err(RadioError::Driver);
        }
        self.associations += 1;
        self.status = if self.stall {
            LinkStatus::Connecting
        } else {
            match self.networks.iter().find(|(n, _)| n == name) {
                Some((_, s)) if s == secret => LinkStatus::GotIp,
                Some(_) => LinkStatus::WrongPassword,
                None => LinkStatus::NoApFound,
            }
        };
        Ok(())
    }

    fn disassociate(&mut self) {
        self.status = LinkStatus::Idle;
    }

    fn status(&self) -> LinkStatus {
        self.status
    }

    fn start_access_point(&mut self, name: &str, _secret: &str) -> Result<(), RadioError> {
        self.ap = Some(name.into());
        Ok(())
    }

    fn stop_access_point(&mut self) {
        self.ap = None;
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF radio
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use esp::EspRadio;

#[cfg(target_os = "espidf")]
mod esp {
    use core::ffi::c_void;
    use core::sync::atomic::{AtomicU16, Ordering};

    use esp_idf_svc::sys;
    use esp_idf_svc::wifi::{
        AccessPointConfiguration, AuthMethod, ClientConfiguration, Configuration, EspWifi,
    };
    use log::warn;

    use super::{LinkStatus, Radio, RadioError};

    /// Last `wifi_err_reason_t` seen on STA_DISCONNECTED; 0 while none.
    static LAST_REASON: AtomicU16 = AtomicU16::new(0);

    const REASON_4WAY_HANDSHAKE_TIMEOUT: u16 = 15;
    const REASON_NO_AP_FOUND: u16 = 201;
    const REASON_AUTH_FAIL: u16 = 202;
    const REASON_ASSOC_FAIL: u16 = 203;
    const REASON_HANDSHAKE_TIMEOUT: u16 = 204;
    const REASON_CONNECTION_FAIL: u16 = 205;

    unsafe extern "C" fn on_sta_disconnected(
        _arg: *mut c_void,
        _base: sys::esp_event_base_t,
        _id: i32,
        data: *mut c_void,
    ) {
        if data.is_null() {
            return;
        }
        // SAFETY: ESP-IDF passes a wifi_event_sta_disconnected_t for this event id.
        let event = unsafe { &*(data as *const sys::wifi_event_sta_disconnected_t) };
        LAST_REASON.store(u16::from(event.reason), Ordering::Relaxed);
    }

    pub struct EspRadio {
        wifi: EspWifi<'static>,
    }

    impl EspRadio {
        pub fn new(wifi: EspWifi<'static>) -> Result<Self, RadioError> {
            // SAFETY: registers a plain fn with no context pointer; WIFI_EVENT is
            // a static event base exported by the driver.
            let rc = unsafe {
                sys::esp_event_handler_register(
                    sys::WIFI_EVENT,
                    sys::wifi_event_t_WIFI_EVENT_STA_DISCONNECTED as i32,
                    Some(on_sta_disconnected),
                    core::ptr::null_mut(),
                )
            };
            if rc != sys::ESP_OK as sys::esp_err_t {
                warn!("WiFi(espidf): disconnect handler registration failed ({})", rc);
                return Err(RadioError::Driver);
            }
            Ok(Self { wifi })
        }
    }

    impl Radio for EspRadio {
        fn set_active(&mut self, active: bool) -> Result<(), RadioError> {
            let result = if active { self.wifi.start() } else { self.wifi.stop() };
            result.map_err(|e| {
                warn!("WiFi(espidf): set_active({}) failed: {}", active, e);
                RadioError::Driver
            })
        }

        fn associate(&mut self, name: &str, secret: &str) -> Result<(), RadioError> {
            LAST_REASON.store(0, Ordering::Relaxed);
            let auth_method = if secret.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            };
            let config = Configuration::Client(ClientConfiguration {
                ssid: name.try_into().map_err(|_| RadioError::Config)?,
                password: secret.try_into().map_err(|_| RadioError::Config)?,
                auth_method,
                ..Default::default()
            });
            self.wifi.set_configuration(&config).map_err(|_| RadioError::Config)?;
            self.wifi.connect().map_err(|e| {
                warn!("WiFi(espidf): connect request failed: {}", e);
                RadioError::Driver
            })
        }

        fn disassociate(&mut self) {
            let _ = self.wifi.disconnect();
        }

        fn status(&self) -> LinkStatus {
            let up = self.wifi.is_connected().unwrap_or(false)
                && self.wifi.sta_netif().is_up().unwrap_or(false);
            if up {
                return LinkStatus::GotIp;
            }
            match LAST_REASON.load(Ordering::Relaxed) {
                0 if self.wifi.is_started().unwrap_or(false) => LinkStatus::Connecting,
                0 => LinkStatus::Idle,
                REASON_AUTH_FAIL | REASON_HANDSHAKE_TIMEOUT | REASON_4WAY_HANDSHAKE_TIMEOUT => {
                    LinkStatus::WrongPassword
                }
                REASON_NO_AP_FOUND => LinkStatus::NoApFound,
                REASON_ASSOC_FAIL | REASON_CONNECTION_FAIL => LinkStatus::ConnectFail,
                _ => LinkStatus::Connecting,
            }
        }

        fn start_access_point(&mut self, name: &str, secret: &str) -> Result<(), RadioError> {
            let _ = self.wifi.stop();
            let config = Configuration::AccessPoint(AccessPointConfiguration {
                ssid: name.try_into().map_err(|_| RadioError::Config)?,
                password: secret.try_into().map_err(|_| RadioError::Config)?,
                auth_method: AuthMethod::WPA2Personal,
                channel: 1,
                ..Default::default()
            });
            self.wifi.set_configuration(&config).map_err(|_| RadioError::Config)?;
            self.wifi.start().map_err(|_| RadioError::Driver)
        }

        fn stop_access_point(&mut self) {
            let _ = self.wifi.stop();
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
