//! Unified error types for the weather station firmware.
//!
//! Each subsystem owns a small error enum; all of them convert into the
//! top-level [`Error`] so the binary's wiring code can use `?` uniformly.
//! Variants are `Copy` where possible so they can be stored in the boot
//! context and emitted as events without allocation.

use core::fmt;

use crate::config::ConfigError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible subsystem funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Credential file could not be written or removed.
    Store(StoreError),
    /// The radio refused a configuration or mode change.
    Connectivity(ConnectivityError),
    /// The setup portal could not be brought up.
    Portal(PortalError),
    /// Weather or forecast could not be fetched or parsed.
    Weather(WeatherError),
    /// Configuration is invalid.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "store: {e}"),
            Self::Connectivity(e) => write!(f, "connectivity: {e}"),
            Self::Portal(e) => write!(f, "portal: {e}"),
            Self::Weather(e) => write!(f, "weather: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Credential store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// Credentials violate the non-empty / length invariant.
    InvalidCredentials,
    /// Serialising the credential record failed.
    Encode,
    /// The backing file could not be written, renamed or removed.
    Io,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "credentials invalid"),
            Self::Encode => write!(f, "credential encoding failed"),
            Self::Io => write!(f, "credential file I/O failed"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Connectivity errors
// ---------------------------------------------------------------------------

/// Radio-level failures that are not association outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    /// The driver rejected the interface configuration.
    ConfigRejected,
    /// Starting or stopping the interface failed.
    DriverFailed,
    /// Access point name or secret out of range.
    InvalidAccessPoint,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigRejected => write!(f, "WiFi configuration rejected"),
            Self::DriverFailed => write!(f, "WiFi driver failure"),
            Self::InvalidAccessPoint => write!(f, "access point name/secret invalid"),
        }
    }
}

impl std::error::Error for ConnectivityError {}

impl From<ConnectivityError> for Error {
    fn from(e: ConnectivityError) -> Self {
        Self::Connectivity(e)
    }
}

// ---------------------------------------------------------------------------
// Portal errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalError {
    /// The listening socket could not be bound.
    Bind,
    /// The listening socket could not be configured.
    Socket,
}

impl fmt::Display for PortalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind => write!(f, "could not bind setup server"),
            Self::Socket => write!(f, "could not configure setup socket"),
        }
    }
}

impl std::error::Error for PortalError {}

impl From<PortalError> for Error {
    fn from(e: PortalError) -> Self {
        Self::Portal(e)
    }
}

// ---------------------------------------------------------------------------
// Weather errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherError {
    /// The HTTP request failed or returned a non-200 status.
    Http(u16),
    /// No network route (link down, DNS, TLS).
    Network,
    /// The response exceeded the buffer cap.
    TooLarge,
    /// JSON did not match the expected shape.
    Parse,
    /// A required field was absent.
    MissingField(&'static str),
}

impl fmt::Display for WeatherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(status) => write!(f, "HTTP status {status}"),
            Self::Network => write!(f, "network unavailable"),
            Self::TooLarge => write!(f, "response too large"),
            Self::Parse => write!(f, "malformed JSON"),
            Self::MissingField(name) => write!(f, "missing field '{name}'"),
        }
    }
}

impl std::error::Error for WeatherError {}

impl From<WeatherError> for Error {
    fn from(e: WeatherError) -> Self {
        Self::Weather(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
