//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Bootstrap FSM / PollService (domain)
//! ```
//!
//! Driven adapters (radio, credential file, display, clock, weather API,
//! restart) implement these traits. The boot state machine and the poll
//! service consume them as `&mut dyn` references bundled in [`Ports`], so
//! the domain core never touches the radio or the socket layer directly
//! and every flow is testable with recording mocks.

use core::fmt;
use core::time::Duration;

use chrono::NaiveDateTime;

use super::events::AppEvent;
use super::screens::Screen;
use crate::credentials::Credentials;
use crate::error::{ConnectivityError, PortalError, StoreError, WeatherError};
use crate::weather::{CurrentConditions, ForecastSample};

// ───────────────────────────────────────────────────────────────
// Credential store (driven adapter: domain ↔ durable file)
// ───────────────────────────────────────────────────────────────

/// Persists the single network credential pair.
///
/// `load` fails soft: a missing or malformed record is `None`, which is
/// the signal to enter setup mode. `save` MUST NOT leave a half-written
/// record that `load` would accept.
pub trait CredentialStore {
    fn load(&self) -> Option<Credentials>;
    fn save(&mut self, credentials: &Credentials) -> Result<(), StoreError>;
    /// Remove the record. `Ok(())` if there was none.
    fn clear(&mut self) -> Result<(), StoreError>;
}

// ───────────────────────────────────────────────────────────────
// Connectivity port (driven adapter: domain → radio)
// ───────────────────────────────────────────────────────────────

/// Why an association attempt ended without a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectFailure {
    /// The network rejected the secret. Terminal.
    WrongSecret,
    /// No network with that name is in range. Terminal.
    NetworkNotFound,
    /// The driver reported a generic association failure.
    GenericFailure,
    /// Neither the first nor the retry wait produced a link.
    Timeout,
}

impl ConnectFailure {
    /// Retrying with the same credentials cannot succeed.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::WrongSecret | Self::NetworkNotFound)
    }
}

impl fmt::Display for ConnectFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongSecret => write!(f, "wrong password"),
            Self::NetworkNotFound => write!(f, "network not found"),
            Self::GenericFailure => write!(f, "connection failed"),
            Self::Timeout => write!(f, "timed out"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    Connected,
    Failed(ConnectFailure),
}

/// Owns the wireless interface: station association and the setup
/// access point.
pub trait ConnectivityPort {
    /// Reset the interface and associate, with one shorter retry cycle
    /// on timeout. Terminal statuses return immediately.
    fn connect(&mut self, credentials: &Credentials) -> ConnectOutcome;
    /// Liveness query used by the steady-state loop.
    fn is_connected(&self) -> bool;
    fn start_access_point(&mut self, name: &str, secret: &str) -> Result<(), ConnectivityError>;
    fn stop_access_point(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Provisioning port (driven adapter: domain → setup portal)
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// A valid submission was persisted.
    Saved(Credentials),
    /// The window closed with no valid submission.
    TimedOut,
}

/// Serves the setup page until one valid submission is persisted or the
/// window closes. The access point is already up when this is called.
pub trait ProvisioningPort {
    fn provision(
        &mut self,
        store: &mut dyn CredentialStore,
        window: Duration,
    ) -> Result<ProvisionOutcome, PortalError>;
}

// ───────────────────────────────────────────────────────────────
// Render port (driven adapter: domain → e-paper)
// ───────────────────────────────────────────────────────────────

/// Narrow rendering capability. The core hands over finished text and
/// icon choices; layout belongs to the adapter.
pub trait RenderPort {
    /// Replace the whole screen (full refresh).
    fn show(&mut self, screen: &Screen);
    /// Update only the "minutes until next refresh" field (partial refresh).
    fn show_countdown(&mut self, minutes_left: u32);
}

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: domain ↔ RTC / SNTP / sleep)
// ───────────────────────────────────────────────────────────────

pub trait ClockPort {
    /// Block the single thread of control.
    fn sleep(&mut self, duration: Duration);
    /// Monotonic seconds since boot.
    fn uptime_secs(&self) -> u64;
    /// Local wall-clock time, `None` until synchronised.
    fn local_now(&self) -> Option<NaiveDateTime>;
    /// Best-effort wall-clock synchronisation.
    fn sync_wall_clock(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Weather port (driven adapter: domain ← HTTP API)
// ───────────────────────────────────────────────────────────────

pub trait WeatherPort {
    fn fetch_current(&mut self) -> Result<CurrentConditions, WeatherError>;
    /// Raw 3-hour feed in feed order.
    fn fetch_forecast(&mut self) -> Result<Vec<ForecastSample>, WeatherError>;
}

// ───────────────────────────────────────────────────────────────
// System port (driven adapter: domain → chip reset)
// ───────────────────────────────────────────────────────────────

pub trait SystemPort {
    /// Cold-restart the device. On hardware this does not return.
    fn restart(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Port bundle
// ───────────────────────────────────────────────────────────────

/// The adapters shared by the boot sequence and the poll loop.
pub struct Ports<'a> {
    pub link: &'a mut dyn ConnectivityPort,
    pub display: &'a mut dyn RenderPort,
    pub clock: &'a mut dyn ClockPort,
    pub system: &'a mut dyn SystemPort,
    pub events: &'a mut dyn EventSink,
}
