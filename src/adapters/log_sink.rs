//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each application event as one
//! line to the ESP-IDF logger (UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::BootStateChanged { from, to } => {
                info!("BOOT | {:?} -> {:?}", from, to);
            }
            AppEvent::ConnectAttemptFailed { attempt, reason } => {
                warn!("LINK | attempt {} failed: {}", attempt, reason);
            }
            AppEvent::Connected { attempt } => {
                info!("LINK | connected on attempt {}", attempt);
            }
            AppEvent::CredentialsSaved { name } => {
                info!("SETUP | credentials saved for '{}'", name);
            }
            AppEvent::ProvisioningTimedOut => {
                warn!("SETUP | window closed without a submission");
            }
            AppEvent::WeatherUpdated {
                temperature,
                forecast_days,
            } => {
                info!(
                    "POLL | {:.1}\u{00b0}C, forecast days={}",
                    temperature, forecast_days
                );
            }
            AppEvent::PollFailed { consecutive } => {
                warn!("POLL | failed, consecutive={}", consecutive);
            }
            AppEvent::LinkLost => {
                warn!("LINK | lost");
            }
            AppEvent::RestartRequested(reason) => {
                warn!("RESTART | {}", reason);
            }
        }
    }
}
