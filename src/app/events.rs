//! Outbound application events.
//!
//! The boot state machine and the poll service emit these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other
//! side decide what to do with them (serial log today).

use super::ports::ConnectFailure;
use crate::fsm::{RestartReason, StateId};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The boot FSM moved between states.
    BootStateChanged { from: StateId, to: StateId },

    /// A boot connect attempt (1-based) failed.
    ConnectAttemptFailed { attempt: u8, reason: ConnectFailure },

    /// The station joined the network on the given attempt.
    Connected { attempt: u8 },

    /// The setup portal persisted credentials for this network.
    CredentialsSaved { name: String },

    /// Setup mode closed with no submission.
    ProvisioningTimedOut,

    /// A poll cycle refreshed the screen.
    WeatherUpdated { temperature: f32, forecast_days: usize },

    /// A poll cycle failed; carries the consecutive failure count.
    PollFailed { consecutive: u8 },

    /// The link dropped during the inter-poll wait.
    LinkLost,

    /// A full device restart is about to happen.
    RestartRequested(RestartReason),
}
