//! Shared mutable context threaded through every boot FSM handler.
//!
//! `BootContext` is the blackboard the state handlers read from and
//! write to: the adapters behind [`Ports`], the credential store and
//! portal, the credentials being tried, and the attempt bookkeeping.
//! It lives only for the duration of the boot sequence.

use crate::app::ports::{CredentialStore, Ports, ProvisioningPort};
use crate::config::StationConfig;
use crate::credentials::Credentials;

use super::RestartReason;

pub struct BootContext<'a> {
    // -- Collaborators --
    pub config: &'a StationConfig,
    pub ports: Ports<'a>,
    pub store: &'a mut dyn CredentialStore,
    pub provisioner: &'a mut dyn ProvisioningPort,

    // -- Connect sequence --
    /// Loaded (or just provisioned) credentials.
    pub credentials: Option<Credentials>,
    /// Attempts made in the current `Connecting` visit.
    pub attempt: u8,
    /// How many of those ended with a terminal reason.
    pub terminal_failures: u8,

    /// Set by whichever state decides to restart.
    pub restart_reason: Option<RestartReason>,
}

impl<'a> BootContext<'a> {
    pub fn new(
        config: &'a StationConfig,
        ports: Ports<'a>,
        store: &'a mut dyn CredentialStore,
        provisioner: &'a mut dyn ProvisioningPort,
    ) -> Self {
        Self {
            config,
            ports,
            store,
            provisioner,
            credentials: None,
            attempt: 0,
            terminal_failures: 0,
            restart_reason: None,
        }
    }

    /// Every attempt so far failed with a reason retrying cannot fix.
    pub fn all_failures_terminal(&self) -> bool {
        self.attempt > 0 && self.terminal_failures == self.attempt
    }
}
