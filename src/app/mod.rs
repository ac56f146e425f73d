//! Application core: pure domain logic, zero direct I/O.
//!
//! This module contains the steady-state rules of the weather station:
//! the poll loop with its error budget, the status screens, and the
//! outbound events. All interaction with the radio, display, clock and
//! weather API happens through **port traits** defined in [`ports`].

pub mod events;
pub mod ports;
pub mod screens;
pub mod service;
