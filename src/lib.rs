//! Weather station firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod credentials;
pub mod error;
pub mod forecast;
pub mod fsm;
pub mod portal;
pub mod weather;

// The ESP-IDF implementations inside are guarded by cfg attributes; the
// host build gets simulation stand-ins.
pub mod adapters;
