//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that drives the boot sequence or the
//! poll loop end to end with the host adapters (simulated radio, file
//! store, loopback portal) plus virtual time. All tests run on the host
//! with no real hardware required.

#![cfg(not(target_os = "espidf"))]

mod boot_flow_tests;
mod mock_hw;
mod poll_flow_tests;
