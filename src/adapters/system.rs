//! Chip restart adapter.

use log::warn;

use crate::app::ports::SystemPort;

/// [`SystemPort`] backed by `esp_restart()` on the device. On the host
/// it only counts requests, so the caller's loop returns normally.
#[derive(Default)]
pub struct EspSystem {
    restarts: u32,
}

impl EspSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restarts(&self) -> u32 {
        self.restarts
    }
}

impl SystemPort for EspSystem {
    #[cfg(target_os = "espidf")]
    fn restart(&mut self) {
        self.restarts += 1;
        warn!("SYS | esp_restart()");
        // SAFETY: plain FFI call; does not return.
        unsafe { esp_idf_svc::sys::esp_restart() }
    }

    #[cfg(not(target_os = "espidf"))]
    fn restart(&mut self) {
        self.restarts += 1;
        warn!("SYS(sim): restart requested ({})", self.restarts);
    }
}
