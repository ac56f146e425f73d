//! Clock adapter.
//!
//! Provides sleeping, monotonic uptime and offset wall-clock time.
//!
//! - **`target_os = "espidf"`**: uptime from `esp_timer_get_time()`, wall
//!   clock set by the ESP-IDF SNTP client (`EspSntp`).
//! - **`not(target_os = "espidf")`**: `std::time::Instant` uptime; the
//!   host clock is assumed synchronised.

use core::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, NaiveDateTime};
use log::{info, warn};

use crate::app::ports::ClockPort;

/// Anything before 2020-01-01 means the RTC was never set.
const EPOCH_2020: i64 = 1_577_836_800;

#[cfg(target_os = "espidf")]
const SNTP_WAIT: Duration = Duration::from_secs(15);

pub struct StationClock {
    utc_offset_secs: i32,
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
    #[cfg(target_os = "espidf")]
    sntp: Option<esp_idf_svc::sntp::EspSntp<'static>>,
}

impl StationClock {
    pub fn new(utc_offset_secs: i32) -> Self {
        Self {
            utc_offset_secs,
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
            #[cfg(target_os = "espidf")]
            sntp: None,
        }
    }

    /// Convert Unix seconds to local time, rejecting an unset clock.
    pub fn local_from_unix(&self, unix_secs: i64) -> Option<NaiveDateTime> {
        if unix_secs < EPOCH_2020 {
            return None;
        }
        let local = unix_secs.checked_add(i64::from(self.utc_offset_secs))?;
        DateTime::from_timestamp(local, 0).map(|t| t.naive_utc())
    }
}

impl ClockPort for StationClock {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }

    #[cfg(target_os = "espidf")]
    fn uptime_secs(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000_000
    }

    #[cfg(not(target_os = "espidf"))]
    fn uptime_secs(&self) -> u64 {
        self.start.elapsed().as_secs()
    }

    fn local_now(&self) -> Option<NaiveDateTime> {
        let secs = SystemTime::now().duration_since(UNIX_EPOCH).ok()?.as_secs();
        self.local_from_unix(i64::try_from(secs).ok()?)
    }

    #[cfg(target_os = "espidf")]
    fn sync_wall_clock(&mut self) -> bool {
        use esp_idf_svc::sntp::{EspSntp, SyncStatus};

        if self.sntp.is_none() {
            match EspSntp::new_default() {
                Ok(sntp) => self.sntp = Some(sntp),
                Err(e) => {
                    warn!("Clock: SNTP start failed: {}", e);
                    return false;
                }
            }
        }
        let Some(sntp) = self.sntp.as_ref() else {
            return false;
        };

        let step = Duration::from_millis(500);
        let mut waited = Duration::ZERO;
        while waited < SNTP_WAIT {
            if sntp.get_sync_status() == SyncStatus::Completed {
                info!("Clock: SNTP synchronised");
                return self.local_now().is_some();
            }
            std::thread::sleep(step);
            waited += step;
        }
        warn!("Clock: SNTP did not complete within {}s", SNTP_WAIT.as_secs());
        false
    }

    #[cfg(not(target_os = "espidf"))]
    fn sync_wall_clock(&mut self) -> bool {
        let synced = self.local_now().is_some();
        if synced {
            info!("Clock(sim): using host clock");
        } else {
            warn!("Clock(sim): host clock predates 2020");
        }
        synced
    }
}
