//! Shared test doubles for integration tests.
//!
//! Time is virtual: sleeps advance a counter instead of blocking, so a
//! sixty-second restart delay costs nothing. Everything that would touch
//! the outside world records what it was asked to do.

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use embedded_hal::delay::DelayNs;
use tempfile::TempDir;
use weatherstation::adapters::credentials::FileCredentialStore;
use weatherstation::app::events::AppEvent;
use weatherstation::app::ports::{ClockPort, EventSink, WeatherPort};
use weatherstation::error::WeatherError;
use weatherstation::weather::{CurrentConditions, ForecastSample};

// ── Virtual clock ─────────────────────────────────────────────

pub struct ManualClock {
    pub now: Option<NaiveDateTime>,
    pub slept: Duration,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn unsynced() -> Self {
        Self {
            now: None,
            slept: Duration::ZERO,
        }
    }

    pub fn at(date: NaiveDate, hour: u32) -> Self {
        Self {
            now: date.and_hms_opt(hour, 0, 0),
            slept: Duration::ZERO,
        }
    }
}

impl ClockPort for ManualClock {
    fn sleep(&mut self, duration: Duration) {
        self.slept += duration;
    }

    fn uptime_secs(&self) -> u64 {
        self.slept.as_secs()
    }

    fn local_now(&self) -> Option<NaiveDateTime> {
        self.now
    }

    fn sync_wall_clock(&mut self) -> bool {
        self.now.is_some()
    }
}

/// [`DelayNs`] that only accumulates.
#[derive(Default)]
pub struct VirtualDelay {
    pub ms: u64,
}

impl DelayNs for VirtualDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.ms += u64::from(ns) / 1_000_000;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.ms += u64::from(ms);
    }
}

// ── Event recorder ────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingEvents {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingEvents {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingEvents {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Scripted weather source ───────────────────────────────────

/// Hands out queued results; an empty queue is a network failure.
#[derive(Default)]
pub struct ScriptedWeather {
    pub current: VecDeque<Result<CurrentConditions, WeatherError>>,
    pub forecast: VecDeque<Result<Vec<ForecastSample>, WeatherError>>,
    pub current_calls: u32,
    pub forecast_calls: u32,
}

impl WeatherPort for ScriptedWeather {
    fn fetch_current(&mut self) -> Result<CurrentConditions, WeatherError> {
        self.current_calls += 1;
        self.current.pop_front().unwrap_or(Err(WeatherError::Network))
    }

    fn fetch_forecast(&mut self) -> Result<Vec<ForecastSample>, WeatherError> {
        self.forecast_calls += 1;
        self.forecast.pop_front().unwrap_or(Err(WeatherError::Network))
    }
}

// ── Filesystem helpers ────────────────────────────────────────

/// A credential store in a fresh directory that is removed when the
/// returned guard drops.
pub fn scratch_store() -> (TempDir, FileCredentialStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = FileCredentialStore::new(dir.path().join("wifi.json"));
    (dir, store)
}
