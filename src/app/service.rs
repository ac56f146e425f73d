//! Steady-state poll service.
//!
//! [`PollService`] owns the session state of the running station (error
//! budget, held forecast, credentials for reconnects). All I/O flows
//! through port traits passed in at call sites, so a whole day of
//! polling runs in a test on a virtual clock.
//!
//! ```text
//!  WeatherPort ──▶ ┌─────────────────────────┐ ──▶ RenderPort
//!                  │       PollService       │
//!    ClockPort ◀──▶│ poll · forecast · wait  │ ──▶ EventSink
//!                  └─────────────────────────┘
//!                        │ link check      │ error threshold
//!                        ▼                 ▼
//!                ConnectivityPort      SystemPort::restart
//! ```

use core::time::Duration;

use chrono::Datelike;
use log::{info, warn};

use crate::config::StationConfig;
use crate::credentials::Credentials;
use crate::forecast::{self, DailyForecasts};
use crate::fsm::RestartReason;

use super::events::AppEvent;
use super::ports::{ClockPort, ConnectOutcome, Ports, WeatherPort};
use super::screens;

// ───────────────────────────────────────────────────────────────
// Session state
// ───────────────────────────────────────────────────────────────

/// Mutable state carried across poll cycles.
#[derive(Debug, Clone, Default)]
pub struct PollSession {
    /// Consecutive failed cycles; reset by any success.
    pub error_count: u8,
    /// Last aggregated forecast, if any fetch succeeded.
    pub forecast: Option<DailyForecasts>,
    /// Uptime (s) of the last successful forecast fetch.
    pub forecast_fetched_at: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The weather screen was redrawn.
    Updated,
    /// The cycle failed but the error budget is not spent.
    Failed,
    /// The error threshold was reached and the restart primitive invoked.
    RestartRequired,
}

// ───────────────────────────────────────────────────────────────
// PollService
// ───────────────────────────────────────────────────────────────

pub struct PollService {
    config: StationConfig,
    credentials: Credentials,
    session: PollSession,
}

impl PollService {
    pub fn new(config: StationConfig, credentials: Credentials) -> Self {
        Self {
            config,
            credentials,
            session: PollSession::default(),
        }
    }

    pub fn session(&self) -> &PollSession {
        &self.session
    }

    /// Poll forever. Returns only after the restart primitive was called
    /// and did not take the process down (host builds, tests).
    pub fn run(&mut self, ports: &mut Ports<'_>, weather: &mut dyn WeatherPort) {
        info!(
            "POLL | every {} min, link check every {} min",
            self.config.poll_interval_mins, self.config.link_check_every_mins
        );
        loop {
            match self.poll_once(ports, weather) {
                PollOutcome::Updated => self.wait_for_next_poll(ports),
                PollOutcome::Failed => {
                    self.supervise_link(ports);
                    ports.clock.sleep(Duration::from_secs(u64::from(
                        self.config.failure_backoff_secs,
                    )));
                }
                PollOutcome::RestartRequired => return,
            }
        }
    }

    /// One fetch-render cycle with error accounting.
    pub fn poll_once(&mut self, ports: &mut Ports<'_>, weather: &mut dyn WeatherPort) -> PollOutcome {
        let current = match weather.fetch_current() {
            Ok(current) => current,
            Err(e) => {
                warn!("POLL | weather fetch failed: {}", e);
                return self.record_failure(ports);
            }
        };

        self.refresh_forecast_if_stale(&mut *ports.clock, weather);

        let days = self.session.forecast.as_deref();
        let screen = screens::weather(&current, days, ports.clock.local_now());
        ports.display.show(&screen);

        self.session.error_count = 0;
        let forecast_days = days.map_or(0, <[_]>::len);
        info!(
            "POLL | {:.1} C, {}, {} forecast days",
            current.temperature, current.description, forecast_days
        );
        ports.events.emit(&AppEvent::WeatherUpdated {
            temperature: current.temperature,
            forecast_days,
        });
        PollOutcome::Updated
    }

    /// The minute countdown between successful polls, with periodic
    /// link supervision.
    pub fn wait_for_next_poll(&mut self, ports: &mut Ports<'_>) {
        let total = self.config.poll_interval_mins;
        let every = self.config.link_check_every_mins.max(1);

        for minute in 0..total {
            ports.display.show_countdown(total - minute);
            if minute % every == 0 {
                self.supervise_link(ports);
            }
            ports.clock.sleep(Duration::from_secs(60));
        }
    }

    /// Reconnect once if the link dropped.
    pub fn supervise_link(&mut self, ports: &mut Ports<'_>) {
        if ports.link.is_connected() {
            return;
        }
        warn!("POLL | link lost, reconnecting to '{}'", self.credentials.name);
        ports.events.emit(&AppEvent::LinkLost);
        match ports.link.connect(&self.credentials) {
            ConnectOutcome::Connected => info!("POLL | link restored"),
            ConnectOutcome::Failed(reason) => warn!("POLL | reconnect failed: {}", reason),
        }
    }

    fn record_failure(&mut self, ports: &mut Ports<'_>) -> PollOutcome {
        self.session.error_count = self.session.error_count.saturating_add(1);
        let consecutive = self.session.error_count;
        ports.events.emit(&AppEvent::PollFailed { consecutive });
        ports.display.show(&screens::fetch_error());

        if consecutive < self.config.error_threshold {
            return PollOutcome::Failed;
        }

        warn!("POLL | {} consecutive failures, restarting", consecutive);
        ports.display.show(&screens::too_many_errors());
        ports
            .clock
            .sleep(self.config.restart_delay(RestartReason::ErrorThreshold));
        ports
            .events
            .emit(&AppEvent::RestartRequested(RestartReason::ErrorThreshold));
        ports.system.restart();
        PollOutcome::RestartRequired
    }

    fn forecast_is_stale(&self, uptime: u64) -> bool {
        match (self.session.forecast.as_ref(), self.session.forecast_fetched_at) {
            (Some(_), Some(at)) => uptime.saturating_sub(at) >= self.config.forecast_refresh_secs,
            _ => true,
        }
    }

    /// A failed forecast fetch keeps whatever forecast is held and is
    /// retried on the next cycle.
    fn refresh_forecast_if_stale(&mut self, clock: &mut dyn ClockPort, weather: &mut dyn WeatherPort) {
        let uptime = clock.uptime_secs();
        if !self.forecast_is_stale(uptime) {
            return;
        }

        let samples = match weather.fetch_forecast() {
            Ok(samples) => samples,
            Err(e) => {
                warn!("POLL | forecast fetch failed: {}", e);
                return;
            }
        };

        // Unsynced clock: treat the feed's first day as today.
        let today = clock
            .local_now()
            .map(|now| now.date())
            .or_else(|| samples.first().map(|s| s.timestamp.date()));
        let Some(today) = today else {
            warn!("POLL | forecast feed is empty");
            return;
        };

        let days = forecast::aggregate(&samples, today, today.weekday());
        info!("POLL | forecast refreshed: {} days", days.len());
        self.session.forecast = Some(days);
        self.session.forecast_fetched_at = Some(uptime);
    }
}
