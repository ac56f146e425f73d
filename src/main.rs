//! Weather Station Firmware: Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  WifiAdapter<EspRadio>  FileCredentialStore  SetupPortal       │
//! │  (Connectivity)         (CredentialStore)    (Provisioning)    │
//! │  StationClock  LogDisplay  EspSystem  LogEventSink  OwmClient  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  Boot FSM (load → setup/connect → sync)                │    │
//! │  │  PollService (fetch · aggregate · render · supervise)  │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{bail, Result};
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sys;
use esp_idf_svc::wifi::EspWifi;
use log::{info, warn};

use weatherstation::adapters::credentials::FileCredentialStore;
use weatherstation::adapters::display::LogDisplay;
use weatherstation::adapters::log_sink::LogEventSink;
use weatherstation::adapters::system::EspSystem;
use weatherstation::adapters::time::StationClock;
use weatherstation::adapters::weather_http::OwmClient;
use weatherstation::adapters::wifi::{EspRadio, WifiAdapter};
use weatherstation::app::ports::Ports;
use weatherstation::app::service::PollService;
use weatherstation::config::StationConfig;
use weatherstation::error::ConnectivityError;
use weatherstation::fsm::context::BootContext;
use weatherstation::fsm::{run_boot, BootOutcome};
use weatherstation::portal::SetupPortal;

const STORAGE_BASE: &core::ffi::CStr = c"/storage";

/// Mount the SPIFFS data partition that holds the credential file.
fn mount_storage() -> Result<()> {
    let conf = sys::esp_vfs_spiffs_conf_t {
        base_path: STORAGE_BASE.as_ptr(),
        partition_label: core::ptr::null(),
        max_files: 4,
        format_if_mount_failed: true,
    };
    // SAFETY: `conf` and the static path outlive the call; the VFS copies them.
    let rc = unsafe { sys::esp_vfs_spiffs_register(&conf) };
    if rc != sys::ESP_OK as sys::esp_err_t {
        bail!("SPIFFS mount failed ({})", rc);
    }
    Ok(())
}

/// Weather API settings baked in at build time.
fn station_config() -> StationConfig {
    let mut config = StationConfig::default();
    if let Some(key) = option_env!("WEATHER_API_KEY") {
        config.weather_api_key = key.into();
    }
    if let Some(lat) = option_env!("WEATHER_LAT") {
        config.latitude = lat.into();
    }
    if let Some(lon) = option_env!("WEATHER_LON") {
        config.longitude = lon.into();
    }
    if config.weather_api_key.is_empty() {
        warn!("WEATHER_API_KEY not set at build time; polls will fail");
    }
    config
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  WeatherStation v{}                ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = station_config();
    config.validate()?;

    mount_storage()?;

    // ── 2. Construct adapters ─────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let esp_wifi = EspWifi::new(peripherals.modem, sysloop, Some(nvs))?;
    let radio = EspRadio::new(esp_wifi)
        .map_err(|e| weatherstation::error::Error::from(ConnectivityError::from(e)))?;

    let mut wifi = WifiAdapter::new(radio, FreeRtos, config.link_timing());
    let mut store = FileCredentialStore::new(config.credentials_path.clone());
    let mut portal = SetupPortal::new(config.portal_bind_addr.clone(), config.portal_settings());
    let mut clock = StationClock::new(config.utc_offset_secs);
    let mut display = LogDisplay::new();
    let mut system = EspSystem::new();
    let mut events = LogEventSink::new();
    let mut weather = OwmClient::new(&config);

    let ports = Ports {
        link: &mut wifi,
        display: &mut display,
        clock: &mut clock,
        system: &mut system,
        events: &mut events,
    };

    // ── 3. Boot sequence ──────────────────────────────────────
    let mut ctx = BootContext::new(&config, ports, &mut store, &mut portal);
    let credentials = match run_boot(&mut ctx) {
        BootOutcome::Online(credentials) => credentials,
        BootOutcome::Restarted(reason) => bail!("restart did not take effect ({reason})"),
    };

    // ── 4. Steady state ───────────────────────────────────────
    info!("System ready. Entering poll loop.");
    let mut service = PollService::new(config.clone(), credentials);
    service.run(&mut ctx.ports, &mut weather);

    bail!("poll loop returned after restart request")
}
