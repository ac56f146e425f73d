//! Integration tests for the boot sequence.
//!
//! Drives `run_boot` with the host adapters: the simulated radio behind
//! the real `WifiAdapter`, the file-backed credential store and the
//! setup portal on a loopback socket.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use tempfile::TempDir;

use weatherstation::adapters::credentials::FileCredentialStore;
use weatherstation::adapters::display::LogDisplay;
use weatherstation::adapters::system::EspSystem;
use weatherstation::adapters::wifi::{SimRadio, WifiAdapter};
use weatherstation::app::events::AppEvent;
use weatherstation::app::ports::{ConnectFailure, CredentialStore, Ports};
use weatherstation::config::StationConfig;
use weatherstation::credentials::Credentials;
use weatherstation::fsm::context::BootContext;
use weatherstation::fsm::{run_boot, BootOutcome, RestartReason, StateId};
use weatherstation::portal::SetupPortal;

use crate::mock_hw::{scratch_store, ManualClock, RecordingEvents, VirtualDelay};

struct Station {
    config: StationConfig,
    wifi: WifiAdapter<SimRadio, VirtualDelay>,
    store: FileCredentialStore,
    portal: SetupPortal,
    clock: ManualClock,
    display: LogDisplay,
    system: EspSystem,
    events: RecordingEvents,
    _scratch: TempDir,
}

impl Station {
    fn new(config: StationConfig, radio: SimRadio) -> Self {
        let wifi = WifiAdapter::new(radio, VirtualDelay::default(), config.link_timing());
        let portal = SetupPortal::new(config.portal_bind_addr.clone(), config.portal_settings());
        let (scratch, store) = scratch_store();
        Self {
            wifi,
            store,
            portal,
            clock: ManualClock::unsynced(),
            display: LogDisplay::new(),
            system: EspSystem::new(),
            events: RecordingEvents::default(),
            _scratch: scratch,
            config,
        }
    }

    /// Serve the setup portal on an already-bound loopback listener.
    fn with_bound_portal(mut self) -> (Self, SocketAddr) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        self.portal = SetupPortal::from_listener(listener, self.config.portal_settings());
        (self, addr)
    }

    fn boot(&mut self) -> BootOutcome {
        let ports = Ports {
            link: &mut self.wifi,
            display: &mut self.display,
            clock: &mut self.clock,
            system: &mut self.system,
            events: &mut self.events,
        };
        let mut ctx = BootContext::new(&self.config, ports, &mut self.store, &mut self.portal);
        run_boot(&mut ctx)
    }

    fn visited(&self) -> Vec<StateId> {
        self.events
            .events
            .iter()
            .filter_map(|e| match e {
                AppEvent::BootStateChanged { to, .. } => Some(*to),
                _ => None,
            })
            .collect()
    }
}

/// Post a form to the portal. The listener is already bound, so the
/// connection queues until the portal starts accepting.
fn submit_form(addr: SocketAddr, body: &'static str) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut stream = TcpStream::connect(addr).unwrap();
        write!(
            stream,
            "POST /save HTTP/1.1\r\nHost: 192.168.4.1\r\n\
             Content-Type: application/x-www-form-urlencoded\r\n\
             Content-Length: {}\r\n\r\n{}",
            body.len(),
            body
        )
        .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        response
    })
}

#[test]
fn first_boot_provisions_over_the_portal_and_restarts() {
    let config = StationConfig {
        provisioning_window_secs: 20,
        ..StationConfig::default()
    };
    let (mut station, addr) = Station::new(config, SimRadio::new()).with_bound_portal();

    let client = submit_form(addr, "ssid=Home+Net&password=Secret123");
    let outcome = station.boot();
    let response = client.join().unwrap();

    assert_eq!(outcome, BootOutcome::Restarted(RestartReason::Reconfigured));
    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.contains("Configuration Saved"));

    assert_eq!(
        station.store.load(),
        Some(Credentials::new("Home Net", "Secret123").unwrap())
    );
    assert_eq!(station.system.restarts(), 1);
    assert_eq!(station.wifi.radio().access_point(), None);
    assert_eq!(
        station.visited(),
        vec![StateId::Provisioning, StateId::RestartDevice]
    );
    assert!(station.events.events.contains(&AppEvent::CredentialsSaved {
        name: "Home Net".into()
    }));
}

#[test]
fn stored_credentials_bring_the_station_online() {
    let mut station = Station::new(
        StationConfig::default(),
        SimRadio::new().with_network("Home", "Secret123"),
    );
    station
        .store
        .save(&Credentials::new("Home", "Secret123").unwrap())
        .unwrap();

    let outcome = station.boot();

    assert_eq!(
        outcome,
        BootOutcome::Online(Credentials::new("Home", "Secret123").unwrap())
    );
    assert_eq!(
        station.visited(),
        vec![StateId::Connecting, StateId::Synchronizing, StateId::Steady]
    );
    assert!(station.events.events.contains(&AppEvent::Connected { attempt: 1 }));
    assert_eq!(station.system.restarts(), 0);
}

#[test]
fn wrong_secret_exhausts_attempts_and_forgets_the_network() {
    let mut station = Station::new(
        StationConfig::default(),
        SimRadio::new().with_network("Home", "Secret123"),
    );
    station
        .store
        .save(&Credentials::new("Home", "NotTheSecret").unwrap())
        .unwrap();

    let outcome = station.boot();

    assert_eq!(outcome, BootOutcome::Restarted(RestartReason::ConnectExhausted));
    let failures = station.events.count(|e| {
        matches!(
            e,
            AppEvent::ConnectAttemptFailed {
                reason: ConnectFailure::WrongSecret,
                ..
            }
        )
    });
    assert_eq!(failures, 3);
    assert_eq!(station.wifi.radio().associations, 3);
    assert_eq!(station.store.load(), None);
    assert_eq!(station.system.restarts(), 1);
    // two 5 s pauses between attempts, then the 60 s restart delay
    assert_eq!(station.clock.slept, Duration::from_secs(70));
}

#[test]
fn timeouts_keep_the_stored_credentials() {
    let mut radio = SimRadio::new().with_network("Home", "Secret123");
    radio.stall = true;
    let mut station = Station::new(StationConfig::default(), radio);
    station
        .store
        .save(&Credentials::new("Home", "Secret123").unwrap())
        .unwrap();

    let outcome = station.boot();

    assert_eq!(outcome, BootOutcome::Restarted(RestartReason::ConnectExhausted));
    // first cycle plus one retry per attempt
    assert_eq!(station.wifi.radio().associations, 6);
    assert!(station.store.load().is_some());
    assert_eq!(station.system.restarts(), 1);
}

#[test]
fn occupied_portal_port_restarts_instead_of_hanging() {
    let blocker = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let config = StationConfig {
        portal_bind_addr: blocker.local_addr().unwrap().to_string(),
        ..StationConfig::default()
    };
    let mut station = Station::new(config, SimRadio::new());

    let outcome = station.boot();

    assert_eq!(outcome, BootOutcome::Restarted(RestartReason::PortalUnavailable));
    assert_eq!(station.system.restarts(), 1);
    assert_eq!(station.wifi.radio().access_point(), None);
}
