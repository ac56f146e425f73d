//! Integration tests for the steady-state poll loop.
//!
//! The forecast test runs the real `OwmClient` against a loopback
//! fixture server; the others script the weather source.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, Weekday};
use weatherstation::adapters::display::LogDisplay;
use weatherstation::adapters::system::EspSystem;
use weatherstation::adapters::weather_http::OwmClient;
use weatherstation::adapters::wifi::{SimRadio, WifiAdapter};
use weatherstation::app::events::AppEvent;
use weatherstation::app::ports::{ConnectOutcome, ConnectivityPort, Ports, WeatherPort};
use weatherstation::app::service::{PollOutcome, PollService};
use weatherstation::config::StationConfig;
use weatherstation::credentials::Credentials;
use weatherstation::fsm::RestartReason;
use weatherstation::weather::WeatherIcon;

use crate::mock_hw::{ManualClock, RecordingEvents, ScriptedWeather, VirtualDelay};

fn home() -> Credentials {
    Credentials::new("Home", "Secret123").unwrap()
}

fn online_wifi(config: &StationConfig) -> WifiAdapter<SimRadio, VirtualDelay> {
    let mut wifi = WifiAdapter::new(
        SimRadio::new().with_network("Home", "Secret123"),
        VirtualDelay::default(),
        config.link_timing(),
    );
    assert_eq!(wifi.connect(&home()), ConnectOutcome::Connected);
    wifi
}

// ── Fixture weather server ────────────────────────────────────

const CURRENT_JSON: &str = r#"{"weather":[{"id":800,"description":"clear sky"}],
"main":{"temp":18.5,"feels_like":17.9,"humidity":40},"wind":{"speed":2.5},
"name":"Athens","sys":{"country":"GR"}}"#;

/// 3-hour feed from 2025-01-09 00:00 for six days.
fn forecast_json() -> String {
    let start = NaiveDate::from_ymd_opt(2025, 1, 9)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let entries: Vec<String> = (0..48)
        .map(|i| {
            let ts: NaiveDateTime = start + chrono::Duration::hours(3 * i);
            let code = if i % 8 == 4 { 500 } else { 800 };
            format!(
                r#"{{"dt_txt":"{}","main":{{"temp":{}.0,"humidity":55}},"weather":[{{"id":{}}}],"wind":{{"speed":3.0}}}}"#,
                ts.format("%Y-%m-%d %H:%M:%S"),
                10 + i / 8,
                code
            )
        })
        .collect();
    format!(r#"{{"cod":"200","list":[{}]}}"#, entries.join(","))
}

/// Serve `requests` responses, routing on the path, then exit.
fn fixture_server(requests: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let forecast = forecast_json();
    thread::spawn(move || {
        for _ in 0..requests {
            let (mut stream, _) = listener.accept().unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 512];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            let request_line = String::from_utf8_lossy(&head);
            let body = if request_line.starts_with("GET /forecast") {
                forecast.as_str()
            } else {
                CURRENT_JSON
            };
            let _ = write!(
                stream,
                "HTTP/1.0 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
                body.len(),
                body
            );
        }
    });
    base
}

#[test]
fn poll_renders_current_conditions_and_five_day_forecast() {
    let config = StationConfig {
        weather_api_base: fixture_server(2),
        weather_api_key: "test-key".into(),
        ..StationConfig::default()
    };
    let mut wifi = online_wifi(&config);
    let mut display = LogDisplay::new();
    // Thursday morning
    let mut clock = ManualClock::at(NaiveDate::from_ymd_opt(2025, 1, 9).unwrap(), 10);
    let mut system = EspSystem::new();
    let mut events = RecordingEvents::default();
    let mut weather = OwmClient::new(&config);
    let mut service = PollService::new(config.clone(), home());

    let outcome = {
        let mut ports = Ports {
            link: &mut wifi,
            display: &mut display,
            clock: &mut clock,
            system: &mut system,
            events: &mut events,
        };
        service.poll_once(&mut ports, &mut weather)
    };

    assert_eq!(outcome, PollOutcome::Updated);
    let days = service.session().forecast.as_ref().unwrap();
    let labels: Vec<Weekday> = days.iter().map(|d| d.weekday).collect();
    assert_eq!(
        labels,
        vec![Weekday::Fri, Weekday::Sat, Weekday::Sun, Weekday::Mon, Weekday::Tue]
    );
    assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2025, 1, 10).unwrap());
    assert_eq!(days[0].temperature, 11.0);
    assert_eq!(days[0].icon(), WeatherIcon::Rain);

    let screen = display.last_screen().unwrap();
    assert_eq!(screen.lines[0], "Weather: Athens, 10:00");
    assert_eq!(screen.icons.len(), 6);
    assert_eq!(screen.icons[0], WeatherIcon::Clear);
    assert!(events.events.contains(&AppEvent::WeatherUpdated {
        temperature: 18.5,
        forecast_days: 5
    }));
}

#[test]
fn five_consecutive_failures_restart_exactly_once() {
    let config = StationConfig::default();
    let mut wifi = online_wifi(&config);
    let mut display = LogDisplay::new();
    let mut clock = ManualClock::unsynced();
    let mut system = EspSystem::new();
    let mut events = RecordingEvents::default();
    let mut weather = ScriptedWeather::default();
    let mut service = PollService::new(config.clone(), home());

    {
        let mut ports = Ports {
            link: &mut wifi,
            display: &mut display,
            clock: &mut clock,
            system: &mut system,
            events: &mut events,
        };
        service.run(&mut ports, &mut weather);
    }

    assert_eq!(system.restarts(), 1);
    assert_eq!(weather.current_calls, 5);
    assert_eq!(
        events.count(|e| matches!(e, AppEvent::PollFailed { .. })),
        5
    );
    assert_eq!(
        events.count(|e| *e == AppEvent::RestartRequested(RestartReason::ErrorThreshold)),
        1
    );
    // link stayed up, so no reconnects
    assert_eq!(events.count(|e| *e == AppEvent::LinkLost), 0);
    assert_eq!(wifi.radio().associations, 1);
    // four back-offs plus the restart delay
    assert_eq!(clock.slept, Duration::from_secs(4 * 60 + 5));
}

#[test]
fn dropped_link_is_restored_during_the_wait() {
    let config = StationConfig::default();
    let mut wifi = online_wifi(&config);
    wifi.radio_mut().drop_link();
    assert!(!wifi.is_connected());

    let mut display = LogDisplay::new();
    let mut clock = ManualClock::unsynced();
    let mut system = EspSystem::new();
    let mut events = RecordingEvents::default();
    let mut service = PollService::new(config.clone(), home());

    {
        let mut ports = Ports {
            link: &mut wifi,
            display: &mut display,
            clock: &mut clock,
            system: &mut system,
            events: &mut events,
        };
        service.wait_for_next_poll(&mut ports);
    }

    assert!(wifi.is_connected());
    assert_eq!(events.count(|e| *e == AppEvent::LinkLost), 1);
    assert_eq!(display.countdown(), Some(1));
    assert_eq!(clock.slept, Duration::from_secs(60 * 60));
}

#[test]
fn success_after_failures_resets_the_error_budget() {
    let config = StationConfig::default();
    let mut wifi = online_wifi(&config);
    let mut display = LogDisplay::new();
    let mut clock = ManualClock::unsynced();
    let mut system = EspSystem::new();
    let mut events = RecordingEvents::default();
    let mut weather = ScriptedWeather::default();
    let mut service = PollService::new(config.clone(), home());

    let mut ports = Ports {
        link: &mut wifi,
        display: &mut display,
        clock: &mut clock,
        system: &mut system,
        events: &mut events,
    };
    for _ in 0..4 {
        assert_eq!(service.poll_once(&mut ports, &mut weather), PollOutcome::Failed);
    }
    weather.current.push_back(Ok(weatherstation::weather::owm::parse_current(
        CURRENT_JSON.as_bytes(),
    )
    .unwrap()));
    assert_eq!(service.poll_once(&mut ports, &mut weather), PollOutcome::Updated);
    assert_eq!(service.session().error_count, 0);
    for _ in 0..4 {
        assert_eq!(service.poll_once(&mut ports, &mut weather), PollOutcome::Failed);
    }
    drop(ports);
    assert_eq!(system.restarts(), 0);
    assert!(weather.forecast_calls >= 1);
}
