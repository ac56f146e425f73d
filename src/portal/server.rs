//! Setup-mode web server.
//!
//! One connection at a time, fully served and closed before the next
//! accept. The listener is non-blocking so the window deadline is checked
//! between accepts. Inside a connection the same deadline is checked
//! between reads, and each read is bounded by the per-client read
//! timeout, so one client can hold the portal at most one read timeout
//! past the window.
//!
//! Per-connection failures (timeouts, malformed requests, early close,
//! oversized bodies) are logged and dropped. Only a bind failure is
//! returned to the caller. Once a submission has been persisted it is
//! reported as saved even if the reply cannot be delivered.

use core::fmt;
use std::io::{ErrorKind, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use super::form;
use super::pages::{self, CONFIG_PAGE, SAVED_PAGE};
use super::request::{self, HttpRequest, RequestError, RequestLimits};
use crate::app::ports::{CredentialStore, ProvisionOutcome, ProvisioningPort};
use crate::credentials::Credentials;
use crate::error::PortalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortalSettings {
    /// Sleep between empty accept polls.
    pub accept_poll: Duration,
    /// Per-client read/write timeout.
    pub read_timeout: Duration,
    pub limits: RequestLimits,
}

impl Default for PortalSettings {
    fn default() -> Self {
        Self {
            accept_poll: Duration::from_millis(100),
            read_timeout: Duration::from_secs(5),
            limits: RequestLimits::default(),
        }
    }
}

#[derive(Debug)]
enum ServeError {
    Request(RequestError),
    Io(ErrorKind),
}

impl fmt::Display for ServeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(e) => write!(f, "{e}"),
            Self::Io(kind) => write!(f, "socket error: {kind}"),
        }
    }
}

impl From<RequestError> for ServeError {
    fn from(e: RequestError) -> Self {
        Self::Request(e)
    }
}

impl From<std::io::Error> for ServeError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.kind())
    }
}

pub struct ProvisioningServer {
    listener: TcpListener,
    settings: PortalSettings,
}

impl ProvisioningServer {
    /// Bind the listener. Port `0` picks a free port; see
    /// [`local_addr`](Self::local_addr).
    pub fn start<A: ToSocketAddrs>(addr: A, settings: PortalSettings) -> Result<Self, PortalError> {
        let listener = TcpListener::bind(addr).map_err(|e| {
            warn!("Portal: bind failed: {}", e);
            PortalError::Bind
        })?;
        Self::from_listener(listener, settings)
    }

    /// Serve on a listener the caller has already bound.
    pub fn from_listener(listener: TcpListener, settings: PortalSettings) -> Result<Self, PortalError> {
        listener.set_nonblocking(true).map_err(|_| PortalError::Socket)?;
        if let Ok(local) = listener.local_addr() {
            info!("Portal: listening on {}", local);
        }
        Ok(Self { listener, settings })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until one valid submission is persisted or `window` elapses.
    pub fn run(&mut self, store: &mut dyn CredentialStore, window: Duration) -> ProvisionOutcome {
        let deadline = Instant::now() + window;

        loop {
            if Instant::now() >= deadline {
                info!("Portal: window of {}s closed without a submission", window.as_secs());
                return ProvisionOutcome::TimedOut;
            }

            match self.listener.accept() {
                Ok((stream, peer)) => {
                    debug!("Portal: client {}", peer);
                    match self.serve(stream, store, deadline) {
                        Ok(Some(credentials)) => {
                            info!("Portal: saved credentials for '{}'", credentials.name);
                            return ProvisionOutcome::Saved(credentials);
                        }
                        Ok(None) => {}
                        Err(e) => warn!("Portal: dropped client {}: {}", peer, e),
                    }
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                    std::thread::sleep(self.settings.accept_poll);
                }
                Err(e) => {
                    warn!("Portal: accept error: {}", e);
                    std::thread::sleep(self.settings.accept_poll);
                }
            }
        }
    }

    fn serve(
        &self,
        mut stream: TcpStream,
        store: &mut dyn CredentialStore,
        deadline: Instant,
    ) -> Result<Option<Credentials>, ServeError> {
        // Accepted sockets inherit O_NONBLOCK on some stacks.
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(self.settings.read_timeout))?;
        stream.set_write_timeout(Some(self.settings.read_timeout))?;

        let request = request::read_request(&mut stream, self.settings.limits, deadline)?;
        let saved = handle(&request, store);
        let saved = reply(&mut stream, saved)?;
        let _ = stream.shutdown(Shutdown::Both);
        Ok(saved)
    }
}

/// Send the page matching `saved`. A write failure is only an error when
/// nothing was persisted; persisted credentials are returned regardless.
fn reply<W: Write>(out: &mut W, saved: Option<Credentials>) -> Result<Option<Credentials>, ServeError> {
    let page = if saved.is_some() { SAVED_PAGE } else { CONFIG_PAGE };
    match (pages::write_page(out, page), saved) {
        (Ok(()), saved) => Ok(saved),
        (Err(e), Some(credentials)) => {
            warn!("Portal: confirmation page not delivered: {}", e);
            Ok(Some(credentials))
        }
        (Err(e), None) => Err(e.into()),
    }
}

/// Route one request. Returns the persisted credentials for a valid
/// `POST /save`; everything else gets the configuration page.
fn handle(request: &HttpRequest, store: &mut dyn CredentialStore) -> Option<Credentials> {
    if request.method != "POST" || request.route() != "/save" {
        return None;
    }

    let fields = form::decode(&request.body);
    let name = fields.get("ssid").map(String::as_str).unwrap_or("");
    let secret = fields.get("password").map(String::as_str).unwrap_or("");

    let credentials = match Credentials::new(name, secret) {
        Ok(c) => c,
        Err(e) => {
            warn!("Portal: rejected submission: {}", e);
            return None;
        }
    };

    match store.save(&credentials) {
        Ok(()) => Some(credentials),
        Err(e) => {
            warn!("Portal: could not persist credentials: {}", e);
            None
        }
    }
}

enum Endpoint {
    /// Bound afresh for every provisioning window.
    Address(String),
    /// Bound once by the owner and reused.
    Listener(TcpListener),
}

/// [`ProvisioningPort`] backed by a [`ProvisioningServer`] per call.
pub struct SetupPortal {
    endpoint: Endpoint,
    settings: PortalSettings,
}

impl SetupPortal {
    pub fn new(bind_addr: impl Into<String>, settings: PortalSettings) -> Self {
        Self {
            endpoint: Endpoint::Address(bind_addr.into()),
            settings,
        }
    }

    pub fn from_listener(listener: TcpListener, settings: PortalSettings) -> Self {
        Self {
            endpoint: Endpoint::Listener(listener),
            settings,
        }
    }
}

impl ProvisioningPort for SetupPortal {
    fn provision(
        &mut self,
        store: &mut dyn CredentialStore,
        window: Duration,
    ) -> Result<ProvisionOutcome, PortalError> {
        let mut server = match &self.endpoint {
            Endpoint::Address(addr) => ProvisioningServer::start(addr.as_str(), self.settings)?,
            Endpoint::Listener(listener) => {
                let listener = listener.try_clone().map_err(|_| PortalError::Socket)?;
                ProvisioningServer::from_listener(listener, self.settings)?
            }
        };
        Ok(server.run(store, window))
    }
}
