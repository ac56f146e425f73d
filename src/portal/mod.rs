//! Setup-mode captive portal.
//!
//! ```text
//!  TcpStream ──▶ request::RequestReader ──▶ HttpRequest
//!                                             │
//!                     GET / (anything else) ──┼──▶ pages::CONFIG_PAGE
//!                                             │
//!                               POST /save ───┴──▶ form::decode ──▶ Credentials ──▶ CredentialStore
//!                                                                                    └──▶ pages::SAVED_PAGE
//! ```
//!
//! Unauthenticated and plaintext. It only runs while the setup access
//! point is up, for a bounded window.

pub mod form;
pub mod pages;
pub mod request;
pub mod server;

pub use server::{PortalSettings, ProvisioningServer, SetupPortal};
